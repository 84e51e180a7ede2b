// Sector rotation - sector-average returns against the market proxy

use super::pairs::{align, CorrelationPair};
use crate::core::config::{CorrelationBaselineConfig, SectorGroup};
use crate::core::types::RotationSignal;
use crate::layer2::stats::{mean, pearson, tail_mean};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCorrelation {
    pub sector: String,
    pub members: Vec<String>,
    pub internal_correlation: f64,
    pub market_correlation: f64,
    pub relative_return: f64,
    pub rotation_signal: RotationSignal,
    pub rotation_strength: f64,
}

/// Equal-weight average of member returns per timestamp
fn sector_average(members: &[&Vec<(i64, f64)>]) -> Vec<(i64, f64)> {
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for series in members {
        for (ts, r) in series.iter() {
            if r.is_finite() {
                let entry = buckets.entry(*ts).or_insert((0.0, 0));
                entry.0 += r;
                entry.1 += 1;
            }
        }
    }
    buckets
        .into_iter()
        .map(|(ts, (sum, count))| (ts, sum / count as f64))
        .collect()
}

pub fn classify_rotation(relative_return: f64, threshold: f64) -> (RotationSignal, f64) {
    if relative_return > threshold {
        (RotationSignal::Inflow, (relative_return.abs() * 100.0).min(1.0))
    } else if relative_return < -threshold {
        (RotationSignal::Outflow, (relative_return.abs() * 100.0).min(1.0))
    } else {
        (RotationSignal::Neutral, 0.5)
    }
}

/// Analyze one sector; None when no member or the proxy is missing from the universe
pub fn analyze_sector(
    group: &SectorGroup,
    returns: &BTreeMap<String, Vec<(i64, f64)>>,
    pairs: &[CorrelationPair],
    config: &CorrelationBaselineConfig,
) -> Option<SectorCorrelation> {
    let proxy = returns.get(&config.market_proxy)?;
    let members: Vec<&String> = group
        .members
        .iter()
        .filter(|m| **m != config.market_proxy && returns.contains_key(m.as_str()))
        .collect();
    if members.is_empty() {
        return None;
    }

    // Mean of the already-computed pairwise correlations among present members
    let internal: Vec<f64> = pairs
        .iter()
        .filter(|p| members.contains(&&p.symbol_a) && members.contains(&&p.symbol_b))
        .map(|p| p.correlation)
        .collect();
    let internal_correlation = if members.len() < 2 { 0.0 } else { mean(&internal).unwrap_or(0.0) };

    let member_series: Vec<&Vec<(i64, f64)>> = members.iter().filter_map(|m| returns.get(m.as_str())).collect();
    let average = sector_average(&member_series);

    let (xs, ys) = align(&average, proxy);
    let market_correlation = if xs.len() >= config.min_overlap {
        pearson(&xs, &ys).unwrap_or(0.0)
    } else {
        0.0
    };

    let sector_values: Vec<f64> = average.iter().map(|(_, r)| *r).collect();
    let proxy_values: Vec<f64> = proxy.iter().map(|(_, r)| *r).collect();
    let relative_return = match (
        tail_mean(&sector_values, config.rotation_window),
        tail_mean(&proxy_values, config.rotation_window),
    ) {
        (Some(s), Some(p)) => s - p,
        _ => 0.0,
    };
    let (rotation_signal, rotation_strength) = classify_rotation(relative_return, config.rotation_threshold);

    Some(SectorCorrelation {
        sector: group.name.clone(),
        members: members.into_iter().cloned().collect(),
        internal_correlation,
        market_correlation,
        relative_return,
        rotation_signal,
        rotation_strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns(values: &[f64]) -> Vec<(i64, f64)> {
        values.iter().enumerate().map(|(i, v)| (i as i64, *v)).collect()
    }

    #[test]
    fn test_classify_rotation() {
        let (signal, strength) = classify_rotation(0.009, 0.002);
        assert_eq!(signal, RotationSignal::Inflow);
        assert!((strength - 0.9).abs() < 1e-9);

        let (signal, strength) = classify_rotation(-0.02, 0.002);
        assert_eq!(signal, RotationSignal::Outflow);
        assert_eq!(strength, 1.0);

        let (signal, strength) = classify_rotation(0.002, 0.002);
        assert_eq!(signal, RotationSignal::Neutral);
        assert_eq!(strength, 0.5);
    }

    #[test]
    fn test_sector_needs_proxy_and_member() {
        let config = CorrelationBaselineConfig::default();
        let group = SectorGroup::new("Technology", &["AAPL", "MSFT"]);

        let mut map = BTreeMap::new();
        map.insert("AAPL".to_string(), returns(&[0.01; 10]));
        assert!(analyze_sector(&group, &map, &[], &config).is_none());

        map.insert("^GSPC".to_string(), returns(&[0.0; 10]));
        let sector = analyze_sector(&group, &map, &[], &config).unwrap();
        assert_eq!(sector.members, vec!["AAPL".to_string()]);
        assert_eq!(sector.internal_correlation, 0.0);
        assert!((sector.relative_return - 0.01).abs() < 1e-12);
        assert_eq!(sector.rotation_signal, RotationSignal::Inflow);
        assert_eq!(sector.rotation_strength, 1.0);
    }

    #[test]
    fn test_sector_market_correlation() {
        let config = CorrelationBaselineConfig::default();
        let group = SectorGroup::new("Energy", &["XOM", "CVX"]);
        let proxy = [0.01, -0.02, 0.015, 0.0, -0.01, 0.02, 0.005, -0.005];
        let mut map = BTreeMap::new();
        map.insert("^GSPC".to_string(), returns(&proxy));
        map.insert("XOM".to_string(), returns(&proxy.map(|r| r * 1.5)));
        map.insert("CVX".to_string(), returns(&proxy.map(|r| r * 0.5)));

        let sector = analyze_sector(&group, &map, &[], &config).unwrap();
        assert!((sector.market_correlation - 1.0).abs() < 1e-9);
        assert!(sector.relative_return.abs() < 0.002);
        assert_eq!(sector.rotation_signal, RotationSignal::Neutral);
    }
}
