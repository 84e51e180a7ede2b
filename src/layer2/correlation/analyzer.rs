// Correlation Analyzer - pairwise matrix, baseline breaks and sector rotation
// Runs once per pass after every symbol's history is available

use super::breaks::{detect_breaks, CorrelationBreak};
use super::pairs::{compute_pair, CorrelationPair, ReturnSeries};
use super::sectors::{analyze_sector, SectorCorrelation};
use crate::core::config::CorrelationBaselineConfig;
use crate::core::types::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const STRONG_CORRELATION: f64 = 0.6;
const UNSTABLE_BELOW: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationInsights {
    pub total_pairs: usize,
    pub strong_positive: usize,
    pub strong_negative: usize,
    pub unstable: usize,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub pairs: Vec<CorrelationPair>,
    pub breaks: Vec<CorrelationBreak>,
    pub sectors: Vec<SectorCorrelation>,
    pub insights: CorrelationInsights,
}

pub struct CorrelationAnalyzer {
    config: CorrelationBaselineConfig,
}

impl CorrelationAnalyzer {
    pub fn new(config: CorrelationBaselineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationBaselineConfig {
        &self.config
    }

    /// Analyze a universe of price histories; order of the result follows symbol order
    pub fn analyze(&self, universe: &BTreeMap<String, PriceSeries>) -> CorrelationReport {
        let returns: BTreeMap<String, ReturnSeries> = universe
            .iter()
            .map(|(symbol, series)| (symbol.clone(), series.returns()))
            .filter(|(_, r)| !r.is_empty())
            .collect();

        let symbols: Vec<&String> = returns.keys().collect();
        let mut pairs = Vec::new();
        for (i, a) in symbols.iter().enumerate() {
            for b in &symbols[i + 1..] {
                if let Some(pair) = compute_pair(a, &returns[*a], b, &returns[*b], self.config.min_overlap) {
                    pairs.push(pair);
                }
            }
        }

        let breaks = detect_breaks(&pairs, &self.config);
        let sectors: Vec<SectorCorrelation> = self
            .config
            .sectors
            .iter()
            .filter_map(|group| analyze_sector(group, &returns, &pairs, &self.config))
            .collect();
        let insights = summarize(&pairs);

        debug!(
            symbols = returns.len(),
            pairs = pairs.len(),
            breaks = breaks.len(),
            sectors = sectors.len(),
            "Correlation analysis complete"
        );

        CorrelationReport { pairs, breaks, sectors, insights }
    }
}

fn summarize(pairs: &[CorrelationPair]) -> CorrelationInsights {
    let strong_positive = pairs.iter().filter(|p| p.correlation >= STRONG_CORRELATION).count();
    let strong_negative = pairs.iter().filter(|p| p.correlation <= -STRONG_CORRELATION).count();
    let unstable = pairs.iter().filter(|p| p.stability < UNSTABLE_BELOW).count();

    let mut notes = Vec::new();
    if strong_positive > 0 {
        notes.push(format!("{} strongly positively correlated pairs", strong_positive));
    }
    if strong_negative > 0 {
        notes.push(format!("{} strongly negatively correlated pairs", strong_negative));
    }
    if unstable > 0 {
        notes.push(format!("{} pairs with unstable correlation", unstable));
    }

    CorrelationInsights {
        total_pairs: pairs.len(),
        strong_positive,
        strong_negative,
        unstable,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bar, DAY_MS};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(i as i64 * DAY_MS, *c, *c, *c, *c, 1000.0))
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn wave(n: usize, scale: f64) -> Vec<f64> {
        (0..n).map(|i| 100.0 + scale * ((i as f64) * 0.7).sin()).collect()
    }

    #[test]
    fn test_pairs_in_symbol_order() {
        let mut universe = BTreeMap::new();
        universe.insert("B".to_string(), series("B", &wave(30, 2.0)));
        universe.insert("A".to_string(), series("A", &wave(30, 3.0)));
        universe.insert("C".to_string(), series("C", &wave(30, -1.0)));

        let report = CorrelationAnalyzer::new(CorrelationBaselineConfig::default()).analyze(&universe);
        assert_eq!(report.pairs.len(), 3);
        assert_eq!((report.pairs[0].symbol_a.as_str(), report.pairs[0].symbol_b.as_str()), ("A", "B"));
        assert_eq!((report.pairs[2].symbol_a.as_str(), report.pairs[2].symbol_b.as_str()), ("B", "C"));
        assert!(report.pairs[0].correlation > 0.9);
        assert!(report.pairs[1].correlation < -0.9);
        assert_eq!(report.insights.strong_positive, 1);
        assert_eq!(report.insights.strong_negative, 2);
        assert!(report.breaks.is_empty());
    }

    #[test]
    fn test_break_against_baseline() {
        let mut universe = BTreeMap::new();
        // Index moving against the proxy breaks the 0.85 baseline
        universe.insert("^GSPC".to_string(), series("^GSPC", &wave(30, 2.0)));
        universe.insert("^IXIC".to_string(), series("^IXIC", &wave(30, -2.0)));

        let report = CorrelationAnalyzer::new(CorrelationBaselineConfig::default()).analyze(&universe);
        assert_eq!(report.breaks.len(), 1);
        assert_eq!(report.breaks[0].significance, 1.0);
    }

    #[test]
    fn test_short_histories_produce_nothing() {
        let mut universe = BTreeMap::new();
        universe.insert("A".to_string(), series("A", &[1.0, 2.0, 3.0]));
        universe.insert("B".to_string(), series("B", &[1.0, 2.0, 3.0]));
        let report = CorrelationAnalyzer::new(CorrelationBaselineConfig::default()).analyze(&universe);
        assert!(report.pairs.is_empty());
        assert!(report.sectors.is_empty());
        assert_eq!(report.insights.total_pairs, 0);
    }
}
