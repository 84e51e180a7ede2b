// Pairwise return correlation with trailing windows and a stability score

use crate::core::types::clamp_unit;
use crate::layer2::stats::{pearson, std_dev_population};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Simple returns keyed by timestamp (ms)
pub type ReturnSeries = Vec<(i64, f64)>;

// Trailing windows in observations: 1 day, 1 week, 1 month of daily bars
const WINDOW_1D: usize = 1;
const WINDOW_1W: usize = 5;
const WINDOW_1M: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> Self {
        let a = r.abs();
        if a >= 0.8 {
            CorrelationStrength::VeryStrong
        } else if a >= 0.6 {
            CorrelationStrength::Strong
        } else if a >= 0.4 {
            CorrelationStrength::Moderate
        } else if a >= 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::VeryWeak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
    Neutral,
}

impl CorrelationDirection {
    pub fn classify(r: f64) -> Self {
        if r > 0.1 {
            CorrelationDirection::Positive
        } else if r < -0.1 {
            CorrelationDirection::Negative
        } else {
            CorrelationDirection::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub symbol_a: String,
    pub symbol_b: String,
    pub correlation: f64,
    pub correlation_1d: f64,
    pub correlation_1w: f64,
    pub correlation_1m: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    pub overlap: usize,
    pub stability: f64,
}

impl CorrelationPair {
    pub fn involves(&self, symbol: &str) -> bool {
        self.symbol_a == symbol || self.symbol_b == symbol
    }
}

/// Values of both series at their shared timestamps, in timestamp order
pub fn align(a: &[(i64, f64)], b: &[(i64, f64)]) -> (Vec<f64>, Vec<f64>) {
    let lookup: BTreeMap<i64, f64> = b.iter().copied().collect();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut sorted: Vec<(i64, f64)> = a.to_vec();
    sorted.sort_by_key(|(ts, _)| *ts);
    sorted.dedup_by_key(|(ts, _)| *ts);

    for (ts, x) in sorted {
        if let Some(y) = lookup.get(&ts) {
            if x.is_finite() && y.is_finite() {
                xs.push(x);
                ys.push(*y);
            }
        }
    }
    (xs, ys)
}

fn trailing(xs: &[f64], ys: &[f64], window: usize, full: f64) -> f64 {
    let start = xs.len().saturating_sub(window);
    pearson(&xs[start..], &ys[start..]).unwrap_or(full)
}

/// Correlate two return series; None below `min_overlap` shared points or on zero variance
pub fn compute_pair(
    symbol_a: &str,
    a: &[(i64, f64)],
    symbol_b: &str,
    b: &[(i64, f64)],
    min_overlap: usize,
) -> Option<CorrelationPair> {
    let (xs, ys) = align(a, b);
    if xs.len() < min_overlap {
        return None;
    }
    let correlation = pearson(&xs, &ys)?;

    let correlation_1d = trailing(&xs, &ys, WINDOW_1D, correlation);
    let correlation_1w = trailing(&xs, &ys, WINDOW_1W, correlation);
    let correlation_1m = trailing(&xs, &ys, WINDOW_1M, correlation);

    let spread = std_dev_population(&[correlation_1d, correlation_1w, correlation_1m, correlation]).unwrap_or(0.0);
    let stability = clamp_unit(1.0 - 2.0 * spread, 0.0, 1.0);

    Some(CorrelationPair {
        symbol_a: symbol_a.to_string(),
        symbol_b: symbol_b.to_string(),
        correlation,
        correlation_1d,
        correlation_1w,
        correlation_1m,
        strength: CorrelationStrength::classify(correlation),
        direction: CorrelationDirection::classify(correlation),
        overlap: xs.len(),
        stability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> ReturnSeries {
        values.iter().enumerate().map(|(i, v)| (i as i64, *v)).collect()
    }

    #[test]
    fn test_align_by_timestamp() {
        let a = vec![(1, 0.1), (2, 0.2), (3, 0.3)];
        let b = vec![(2, 1.0), (3, 2.0), (4, 3.0)];
        let (xs, ys) = align(&a, &b);
        assert_eq!(xs, vec![0.2, 0.3]);
        assert_eq!(ys, vec![1.0, 2.0]);
    }

    #[test]
    fn test_pair_requires_overlap() {
        let a = series(&[0.01, 0.02, -0.01, 0.03]);
        let b = series(&[0.02, 0.04, -0.02, 0.06]);
        assert!(compute_pair("A", &a, "B", &b, 5).is_none());
    }

    #[test]
    fn test_perfect_pair_is_stable() {
        let a = series(&[0.01, 0.02, -0.01, 0.03, -0.02, 0.01, 0.00, 0.02]);
        let b: ReturnSeries = a.iter().map(|(t, v)| (*t, v * 2.0)).collect();
        let pair = compute_pair("A", &a, "B", &b, 5).unwrap();
        assert!((pair.correlation - 1.0).abs() < 1e-9);
        assert_eq!(pair.strength, CorrelationStrength::VeryStrong);
        assert_eq!(pair.direction, CorrelationDirection::Positive);
        assert_eq!(pair.overlap, 8);
        assert!(pair.stability > 0.99);
    }

    #[test]
    fn test_zero_variance_skipped() {
        let a = series(&[0.0; 10]);
        let b = series(&[0.01, 0.02, -0.01, 0.03, -0.02, 0.01, 0.0, 0.02, 0.01, 0.0]);
        assert!(compute_pair("A", &a, "B", &b, 5).is_none());
    }

    #[test]
    fn test_classification() {
        assert_eq!(CorrelationStrength::classify(-0.85), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::classify(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(0.1), CorrelationStrength::VeryWeak);
        assert_eq!(CorrelationDirection::classify(0.05), CorrelationDirection::Neutral);
        assert_eq!(CorrelationDirection::classify(-0.5), CorrelationDirection::Negative);
    }
}
