// Correlation breaks - observed pair correlation far from its configured baseline

use super::pairs::CorrelationPair;
use crate::core::config::CorrelationBaselineConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationBreak {
    pub symbol_a: String,
    pub symbol_b: String,
    pub expected: f64,
    pub observed: f64,
    pub deviation: f64,
    pub significance: f64,
}

impl CorrelationBreak {
    pub fn pair_label(&self) -> String {
        format!("{}-{}", self.symbol_a, self.symbol_b)
    }
}

/// Flag a deviation strictly above `threshold`
pub fn evaluate_break(
    symbol_a: &str,
    symbol_b: &str,
    expected: f64,
    observed: f64,
    threshold: f64,
) -> Option<CorrelationBreak> {
    let deviation = (observed - expected).abs();
    if !deviation.is_finite() || deviation <= threshold {
        return None;
    }
    Some(CorrelationBreak {
        symbol_a: symbol_a.to_string(),
        symbol_b: symbol_b.to_string(),
        expected,
        observed,
        deviation,
        significance: (deviation / 0.5).min(1.0),
    })
}

/// Check every computed pair that has a baseline
pub fn detect_breaks(pairs: &[CorrelationPair], config: &CorrelationBaselineConfig) -> Vec<CorrelationBreak> {
    pairs
        .iter()
        .filter_map(|pair| {
            let expected = config.baseline_for(&pair.symbol_a, &pair.symbol_b)?;
            let found = evaluate_break(&pair.symbol_a, &pair.symbol_b, expected, pair.correlation, config.break_threshold);
            if let Some(b) = &found {
                debug!(pair = %b.pair_label(), expected = b.expected, observed = b.observed, "Correlation break");
            }
            found
        })
        .collect()
}
