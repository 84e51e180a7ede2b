// Correlation Analyzer
// Return correlations, baseline breaks and sector rotation

pub mod pairs;
pub mod breaks;
pub mod sectors;
pub mod analyzer;

pub use analyzer::{CorrelationAnalyzer, CorrelationInsights, CorrelationReport};
pub use breaks::{detect_breaks, evaluate_break, CorrelationBreak};
pub use pairs::{align, compute_pair, CorrelationDirection, CorrelationPair, CorrelationStrength, ReturnSeries};
pub use sectors::{analyze_sector, classify_rotation, SectorCorrelation};
