// Layer 2 - Signal Processing
// Technical indicators, sentiment and cross-asset correlation derived from raw provider data

pub mod stats;
pub mod technical;
pub mod sentiment;
pub mod correlation;

// Re-export commonly used items
pub use technical::{ComponentVotes, IndicatorEngine, IndicatorSet, MacdCross, Sufficiency};
pub use sentiment::{SentimentAggregator, SentimentReading, VolatilityShift};
pub use correlation::{
    CorrelationAnalyzer, CorrelationBreak, CorrelationPair, CorrelationReport, SectorCorrelation,
};
