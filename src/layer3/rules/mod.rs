// Event Rules - typed detection rules over a tagged union of signal inputs
// Each rule emits at most one event per evaluation

pub mod price;
pub mod technical;
pub mod momentum;
pub mod sentiment;
pub mod market;

use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventLinks};
use crate::layer2::correlation::{CorrelationBreak, SectorCorrelation};
use crate::layer2::sentiment::{SentimentReading, VolatilityShift};
use crate::layer2::technical::IndicatorSet;
use serde::{Deserialize, Serialize};

pub use market::{CorrelationBreakRule, RegimeChangeRule, SectorRotationRule};
pub use momentum::{MacdCrossRule, PriceMacdDivergenceRule};
pub use price::{LiquidityCrisisRule, PriceMoveRule, VolatilitySpikeRule, VolumeSpikeRule};
pub use sentiment::{FearGreedExtremeRule, SentimentExtremeRule};
pub use technical::{BollingerBreakRule, RsiExtremeRule};

/// Everything known about one symbol after the fan-out stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSignals {
    pub symbol: String,
    pub indicators: IndicatorSet,
    pub sentiment: Option<SentimentReading>,
}

impl SymbolSignals {
    pub fn links(&self) -> EventLinks {
        EventLinks {
            indicators: Some(self.indicators.clone()),
            sentiment: self.sentiment.clone(),
            ..Default::default()
        }
    }
}

/// Input to a rule
#[derive(Debug, Clone, Copy)]
pub enum SignalSet<'a> {
    Symbol(&'a SymbolSignals),
    Correlation(&'a CorrelationBreak),
    Sector(&'a SectorCorrelation),
    Volatility(&'a VolatilityShift),
}

pub trait EventRule: Send + Sync {
    /// Rule tag, also part of the event id
    fn name(&self) -> &'static str;

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event>;
}

/// Full rule set in evaluation order
pub fn default_rules(thresholds: &DetectionThresholds) -> Vec<Box<dyn EventRule>> {
    vec![
        Box::new(PriceMoveRule::new(thresholds)),
        Box::new(RsiExtremeRule::new(thresholds)),
        Box::new(BollingerBreakRule),
        Box::new(MacdCrossRule),
        Box::new(PriceMacdDivergenceRule::new(thresholds)),
        Box::new(SentimentExtremeRule),
        Box::new(FearGreedExtremeRule::new(thresholds)),
        Box::new(LiquidityCrisisRule::new(thresholds)),
        Box::new(VolumeSpikeRule::new(thresholds)),
        Box::new(VolatilitySpikeRule::new(thresholds)),
        Box::new(CorrelationBreakRule::new(thresholds)),
        Box::new(SectorRotationRule::new(thresholds)),
        Box::new(RegimeChangeRule::new(thresholds)),
    ]
}
