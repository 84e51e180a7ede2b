// Event Model for Market Sentinel
// Typed events with severity/confidence scores and value-copied signal links

use crate::core::types::{clamp_unit, ExpectedDuration};
use crate::layer2::correlation::{CorrelationBreak, SectorCorrelation};
use crate::layer2::sentiment::{SentimentReading, VolatilityShift};
use crate::layer2::technical::IndicatorSet;
use crate::layer3::common::event_types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Event Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PriceSurge,
    PriceDrop,
    VolatilitySpike,
    VolumeSpike,
    TechnicalBreakout,
    SentimentShift,
    MomentumDivergence,
    SectorRotation,
    RegimeChange,
    LiquidityCrisis,
    RiskOff,
    RiskOn,
    CorrelationBreak,
}

impl EventType {
    pub const ALL: [EventType; 13] = [
        EventType::PriceSurge,
        EventType::PriceDrop,
        EventType::VolatilitySpike,
        EventType::VolumeSpike,
        EventType::TechnicalBreakout,
        EventType::SentimentShift,
        EventType::MomentumDivergence,
        EventType::SectorRotation,
        EventType::RegimeChange,
        EventType::LiquidityCrisis,
        EventType::RiskOff,
        EventType::RiskOn,
        EventType::CorrelationBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PriceSurge => PRICE_SURGE,
            EventType::PriceDrop => PRICE_DROP,
            EventType::VolatilitySpike => VOLATILITY_SPIKE,
            EventType::VolumeSpike => VOLUME_SPIKE,
            EventType::TechnicalBreakout => TECHNICAL_BREAKOUT,
            EventType::SentimentShift => SENTIMENT_SHIFT,
            EventType::MomentumDivergence => MOMENTUM_DIVERGENCE,
            EventType::SectorRotation => SECTOR_ROTATION,
            EventType::RegimeChange => REGIME_CHANGE,
            EventType::LiquidityCrisis => LIQUIDITY_CRISIS,
            EventType::RiskOff => RISK_OFF,
            EventType::RiskOn => RISK_ON,
            EventType::CorrelationBreak => CORRELATION_BREAK,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Types that raise the session risk level on their own
    pub fn is_high_risk(&self) -> bool {
        matches!(
            self,
            EventType::LiquidityCrisis | EventType::RegimeChange | EventType::CorrelationBreak
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Event Priority
// ============================================================================

/// Coarse bucket of severity x confidence, for consumers that route by urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventPriority {
    Critical = 1,  // score >= 0.8
    High = 2,      // score >= 0.6
    Medium = 3,    // score >= 0.4
    Low = 4,       // score >= 0.2
    Info = 5,
}

impl EventPriority {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            EventPriority::Critical
        } else if score >= 0.6 {
            EventPriority::High
        } else if score >= 0.4 {
            EventPriority::Medium
        } else if score >= 0.2 {
            EventPriority::Low
        } else {
            EventPriority::Info
        }
    }
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// Event
// ============================================================================

/// Value copies of the signals that produced an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_break: Option<CorrelationBreak>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<SectorCorrelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<VolatilityShift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub symbol: String,
    pub event_type: EventType,
    pub severity: f64,
    pub confidence: f64,
    pub created_at_ms: i64,
    pub description: String,
    pub rule: String,
    #[serde(default)]
    pub related_symbols: Vec<String>,
    pub expected_duration: ExpectedDuration,
    #[serde(default)]
    pub links: EventLinks,
}

impl Event {
    /// Build an event; finite severity and confidence are clamped to [0, 1].
    /// Non-finite values are kept so the filter can drop the event as malformed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: &str,
        event_type: EventType,
        rule: &str,
        severity: f64,
        confidence: f64,
        created_at_ms: i64,
        expected_duration: ExpectedDuration,
        description: String,
    ) -> Self {
        Self {
            id: Self::make_id(symbol, event_type, rule, created_at_ms),
            symbol: symbol.to_string(),
            event_type,
            severity: clamp_score(severity),
            confidence: clamp_score(confidence),
            created_at_ms,
            description,
            rule: rule.to_string(),
            related_symbols: Vec::new(),
            expected_duration,
            links: EventLinks::default(),
        }
    }

    pub fn make_id(symbol: &str, event_type: EventType, rule: &str, ts: i64) -> String {
        format!(
            "{}_{}_{}_{}",
            symbol,
            event_type.as_str().to_uppercase(),
            rule.to_uppercase(),
            ts
        )
    }

    pub fn with_links(mut self, links: EventLinks) -> Self {
        self.links = links;
        self
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related_symbols = related;
        self
    }

    /// Ranking score used by the filter
    pub fn score(&self) -> f64 {
        self.severity * self.confidence
    }

    pub fn priority(&self) -> EventPriority {
        EventPriority::from_score(self.score())
    }

    /// Empty symbol or non-finite scores
    pub fn is_malformed(&self) -> bool {
        self.symbol.trim().is_empty() || !self.severity.is_finite() || !self.confidence.is_finite()
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        clamp_unit(value, 0.0, 1.0)
    } else {
        value
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event(type={}, symbol={}, severity={:.2}, confidence={:.2}, priority={})",
            self.event_type,
            self.symbol,
            self.severity,
            self.confidence,
            self.priority()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names_roundtrip() {
        for t in EventType::ALL {
            assert_eq!(EventType::from_name(t.as_str()), Some(t));
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert_eq!(EventType::from_name("nope"), None);
    }

    #[test]
    fn test_event_id_and_clamping() {
        let event = Event::new(
            "XYZ",
            EventType::PriceSurge,
            RULE_PRICE_MOVE,
            1.4,
            0.7,
            1000,
            ExpectedDuration::Short,
            "XYZ up 12%".to_string(),
        );
        assert_eq!(event.id, "XYZ_PRICE_SURGE_PRICE_MOVE_1000");
        assert_eq!(event.severity, 1.0);
        assert!((event.score() - 0.7).abs() < 1e-12);
        assert_eq!(event.priority(), EventPriority::High);
        assert!(!event.is_malformed());
    }

    #[test]
    fn test_malformed_detection() {
        let mut event = Event::new("", EventType::RiskOn, RULE_FEAR_GREED_EXTREME, 0.5, 0.8, 0, ExpectedDuration::Medium, String::new());
        assert!(event.is_malformed());
        event.symbol = "XYZ".to_string();
        event.confidence = f64::NAN;
        assert!(event.is_malformed());

        let built = Event::new("XYZ", EventType::PriceSurge, RULE_PRICE_MOVE, f64::NAN, 0.7, 0, ExpectedDuration::Short, String::new());
        assert!(built.severity.is_nan());
        assert!(built.is_malformed());
        let built = Event::new("XYZ", EventType::PriceSurge, RULE_PRICE_MOVE, 0.5, f64::INFINITY, 0, ExpectedDuration::Short, String::new());
        assert!(built.is_malformed());
    }

    #[test]
    fn test_event_json_roundtrip() {
        let event = Event::new("XYZ", EventType::RegimeChange, RULE_REGIME_CHANGE, 0.55, 0.9, 42, ExpectedDuration::Medium, "vol up".to_string())
            .with_related(vec!["^VIX".to_string()]);
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
