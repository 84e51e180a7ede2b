// Sentiment rules - extreme news sentiment and fear/greed extremes

use super::{EventRule, SignalSet};
use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventType};
use crate::core::types::ExpectedDuration;
use crate::layer3::common::event_types::*;

pub struct SentimentExtremeRule;

impl EventRule for SentimentExtremeRule {
    fn name(&self) -> &'static str {
        RULE_SENTIMENT_EXTREME
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let reading = s.sentiment.as_ref()?;
        if reading.sample_count == 0 || !reading.class.is_extreme() || !reading.score.is_finite() {
            return None;
        }
        let event = Event::new(
            &s.symbol,
            EventType::SentimentShift,
            self.name(),
            reading.score.abs(),
            0.65,
            now_ms,
            ExpectedDuration::Medium,
            format!(
                "{} sentiment {} (score {:.2} over {} items)",
                s.symbol, reading.class, reading.score, reading.sample_count
            ),
        );
        Some(event.with_links(s.links()))
    }
}

/// Fear/greed index below the fear line or above the greed line
pub struct FearGreedExtremeRule {
    low: f64,
    high: f64,
}

impl FearGreedExtremeRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { low: t.fear_greed_low, high: t.fear_greed_high }
    }
}

impl EventRule for FearGreedExtremeRule {
    fn name(&self) -> &'static str {
        RULE_FEAR_GREED_EXTREME
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let reading = s.sentiment.as_ref()?;
        // Without an index reading the value is the neutral default
        reading.volatility_index?;
        let fg = reading.fear_greed_index;
        if !fg.is_finite() {
            return None;
        }

        let (event_type, severity, mood) = if fg < self.low {
            (EventType::RiskOff, (self.low - fg) / 20.0, "extreme fear")
        } else if fg > self.high {
            (EventType::RiskOn, (fg - self.high) / 20.0, "extreme greed")
        } else {
            return None;
        };

        let event = Event::new(
            &s.symbol,
            event_type,
            self.name(),
            severity,
            0.8,
            now_ms,
            ExpectedDuration::Medium,
            format!("Fear/greed index {:.0} signals {} around {}", fg, mood, s.symbol),
        );
        Some(event.with_links(s.links()))
    }
}
