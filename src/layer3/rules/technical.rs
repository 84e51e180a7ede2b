// Technical breakout rules - RSI extremes and Bollinger band breaks

use super::{EventRule, SignalSet};
use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventType};
use crate::core::types::ExpectedDuration;
use crate::layer3::common::event_types::*;

pub struct RsiExtremeRule {
    overbought: f64,
    oversold: f64,
}

impl RsiExtremeRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { overbought: t.rsi_overbought, oversold: t.rsi_oversold }
    }
}

impl EventRule for RsiExtremeRule {
    fn name(&self) -> &'static str {
        RULE_RSI_EXTREME
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let rsi = s.indicators.rsi;
        if !s.indicators.is_sufficient() || !rsi.is_finite() {
            return None;
        }

        let (severity, state) = if rsi > self.overbought {
            ((rsi - self.overbought) / (100.0 - self.overbought), "overbought")
        } else if rsi < self.oversold {
            ((self.oversold - rsi) / self.oversold, "oversold")
        } else {
            return None;
        };

        let event = Event::new(
            &s.symbol,
            EventType::TechnicalBreakout,
            self.name(),
            severity,
            0.7,
            now_ms,
            ExpectedDuration::Medium,
            format!("{} RSI {:.1} ({})", s.symbol, rsi, state),
        );
        Some(event.with_links(s.links()))
    }
}

/// Close outside the Bollinger bands
pub struct BollingerBreakRule;

impl EventRule for BollingerBreakRule {
    fn name(&self) -> &'static str {
        RULE_BOLLINGER_BREAK
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let ind = &s.indicators;
        let band = ind.bollinger_upper - ind.bollinger_lower;
        if !ind.is_sufficient() || !band.is_finite() || band <= 0.0 || !ind.last_close.is_finite() {
            return None;
        }

        let (penetration, side) = if ind.last_close > ind.bollinger_upper {
            (ind.last_close - ind.bollinger_upper, "above the upper")
        } else if ind.last_close < ind.bollinger_lower {
            (ind.bollinger_lower - ind.last_close, "below the lower")
        } else {
            return None;
        };

        let event = Event::new(
            &s.symbol,
            EventType::TechnicalBreakout,
            self.name(),
            (penetration / band).min(1.0),
            0.8,
            now_ms,
            ExpectedDuration::Short,
            format!("{} closed {:.2} {} Bollinger band", s.symbol, ind.last_close, side),
        );
        Some(event.with_links(s.links()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{indicators, signals};
    use super::*;

    #[test]
    fn test_rsi_overbought_and_oversold() {
        let rule = RsiExtremeRule::new(&DetectionThresholds::default());
        let mut set = indicators("XYZ");
        set.rsi = 85.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::TechnicalBreakout);
        assert!((event.severity - 0.5).abs() < 1e-12);
        assert!(event.description.contains("overbought"));

        set.rsi = 15.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert!((event.severity - 0.5).abs() < 1e-12);
        assert!(event.description.contains("oversold"));

        set.rsi = 70.0;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_rsi_skips_insufficient_history() {
        let rule = RsiExtremeRule::new(&DetectionThresholds::default());
        let mut set = indicators("XYZ");
        set.rsi = 90.0;
        set.sufficiency = crate::layer2::technical::Sufficiency::Insufficient;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_bollinger_break() {
        let rule = BollingerBreakRule;
        let mut set = indicators("XYZ");
        // Band 96..104, width 8; close 106 penetrates by 2
        set.last_close = 106.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert!((event.severity - 0.25).abs() < 1e-12);
        assert_eq!(event.confidence, 0.8);

        set.last_close = 100.0;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }
}
