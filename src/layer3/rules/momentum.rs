// Momentum rules - MACD zero crosses and price moving against MACD

use super::{EventRule, SignalSet};
use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventType};
use crate::core::types::ExpectedDuration;
use crate::layer2::technical::MacdCross;
use crate::layer3::common::event_types::*;

/// Recent histogram cross that still agrees in sign
pub struct MacdCrossRule;

impl EventRule for MacdCrossRule {
    fn name(&self) -> &'static str {
        RULE_MACD_CROSS
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let ind = &s.indicators;
        let hist = ind.macd_histogram.filter(|h| h.is_finite())?;

        let direction = match ind.macd_cross {
            MacdCross::Bullish if hist > 0.0 => "bullish",
            MacdCross::Bearish if hist < 0.0 => "bearish",
            _ => return None,
        };

        let event = Event::new(
            &s.symbol,
            EventType::MomentumDivergence,
            self.name(),
            ind.strength,
            0.75,
            now_ms,
            ExpectedDuration::Medium,
            format!("{} MACD {} cross (histogram {:.4})", s.symbol, direction, hist),
        );
        Some(event.with_links(s.links()))
    }
}

/// Price up while MACD is below signal, or down while above
pub struct PriceMacdDivergenceRule {
    min_change_pct: f64,
}

impl PriceMacdDivergenceRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_change_pct: t.divergence_change_pct }
    }
}

impl EventRule for PriceMacdDivergenceRule {
    fn name(&self) -> &'static str {
        RULE_PRICE_MACD_DIVERGENCE
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let ind = &s.indicators;
        let line = ind.macd.filter(|v| v.is_finite())?;
        let signal = ind.macd_signal.filter(|v| v.is_finite())?;
        let change = ind.change_pct;
        if !change.is_finite() {
            return None;
        }

        let kind = if change > self.min_change_pct && line < signal {
            "bearish"
        } else if change < -self.min_change_pct && line > signal {
            "bullish"
        } else {
            return None;
        };

        let event = Event::new(
            &s.symbol,
            EventType::MomentumDivergence,
            self.name(),
            (change.abs() / 10.0).min(1.0),
            0.6,
            now_ms,
            ExpectedDuration::Medium,
            format!("{} {} divergence: price {:+.2}% against MACD", s.symbol, kind, change),
        );
        Some(event.with_links(s.links()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{indicators, signals};
    use super::*;

    #[test]
    fn test_macd_cross_needs_sign_agreement() {
        let mut set = indicators("XYZ");
        set.macd_cross = MacdCross::Bullish;
        set.macd_histogram = Some(0.4);
        set.strength = 0.6;
        let s = signals(set.clone());
        let event = MacdCrossRule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::MomentumDivergence);
        assert_eq!(event.severity, 0.6);
        assert_eq!(event.confidence, 0.75);

        set.macd_histogram = Some(-0.1);
        let s = signals(set.clone());
        assert!(MacdCrossRule.evaluate(&SignalSet::Symbol(&s), 1).is_none());

        set.macd_cross = MacdCross::None;
        let s = signals(set);
        assert!(MacdCrossRule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_price_macd_divergence() {
        let rule = PriceMacdDivergenceRule::new(&DetectionThresholds::default());
        let mut set = indicators("XYZ");
        set.macd = Some(-0.5);
        set.macd_signal = Some(0.1);
        set.change_pct = 4.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert!((event.severity - 0.4).abs() < 1e-12);
        assert!(event.description.contains("bearish"));

        set.change_pct = -4.0;
        let s = signals(set.clone());
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());

        set.macd_signal = None;
        set.change_pct = 4.0;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }
}
