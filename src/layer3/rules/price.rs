// Price and volume rules - large moves, volume spikes, wide ranges, liquidity stress

use super::{EventRule, SignalSet};
use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventType};
use crate::core::types::ExpectedDuration;
use crate::layer3::common::event_types::*;

/// Daily change at or beyond the threshold
pub struct PriceMoveRule {
    threshold_pct: f64,
}

impl PriceMoveRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { threshold_pct: t.price_move_pct }
    }
}

impl EventRule for PriceMoveRule {
    fn name(&self) -> &'static str {
        RULE_PRICE_MOVE
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let change = s.indicators.change_pct;
        if !change.is_finite() || change.abs() < self.threshold_pct {
            return None;
        }

        let (event_type, verb) = if change > 0.0 {
            (EventType::PriceSurge, "surged")
        } else {
            (EventType::PriceDrop, "dropped")
        };
        let event = Event::new(
            &s.symbol,
            event_type,
            self.name(),
            (change.abs() / 20.0).min(1.0),
            0.7,
            now_ms,
            ExpectedDuration::Short,
            format!("{} {} {:.2}% to {:.2}", s.symbol, verb, change.abs(), s.indicators.last_close),
        );
        Some(event.with_links(s.links()))
    }
}

/// Last volume a multiple of its trailing average
pub struct VolumeSpikeRule {
    min_ratio: f64,
}

impl VolumeSpikeRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_ratio: t.volume_spike_ratio }
    }
}

impl EventRule for VolumeSpikeRule {
    fn name(&self) -> &'static str {
        RULE_VOLUME_SPIKE
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let ratio = s.indicators.volume_ratio;
        if !s.indicators.is_sufficient() || !ratio.is_finite() || ratio < self.min_ratio {
            return None;
        }
        let event = Event::new(
            &s.symbol,
            EventType::VolumeSpike,
            self.name(),
            (ratio / 10.0).min(1.0),
            0.7,
            now_ms,
            ExpectedDuration::Short,
            format!("{} volume {:.1}x its 20-bar average", s.symbol, ratio),
        );
        Some(event.with_links(s.links()))
    }
}

/// Wide intraday range on the last bar
pub struct VolatilitySpikeRule {
    min_range_pct: f64,
}

impl VolatilitySpikeRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_range_pct: t.volatility_range_pct }
    }
}

impl EventRule for VolatilitySpikeRule {
    fn name(&self) -> &'static str {
        RULE_VOLATILITY_SPIKE
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let range = s.indicators.range_pct;
        if !range.is_finite() || range < self.min_range_pct {
            return None;
        }
        let event = Event::new(
            &s.symbol,
            EventType::VolatilitySpike,
            self.name(),
            (range / 20.0).min(1.0),
            0.7,
            now_ms,
            ExpectedDuration::Short,
            format!("{} traded a {:.2}% intraday range", s.symbol, range),
        );
        Some(event.with_links(s.links()))
    }
}

/// Sharp move on thin volume
pub struct LiquidityCrisisRule {
    max_ratio: f64,
    min_change_pct: f64,
}

impl LiquidityCrisisRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self {
            max_ratio: t.liquidity_volume_ratio,
            min_change_pct: t.liquidity_change_pct,
        }
    }
}

impl EventRule for LiquidityCrisisRule {
    fn name(&self) -> &'static str {
        RULE_LIQUIDITY_CRISIS
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Symbol(s) = signals else { return None };
        let ratio = s.indicators.volume_ratio;
        let change = s.indicators.change_pct;
        if !s.indicators.is_sufficient() || !ratio.is_finite() || !change.is_finite() {
            return None;
        }
        if ratio >= self.max_ratio || change.abs() <= self.min_change_pct {
            return None;
        }
        let event = Event::new(
            &s.symbol,
            EventType::LiquidityCrisis,
            self.name(),
            ((3.0 - ratio) / 3.0).min(1.0),
            0.8,
            now_ms,
            ExpectedDuration::Medium,
            format!("{} moved {:.2}% on {:.2}x normal volume", s.symbol, change, ratio),
        );
        Some(event.with_links(s.links()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{indicators, signals};
    use super::*;

    fn thresholds() -> DetectionThresholds {
        DetectionThresholds::default()
    }

    #[test]
    fn test_price_move_surge_and_drop() {
        let rule = PriceMoveRule::new(&thresholds());
        let mut set = indicators("XYZ");
        set.change_pct = 12.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::PriceSurge);
        assert!((event.severity - 0.6).abs() < 1e-12);
        assert_eq!(event.confidence, 0.7);
        assert!(event.links.indicators.is_some());

        set.change_pct = -25.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::PriceDrop);
        assert_eq!(event.severity, 1.0);

        set.change_pct = 9.99;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_price_severity_monotonic() {
        let rule = PriceMoveRule::new(&thresholds());
        let mut last = 0.0;
        for step in 0..40 {
            let mut set = indicators("XYZ");
            set.change_pct = 10.0 + step as f64;
            let s = signals(set);
            let severity = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap().severity;
            assert!(severity >= last);
            last = severity;
        }
    }

    #[test]
    fn test_volume_spike() {
        let rule = VolumeSpikeRule::new(&thresholds());
        let mut set = indicators("XYZ");
        set.volume_ratio = 3.5;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert!((event.severity - 0.35).abs() < 1e-12);

        set.volume_ratio = 2.9;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_volatility_spike() {
        let rule = VolatilitySpikeRule::new(&thresholds());
        let mut set = indicators("XYZ");
        set.range_pct = 8.0;
        let s = signals(set);
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::VolatilitySpike);
        assert!((event.severity - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_liquidity_crisis() {
        let rule = LiquidityCrisisRule::new(&thresholds());
        let mut set = indicators("XYZ");
        set.volume_ratio = 0.2;
        set.change_pct = -4.0;
        let s = signals(set.clone());
        let event = rule.evaluate(&SignalSet::Symbol(&s), 1).unwrap();
        assert_eq!(event.event_type, EventType::LiquidityCrisis);
        assert!(event.severity > 0.9);

        set.change_pct = -2.0;
        let s = signals(set);
        assert!(rule.evaluate(&SignalSet::Symbol(&s), 1).is_none());
    }

    #[test]
    fn test_rules_ignore_other_inputs() {
        let shift = crate::layer2::sentiment::VolatilityShift::between("^VIX", 18.0, 23.0).unwrap();
        let rule = PriceMoveRule::new(&thresholds());
        assert!(rule.evaluate(&SignalSet::Volatility(&shift), 1).is_none());
    }
}
