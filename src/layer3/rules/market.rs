// Market-level rules - correlation breaks, sector rotation, volatility regime changes

use super::{EventRule, SignalSet};
use crate::core::config::DetectionThresholds;
use crate::core::events::{Event, EventLinks, EventType};
use crate::core::types::{ExpectedDuration, RotationSignal};
use crate::layer3::common::event_types::*;

pub struct CorrelationBreakRule {
    min_significance: f64,
}

impl CorrelationBreakRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_significance: t.correlation_significance }
    }
}

impl EventRule for CorrelationBreakRule {
    fn name(&self) -> &'static str {
        RULE_CORRELATION_BREAK
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Correlation(b) = signals else { return None };
        if !b.significance.is_finite() || b.significance <= self.min_significance {
            return None;
        }

        let mut event = Event::new(
            MARKET_SYMBOL,
            EventType::CorrelationBreak,
            self.name(),
            b.significance,
            0.8,
            now_ms,
            ExpectedDuration::Long,
            format!(
                "{} correlation {:.2} vs normal {:.2}",
                b.pair_label(),
                b.observed,
                b.expected
            ),
        )
        .with_related(vec![b.symbol_a.clone(), b.symbol_b.clone()])
        .with_links(EventLinks { correlation_break: Some((*b).clone()), ..Default::default() });
        // Several pairs can break in one pass
        event.id = format!("{}_{}", event.id, b.pair_label());
        Some(event)
    }
}

pub struct SectorRotationRule {
    min_strength: f64,
}

impl SectorRotationRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_strength: t.sector_rotation_strength }
    }
}

impl EventRule for SectorRotationRule {
    fn name(&self) -> &'static str {
        RULE_SECTOR_ROTATION
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Sector(sector) = signals else { return None };
        if sector.rotation_signal == RotationSignal::Neutral || sector.rotation_strength <= self.min_strength {
            return None;
        }

        let event = Event::new(
            &sector.sector,
            EventType::SectorRotation,
            self.name(),
            sector.rotation_strength,
            0.7,
            now_ms,
            ExpectedDuration::Long,
            format!(
                "{} sector {} ({:+.2}% vs market)",
                sector.sector,
                sector.rotation_signal,
                sector.relative_return * 100.0
            ),
        )
        .with_related(sector.members.clone())
        .with_links(EventLinks { sector: Some((*sector).clone()), ..Default::default() });
        Some(event)
    }
}

pub struct RegimeChangeRule {
    min_change_pct: f64,
}

impl RegimeChangeRule {
    pub fn new(t: &DetectionThresholds) -> Self {
        Self { min_change_pct: t.regime_change_pct }
    }
}

impl EventRule for RegimeChangeRule {
    fn name(&self) -> &'static str {
        RULE_REGIME_CHANGE
    }

    fn evaluate(&self, signals: &SignalSet<'_>, now_ms: i64) -> Option<Event> {
        let SignalSet::Volatility(shift) = signals else { return None };
        let change = shift.change_pct;
        if !change.is_finite() || change.abs() <= self.min_change_pct {
            return None;
        }

        let event = Event::new(
            &shift.index_symbol,
            EventType::RegimeChange,
            self.name(),
            (change.abs() / 50.0).min(1.0),
            0.9,
            now_ms,
            ExpectedDuration::Medium,
            format!(
                "{} moved {:+.1}% ({:.2} -> {:.2}): {} regime",
                shift.index_symbol, change, shift.previous, shift.current, shift.polarity
            ),
        )
        .with_links(EventLinks { volatility: Some((*shift).clone()), ..Default::default() });
        Some(event)
    }
}
