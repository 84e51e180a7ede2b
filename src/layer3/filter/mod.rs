// Event Filter & Prioritizer - thresholds, ranking, cooldown and the per-pass cap
// Cooldown and history live in an AlertStore handle owned by the engine

pub mod cooldown;
pub mod history;

pub use cooldown::CooldownRegistry;
pub use history::EventHistory;

use crate::core::config::FilterConfig;
use crate::core::events::Event;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Where a proposed event ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    Malformed,
    SuppressedByThreshold,
    SuppressedByCooldown,
    SuppressedByRateCap,
    Accepted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub proposed: usize,
    pub malformed: usize,
    pub below_threshold: usize,
    pub cooldown_suppressed: usize,
    pub rate_capped: usize,
    pub accepted: usize,
}

impl FilterReport {
    fn count(&mut self, outcome: FilterOutcome) {
        match outcome {
            FilterOutcome::Malformed => self.malformed += 1,
            FilterOutcome::SuppressedByThreshold => self.below_threshold += 1,
            FilterOutcome::SuppressedByCooldown => self.cooldown_suppressed += 1,
            FilterOutcome::SuppressedByRateCap => self.rate_capped += 1,
            FilterOutcome::Accepted => self.accepted += 1,
        }
    }
}

/// Mutable cross-pass state: cooldown registry and accepted-event history
pub struct AlertStore {
    cooldowns: CooldownRegistry,
    history: EventHistory,
}

impl AlertStore {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            cooldowns: CooldownRegistry::new(),
            history: EventHistory::from_config(config),
        }
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn reset(&self) {
        self.cooldowns.clear();
        self.history.clear();
    }
}

/// Highest severity x confidence first; ties by symbol, type name, then id
pub fn rank_order(a: &Event, b: &Event) -> Ordering {
    OrderedFloat(b.score())
        .cmp(&OrderedFloat(a.score()))
        .then_with(|| a.symbol.cmp(&b.symbol))
        .then_with(|| a.event_type.as_str().cmp(b.event_type.as_str()))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone)]
pub struct FilterResult {
    pub accepted: Vec<Event>,
    pub report: FilterReport,
}

pub struct EventFilter {
    config: FilterConfig,
}

impl EventFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn passes_thresholds(&self, event: &Event) -> bool {
        event.severity >= self.config.min_severity && event.confidence >= self.config.min_confidence
    }

    /// Filter one pass's candidates against the store; accepted events are recorded in history
    pub fn apply(&self, candidates: Vec<Event>, store: &AlertStore, now_ms: i64) -> FilterResult {
        let mut report = FilterReport { proposed: candidates.len(), ..Default::default() };

        let mut ranked = Vec::with_capacity(candidates.len());
        for event in candidates {
            if event.is_malformed() {
                warn!(id = %event.id, symbol = %event.symbol, "Dropping malformed event");
                report.count(FilterOutcome::Malformed);
            } else if !self.passes_thresholds(&event) {
                report.count(FilterOutcome::SuppressedByThreshold);
            } else {
                ranked.push(event);
            }
        }
        ranked.sort_by(rank_order);

        let mut accepted = Vec::new();
        for event in ranked {
            let outcome = if accepted.len() >= self.config.max_events_per_pass {
                FilterOutcome::SuppressedByRateCap
            } else if store.cooldowns.try_acquire(
                &event.symbol,
                event.event_type,
                now_ms,
                self.config.cooldown_for(event.event_type),
            ) {
                FilterOutcome::Accepted
            } else {
                FilterOutcome::SuppressedByCooldown
            };

            debug!(id = %event.id, outcome = ?outcome, score = event.score(), "Filter decision");
            report.count(outcome);
            if outcome == FilterOutcome::Accepted {
                accepted.push(event);
            }
        }

        store.history.record(&accepted, now_ms);
        // Stamps past the longest cooldown can no longer suppress anything
        let evicted = store.cooldowns.evict_before(now_ms - self.config.max_cooldown_ms());
        if evicted > 0 {
            debug!(evicted = evicted, "Expired cooldowns evicted");
        }
        FilterResult { accepted, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventType;
    use crate::core::types::{ExpectedDuration, MINUTE_MS};

    fn event(symbol: &str, event_type: EventType, severity: f64, confidence: f64) -> Event {
        Event::new(symbol, event_type, "test", severity, confidence, 0, ExpectedDuration::Short, String::new())
    }

    fn setup() -> (EventFilter, AlertStore) {
        let config = FilterConfig::default();
        let store = AlertStore::new(&config);
        (EventFilter::new(config), store)
    }

    #[test]
    fn test_thresholds() {
        let (filter, store) = setup();
        let result = filter.apply(
            vec![
                event("A", EventType::PriceSurge, 0.29, 0.9),
                event("B", EventType::PriceSurge, 0.9, 0.49),
                event("C", EventType::PriceSurge, 0.3, 0.5),
            ],
            &store,
            0,
        );
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].symbol, "C");
        assert_eq!(result.report.below_threshold, 2);
    }

    #[test]
    fn test_malformed_dropped() {
        let (filter, store) = setup();
        let mut bad = event("A", EventType::PriceSurge, 0.9, 0.9);
        bad.severity = f64::NAN;
        let result = filter.apply(vec![bad, event("", EventType::PriceDrop, 0.9, 0.9)], &store, 0);
        assert!(result.accepted.is_empty());
        assert_eq!(result.report.malformed, 2);
    }

    #[test]
    fn test_ranking_and_ties() {
        let (filter, store) = setup();
        let result = filter.apply(
            vec![
                event("B", EventType::PriceSurge, 0.6, 0.7),
                event("A", EventType::VolumeSpike, 0.6, 0.7),
                event("A", EventType::PriceSurge, 0.6, 0.7),
                event("Z", EventType::RegimeChange, 0.9, 0.9),
            ],
            &store,
            0,
        );
        let order: Vec<(&str, EventType)> = result.accepted.iter().map(|e| (e.symbol.as_str(), e.event_type)).collect();
        assert_eq!(
            order,
            vec![
                ("Z", EventType::RegimeChange),
                ("A", EventType::PriceSurge),
                ("A", EventType::VolumeSpike),
                ("B", EventType::PriceSurge),
            ]
        );
    }

    #[test]
    fn test_cooldown_across_passes() {
        let (filter, store) = setup();
        let first = filter.apply(vec![event("XYZ", EventType::PriceSurge, 0.6, 0.7)], &store, 0);
        assert_eq!(first.accepted.len(), 1);

        let second = filter.apply(vec![event("XYZ", EventType::PriceSurge, 0.6, 0.7)], &store, 5 * MINUTE_MS);
        assert!(second.accepted.is_empty());
        assert_eq!(second.report.cooldown_suppressed, 1);

        let third = filter.apply(vec![event("XYZ", EventType::PriceSurge, 0.6, 0.7)], &store, 15 * MINUTE_MS);
        assert_eq!(third.accepted.len(), 1);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_cap_does_not_stamp() {
        let mut config = FilterConfig::default();
        config.max_events_per_pass = 2;
        let store = AlertStore::new(&config);
        let filter = EventFilter::new(config);

        let candidates = vec![
            event("A", EventType::PriceSurge, 0.9, 0.9),
            event("B", EventType::PriceSurge, 0.8, 0.9),
            event("C", EventType::PriceSurge, 0.7, 0.9),
        ];
        let result = filter.apply(candidates, &store, 0);
        assert_eq!(result.accepted.len(), 2);
        assert_eq!(result.report.rate_capped, 1);
        assert_eq!(store.cooldowns().last_accepted("C", EventType::PriceSurge), None);

        // C was never stamped, so it is free next pass
        let next = filter.apply(vec![event("C", EventType::PriceSurge, 0.7, 0.9)], &store, MINUTE_MS);
        assert_eq!(next.accepted.len(), 1);
    }

    #[test]
    fn test_expired_cooldowns_evicted() {
        let (filter, store) = setup();
        filter.apply(vec![event("OLD", EventType::PriceSurge, 0.6, 0.7)], &store, 0);
        assert_eq!(store.cooldowns().len(), 1);

        let later = filter.config().max_cooldown_ms() + MINUTE_MS;
        filter.apply(vec![event("NEW", EventType::PriceSurge, 0.6, 0.7)], &store, later);
        assert_eq!(store.cooldowns().len(), 1);
        assert_eq!(store.cooldowns().last_accepted("OLD", EventType::PriceSurge), None);
    }

    #[test]
    fn test_nan_scores_counted_as_malformed() {
        let (filter, store) = setup();
        let nan = Event::new("XYZ", EventType::PriceSurge, "test", f64::NAN, 0.7, 0, ExpectedDuration::Short, String::new());
        let result = filter.apply(vec![nan], &store, 0);
        assert_eq!(result.report.malformed, 1);
        assert_eq!(result.report.below_threshold, 0);
    }

    #[test]
    fn test_duplicate_key_within_pass() {
        let (filter, store) = setup();
        let result = filter.apply(
            vec![
                event("XYZ", EventType::TechnicalBreakout, 0.5, 0.8),
                event("XYZ", EventType::TechnicalBreakout, 0.7, 0.8),
            ],
            &store,
            0,
        );
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].severity, 0.7);
        assert_eq!(result.report.cooldown_suppressed, 1);
    }
}
