// Event Synthesizer - runs every rule over the pass's signals
// Pure: identical inputs give identical events in identical order

use crate::core::config::DetectionThresholds;
use crate::core::events::Event;
use crate::layer2::correlation::CorrelationReport;
use crate::layer2::sentiment::VolatilityShift;
use crate::layer3::common::event_types::{
    RULE_FEAR_GREED_EXTREME, RULE_SENTIMENT_EXTREME, RULE_VOLUME_SPIKE,
};
use crate::layer3::rules::{default_rules, EventRule, SignalSet, SymbolSignals};
use tracing::debug;

pub struct EventSynthesizer {
    rules: Vec<Box<dyn EventRule>>,
    thresholds: DetectionThresholds,
}

impl EventSynthesizer {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self { rules: default_rules(&thresholds), thresholds }
    }

    pub fn with_rules(thresholds: DetectionThresholds, rules: Vec<Box<dyn EventRule>>) -> Self {
        Self { rules, thresholds }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Symbol events first (in the given symbol order), then breaks, sectors, the regime shift
    pub fn synthesize(
        &self,
        symbols: &[SymbolSignals],
        correlation: &CorrelationReport,
        volatility: Option<&VolatilityShift>,
        now_ms: i64,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        for signals in symbols {
            let input = SignalSet::Symbol(signals);
            for rule in &self.rules {
                if let Some(mut event) = rule.evaluate(&input, now_ms) {
                    self.corroborate(&mut event, signals);
                    events.push(event);
                }
            }
        }

        let market_inputs = correlation
            .breaks
            .iter()
            .map(SignalSet::Correlation)
            .chain(correlation.sectors.iter().map(SignalSet::Sector))
            .chain(volatility.into_iter().map(SignalSet::Volatility));
        for input in market_inputs {
            for rule in &self.rules {
                if let Some(event) = rule.evaluate(&input, now_ms) {
                    events.push(event);
                }
            }
        }

        debug!(symbols = symbols.len(), events = events.len(), "Events synthesized");
        events
    }

    /// Heavy volume and confident sentiment each add to a symbol event's confidence.
    /// A signal never corroborates the rule it fired from.
    fn corroborate(&self, event: &mut Event, signals: &SymbolSignals) {
        let t = &self.thresholds;
        let mut boost = 0.0;
        if event.rule != RULE_VOLUME_SPIKE && signals.indicators.volume_ratio > t.corroboration_volume_ratio {
            boost += t.corroboration_boost;
        }
        let from_sentiment = event.rule == RULE_SENTIMENT_EXTREME || event.rule == RULE_FEAR_GREED_EXTREME;
        if let Some(sentiment) = signals.sentiment.as_ref().filter(|_| !from_sentiment) {
            if sentiment.confidence > t.corroboration_sentiment_confidence {
                boost += t.corroboration_boost;
            }
        }
        if boost > 0.0 && event.confidence.is_finite() {
            event.confidence = (event.confidence + boost).min(1.0);
        }
    }
}
