// Session Aggregator - digest of one pass's accepted events
// Pure over the batch; no store access

use crate::core::events::{Event, EventType};
use crate::core::types::{MarketTone, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

const HIGH_SEVERITY: f64 = 0.7;
const CRITICAL_SEVERITY: f64 = 0.8;
const TONE_THRESHOLD: f64 = 0.3;
const BREAKOUT_CLUSTER: usize = 3;
const MAX_INSIGHTS: usize = 5;

pub const NO_DATA_INSIGHT: &str = "No data available";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_events: usize,
    pub counts_by_type: BTreeMap<EventType, usize>,
    pub high_severity_count: usize,
    pub affected_symbols: Vec<String>,
    pub market_tone: MarketTone,
    pub risk_level: RiskLevel,
    pub insights: Vec<String>,
    pub no_data: bool,
}

impl SessionSummary {
    /// Symbols were analyzed but nothing was accepted
    pub fn quiet() -> Self {
        Self {
            total_events: 0,
            counts_by_type: BTreeMap::new(),
            high_severity_count: 0,
            affected_symbols: Vec::new(),
            market_tone: MarketTone::Neutral,
            risk_level: RiskLevel::Low,
            insights: Vec::new(),
            no_data: false,
        }
    }

    /// No symbol produced data this pass
    pub fn no_data() -> Self {
        Self {
            total_events: 0,
            counts_by_type: BTreeMap::new(),
            high_severity_count: 0,
            affected_symbols: Vec::new(),
            market_tone: MarketTone::Neutral,
            risk_level: RiskLevel::Low,
            insights: vec![NO_DATA_INSIGHT.to_string()],
            no_data: true,
        }
    }

    /// Human-readable digest for logs and notifications
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if self.no_data {
            let _ = writeln!(out, "Market session: {}", NO_DATA_INSIGHT);
            return out;
        }

        let _ = writeln!(
            out,
            "Market session: {} events, tone {}, risk {}",
            self.total_events, self.market_tone, self.risk_level
        );
        if !self.affected_symbols.is_empty() {
            let _ = writeln!(out, "Symbols: {}", self.affected_symbols.join(", "));
        }
        for (event_type, count) in &self.counts_by_type {
            let _ = writeln!(out, "  {}: {}", event_type, count);
        }
        for insight in &self.insights {
            let _ = writeln!(out, "- {}", insight);
        }
        out
    }
}

/// Summarize an accepted batch. Whether any data was analyzed is the caller's call.
pub fn summarize(events: &[Event]) -> SessionSummary {
    if events.is_empty() {
        return SessionSummary::quiet();
    }

    let mut counts_by_type = BTreeMap::new();
    for event in events {
        *counts_by_type.entry(event.event_type).or_insert(0) += 1;
    }

    let affected_symbols: BTreeSet<&str> = events.iter().map(|e| e.symbol.as_str()).collect();

    SessionSummary {
        total_events: events.len(),
        high_severity_count: events.iter().filter(|e| e.severity > HIGH_SEVERITY).count(),
        affected_symbols: affected_symbols.into_iter().map(String::from).collect(),
        market_tone: market_tone(events),
        risk_level: risk_level(events),
        insights: insights(events, &counts_by_type),
        counts_by_type,
        no_data: false,
    }
}

fn tone_contribution(event: &Event) -> Option<f64> {
    if let Some(sentiment) = &event.links.sentiment {
        return Some(sentiment.score);
    }
    match event.event_type {
        EventType::PriceSurge | EventType::RiskOn => Some(0.5),
        EventType::PriceDrop | EventType::RiskOff => Some(-0.5),
        _ => None,
    }
}

pub fn market_tone(events: &[Event]) -> MarketTone {
    let scores: Vec<f64> = events.iter().filter_map(tone_contribution).collect();
    if scores.is_empty() {
        return MarketTone::Neutral;
    }
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    if avg > TONE_THRESHOLD {
        MarketTone::Positive
    } else if avg < -TONE_THRESHOLD {
        MarketTone::Negative
    } else {
        MarketTone::Neutral
    }
}

pub fn risk_level(events: &[Event]) -> RiskLevel {
    let high_risk = events.iter().filter(|e| e.event_type.is_high_risk()).count();
    let critical = events.iter().filter(|e| e.severity > CRITICAL_SEVERITY).count();
    match high_risk * 2 + critical {
        s if s >= 5 => RiskLevel::VeryHigh,
        s if s >= 3 => RiskLevel::High,
        s if s >= 1 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

fn insights(events: &[Event], counts: &BTreeMap<EventType, usize>) -> Vec<String> {
    let mut out = Vec::new();

    // first type wins ties
    let mut most_common: Option<(EventType, usize)> = None;
    for (&event_type, &count) in counts {
        if most_common.map_or(true, |(_, best)| count > best) {
            most_common = Some((event_type, count));
        }
    }
    if let Some((event_type, count)) = most_common {
        out.push(format!("Most frequent event: {} ({}x)", event_type, count));
    }

    let critical = events.iter().filter(|e| e.severity > CRITICAL_SEVERITY).count();
    if critical > 0 {
        out.push(format!("{} high-severity events", critical));
    }

    let rotations = counts.get(&EventType::SectorRotation).copied().unwrap_or(0);
    if rotations > 0 {
        out.push(format!("Active sector rotation: {} sectors affected", rotations));
    }

    if counts.contains_key(&EventType::CorrelationBreak) {
        out.push("Market correlation structure change detected".to_string());
    }

    let breakouts = counts.get(&EventType::TechnicalBreakout).copied().unwrap_or(0);
    if breakouts > BREAKOUT_CLUSTER {
        out.push(format!("Cluster of technical breakouts: {}", breakouts));
    }

    out.truncate(MAX_INSIGHTS);
    out
}
