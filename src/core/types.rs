// Core Type Definitions for Market Sentinel
// Price series, text items and the shared classification enums

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

/// Composite technical signal produced by the weighted indicator vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalSignal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl TechnicalSignal {
    /// Classify a weighted vote sum
    pub fn from_weighted_sum(sum: f64) -> Self {
        if !sum.is_finite() {
            return TechnicalSignal::Neutral;
        }
        if sum >= 1.5 {
            TechnicalSignal::StrongBuy
        } else if sum >= 0.5 {
            TechnicalSignal::Buy
        } else if sum <= -1.5 {
            TechnicalSignal::StrongSell
        } else if sum <= -0.5 {
            TechnicalSignal::Sell
        } else {
            TechnicalSignal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalSignal::StrongBuy => "strong_buy",
            TechnicalSignal::Buy => "buy",
            TechnicalSignal::Neutral => "neutral",
            TechnicalSignal::Sell => "sell",
            TechnicalSignal::StrongSell => "strong_sell",
        }
    }
}

impl fmt::Display for TechnicalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Five-bucket sentiment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentClass {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl SentimentClass {
    /// Cut points at ±0.2 and ±0.6
    pub fn from_score(score: f64) -> Self {
        if score >= 0.6 {
            SentimentClass::VeryPositive
        } else if score >= 0.2 {
            SentimentClass::Positive
        } else if score <= -0.6 {
            SentimentClass::VeryNegative
        } else if score <= -0.2 {
            SentimentClass::Negative
        } else {
            SentimentClass::Neutral
        }
    }

    pub fn is_extreme(&self) -> bool {
        matches!(self, SentimentClass::VeryPositive | SentimentClass::VeryNegative)
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentTrend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for SentimentTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSignal {
    Inflow,
    Outflow,
    Neutral,
}

impl fmt::Display for RotationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationSignal::Inflow => write!(f, "inflow"),
            RotationSignal::Outflow => write!(f, "outflow"),
            RotationSignal::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedDuration {
    Short,
    Medium,
    Long,
}

impl fmt::Display for ExpectedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Direction of a volatility-regime move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimePolarity {
    RiskOn,
    RiskOff,
}

impl fmt::Display for RegimePolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimePolarity::RiskOn => write!(f, "risk_on"),
            RegimePolarity::RiskOff => write!(f, "risk_off"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::VeryHigh => write!(f, "very_high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTone {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for MarketTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// Price Data
// ============================================================================

/// One OHLCV sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64, // milliseconds
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }

    /// Intraday range as a percentage of the close
    pub fn range_pct(&self) -> f64 {
        if self.close <= 0.0 {
            return 0.0;
        }
        (self.high - self.low) / self.close * 100.0
    }
}

/// Ordered OHLCV history for one symbol over a lookback window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self { symbol: symbol.into(), bars }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), bars: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn previous_close(&self) -> Option<f64> {
        let n = self.bars.len();
        if n < 2 {
            return None;
        }
        Some(self.bars[n - 2].close)
    }

    /// Last close vs previous close, in percent
    pub fn change_pct(&self) -> f64 {
        match (self.last_close(), self.previous_close()) {
            (Some(last), Some(prev)) if prev > 0.0 => (last - prev) / prev * 100.0,
            _ => 0.0,
        }
    }

    /// Simple returns keyed by the timestamp of the later bar
    pub fn returns(&self) -> Vec<(i64, f64)> {
        self.bars
            .windows(2)
            .filter(|w| w[0].close > 0.0)
            .map(|w| (w[1].timestamp, w[1].close / w[0].close - 1.0))
            .collect()
    }
}

impl fmt::Display for PriceSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceSeries(symbol={}, bars={}, last={:?})",
            self.symbol,
            self.bars.len(),
            self.last_close()
        )
    }
}

// ============================================================================
// Text Items
// ============================================================================

/// One news/text item from the text feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    pub timestamp: i64, // milliseconds
}

impl TextItem {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, source: impl Into<String>, timestamp: i64) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            source: source.into(),
            timestamp,
        }
    }

    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }

    /// Age in hours relative to `now_ms`, never negative
    pub fn age_hours(&self, now_ms: i64) -> f64 {
        ((now_ms - self.timestamp).max(0) as f64) / 3_600_000.0
    }
}

// ============================================================================
// Time helpers
// ============================================================================

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 86_400_000;

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Clamp helper that maps NaN to the lower bound
pub fn clamp_unit(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_classification() {
        assert_eq!(TechnicalSignal::from_weighted_sum(1.5), TechnicalSignal::StrongBuy);
        assert_eq!(TechnicalSignal::from_weighted_sum(0.5), TechnicalSignal::Buy);
        assert_eq!(TechnicalSignal::from_weighted_sum(0.49), TechnicalSignal::Neutral);
        assert_eq!(TechnicalSignal::from_weighted_sum(-0.5), TechnicalSignal::Sell);
        assert_eq!(TechnicalSignal::from_weighted_sum(-2.0), TechnicalSignal::StrongSell);
        assert_eq!(TechnicalSignal::from_weighted_sum(f64::NAN), TechnicalSignal::Neutral);
    }

    #[test]
    fn test_sentiment_class_cut_points() {
        assert_eq!(SentimentClass::from_score(0.6), SentimentClass::VeryPositive);
        assert_eq!(SentimentClass::from_score(0.2), SentimentClass::Positive);
        assert_eq!(SentimentClass::from_score(0.0), SentimentClass::Neutral);
        assert_eq!(SentimentClass::from_score(-0.2), SentimentClass::Negative);
        assert_eq!(SentimentClass::from_score(-0.6), SentimentClass::VeryNegative);
    }

    #[test]
    fn test_series_change_and_returns() {
        let series = PriceSeries::new(
            "XYZ",
            vec![
                Bar::new(2, 110.0, 112.0, 108.0, 110.0, 10.0),
                Bar::new(1, 100.0, 101.0, 99.0, 100.0, 10.0),
            ],
        );
        assert_eq!(series.bars[0].timestamp, 1);
        assert!((series.change_pct() - 10.0).abs() < 1e-9);

        let returns = series.returns();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].0, 2);
        assert!((returns[0].1 - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty("NONE");
        assert!(series.is_empty());
        assert_eq!(series.change_pct(), 0.0);
        assert!(series.returns().is_empty());
    }

    #[test]
    fn test_text_item_age() {
        let item = TextItem::new("t", "s", "src", 0);
        assert!((item.age_hours(2 * HOUR_MS) - 2.0).abs() < 1e-9);
        assert_eq!(item.age_hours(-5), 0.0);
    }
}
