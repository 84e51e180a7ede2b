// In-memory providers - deterministic data sources for tests and demos

use super::provider::{MarketDataProvider, ProviderError, TextFeedProvider, VolatilityIndexProvider};
use crate::core::types::{PriceSeries, TextItem};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Concurrent-call gauge with a high-water mark
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fixed price histories keyed by symbol, with optional failure and latency injection
#[derive(Default)]
pub struct StaticMarketData {
    series: RwLock<HashMap<String, PriceSeries>>,
    failing: RwLock<HashSet<String>>,
    delays_ms: RwLock<HashMap<String, u64>>,
    in_flight: InFlight,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, series: PriceSeries) {
        self.series.write().insert(series.symbol.clone(), series);
    }

    pub fn with_series(self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    /// Every request for `symbol` fails
    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.write().insert(symbol.to_string());
    }

    /// Every request for `symbol` sleeps first
    pub fn delay_symbol(&self, symbol: &str, delay_ms: u64) {
        self.delays_ms.write().insert(symbol.to_string(), delay_ms);
    }

    /// Most `get_history` calls ever running at once
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn get_history(&self, symbol: &str, lookback_bars: usize) -> Result<PriceSeries, ProviderError> {
        let _guard = self.in_flight.enter();
        let delay = self.delays_ms.read().get(symbol).copied();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.failing.read().contains(symbol) {
            return Err(ProviderError::Unavailable(format!("history for {}", symbol)));
        }

        let series = self.series.read().get(symbol).cloned();
        Ok(match series {
            Some(mut s) => {
                let excess = s.bars.len().saturating_sub(lookback_bars);
                s.bars.drain(..excess);
                s
            }
            None => PriceSeries::empty(symbol),
        })
    }
}

#[derive(Default)]
pub struct StaticTextFeed {
    items: RwLock<HashMap<String, Vec<TextItem>>>,
    failing: RwLock<HashSet<String>>,
    delay_ms: RwLock<Option<u64>>,
    in_flight: InFlight,
}

impl StaticTextFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: &str, items: Vec<TextItem>) {
        self.items.write().insert(symbol.to_string(), items);
    }

    pub fn with_items(self, symbol: &str, items: Vec<TextItem>) -> Self {
        self.insert(symbol, items);
        self
    }

    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.write().insert(symbol.to_string());
    }

    /// Every request sleeps first
    pub fn delay_all(&self, delay_ms: u64) {
        *self.delay_ms.write() = Some(delay_ms);
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl TextFeedProvider for StaticTextFeed {
    async fn get_recent_items(&self, symbol: &str, max_items: usize) -> Result<Vec<TextItem>, ProviderError> {
        let _guard = self.in_flight.enter();
        let delay = *self.delay_ms.read();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.failing.read().contains(symbol) {
            return Err(ProviderError::Unavailable(format!("text feed for {}", symbol)));
        }
        let mut items = self.items.read().get(symbol).cloned().unwrap_or_default();
        items.truncate(max_items);
        Ok(items)
    }
}

/// Volatility index with a fixed current level and optional previous close
pub struct StaticVolatilityIndex {
    current: RwLock<Option<f64>>,
    previous: RwLock<Option<f64>>,
}

impl StaticVolatilityIndex {
    pub fn new(current: f64, previous: Option<f64>) -> Self {
        Self {
            current: RwLock::new(Some(current)),
            previous: RwLock::new(previous),
        }
    }

    /// Index that always fails
    pub fn unavailable() -> Self {
        Self {
            current: RwLock::new(None),
            previous: RwLock::new(None),
        }
    }

    pub fn set(&self, current: f64, previous: Option<f64>) {
        *self.current.write() = Some(current);
        *self.previous.write() = previous;
    }
}

#[async_trait]
impl VolatilityIndexProvider for StaticVolatilityIndex {
    async fn get_current(&self) -> Result<f64, ProviderError> {
        (*self.current.read()).ok_or_else(|| ProviderError::Unavailable("volatility index".to_string()))
    }

    async fn get_previous_close(&self) -> Result<Option<f64>, ProviderError> {
        Ok(*self.previous.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Bar;

    #[tokio::test]
    async fn test_unknown_symbol_is_empty() {
        let provider = StaticMarketData::new();
        let series = provider.get_history("NOPE", 50).await.unwrap();
        assert!(series.is_empty());
        assert_eq!(series.symbol, "NOPE");
    }

    #[tokio::test]
    async fn test_lookback_truncates_oldest() {
        let bars = (0..10).map(|i| Bar::new(i, 1.0, 1.0, 1.0, i as f64, 1.0)).collect();
        let provider = StaticMarketData::new().with_series(PriceSeries::new("A", bars));
        let series = provider.get_history("A", 3).await.unwrap();
        assert_eq!(series.closes(), vec![7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let provider = StaticMarketData::new();
        provider.fail_symbol("BAD");
        assert!(provider.get_history("BAD", 10).await.is_err());

        let feed = StaticTextFeed::new();
        feed.fail_symbol("BAD");
        assert!(feed.get_recent_items("BAD", 10).await.is_err());
        assert!(feed.get_recent_items("GOOD", 10).await.unwrap().is_empty());

        let vix = StaticVolatilityIndex::unavailable();
        assert!(vix.get_current().await.is_err());
    }

    #[tokio::test]
    async fn test_peak_in_flight() {
        let provider = StaticMarketData::new();
        provider.delay_symbol("A", 20);
        provider.delay_symbol("B", 20);
        let (a, b) = tokio::join!(provider.get_history("A", 10), provider.get_history("B", 10));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(provider.peak_in_flight(), 2);

        let feed = StaticTextFeed::new();
        feed.get_recent_items("A", 5).await.unwrap();
        feed.get_recent_items("B", 5).await.unwrap();
        assert_eq!(feed.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_volatility_index_values() {
        let vix = StaticVolatilityIndex::new(23.0, Some(18.0));
        assert_eq!(vix.get_current().await.unwrap(), 23.0);
        assert_eq!(vix.get_previous_close().await.unwrap(), Some(18.0));
    }
}
