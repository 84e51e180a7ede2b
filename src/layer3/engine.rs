// Detection Engine - one detection pass from provider fetch to accepted events
// Fan-out -> correlation barrier -> synthesis -> filter -> session summary

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::events::Event;
use crate::core::logger::pass_span;
use crate::core::types::{now_ms, PriceSeries, HOUR_MS};
use crate::layer1::provider::{
    MarketDataProvider, ProviderError, TextFeedProvider, VolatilityIndexProvider,
};
use crate::layer2::correlation::{CorrelationAnalyzer, CorrelationReport};
use crate::layer2::sentiment::{SentimentAggregator, SentimentReading, VolatilityShift};
use crate::layer2::technical::IndicatorEngine;
use crate::layer3::filter::{AlertStore, EventFilter, FilterReport};
use crate::layer3::rules::SymbolSignals;
use crate::layer3::session::{summarize, SessionSummary};
use crate::layer3::synthesizer::EventSynthesizer;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn, Instrument};

// ============================================================================
// Errors & Cancellation
// ============================================================================

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("No symbols requested")]
    EmptySymbols,
}

/// Cancels an in-flight pass. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct PassCancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl PassCancellation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for PassCancellation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Completed,
    Cancelled,
}

// ============================================================================
// Results & Stats
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub pass_id: String,
    pub events: Vec<Event>,
    pub summary: SessionSummary,
    pub generated_at_ms: i64,
    pub analyzed_symbols: Vec<String>,
    pub failed_symbols: Vec<String>,
    pub filter_report: FilterReport,
    pub outcome: PassOutcome,
}

impl DetectionResult {
    fn empty(pass_id: String, now_ms: i64, outcome: PassOutcome) -> Self {
        Self {
            pass_id,
            events: Vec::new(),
            summary: SessionSummary::no_data(),
            generated_at_ms: now_ms,
            analyzed_symbols: Vec::new(),
            failed_symbols: Vec::new(),
            filter_report: FilterReport::default(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub passes_completed: u64,
    pub passes_cancelled: u64,
    pub events_proposed: u64,
    pub events_accepted: u64,
    pub symbol_failures: u64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine(passes={}, cancelled={}, proposed={}, accepted={}, symbol_failures={})",
            self.passes_completed,
            self.passes_cancelled,
            self.events_proposed,
            self.events_accepted,
            self.symbol_failures
        )
    }
}

/// Outcome of the fan-out stage for one symbol
struct SymbolFetch {
    symbol: String,
    series: Option<PriceSeries>,
    signals: Option<SymbolSignals>,
}

struct Gathered {
    fetched: Vec<SymbolFetch>,
    volatility: Option<VolatilityShift>,
}

async fn with_timeout<T, F>(timeout_ms: u64, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout_ms)),
    }
}

async fn deadline(deadline_ms: Option<u64>) {
    match deadline_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending::<()>().await,
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct DetectionEngine {
    config: EngineConfig,
    market_data: Arc<dyn MarketDataProvider>,
    text_feed: Arc<dyn TextFeedProvider>,
    volatility_index: Arc<dyn VolatilityIndexProvider>,

    indicators: IndicatorEngine,
    sentiment: SentimentAggregator,
    correlation: CorrelationAnalyzer,
    synthesizer: EventSynthesizer,
    filter: EventFilter,

    store: Arc<AlertStore>,
    text_permits: Semaphore,
    stats: Mutex<EngineStats>,
}

impl DetectionEngine {
    /// Validates the configuration; an invalid one never reaches a pass
    pub fn new(
        config: EngineConfig,
        market_data: Arc<dyn MarketDataProvider>,
        text_feed: Arc<dyn TextFeedProvider>,
        volatility_index: Arc<dyn VolatilityIndexProvider>,
    ) -> Result<Self, EngineError> {
        let store = Arc::new(AlertStore::new(&config.filter));
        Self::with_store(config, market_data, text_feed, volatility_index, store)
    }

    /// Build over an existing store, sharing cooldowns and history with other engines
    pub fn with_store(
        config: EngineConfig,
        market_data: Arc<dyn MarketDataProvider>,
        text_feed: Arc<dyn TextFeedProvider>,
        volatility_index: Arc<dyn VolatilityIndexProvider>,
        store: Arc<AlertStore>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        info!(
            market_proxy = %config.correlation.market_proxy,
            max_concurrency = config.providers.max_concurrency,
            "Creating detection engine"
        );
        Ok(Self {
            indicators: IndicatorEngine::new(config.indicators.clone()),
            sentiment: SentimentAggregator::new(config.sentiment.clone()),
            correlation: CorrelationAnalyzer::new(config.correlation.clone()),
            synthesizer: EventSynthesizer::new(config.detection.clone()),
            filter: EventFilter::new(config.filter.clone()),
            text_permits: Semaphore::new(config.providers.max_text_requests.max(1)),
            stats: Mutex::new(EngineStats::default()),
            store,
            config,
            market_data,
            text_feed,
            volatility_index,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn alert_store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    pub fn get_stats(&self) -> EngineStats {
        self.stats.lock().clone()
    }

    pub async fn run_detection_pass(&self, symbols: &[String]) -> Result<DetectionResult, EngineError> {
        self.run_pass(symbols, now_ms(), None).await
    }

    pub async fn run_detection_pass_at(
        &self,
        symbols: &[String],
        now_ms: i64,
    ) -> Result<DetectionResult, EngineError> {
        self.run_pass(symbols, now_ms, None).await
    }

    pub async fn run_detection_pass_cancellable(
        &self,
        symbols: &[String],
        now_ms: i64,
        cancellation: &PassCancellation,
    ) -> Result<DetectionResult, EngineError> {
        self.run_pass(symbols, now_ms, Some(cancellation)).await
    }

    /// Accepted events from the last `since_hours`
    pub fn get_recent_events(&self, since_hours: f64) -> Vec<Event> {
        self.get_recent_events_at(since_hours, now_ms())
    }

    pub fn get_recent_events_at(&self, since_hours: f64, now_ms: i64) -> Vec<Event> {
        let since_ms = now_ms - (since_hours.max(0.0) * HOUR_MS as f64) as i64;
        self.store.history().since(since_ms)
    }

    async fn run_pass(
        &self,
        symbols: &[String],
        now_ms: i64,
        cancellation: Option<&PassCancellation>,
    ) -> Result<DetectionResult, EngineError> {
        let requested: BTreeSet<String> = symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if requested.is_empty() {
            return Err(EngineError::EmptySymbols);
        }

        let mut universe = requested.clone();
        universe.insert(self.config.correlation.market_proxy.clone());

        let pass_id = uuid::Uuid::new_v4().to_string();
        let span = pass_span(&pass_id, universe.len());
        self.run_pass_inner(pass_id, requested, universe, now_ms, cancellation)
            .instrument(span)
            .await
    }

    async fn run_pass_inner(
        &self,
        pass_id: String,
        requested: BTreeSet<String>,
        universe: BTreeSet<String>,
        now_ms: i64,
        cancellation: Option<&PassCancellation>,
    ) -> Result<DetectionResult, EngineError> {
        info!(requested = requested.len(), universe = universe.len(), "Detection pass started");

        let gather = self.gather(&requested, &universe, now_ms);
        let gathered = match cancellation {
            Some(cancel) => tokio::select! {
                gathered = gather => Some(gathered),
                _ = cancel.cancelled() => None,
                _ = deadline(self.config.providers.pass_deadline_ms) => None,
            },
            None => tokio::select! {
                gathered = gather => Some(gathered),
                _ = deadline(self.config.providers.pass_deadline_ms) => None,
            },
        };

        let gathered = match gathered {
            Some(g) if !cancellation.is_some_and(|c| c.is_cancelled()) => g,
            _ => {
                warn!("Detection pass cancelled before filtering");
                self.stats.lock().passes_cancelled += 1;
                return Ok(DetectionResult::empty(pass_id, now_ms, PassOutcome::Cancelled));
            }
        };

        // Barrier: everything below sees the complete, name-ordered universe
        let mut series_by_symbol = BTreeMap::new();
        let mut symbol_signals = Vec::new();
        let mut analyzed_symbols = Vec::new();
        let mut failed_symbols = Vec::new();
        for fetch in gathered.fetched {
            let is_requested = requested.contains(&fetch.symbol);
            match fetch.series {
                Some(series) => {
                    if is_requested {
                        analyzed_symbols.push(fetch.symbol.clone());
                    }
                    series_by_symbol.insert(fetch.symbol, series);
                }
                None if is_requested => failed_symbols.push(fetch.symbol),
                None => {}
            }
            if let Some(signals) = fetch.signals {
                symbol_signals.push(signals);
            }
        }
        analyzed_symbols.sort();
        failed_symbols.sort();
        symbol_signals.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        {
            let mut stats = self.stats.lock();
            stats.symbol_failures += failed_symbols.len() as u64;
        }

        if analyzed_symbols.is_empty() {
            warn!(failed = failed_symbols.len(), "No symbols analyzed, no data available");
            self.stats.lock().passes_completed += 1;
            let mut result = DetectionResult::empty(pass_id, now_ms, PassOutcome::Completed);
            result.failed_symbols = failed_symbols;
            return Ok(result);
        }

        let correlation = if series_by_symbol.len() >= 2 {
            self.correlation.analyze(&series_by_symbol)
        } else {
            CorrelationReport::default()
        };

        let candidates =
            self.synthesizer
                .synthesize(&symbol_signals, &correlation, gathered.volatility.as_ref(), now_ms);
        let proposed = candidates.len();

        let filtered = self.filter.apply(candidates, &self.store, now_ms);
        let summary = summarize(&filtered.accepted);

        {
            let mut stats = self.stats.lock();
            stats.passes_completed += 1;
            stats.events_proposed += proposed as u64;
            stats.events_accepted += filtered.accepted.len() as u64;
        }

        info!(
            analyzed = analyzed_symbols.len(),
            failed = failed_symbols.len(),
            proposed = proposed,
            accepted = filtered.accepted.len(),
            risk = %summary.risk_level,
            "Detection pass completed"
        );

        Ok(DetectionResult {
            pass_id,
            events: filtered.accepted,
            summary,
            generated_at_ms: now_ms,
            analyzed_symbols,
            failed_symbols,
            filter_report: filtered.report,
            outcome: PassOutcome::Completed,
        })
    }

    /// Fan-out stage: volatility index first, then every symbol with bounded parallelism
    async fn gather(&self, requested: &BTreeSet<String>, universe: &BTreeSet<String>, now_ms: i64) -> Gathered {
        let (current_vix, volatility) = self.gather_volatility().await;

        let fetched: Vec<SymbolFetch> = stream::iter(universe.iter().cloned())
            .map(|symbol| {
                let wants_signals = requested.contains(&symbol);
                self.gather_symbol(symbol, wants_signals, current_vix, now_ms)
            })
            .buffer_unordered(self.config.providers.max_concurrency.max(1))
            .collect()
            .await;

        Gathered { fetched, volatility }
    }

    async fn gather_volatility(&self) -> (Option<f64>, Option<VolatilityShift>) {
        let timeout_ms = self.config.providers.provider_timeout_ms;
        let index_symbol = &self.config.sentiment.volatility_index_symbol;

        let current = match with_timeout(timeout_ms, self.volatility_index.get_current()).await {
            Ok(v) if v.is_finite() => Some(v),
            Ok(v) => {
                warn!(index = %index_symbol, value = v, "Volatility index not finite");
                None
            }
            Err(e) => {
                warn!(index = %index_symbol, error = %e, "Volatility index unavailable");
                None
            }
        };
        let Some(current) = current else {
            return (None, None);
        };

        let previous = match with_timeout(timeout_ms, self.volatility_index.get_previous_close()).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(index = %index_symbol, error = %e, "Volatility previous close unavailable");
                None
            }
        };
        let shift = previous.and_then(|p| VolatilityShift::between(index_symbol, p, current));
        debug!(index = %index_symbol, current = current, previous = ?previous, "Volatility index read");
        (Some(current), shift)
    }

    async fn gather_symbol(
        &self,
        symbol: String,
        wants_signals: bool,
        volatility_index: Option<f64>,
        now_ms: i64,
    ) -> SymbolFetch {
        let providers = &self.config.providers;
        let history = with_timeout(
            providers.provider_timeout_ms,
            self.market_data.get_history(&symbol, providers.lookback_bars),
        )
        .await;

        let series = match history {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                warn!(symbol = %symbol, "No price history");
                return SymbolFetch { symbol, series: None, signals: None };
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Market data fetch failed");
                return SymbolFetch { symbol, series: None, signals: None };
            }
        };

        if !wants_signals {
            return SymbolFetch { symbol, series: Some(series), signals: None };
        }

        let indicators = self.indicators.analyze(&series);
        let sentiment = self.gather_sentiment(&symbol, volatility_index, now_ms).await;
        debug!(
            symbol = %symbol,
            samples = series.len(),
            signal = %indicators.signal,
            sentiment = sentiment.score,
            "Symbol analyzed"
        );

        SymbolFetch {
            signals: Some(SymbolSignals { symbol: symbol.clone(), indicators, sentiment: Some(sentiment) }),
            series: Some(series),
            symbol,
        }
    }

    async fn gather_sentiment(&self, symbol: &str, volatility_index: Option<f64>, now_ms: i64) -> SentimentReading {
        let Ok(_permit) = self.text_permits.acquire().await else {
            return SentimentReading::neutral(symbol, volatility_index);
        };

        let max_items = self.config.sentiment.max_items;
        let items = with_timeout(
            self.config.providers.provider_timeout_ms,
            self.text_feed.get_recent_items(symbol, max_items),
        )
        .await;

        match items {
            Ok(items) => self.sentiment.aggregate(symbol, &items, volatility_index, now_ms),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Text feed fetch failed");
                SentimentReading::neutral(symbol, volatility_index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bar, DAY_MS};
    use crate::layer1::static_provider::{StaticMarketData, StaticTextFeed, StaticVolatilityIndex};

    const NOW: i64 = 1_700_000_000_000;

    fn trending(symbol: &str, n: usize, step: f64) -> PriceSeries {
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + step * i as f64;
                Bar::new(NOW - (n - i) as i64 * DAY_MS, close, close * 1.001, close * 0.999, close, 1_000_000.0)
            })
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn engine(market: StaticMarketData) -> DetectionEngine {
        DetectionEngine::new(
            EngineConfig::default(),
            Arc::new(market),
            Arc::new(StaticTextFeed::new()),
            Arc::new(StaticVolatilityIndex::unavailable()),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.filter.max_events_per_pass = 0;
        let result = DetectionEngine::new(
            config,
            Arc::new(StaticMarketData::new()),
            Arc::new(StaticTextFeed::new()),
            Arc::new(StaticVolatilityIndex::unavailable()),
        );
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_with_store_validates_config() {
        let mut config = EngineConfig::default();
        config.providers.max_concurrency = 0;
        let store = Arc::new(AlertStore::new(&config.filter));
        let result = DetectionEngine::with_store(
            config,
            Arc::new(StaticMarketData::new()),
            Arc::new(StaticTextFeed::new()),
            Arc::new(StaticVolatilityIndex::unavailable()),
            store,
        );
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_symbol_list() {
        let engine = engine(StaticMarketData::new());
        let result = engine.run_detection_pass_at(&[" ".to_string()], NOW).await;
        assert!(matches!(result, Err(EngineError::EmptySymbols)));
    }

    #[tokio::test]
    async fn test_unknown_symbols_give_no_data() {
        let engine = engine(StaticMarketData::new());
        let result = engine.run_detection_pass_at(&["NOPE".to_string()], NOW).await.unwrap();
        assert_eq!(result.outcome, PassOutcome::Completed);
        assert!(result.summary.no_data);
        assert!(result.events.is_empty());
        assert_eq!(result.failed_symbols, vec!["NOPE".to_string()]);
    }

    #[tokio::test]
    async fn test_proxy_not_reported_as_analyzed() {
        let market = StaticMarketData::new()
            .with_series(trending("AAA", 60, 0.1))
            .with_series(trending("^GSPC", 60, 0.05));
        let engine = engine(market);
        let result = engine.run_detection_pass_at(&["AAA".to_string()], NOW).await.unwrap();
        assert_eq!(result.analyzed_symbols, vec!["AAA".to_string()]);
        assert!(result.failed_symbols.is_empty());
        assert!(result.events.iter().all(|e| e.symbol != "^GSPC"));
    }

    #[tokio::test]
    async fn test_provider_timeout_marks_symbol_failed() {
        let market = StaticMarketData::new()
            .with_series(trending("AAA", 60, 0.1))
            .with_series(trending("SLOW", 60, 0.1));
        market.delay_symbol("SLOW", 500);
        let mut config = EngineConfig::default();
        config.providers.provider_timeout_ms = 50;
        let engine = DetectionEngine::new(
            config,
            Arc::new(market),
            Arc::new(StaticTextFeed::new()),
            Arc::new(StaticVolatilityIndex::unavailable()),
        )
        .unwrap();

        let result = engine
            .run_detection_pass_at(&["AAA".to_string(), "SLOW".to_string()], NOW)
            .await
            .unwrap();
        assert_eq!(result.analyzed_symbols, vec!["AAA".to_string()]);
        assert_eq!(result.failed_symbols, vec!["SLOW".to_string()]);
    }

    #[tokio::test]
    async fn test_pre_cancelled_pass() {
        let market = StaticMarketData::new().with_series(trending("AAA", 60, 0.1));
        let engine = engine(market);
        let cancel = PassCancellation::new();
        cancel.cancel();

        let result = engine
            .run_detection_pass_cancellable(&["AAA".to_string()], NOW, &cancel)
            .await
            .unwrap();
        assert_eq!(result.outcome, PassOutcome::Cancelled);
        assert!(result.events.is_empty());
        assert!(engine.alert_store().cooldowns().is_empty());
        assert_eq!(engine.get_stats().passes_cancelled, 1);
    }

    #[test]
    fn test_stats_display() {
        let stats = EngineStats { passes_completed: 2, ..Default::default() };
        assert!(stats.to_string().starts_with("Engine(passes=2"));
    }
}
