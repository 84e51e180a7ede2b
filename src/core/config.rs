// Configuration Management for Market Sentinel
// JSON file + MARKET_SENTINEL_* environment overrides, validated before use

use crate::core::events::EventType;
use crate::core::types::{HOUR_MS, MINUTE_MS};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

/// Indicator periods and warm-up requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub volume_period: usize,
    pub level_period: usize,

    // Below `min_samples` the set is neutral; below `full_samples` it is partial
    pub min_samples: usize,
    pub full_samples: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bollinger_period: 20,
            bollinger_std: 2.0,
            volume_period: 20,
            level_period: 20,
            min_samples: 20,
            full_samples: 50,
        }
    }
}

/// Rule trigger thresholds for the event synthesizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    // Price
    pub price_move_pct: f64,
    pub divergence_change_pct: f64,
    pub volatility_range_pct: f64,

    // Technical
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,

    // Volume
    pub volume_spike_ratio: f64,
    pub liquidity_volume_ratio: f64,
    pub liquidity_change_pct: f64,

    // Sentiment
    pub fear_greed_low: f64,
    pub fear_greed_high: f64,

    // Market-level
    pub correlation_significance: f64,
    pub sector_rotation_strength: f64,
    pub regime_change_pct: f64,

    // Confidence corroboration
    pub corroboration_volume_ratio: f64,
    pub corroboration_sentiment_confidence: f64,
    pub corroboration_boost: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            price_move_pct: 10.0,
            divergence_change_pct: 2.0,
            volatility_range_pct: 5.0,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            volume_spike_ratio: 3.0,
            liquidity_volume_ratio: 0.3,
            liquidity_change_pct: 3.0,
            fear_greed_low: 20.0,
            fear_greed_high: 80.0,
            correlation_significance: 0.5,
            sector_rotation_strength: 0.7,
            regime_change_pct: 20.0,
            corroboration_volume_ratio: 2.0,
            corroboration_sentiment_confidence: 0.7,
            corroboration_boost: 0.1,
        }
    }
}

/// Filter thresholds, per-type cooldowns and history retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_severity: f64,
    pub min_confidence: f64,
    pub max_events_per_pass: usize,
    pub default_cooldown_ms: i64,
    /// Keyed by event type name (e.g. "liquidity_crisis")
    pub cooldown_overrides_ms: BTreeMap<String, i64>,
    pub history_retention_ms: i64,
    pub history_capacity: usize,
}

impl FilterConfig {
    pub fn cooldown_for(&self, event_type: EventType) -> i64 {
        self.cooldown_overrides_ms
            .get(event_type.as_str())
            .copied()
            .unwrap_or(self.default_cooldown_ms)
    }

    /// Longest cooldown of any event type
    pub fn max_cooldown_ms(&self) -> i64 {
        self.cooldown_overrides_ms
            .values()
            .copied()
            .fold(self.default_cooldown_ms, i64::max)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert(EventType::LiquidityCrisis.as_str().to_string(), 5 * MINUTE_MS);
        overrides.insert(EventType::CorrelationBreak.as_str().to_string(), 30 * MINUTE_MS);
        overrides.insert(EventType::SectorRotation.as_str().to_string(), 60 * MINUTE_MS);
        overrides.insert(EventType::RegimeChange.as_str().to_string(), 60 * MINUTE_MS);

        Self {
            min_severity: 0.3,
            min_confidence: 0.5,
            max_events_per_pass: 20,
            default_cooldown_ms: 15 * MINUTE_MS,
            cooldown_overrides_ms: overrides,
            history_retention_ms: 24 * HOUR_MS,
            history_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselinePair {
    pub a: String,
    pub b: String,
    pub expected: f64,
}

impl BaselinePair {
    pub fn new(a: &str, b: &str, expected: f64) -> Self {
        Self { a: a.to_string(), b: b.to_string(), expected }
    }

    /// Order-insensitive pair match
    pub fn matches(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorGroup {
    pub name: String,
    pub members: Vec<String>,
}

impl SectorGroup {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Baseline correlations, sector groups and the market proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationBaselineConfig {
    pub market_proxy: String,
    pub baselines: Vec<BaselinePair>,
    pub sectors: Vec<SectorGroup>,
    pub break_threshold: f64,
    pub min_overlap: usize,
    pub rotation_window: usize,
    pub rotation_threshold: f64,
}

impl CorrelationBaselineConfig {
    pub fn baseline_for(&self, x: &str, y: &str) -> Option<f64> {
        self.baselines.iter().find(|p| p.matches(x, y)).map(|p| p.expected)
    }
}

impl Default for CorrelationBaselineConfig {
    fn default() -> Self {
        Self {
            market_proxy: "^GSPC".to_string(),
            baselines: vec![
                BaselinePair::new("^GSPC", "^IXIC", 0.85),
                BaselinePair::new("^GSPC", "^DJI", 0.90),
                BaselinePair::new("^GSPC", "^VIX", -0.75),
                BaselinePair::new("XLK", "QQQ", 0.95),
            ],
            sectors: vec![
                SectorGroup::new("Technology", &["XLK", "QQQ", "AAPL", "MSFT", "GOOGL", "NVDA"]),
                SectorGroup::new("Healthcare", &["XLV", "JNJ", "PFE", "UNH", "ABBV"]),
                SectorGroup::new("Financial", &["XLF", "JPM", "BAC", "WFC", "GS"]),
                SectorGroup::new("Energy", &["XLE", "XOM", "CVX", "COP", "SLB"]),
                SectorGroup::new("Consumer", &["XLY", "AMZN", "TSLA", "HD", "MCD"]),
                SectorGroup::new("Industrial", &["XLI", "BA", "CAT", "GE", "MMM"]),
            ],
            break_threshold: 0.2,
            min_overlap: 5,
            rotation_window: 20,
            rotation_threshold: 0.002,
        }
    }
}

/// Lexicons and weighting for the sentiment aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub market_keywords: Vec<String>,
    /// Lowercase symbol -> alternative names that mark an item as relevant
    pub symbol_aliases: BTreeMap<String, Vec<String>>,
    pub max_items: usize,
    pub decay_hours: f64,
    pub recent_hours: f64,
    pub news_weight: f64,
    pub volatility_index_symbol: String,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for SentimentConfig {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("aapl".to_string(), words(&["apple", "iphone", "mac", "ipad"]));
        aliases.insert("googl".to_string(), words(&["google", "alphabet", "android", "youtube"]));
        aliases.insert("msft".to_string(), words(&["microsoft", "windows", "azure", "office"]));
        aliases.insert("tsla".to_string(), words(&["tesla", "elon musk", "electric vehicle"]));
        aliases.insert("nvda".to_string(), words(&["nvidia", "gpu", "ai chip", "graphics"]));
        aliases.insert("^gspc".to_string(), words(&["s&p 500", "sp500", "market index"]));
        aliases.insert("^ixic".to_string(), words(&["nasdaq", "tech stock", "technology"]));
        aliases.insert("^vix".to_string(), words(&["vix", "volatility", "fear index"]));

        Self {
            positive_keywords: words(&[
                "surge", "rally", "gain", "gains", "rise", "rises", "up", "bull", "bullish",
                "growth", "profit", "earnings", "beat", "beats", "strong", "robust", "solid",
                "positive", "optimistic", "confident", "breakthrough", "success", "record", "high",
            ]),
            negative_keywords: words(&[
                "fall", "falls", "drop", "drops", "decline", "crash", "bear", "bearish", "loss",
                "losses", "weak", "poor", "disappointing", "concern", "worry", "fear", "risk",
                "uncertainty", "volatile", "pressure", "struggle", "challenge", "low",
            ]),
            market_keywords: words(&["stock", "market", "trading", "investor", "economy", "financial"]),
            symbol_aliases: aliases,
            max_items: 20,
            decay_hours: 48.0,
            recent_hours: 24.0,
            news_weight: 0.7,
            volatility_index_symbol: "^VIX".to_string(),
        }
    }
}

/// Provider endpoints, timeouts and fan-out limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub requests_per_minute: u32,
    pub provider_timeout_ms: u64,
    pub lookback_bars: usize,
    pub max_concurrency: usize,
    pub max_text_requests: usize,
    /// Whole-pass deadline; None disables it
    pub pass_deadline_ms: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            requests_per_minute: 600,
            provider_timeout_ms: 10_000,
            lookback_bars: 100,
            max_concurrency: 8,
            max_text_requests: 10,
            pass_deadline_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json_format: bool,
    pub console_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_format: false,
            console_output: true,
        }
    }
}

/// Complete engine configuration, passed by value into the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub detection: DetectionThresholds,
    pub filter: FilterConfig,
    pub correlation: CorrelationBaselineConfig,
    pub sentiment: SentimentConfig,
    pub providers: ProviderConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let ind = &self.indicators;
        if ind.rsi_period == 0 || ind.sma_short == 0 || ind.sma_long == 0 {
            errors.push("indicator periods must be positive".to_string());
        }
        if ind.ema_fast >= ind.ema_slow {
            errors.push("ema_fast must be shorter than ema_slow".to_string());
        }
        if ind.bollinger_period < 2 {
            errors.push("bollinger_period must be at least 2".to_string());
        }
        if ind.min_samples > ind.full_samples {
            errors.push("min_samples must not exceed full_samples".to_string());
        }

        let filter = &self.filter;
        if !(0.0..=1.0).contains(&filter.min_severity) {
            errors.push("min_severity must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&filter.min_confidence) {
            errors.push("min_confidence must be within [0, 1]".to_string());
        }
        if filter.max_events_per_pass == 0 {
            errors.push("max_events_per_pass must be positive".to_string());
        }
        if filter.default_cooldown_ms < 0 || filter.cooldown_overrides_ms.values().any(|v| *v < 0) {
            errors.push("cooldowns must not be negative".to_string());
        }
        for name in filter.cooldown_overrides_ms.keys() {
            if EventType::from_name(name).is_none() {
                errors.push(format!("unknown event type in cooldown overrides: {}", name));
            }
        }
        if filter.history_capacity == 0 || filter.history_retention_ms <= 0 {
            errors.push("history retention and capacity must be positive".to_string());
        }

        let corr = &self.correlation;
        if corr.market_proxy.is_empty() {
            errors.push("market_proxy must not be empty".to_string());
        }
        if corr.baselines.iter().any(|b| !(-1.0..=1.0).contains(&b.expected)) {
            errors.push("baseline correlations must be within [-1, 1]".to_string());
        }
        if corr.min_overlap < 2 {
            errors.push("min_overlap must be at least 2".to_string());
        }

        let providers = &self.providers;
        if providers.max_concurrency == 0 || providers.max_text_requests == 0 {
            errors.push("concurrency limits must be positive".to_string());
        }
        if providers.provider_timeout_ms == 0 {
            errors.push("provider_timeout_ms must be positive".to_string());
        }
        if providers.lookback_bars < ind.min_samples {
            errors.push("lookback_bars must cover min_samples".to_string());
        }

        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            warn!(error = %error, "Config validation error");
        }
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

// ============================================================================
// Configuration Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub market_proxy: String,
    pub min_severity: f64,
    pub min_confidence: f64,
    pub max_events_per_pass: usize,
    pub max_concurrency: usize,
    pub log_level: String,
}

// ============================================================================
// Configuration Manager
// ============================================================================

pub struct ConfigManager {
    indicators: Arc<RwLock<IndicatorConfig>>,
    detection: Arc<RwLock<DetectionThresholds>>,
    filter: Arc<RwLock<FilterConfig>>,
    correlation: Arc<RwLock<CorrelationBaselineConfig>>,
    sentiment: Arc<RwLock<SentimentConfig>>,
    providers: Arc<RwLock<ProviderConfig>>,
    logging: Arc<RwLock<LoggingConfig>>,
}

impl ConfigManager {
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();
        let mut manager = Self {
            indicators: Arc::new(RwLock::new(defaults.indicators)),
            detection: Arc::new(RwLock::new(defaults.detection)),
            filter: Arc::new(RwLock::new(defaults.filter)),
            correlation: Arc::new(RwLock::new(defaults.correlation)),
            sentiment: Arc::new(RwLock::new(defaults.sentiment)),
            providers: Arc::new(RwLock::new(defaults.providers)),
            logging: Arc::new(RwLock::new(defaults.logging)),
        };

        if let Some(path) = config_path {
            manager.load_from_file(path)?;
        }

        manager.load_from_env();

        info!("Configuration initialized");
        Ok(manager)
    }

    /// Load configuration from JSON file; a missing file keeps defaults
    pub fn load_from_file(&mut self, config_path: &str) -> Result<(), ConfigError> {
        let path = Path::new(config_path);
        if !path.exists() {
            warn!(path = config_path, "Config file not found, using defaults");
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        let config_data: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        // Sections present in the file replace the defaults wholesale
        if let Some(data) = config_data.get("indicators") {
            *self.indicators.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("detection") {
            *self.detection.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("filter") {
            *self.filter.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("correlation") {
            *self.correlation.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("sentiment") {
            *self.sentiment.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("providers") {
            *self.providers.write() = serde_json::from_value(data.clone())?;
        }
        if let Some(data) = config_data.get("logging") {
            *self.logging.write() = serde_json::from_value(data.clone())?;
        }

        info!(path = config_path, "Configuration loaded");
        Ok(())
    }

    /// Apply MARKET_SENTINEL_* environment overrides
    pub fn load_from_env(&mut self) {
        if let Ok(url) = std::env::var("MARKET_SENTINEL_BASE_URL") {
            self.providers.write().base_url = url;
        }
        if let Some(v) = env_parse::<u64>("MARKET_SENTINEL_PROVIDER_TIMEOUT_MS") {
            self.providers.write().provider_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("MARKET_SENTINEL_MAX_CONCURRENCY") {
            self.providers.write().max_concurrency = v;
        }
        if let Some(v) = env_parse::<f64>("MARKET_SENTINEL_MIN_SEVERITY") {
            self.filter.write().min_severity = v;
        }
        if let Some(v) = env_parse::<f64>("MARKET_SENTINEL_MIN_CONFIDENCE") {
            self.filter.write().min_confidence = v;
        }
        if let Some(v) = env_parse::<usize>("MARKET_SENTINEL_MAX_EVENTS") {
            self.filter.write().max_events_per_pass = v;
        }
        if let Ok(level) = std::env::var("MARKET_SENTINEL_LOG_LEVEL") {
            self.logging.write().log_level = level;
        }
        if let Ok(json) = std::env::var("MARKET_SENTINEL_LOG_JSON") {
            self.logging.write().json_format = json.to_lowercase() == "true";
        }
    }

    /// Save the full configuration as pretty JSON
    pub fn save_to_file(&self, config_path: &str) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.engine_config())?;

        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, json)?;

        info!(path = config_path, "Configuration saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config().validate()?;
        info!("Configuration validated successfully");
        Ok(())
    }

    pub fn get_summary(&self) -> ConfigSummary {
        let filter = self.filter.read();
        ConfigSummary {
            market_proxy: self.correlation.read().market_proxy.clone(),
            min_severity: filter.min_severity,
            min_confidence: filter.min_confidence,
            max_events_per_pass: filter.max_events_per_pass,
            max_concurrency: self.providers.read().max_concurrency,
            log_level: self.logging.read().log_level.clone(),
        }
    }

    /// Snapshot of every section, for handing to the engine
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            indicators: self.indicators(),
            detection: self.detection(),
            filter: self.filter(),
            correlation: self.correlation(),
            sentiment: self.sentiment(),
            providers: self.providers(),
            logging: self.logging(),
        }
    }

    // Getters for each config section
    pub fn indicators(&self) -> IndicatorConfig {
        self.indicators.read().clone()
    }

    pub fn detection(&self) -> DetectionThresholds {
        self.detection.read().clone()
    }

    pub fn filter(&self) -> FilterConfig {
        self.filter.read().clone()
    }

    pub fn correlation(&self) -> CorrelationBaselineConfig {
        self.correlation.read().clone()
    }

    pub fn sentiment(&self) -> SentimentConfig {
        self.sentiment.read().clone()
    }

    pub fn providers(&self) -> ProviderConfig {
        self.providers.read().clone()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.read().clone()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key = key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

// Global config instance (thread-safe singleton)
static GLOBAL_CONFIG: OnceLock<Arc<RwLock<ConfigManager>>> = OnceLock::new();

/// Get global configuration instance (singleton).
/// Starts from defaults plus environment overrides.
pub fn get_config() -> Arc<RwLock<ConfigManager>> {
    Arc::clone(GLOBAL_CONFIG.get_or_init(|| {
        let mut manager = ConfigManager {
            indicators: Arc::new(RwLock::new(IndicatorConfig::default())),
            detection: Arc::new(RwLock::new(DetectionThresholds::default())),
            filter: Arc::new(RwLock::new(FilterConfig::default())),
            correlation: Arc::new(RwLock::new(CorrelationBaselineConfig::default())),
            sentiment: Arc::new(RwLock::new(SentimentConfig::default())),
            providers: Arc::new(RwLock::new(ProviderConfig::default())),
            logging: Arc::new(RwLock::new(LoggingConfig::default())),
        };
        manager.load_from_env();
        Arc::new(RwLock::new(manager))
    }))
}
