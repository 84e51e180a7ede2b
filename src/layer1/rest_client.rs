// REST Client - JSON HTTP market data, text feed and volatility index source
// Token-bucket rate limited; a pass never retries, so failures surface immediately

use super::provider::{MarketDataProvider, ProviderError, TextFeedProvider, VolatilityIndexProvider};
use crate::core::config::ProviderConfig;
use crate::core::types::{Bar, PriceSeries, TextItem};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

// ============================================================================
// Rate Limiter
// ============================================================================

/// Token bucket rate limiter for API requests.
/// Used behind Arc<Mutex<RateLimiter>>, so no internal lock needed.
pub struct RateLimiter {
    tokens: f64,
    pub max_tokens: f64,
    rate_per_sec: f64,
    last_update: Instant,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1) as f64;
        Self {
            tokens: rpm,
            max_tokens: rpm,
            rate_per_sec: rpm / 60.0,
            last_update: Instant::now(),
        }
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&mut self) -> bool {
        self.add_tokens();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available (caller must hold the Mutex)
    pub async fn acquire(&mut self) {
        while !self.try_acquire() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }

    fn add_tokens(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.max_tokens);
        self.last_update = now;
    }
}

// ============================================================================
// Client Statistics
// ============================================================================

#[derive(Debug, Clone)]
pub struct RestClientStats {
    pub requests_sent: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub success_rate: f64,
}

impl fmt::Display for RestClientStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RestClientStats(sent={}, ok={}, fail={}, rate={:.2}%)",
            self.requests_sent,
            self.requests_succeeded,
            self.requests_failed,
            self.success_rate * 100.0
        )
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    bars: Vec<Bar>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<TextItem>,
}

#[derive(Debug, Deserialize)]
struct VolatilityResponse {
    current: f64,
    #[serde(default)]
    previous_close: Option<f64>,
}

// ============================================================================
// REST Client
// ============================================================================

/// HTTP client for a JSON market-data gateway
///
/// Endpoints:
/// - `GET /history?symbol=S&bars=N` -> `{"bars": [Bar, ...]}`
/// - `GET /news?symbol=S&limit=N` -> `{"items": [TextItem, ...]}`
/// - `GET /volatility?symbol=V` -> `{"current": f64, "previous_close": f64|null}`
pub struct RestClient {
    base_url: String,
    volatility_symbol: String,
    client: Client,
    limiter: Arc<Mutex<RateLimiter>>,

    requests_sent: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
}

impl RestClient {
    pub fn new(
        base_url: &str,
        volatility_symbol: &str,
        requests_per_minute: u32,
        timeout_ms: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            volatility_symbol: volatility_symbol.to_string(),
            client,
            limiter: Arc::new(Mutex::new(RateLimiter::new(requests_per_minute))),
            requests_sent: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &ProviderConfig, volatility_symbol: &str) -> Result<Self, ProviderError> {
        Self::new(
            &config.base_url,
            volatility_symbol,
            config.requests_per_minute,
            config.provider_timeout_ms,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rate-limited GET returning decoded JSON, or None on 404
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, ProviderError> {
        self.limiter.lock().await.acquire().await;

        let url = format!("{}{}", self.base_url, endpoint);
        self.requests_sent.fetch_add(1, Ordering::Relaxed);

        let response = match self.client.get(&url).query(params).send().await {
            Ok(r) => r,
            Err(e) => {
                self.requests_failed.fetch_add(1, Ordering::Relaxed);
                warn!(url = %url, error = %e, "Request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
            debug!(url = %url, "Resource not found");
            return Ok(None);
        }
        if !status.is_success() {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status: status.as_u16(), message });
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<T>(&body) {
            Ok(data) => {
                self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
                Ok(Some(data))
            }
            Err(e) => {
                self.requests_failed.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }

    pub fn get_stats(&self) -> RestClientStats {
        let sent = self.requests_sent.load(Ordering::Relaxed);
        let succeeded = self.requests_succeeded.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        RestClientStats {
            requests_sent: sent,
            requests_succeeded: succeeded,
            requests_failed: failed,
            success_rate: if sent > 0 { succeeded as f64 / sent as f64 } else { 0.0 },
        }
    }
}

#[async_trait]
impl MarketDataProvider for RestClient {
    async fn get_history(&self, symbol: &str, lookback_bars: usize) -> Result<PriceSeries, ProviderError> {
        let params = [("symbol", symbol.to_string()), ("bars", lookback_bars.to_string())];
        let response: Option<HistoryResponse> = self.get_json("/history", &params).await?;
        Ok(match response {
            Some(r) => PriceSeries::new(symbol, r.bars),
            None => PriceSeries::empty(symbol),
        })
    }
}

#[async_trait]
impl TextFeedProvider for RestClient {
    async fn get_recent_items(&self, symbol: &str, max_items: usize) -> Result<Vec<TextItem>, ProviderError> {
        let params = [("symbol", symbol.to_string()), ("limit", max_items.to_string())];
        let response: Option<ItemsResponse> = self.get_json("/news", &params).await?;
        let mut items = response.map(|r| r.items).unwrap_or_default();
        items.truncate(max_items);
        Ok(items)
    }
}

#[async_trait]
impl VolatilityIndexProvider for RestClient {
    async fn get_current(&self) -> Result<f64, ProviderError> {
        Ok(self.volatility().await?.current)
    }

    async fn get_previous_close(&self) -> Result<Option<f64>, ProviderError> {
        Ok(self.volatility().await?.previous_close)
    }
}

impl RestClient {
    async fn volatility(&self) -> Result<VolatilityResponse, ProviderError> {
        let params = [("symbol", self.volatility_symbol.clone())];
        self.get_json::<VolatilityResponse>("/volatility", &params)
            .await?
            .ok_or_else(|| ProviderError::UnknownSymbol(self.volatility_symbol.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_bucket() {
        let mut limiter = RateLimiter::new(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        // Refill is 2/60 per second, nothing available immediately
        assert!(!limiter.try_acquire());
        assert!(limiter.available() < 1.0);
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = RestClient::new("http://localhost:9000/", "^VIX", 60, 1000).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
        let stats = client.get_stats();
        assert_eq!(stats.requests_sent, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_wire_formats_decode() {
        let history: HistoryResponse = serde_json::from_str(
            r#"{"bars": [{"timestamp": 1, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10.0}]}"#,
        )
        .unwrap();
        assert_eq!(history.bars.len(), 1);

        let items: ItemsResponse =
            serde_json::from_str(r#"{"items": [{"title": "XYZ rallies", "timestamp": 5}]}"#).unwrap();
        assert_eq!(items.items[0].summary, "");

        let vol: VolatilityResponse = serde_json::from_str(r#"{"current": 23.0}"#).unwrap();
        assert_eq!(vol.previous_close, None);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_provider_error() {
        let client = RestClient::new("http://127.0.0.1:1", "^VIX", 600, 500).unwrap();
        let result = client.get_history("XYZ", 10).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
        assert_eq!(client.get_stats().requests_failed, 1);
    }
}
