// Provider interfaces - market data, text feed and volatility index collaborators
// Every failure is recovered by the engine as "no data for this symbol"

use crate::core::types::{PriceSeries, TextItem};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// OHLCV history source. Unknown symbols yield an empty series, not an error.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_history(&self, symbol: &str, lookback_bars: usize) -> Result<PriceSeries, ProviderError>;
}

/// News/text items for a symbol, newest first when the source knows the order
#[async_trait]
pub trait TextFeedProvider: Send + Sync {
    async fn get_recent_items(&self, symbol: &str, max_items: usize) -> Result<Vec<TextItem>, ProviderError>;
}

#[async_trait]
pub trait VolatilityIndexProvider: Send + Sync {
    async fn get_current(&self) -> Result<f64, ProviderError>;

    /// Previous close of the index; sources without one report None
    async fn get_previous_close(&self) -> Result<Option<f64>, ProviderError> {
        Ok(None)
    }
}
