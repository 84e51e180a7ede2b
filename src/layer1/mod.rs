// Layer 1 - Data Providers
// Async interfaces for market data, text feeds and the volatility index, plus bundled sources

pub mod provider;
pub mod static_provider;
pub mod rest_client;

// Re-export commonly used items for convenience
pub use provider::{MarketDataProvider, ProviderError, TextFeedProvider, VolatilityIndexProvider};
pub use static_provider::{StaticMarketData, StaticTextFeed, StaticVolatilityIndex};
pub use rest_client::{RateLimiter, RestClient, RestClientStats};
