// Core Module - Foundational types, config, logging, events

pub mod types;
pub mod config;
pub mod logger;
pub mod events;

// Re-export commonly used items for convenience
pub use types::*;
pub use config::{
    BaselinePair, ConfigError, ConfigManager, CorrelationBaselineConfig, DetectionThresholds,
    EngineConfig, FilterConfig, IndicatorConfig, LoggingConfig, ProviderConfig, SectorGroup,
    SentimentConfig, get_config,
};
pub use events::{Event, EventLinks, EventPriority, EventType};
pub use logger::setup_logging;
