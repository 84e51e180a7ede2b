// Structured Logging for Market Sentinel
// tracing + tracing-subscriber, installed once per process

use crate::core::config::LoggingConfig;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn parse_level(level: &str) -> Level {
    match level.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Setup structured logging for the entire application.
/// Later calls are no-ops; an already-installed global subscriber is left in place.
pub fn setup_logging(log_level: Option<&str>, json_format: Option<bool>, console_output: Option<bool>) {
    let log_level_str = log_level.unwrap_or("INFO");
    let json_format = json_format.unwrap_or(false);
    let console_output = console_output.unwrap_or(true);
    let level = parse_level(log_level_str);

    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env().add_directive(level.into());
        // Suppress noisy libraries
        for directive in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        let installed = if !console_output {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init()
        } else if json_format {
            tracing_subscriber::fmt()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_env_filter(filter)
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_target(true)
                .with_env_filter(filter)
                .try_init()
        };

        if installed.is_ok() {
            tracing::info!(log_level = %log_level_str, json = json_format, "Logging initialized");
        }
    });
}

pub fn setup_from_config(config: &LoggingConfig) {
    setup_logging(
        Some(&config.log_level),
        Some(config.json_format),
        Some(config.console_output),
    );
}

/// Span wrapping one detection pass
pub fn pass_span(pass_id: &str, symbols: usize) -> tracing::Span {
    tracing::info_span!(target: "market_sentinel", "detection_pass", pass_id = %pass_id, symbols = symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging(Some("DEBUG"), Some(false), Some(true));
        setup_from_config(&LoggingConfig::default());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }
}
