//! Logging setup for applications embedding the bridge
//!
//! The bridge only emits `tracing` events. Hosts that already install a
//! subscriber can ignore this module; everyone else picks a mode here.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output for development
    Development,
    /// Verbose diagnostics with thread names and source locations
    Debug,
    /// One JSON object per line, for log shippers
    Json,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `BEEPER_LOG_LEVEL`: Override the filter (e.g. `debug`,
///   `beeper_event_manager=trace`)
/// - `RUST_LOG`: Used when `BEEPER_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_names(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(create_env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            // Thread names matter here: most bugs are "ran on the wrong thread".
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_names(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(create_env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Json => {
            let subscriber = Registry::default()
                .with(fmt::layer().json().with_thread_names(true))
                .with(create_env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from the `BEEPER_LOG_MODE` environment variable
///
/// - "development" -> LoggingMode::Development
/// - "debug" -> LoggingMode::Debug
/// - "json" -> LoggingMode::Json
///
/// Anything else, including an unset variable, means silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_str(std::env::var("BEEPER_LOG_MODE").ok().as_deref()))
}

fn mode_from_str(value: Option<&str>) -> LoggingMode {
    match value {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        Some("json") => LoggingMode::Json,
        _ => LoggingMode::Silent,
    }
}

/// Filter from `BEEPER_LOG_LEVEL`, then `RUST_LOG`, then `default_level`
fn create_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("BEEPER_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(mode_from_str(Some("debug")), LoggingMode::Debug);
        assert_eq!(mode_from_str(Some("development")), LoggingMode::Development);
        assert_eq!(mode_from_str(Some("json")), LoggingMode::Json);
        assert_eq!(mode_from_str(Some("loud")), LoggingMode::Silent);
        assert_eq!(mode_from_str(None), LoggingMode::Silent);
    }
}
