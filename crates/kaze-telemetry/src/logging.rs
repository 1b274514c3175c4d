//! Structured logging.
//!
//! ```rust,ignore
//! use kaze_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(http.method = "GET", http.path = "/", "request started");
//! ```

use kaze_config::{LogFormat, TelemetryConfigSection};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,

    /// Default filter directive (e.g. `info`, `kaze_middleware=debug`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Whether to output JSON.
    pub json_format: bool,

    /// Colored output in pretty mode.
    pub ansi: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            ansi: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            ansi: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

impl From<&TelemetryConfigSection> for LogConfig {
    fn from(section: &TelemetryConfigSection) -> Self {
        let logging = &section.logging;
        Self {
            enabled: logging.enabled,
            level: logging.level.clone(),
            json_format: logging.format == LogFormat::Json,
            ansi: logging.ansi_enabled,
            ..Self::default()
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => create_env_filter(&directives)?,
        _ => create_env_filter(&config.level)?,
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.ansi)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Parses a filter directive string.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the directives are invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::LoggingInit(format!("invalid log filter: {e}")))
}

/// Field names used across Kaze log lines.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request path.
    pub const HTTP_PATH: &str = "http.path";

    /// Response status.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// Matched route pattern.
    pub const ROUTE: &str = "route";

    /// Error text.
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaze_config::KazeConfig;

    #[test]
    fn test_presets() {
        assert!(LogConfig::default().json_format);
        let dev = LogConfig::development();
        assert!(!dev.json_format);
        assert_eq!(dev.level, "debug");
    }

    #[test]
    fn test_from_config_section() {
        let config = KazeConfig::development();
        let log = LogConfig::from(&config.telemetry);
        assert!(!log.json_format);
        assert!(log.ansi);
        assert_eq!(log.level, "debug");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info,kaze_middleware=debug").is_ok());
        assert!(create_env_filter("kaze=notalevel").is_err());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::REQUEST_ID, "request_id");
        assert_eq!(fields::HTTP_STATUS, "http.status_code");
    }
}
