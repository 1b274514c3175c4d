//! Configuration section types.

use serde::{Deserialize, Serialize};

/// HTTP listener settings.
///
/// # Example
///
/// ```
/// use kaze_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.shutdown_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, e.g. `0.0.0.0:8657`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// How long to wait for open connections on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Marks every request as secure. Set when TLS is terminated in front
    /// of the server.
    #[serde(default)]
    pub https: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            https: false,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8657".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Matching behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Require the static segments of a dynamic pattern to match and bind
    /// params by position. Off by default.
    #[serde(default)]
    pub strict_static_prefix: bool,

    /// Strip a trailing `/` from non-root request paths before matching.
    #[serde(default = "default_true")]
    pub strip_trailing_slash: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strict_static_prefix: false,
            strip_trailing_slash: true,
        }
    }
}

/// File-system route discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileRouterConfig {
    /// Load routes from `root` at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Routes directory.
    #[serde(default = "default_routes_root")]
    pub root: String,

    /// Rebuild lazy route modules on every request.
    #[serde(default = "default_true")]
    pub lazy_bypass_cache: bool,
}

impl Default for FileRouterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: default_routes_root(),
            lazy_bypass_cache: true,
        }
    }
}

fn default_routes_root() -> String {
    "routes".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Colored output for the pretty format.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            ansi_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Address the exporter listens on.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Observability settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name attached to log lines.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "kaze".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.http_addr, "0.0.0.0:8657");
        assert!(!server.https);

        let router = RouterConfig::default();
        assert!(!router.strict_static_prefix);
        assert!(router.strip_trailing_slash);

        let files = FileRouterConfig::default();
        assert_eq!(files.root, "routes");
        assert!(files.lazy_bypass_cache);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let router: RouterConfig = toml::from_str("strict_static_prefix = true").unwrap();
        assert!(router.strict_static_prefix);
        assert!(router.strip_trailing_slash);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str("port = 80");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_names() {
        let logging: LoggingConfig = serde_json::from_str(r#"{"format":"pretty"}"#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
    }
}
