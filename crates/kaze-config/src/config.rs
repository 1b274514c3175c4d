//! The root configuration type and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, FileRouterConfig, LogFormat, RouterConfig, ServerConfig, TelemetryConfigSection};

/// Complete Kaze configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use kaze_config::KazeConfig;
///
/// let config = KazeConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8657");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct KazeConfig {
    /// Listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Matching behaviour.
    #[serde(default)]
    pub router: RouterConfig,

    /// File-system routes.
    #[serde(default)]
    pub file_router: FileRouterConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl KazeConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use kaze_config::{KazeConfig, RouterConfig};
    ///
    /// let config = KazeConfig::builder()
    ///     .router(RouterConfig {
    ///         strict_static_prefix: true,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.router.strict_static_prefix);
    /// ```
    #[must_use]
    pub fn builder() -> KazeConfigBuilder {
        KazeConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the server address is not a socket address
    /// - metrics are enabled and their address is not a socket address
    /// - the log level is empty
    /// - file routes are enabled with an empty root
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let metrics = &self.telemetry.metrics;
        if metrics.enabled && metrics.addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", metrics.addr),
            ));
        }

        if self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("telemetry.logging.level", "must not be empty"));
        }

        if self.file_router.enabled && self.file_router.root.trim().is_empty() {
            return Err(ConfigError::invalid_value("file_router.root", "must not be empty"));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs.
    ///
    /// # Example
    ///
    /// ```
    /// use kaze_config::KazeConfig;
    ///
    /// let config = KazeConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8657".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config
    }

    /// Production preset: JSON logs, metrics on, lazy modules cached.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.metrics.enabled = true;
        config.file_router.lazy_bypass_cache = false;
        config
    }
}

/// Builder for [`KazeConfig`].
#[derive(Debug, Default)]
pub struct KazeConfigBuilder {
    server: Option<ServerConfig>,
    router: Option<RouterConfig>,
    file_router: Option<FileRouterConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl KazeConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the router section.
    #[must_use]
    pub fn router(mut self, router: RouterConfig) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the file router section.
    #[must_use]
    pub fn file_router(mut self, file_router: FileRouterConfig) -> Self {
        self.file_router = Some(file_router);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> KazeConfig {
        KazeConfig {
            server: self.server.unwrap_or_default(),
            router: self.router.unwrap_or_default(),
            file_router: self.file_router.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<KazeConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
