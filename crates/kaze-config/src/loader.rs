//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, KazeConfig, LogFormat};

/// Default environment prefix.
pub const DEFAULT_ENV_PREFIX: &str = "KAZE";

/// Loads a [`KazeConfig`] in layers, later layers overriding earlier ones:
///
/// 1. defaults or a preset
/// 2. a TOML or JSON file (replaces the whole config; missing fields fall
///    back to their defaults)
/// 3. `PREFIX__SECTION__KEY` environment variables
///
/// # Example
///
/// ```no_run
/// use kaze_config::ConfigLoader;
///
/// # fn main() -> Result<(), kaze_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("kaze.toml")?
///     .with_env_prefix("KAZE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: KazeConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KazeConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = KazeConfig::default();
        self
    }

    /// Start from [`KazeConfig::development`].
    ///
    /// ```
    /// use kaze_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = KazeConfig::development();
        self
    }

    /// Start from [`KazeConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = KazeConfig::production();
        self
    }

    /// Load a `.toml` or `.json` file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// has an unknown extension, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration text in the given format (`toml` or `json`).
    ///
    /// ```
    /// use kaze_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[router]\nstrict_static_prefix = true", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert!(config.router.strict_static_prefix);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enable `PREFIX__SECTION__KEY` overrides, e.g.
    /// `KAZE__SERVER__HTTP_ADDR=127.0.0.1:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory or its
    /// parents. A missing file is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<KazeConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration as loaded so far, without environment
    /// overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> KazeConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "HTTPS"] => config.server.https = bool_var(key, value)?,

            ["ROUTER", "STRICT_STATIC_PREFIX"] => config.router.strict_static_prefix = bool_var(key, value)?,
            ["ROUTER", "STRIP_TRAILING_SLASH"] => config.router.strip_trailing_slash = bool_var(key, value)?,

            ["FILE_ROUTER", "ENABLED"] => config.file_router.enabled = bool_var(key, value)?,
            ["FILE_ROUTER", "ROOT"] => config.file_router.root = value.to_string(),
            ["FILE_ROUTER", "LAZY_BYPASS_CACHE"] => config.file_router.lazy_bypass_cache = bool_var(key, value)?,

            ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
            ["TELEMETRY", "LOGGING", "ENABLED"] => config.telemetry.logging.enabled = bool_var(key, value)?,
            ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["TELEMETRY", "LOGGING", "ANSI_ENABLED"] => {
                config.telemetry.logging.ansi_enabled = bool_var(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => config.telemetry.metrics.enabled = bool_var(key, value)?,
            ["TELEMETRY", "METRICS", "ADDR"] => config.telemetry.metrics.addr = value.to_string(),

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<KazeConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
