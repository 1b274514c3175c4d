//! Typed configuration for Kaze.
//!
//! - TOML and JSON files, strict about unknown fields
//! - `KAZE__SECTION__KEY` environment overrides
//! - defaults, presets and validation
//!
//! # Example
//!
//! ```no_run
//! use kaze_config::ConfigLoader;
//!
//! # fn main() -> Result<(), kaze_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("kaze.toml")?
//!     .with_env_prefix("KAZE")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8657"
//! shutdown_timeout_secs = 30
//! https = false
//!
//! [router]
//! strict_static_prefix = false
//! strip_trailing_slash = true
//!
//! [file_router]
//! enabled = true
//! root = "routes"
//! lazy_bypass_cache = true
//!
//! [telemetry]
//! service_name = "my-service"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![doc(html_root_url = "https://docs.rs/kaze-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{KazeConfig, KazeConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    FileRouterConfig, LogFormat, LoggingConfig, MetricsConfig, RouterConfig, ServerConfig,
    TelemetryConfigSection,
};
