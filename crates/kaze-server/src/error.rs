//! Server error types.

use std::net::SocketAddr;

use kaze_config::ConfigError;
use kaze_core::KazeError;
use kaze_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while building or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be parsed.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The address as given.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Route setup failed (e.g. the routes directory is unreadable).
    #[error(transparent)]
    Routes(#[from] KazeError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub(crate) fn invalid_address(addr: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidAddress {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ServerError::invalid_address("nowhere", "invalid socket address syntax");
        assert_eq!(err.to_string(), "invalid address 'nowhere': invalid socket address syntax");

        let err = ServerError::from(KazeError::route_not_found("/x"));
        assert_eq!(err.to_string(), "Route '/x' not found.");
    }
}
