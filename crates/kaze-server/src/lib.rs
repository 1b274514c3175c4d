//! # Kaze Server
//!
//! The [`Kaze`] application builder and its HTTP/1 server.
//!
//! ```no_run
//! use kaze_core::handler_fn;
//! use kaze_server::Kaze;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kaze_server::ServerError> {
//!     let mut app = Kaze::from_env()?;
//!     kaze_telemetry::init_telemetry(&app.config().telemetry)?;
//!
//!     app.get("/", [handler_fn(|ctx, _next| Box::pin(async move { ctx.send("ok") }))]);
//!     app.serve().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/kaze-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod server;
mod service;
mod shutdown;

pub use app::{Kaze, DEFAULT_CONFIG_FILE};
pub use error::ServerError;
pub use server::Server;
pub use service::KazeService;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
