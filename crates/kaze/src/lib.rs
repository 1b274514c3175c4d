//! # Kaze
//!
//! An in-process HTTP router and middleware dispatch engine.
//!
//! - Method-keyed route tables with exact, `:param` and wildcard patterns
//! - Ordered middleware chains driven by an explicit `next` cursor
//! - File-system routes discovered from a `routes/` tree
//! - Pluggable error, validation and rendering hooks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kaze::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = Kaze::from_env()?;
//!     init_telemetry(&app.config().telemetry)?;
//!
//!     app.middlewares([std::sync::Arc::new(CookieParser) as BoxedHandler]);
//!     app.get("/users/:id", [handler_fn(|ctx, _next| {
//!         Box::pin(async move {
//!             let id = ctx.param("id").unwrap_or_default().to_string();
//!             ctx.json(&serde_json::json!({ "id": id }))
//!         })
//!     })]);
//!
//!     app.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → normalise path → global middlewares → route middlewares → handler
//!                                                                        ↓
//! Response ← error / validation handler (on failure) ←───────────────────┘
//! ```

#![forbid(unsafe_code)]

pub use kaze_config as config;
pub use kaze_core as core;
pub use kaze_fs_router as fs_router;
pub use kaze_middleware as middleware;
pub use kaze_router as router;
pub use kaze_server as server;
pub use kaze_telemetry as telemetry;

pub use kaze_server::Kaze;

/// Common imports.
///
/// ```rust
/// use kaze::prelude::*;
/// ```
pub mod prelude {
    pub use kaze_core::{
        handler_fn, named_handler_fn, BoxFuture, BoxedHandler, Context, CookieOptions, Endpoint,
        Handler, HandlerResult, HttpMethod, KazeError, KazeResult, MapRouter, Next, Params,
        RenderEngine, SameSite, ValidationErrors,
    };

    pub use kaze_middleware::stages::{
        params_validate, query_validate, CookieParser, FieldSchema, ObjectSchema,
        RequestIdMiddleware, ValidatedParams, ValidatedQuery,
    };
    pub use kaze_middleware::{
        error_handler_fn, validation_handler_fn, BoxedErrorHandler, BoxedValidationHandler,
        Dispatcher,
    };

    pub use kaze_fs_router::{FileRouteLoader, MiddlewareModule, ModuleRegistry, RouteModule};

    pub use kaze_config::{ConfigLoader, KazeConfig};
    pub use kaze_server::{Kaze, KazeService, ServerError};
    pub use kaze_telemetry::init_telemetry;
}
