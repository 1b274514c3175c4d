//! The dispatch pipeline.
//!
//! A [`Dispatcher`] owns the application router and drives a single request
//! from matching to a written response:
//!
//! ```text
//! Matching ─► Executing ─► Responded
//!    │            │
//!    └► NotFound  └► Errored ─► Responded
//! ```
//!
//! The flattened chain is the router-level (global) middlewares in
//! registration order followed by the route's chain. Handler failures
//! travel back through `next.run` as `Err` and are classified here, at the
//! only place they are caught:
//!
//! - a validation failure goes to the validation handler,
//! - a second response write is logged and counted, and the first response
//!   is kept,
//! - anything else goes to the error handler.
//!
//! Every request ends with a written response. A chain that finishes
//! without writing one produces a 500.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use kaze_core::{
    BoxedHandler, Context, HandlerResult, KazeError, Next, Renderer, ResponseState, Router,
};
use kaze_router::{HttpMethod, WILDCARD_PARAM};

use crate::failure::{
    write_error_page, BoxedErrorHandler, BoxedValidationHandler, DefaultErrorHandler,
    DefaultValidationHandler,
};

/// Drives requests through the router and handler chains.
///
/// # Example
///
/// ```
/// use http::Method;
/// use kaze_core::{handler_fn, Context, MapRouter};
/// use kaze_middleware::Dispatcher;
///
/// # tokio_test::block_on(async {
/// let mut router = MapRouter::new();
/// router.get("/:id", [handler_fn(|ctx, _next| {
///     Box::pin(async move {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         ctx.send(id)
///     })
/// })]);
///
/// let dispatcher = Dispatcher::new(router);
/// let response = dispatcher.handle(Context::new(Method::GET, "/5")).await;
/// assert_eq!(response.body().as_ref(), b"5");
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<dyn Router>,
    error_handler: BoxedErrorHandler,
    validation_handler: BoxedValidationHandler,
    renderer: Arc<Renderer>,
    dependencies: Option<Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("renderer", &self.renderer)
            .field("dependencies", &self.dependencies.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default error and validation handlers.
    #[must_use]
    pub fn new(router: impl Router + 'static) -> Self {
        Self {
            router: Arc::new(router),
            error_handler: Arc::new(DefaultErrorHandler),
            validation_handler: Arc::new(DefaultValidationHandler),
            renderer: Arc::new(Renderer::default()),
            dependencies: None,
        }
    }

    /// Replaces the general error handler.
    #[must_use]
    pub fn with_error_handler(mut self, handler: BoxedErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    /// Replaces the validation-failure handler.
    #[must_use]
    pub fn with_validation_handler(mut self, handler: BoxedValidationHandler) -> Self {
        self.validation_handler = handler;
        self
    }

    /// Sets the renderer handed to every request context.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Sets the shared dependencies handed to every request context.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    /// Builds a fresh context for an incoming request.
    #[must_use]
    pub fn context_for(&self, request: http::Request<Bytes>, secure: bool) -> Context {
        Context::from_request(request)
            .with_secure(secure)
            .with_renderer(Arc::clone(&self.renderer))
            .with_dependencies(self.dependencies.clone())
    }

    /// Dispatches `ctx` and returns the written response.
    pub async fn handle(&self, mut ctx: Context) -> ResponseState {
        self.dispatch(&mut ctx).await;
        ctx.take_response()
    }

    /// Dispatches a request in place.
    ///
    /// On return the context's response has been written exactly once.
    pub async fn dispatch(&self, ctx: &mut Context) {
        tracing::debug!(
            request_id = %ctx.request_id(),
            http.method = %ctx.method(),
            http.path = %ctx.path(),
            "dispatching request"
        );

        if let Err(err) = self.execute(ctx).await {
            self.handle_failure(ctx, err).await;
        }

        if !ctx.response().is_sent() {
            tracing::warn!(
                request_id = %ctx.request_id(),
                http.path = %ctx.path(),
                "handler chain completed without a response"
            );
            ctx.status(StatusCode::INTERNAL_SERVER_ERROR);
            if let Err(err) = ctx.send("No response was sent for this request.") {
                tracing::error!(error = %err, "failed to write fallback response");
            }
        }

        let status = ctx.response().status();
        let elapsed = ctx.elapsed();
        kaze_telemetry::metrics::record_request(ctx.method().as_str(), status.as_u16(), elapsed);

        tracing::debug!(
            request_id = %ctx.request_id(),
            http.status_code = status.as_u16(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "request completed"
        );
    }

    async fn execute(&self, ctx: &mut Context) -> HandlerResult {
        let method = HttpMethod::try_from(ctx.method())
            .map_err(|_| KazeError::route_not_found(ctx.path()))?;

        let matched = self.router.fetch_handlers(ctx.path(), method)?;
        let route = matched.pattern();
        tracing::debug!(request_id = %ctx.request_id(), route, "route matched");

        let globals = self.router.fetch_middlewares();
        let mut chain: Vec<BoxedHandler> = globals.to_vec();

        let (endpoint, params) = matched.into_parts();
        if endpoint.collect_into(method, &mut chain).await? {
            ctx.set_params(params);
        } else {
            // A lazy route without an export for this method falls through
            // to the catch-all.
            let catch_all = self
                .router
                .fetch_catch_all(method)
                .filter(|_| route != WILDCARD_PARAM)
                .ok_or_else(|| KazeError::route_not_found(ctx.path()))?;
            tracing::debug!(request_id = %ctx.request_id(), route, "no handler for method, using catch-all");
            let (fallback, _) = catch_all.into_parts();
            if !fallback.collect_into(method, &mut chain).await? {
                return Err(KazeError::route_not_found(ctx.path()));
            }
        }

        Next::new(&chain).run(ctx).await
    }

    async fn handle_failure(&self, ctx: &mut Context, err: KazeError) {
        if err.is_double_response() {
            tracing::error!(
                request_id = %ctx.request_id(),
                http.path = %ctx.path(),
                handler = ctx.cursor(),
                "{err}"
            );
            kaze_telemetry::metrics::record_double_response();
            return;
        }

        if ctx.response().is_sent() {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %err.describe(),
                "handler failed after the response was sent"
            );
            return;
        }

        let outcome = match err {
            KazeError::Validation(errors) => {
                tracing::debug!(request_id = %ctx.request_id(), fields = errors.len(), "validation failed");
                self.validation_handler.handle(ctx, errors).await
            }
            other => {
                if other.status_code().is_server_error() {
                    tracing::error!(request_id = %ctx.request_id(), error = %other.describe(), "request failed");
                } else {
                    tracing::warn!(request_id = %ctx.request_id(), error = %other, "request rejected");
                }
                self.error_handler.handle(ctx, other).await
            }
        };

        if let Err(handler_err) = outcome {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %handler_err.describe(),
                "failure handler returned an error"
            );
            if !ctx.response().is_sent() {
                if let Err(err) = write_error_page(ctx, &handler_err) {
                    tracing::error!(error = %err, "failed to write error page");
                }
            }
        }
    }
}
