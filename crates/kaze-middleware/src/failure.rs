//! Error and validation-failure handlers.
//!
//! Exactly one of these runs for a failing request. Both can be replaced
//! on the [`Dispatcher`](crate::Dispatcher); the defaults below are used
//! otherwise.

use std::sync::Arc;

use http::StatusCode;
use kaze_core::{error_text_to_html, BoxFuture, Context, KazeError, KazeResult, ValidationErrors};

/// Handles every failure that is not a validation failure.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Writes the response for `error`.
    fn handle<'a>(&'a self, ctx: &'a mut Context, error: KazeError) -> BoxFuture<'a, KazeResult<()>>;
}

/// Handles validation failures.
pub trait ValidationHandler: Send + Sync + 'static {
    /// Writes the response for `errors`.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        errors: ValidationErrors,
    ) -> BoxFuture<'a, KazeResult<()>>;
}

/// A shared error handler.
pub type BoxedErrorHandler = Arc<dyn ErrorHandler>;

/// A shared validation handler.
pub type BoxedValidationHandler = Arc<dyn ValidationHandler>;

/// Renders the error description as an HTML page.
///
/// The status is the error's own status code: 404 for a missing route,
/// the carried code for a route error, 500 for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle<'a>(&'a self, ctx: &'a mut Context, error: KazeError) -> BoxFuture<'a, KazeResult<()>> {
        Box::pin(async move { write_error_page(ctx, &error) })
    }
}

/// Sends the field-keyed messages as JSON with status 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidationHandler;

impl ValidationHandler for DefaultValidationHandler {
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        errors: ValidationErrors,
    ) -> BoxFuture<'a, KazeResult<()>> {
        Box::pin(async move {
            ctx.status(StatusCode::BAD_REQUEST);
            ctx.json(&errors)
        })
    }
}

pub(crate) fn write_error_page(ctx: &mut Context, error: &KazeError) -> KazeResult<()> {
    ctx.status(error.status_code());
    ctx.html(error_text_to_html(&error.describe()))
}

struct FnErrorHandler<F>(F);

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: for<'a> Fn(&'a mut Context, KazeError) -> BoxFuture<'a, KazeResult<()>> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, error: KazeError) -> BoxFuture<'a, KazeResult<()>> {
        (self.0)(ctx, error)
    }
}

struct FnValidationHandler<F>(F);

impl<F> ValidationHandler for FnValidationHandler<F>
where
    F: for<'a> Fn(&'a mut Context, ValidationErrors) -> BoxFuture<'a, KazeResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        errors: ValidationErrors,
    ) -> BoxFuture<'a, KazeResult<()>> {
        (self.0)(ctx, errors)
    }
}

/// Wraps a closure as an error handler.
///
/// ```
/// use http::StatusCode;
/// use kaze_middleware::error_handler_fn;
///
/// let handler = error_handler_fn(|ctx, err| {
///     Box::pin(async move {
///         ctx.status(err.status_code());
///         ctx.send(format!("oops: {err}"))
///     })
/// });
/// ```
pub fn error_handler_fn<F>(func: F) -> BoxedErrorHandler
where
    F: for<'a> Fn(&'a mut Context, KazeError) -> BoxFuture<'a, KazeResult<()>> + Send + Sync + 'static,
{
    Arc::new(FnErrorHandler(func))
}

/// Wraps a closure as a validation handler.
pub fn validation_handler_fn<F>(func: F) -> BoxedValidationHandler
where
    F: for<'a> Fn(&'a mut Context, ValidationErrors) -> BoxFuture<'a, KazeResult<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnValidationHandler(func))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use kaze_core::{APPLICATION_JSON, TEXT_HTML};

    #[tokio::test]
    async fn test_default_error_handler_uses_status_code() {
        let mut ctx = Context::new(Method::GET, "/missing");
        DefaultErrorHandler
            .handle(&mut ctx, KazeError::route_not_found("/missing"))
            .await
            .unwrap();

        let response = ctx.response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.content_type(), TEXT_HTML);
        let body = std::str::from_utf8(response.body()).unwrap();
        assert_eq!(body, "RouteNotFound: Route &#39;/missing&#39; not found.");
    }

    #[tokio::test]
    async fn test_default_error_handler_internal_is_500() {
        let mut ctx = Context::new(Method::GET, "/");
        DefaultErrorHandler
            .handle(&mut ctx, KazeError::internal("line one\nline two"))
            .await
            .unwrap();

        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = std::str::from_utf8(ctx.response().body()).unwrap();
        assert!(body.contains("<br/>"));
    }

    #[tokio::test]
    async fn test_default_validation_handler() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "required");

        let mut ctx = Context::new(Method::POST, "/signup");
        DefaultValidationHandler.handle(&mut ctx, errors).await.unwrap();

        assert_eq!(ctx.response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.response().content_type(), APPLICATION_JSON);
        assert_eq!(ctx.response().body().as_ref(), br#"{"email":["required"]}"#);
    }

    #[tokio::test]
    async fn test_closure_handlers() {
        let on_error = error_handler_fn(|ctx, err| {
            Box::pin(async move {
                ctx.status(StatusCode::IM_A_TEAPOT);
                ctx.send(err.kind())
            })
        });
        let mut ctx = Context::new(Method::GET, "/");
        on_error.handle(&mut ctx, KazeError::DoubleResponse).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(ctx.response().body().as_ref(), b"DoubleResponseError");

        let on_invalid = validation_handler_fn(|ctx, errors| {
            Box::pin(async move { ctx.send(format!("{} invalid", errors.len())) })
        });
        let mut ctx = Context::new(Method::GET, "/");
        let mut errors = ValidationErrors::new();
        errors.add("a", "x");
        on_invalid.handle(&mut ctx, errors).await.unwrap();
        assert_eq!(ctx.response().body().as_ref(), b"1 invalid");
    }
}
