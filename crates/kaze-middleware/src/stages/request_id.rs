//! Request ID middleware.
//!
//! Assigns the request a UUID v7 identifier, or adopts the one from the
//! `X-Request-ID` header when configured to trust it, and echoes it on the
//! response so clients can correlate their requests with server logs.

use kaze_core::{BoxFuture, Context, Handler, HandlerResult, Next, RequestId};
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or propagates request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Always generates a new ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts a valid incoming `X-Request-ID`, generating one otherwise.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { trust_incoming: true }
    }

    fn extract(&self, ctx: &Context) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        ctx.header_str(REQUEST_ID_HEADER)
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Handler for RequestIdMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let request_id = self.extract(ctx).unwrap_or_default();
            ctx.set_request_id(request_id);
            ctx.header(REQUEST_ID_HEADER, &request_id.to_string())?;
            next.run(ctx).await
        })
    }

    fn name(&self) -> &str {
        "request_id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method};
    use kaze_core::{handler_fn, BoxedHandler};
    use std::sync::Arc;

    fn chain(stage: RequestIdMiddleware) -> Vec<BoxedHandler> {
        vec![
            Arc::new(stage),
            handler_fn(|ctx, _next| Box::pin(async move { ctx.send("OK") })),
        ]
    }

    fn context_with_id(id: &str) -> Context {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        Context::new(Method::GET, "/test").with_headers(headers)
    }

    fn response_id(ctx: &Context) -> String {
        ctx.response().headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let handlers = chain(RequestIdMiddleware::new());
        let mut ctx = Context::new(Method::GET, "/test");

        Next::new(&handlers).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.request_id().to_string(), response_id(&ctx));
    }

    #[tokio::test]
    async fn test_ignores_incoming_id_when_not_trusted() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let handlers = chain(RequestIdMiddleware::new());
        let mut ctx = context_with_id(incoming);

        Next::new(&handlers).run(&mut ctx).await.unwrap();

        assert_ne!(response_id(&ctx), incoming);
    }

    #[tokio::test]
    async fn test_uses_incoming_id_when_trusted() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let handlers = chain(RequestIdMiddleware::trust_incoming());
        let mut ctx = context_with_id(incoming);

        Next::new(&handlers).run(&mut ctx).await.unwrap();

        assert_eq!(response_id(&ctx), incoming);
        assert_eq!(ctx.request_id().to_string(), incoming);
    }

    #[tokio::test]
    async fn test_invalid_incoming_id_replaced() {
        let handlers = chain(RequestIdMiddleware::trust_incoming());
        let mut ctx = context_with_id("not-a-valid-uuid");

        Next::new(&handlers).run(&mut ctx).await.unwrap();

        let id = response_id(&ctx);
        assert_ne!(id, "not-a-valid-uuid");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_name() {
        assert_eq!(RequestIdMiddleware::new().name(), "request_id");
    }
}
