//! Cookie parsing middleware.

use http::header::COOKIE;
use kaze_core::{BoxFuture, Context, Cookies, Handler, HandlerResult, Next};

/// Populates [`Context::cookies`] from the `Cookie` request headers.
///
/// Several `Cookie` headers are merged; a later value for the same name
/// replaces an earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieParser;

impl Handler for CookieParser {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let joined = ctx
                .headers()
                .get_all(COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                ctx.set_cookies(Cookies::parse(&joined));
            }
            next.run(ctx).await
        })
    }

    fn name(&self) -> &str {
        "cookie_parser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method};
    use kaze_core::BoxedHandler;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_parses_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("session=abc; theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("lang=en"));
        let mut ctx = Context::new(Method::GET, "/").with_headers(headers);

        let chain: Vec<BoxedHandler> = vec![Arc::new(CookieParser)];
        Next::new(&chain).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.cookies().get("session"), Some("abc"));
        assert_eq!(ctx.cookies().get("theme"), Some("dark"));
        assert_eq!(ctx.cookies().get("lang"), Some("en"));
        assert_eq!(ctx.cookies().len(), 3);
    }

    #[tokio::test]
    async fn test_no_cookie_header() {
        let mut ctx = Context::new(Method::GET, "/");
        let chain: Vec<BoxedHandler> = vec![Arc::new(CookieParser)];
        Next::new(&chain).run(&mut ctx).await.unwrap();
        assert!(ctx.cookies().is_empty());
    }
}
