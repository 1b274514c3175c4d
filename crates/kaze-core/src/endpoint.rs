//! What a route resolves to.

use std::sync::Arc;

use kaze_router::HttpMethod;

use crate::error::KazeResult;
use crate::handler::{BoxFuture, BoxedHandler, HandlerChain};

/// A route whose handlers are looked up when a request arrives.
///
/// Used by the file router for `@name` directories: the module behind the
/// route is resolved again for every request instead of once at startup.
pub trait LazyRoute: Send + Sync + 'static {
    /// Resolves the handlers for one request, or `None` if the route has
    /// nothing for `method`.
    fn resolve(&self, method: HttpMethod) -> BoxFuture<'_, KazeResult<Option<Vec<BoxedHandler>>>>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// The value stored in the route table for a `(method, pattern)` key.
///
/// `chain` runs first. For a lazy endpoint, the handlers resolved at
/// request time are appended after it.
#[derive(Clone)]
pub struct Endpoint {
    chain: HandlerChain,
    lazy: Option<Arc<dyn LazyRoute>>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("handlers", &self.chain.len())
            .field("lazy", &self.lazy.as_ref().map(|l| l.describe()))
            .finish()
    }
}

impl Endpoint {
    /// An endpoint with a fixed chain.
    #[must_use]
    pub fn new(chain: impl IntoIterator<Item = BoxedHandler>) -> Self {
        Self {
            chain: chain.into_iter().collect(),
            lazy: None,
        }
    }

    /// An endpoint resolved per request, preceded by `chain`.
    #[must_use]
    pub fn lazy(chain: impl IntoIterator<Item = BoxedHandler>, route: Arc<dyn LazyRoute>) -> Self {
        Self {
            chain: chain.into_iter().collect(),
            lazy: Some(route),
        }
    }

    /// The fixed part of the chain.
    #[must_use]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// The lazy part, if any.
    #[must_use]
    pub fn lazy_route(&self) -> Option<&Arc<dyn LazyRoute>> {
        self.lazy.as_ref()
    }

    /// Returns `true` if handlers are resolved per request.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.lazy.is_some()
    }

    /// Returns a copy with `handlers` placed in front of the chain.
    #[must_use]
    pub fn prepend(&self, handlers: &[BoxedHandler]) -> Self {
        if handlers.is_empty() {
            return self.clone();
        }
        Self {
            chain: handlers.iter().chain(self.chain.iter()).cloned().collect(),
            lazy: self.lazy.clone(),
        }
    }

    /// Appends the full handler list for one request to `out`.
    ///
    /// Returns `false`, leaving `out` untouched, when a lazy route has no
    /// handler for `method`.
    pub async fn collect_into(&self, method: HttpMethod, out: &mut Vec<BoxedHandler>) -> KazeResult<bool> {
        let resolved = match &self.lazy {
            Some(lazy) => match lazy.resolve(method).await? {
                Some(handlers) => handlers,
                None => return Ok(false),
            },
            None => Vec::new(),
        };
        out.extend(self.chain.iter().cloned());
        out.extend(resolved);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KazeError;
    use crate::handler::named_handler_fn;

    fn named(name: &'static str) -> BoxedHandler {
        named_handler_fn(name, |ctx, next| Box::pin(async move { next.run(ctx).await }))
    }

    struct Fixed(Vec<BoxedHandler>);

    impl LazyRoute for Fixed {
        fn resolve(&self, method: HttpMethod) -> BoxFuture<'_, KazeResult<Option<Vec<BoxedHandler>>>> {
            let handlers = (method == HttpMethod::Get).then(|| self.0.clone());
            Box::pin(async move { Ok(handlers) })
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    struct Broken;

    impl LazyRoute for Broken {
        fn resolve(&self, _method: HttpMethod) -> BoxFuture<'_, KazeResult<Option<Vec<BoxedHandler>>>> {
            Box::pin(async { Err(KazeError::module("@admin/route", "not registered")) })
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn names(handlers: &[BoxedHandler]) -> Vec<&str> {
        handlers.iter().map(|h| h.name()).collect()
    }

    #[test]
    fn test_prepend() {
        let endpoint = Endpoint::new([named("handler")]);
        let grouped = endpoint.prepend(&[named("auth"), named("audit")]);

        assert_eq!(names(grouped.chain()), vec!["auth", "audit", "handler"]);
        assert_eq!(names(endpoint.chain()), vec!["handler"]);
    }

    #[tokio::test]
    async fn test_lazy_collect() {
        let endpoint = Endpoint::lazy([named("mw")], Arc::new(Fixed(vec![named("get")])));
        assert!(endpoint.is_lazy());

        let mut out = Vec::new();
        assert!(endpoint.collect_into(HttpMethod::Get, &mut out).await.unwrap());
        assert_eq!(names(&out), vec!["mw", "get"]);
    }

    #[tokio::test]
    async fn test_lazy_without_export_collects_nothing() {
        let endpoint = Endpoint::lazy([named("mw")], Arc::new(Fixed(vec![named("get")])));

        let mut out = Vec::new();
        assert!(!endpoint.collect_into(HttpMethod::Delete, &mut out).await.unwrap());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_lazy_failure_surfaces() {
        let endpoint = Endpoint::lazy([], Arc::new(Broken));
        let mut out = Vec::new();
        let err = endpoint.collect_into(HttpMethod::Get, &mut out).await.unwrap_err();
        assert!(matches!(err, KazeError::Module { .. }));
    }
}
