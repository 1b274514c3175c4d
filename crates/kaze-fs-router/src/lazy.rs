//! Routes under `@name` directories.

use std::sync::Arc;

use kaze_core::{BoxFuture, BoxedHandler, KazeResult, LazyRoute};
use kaze_router::HttpMethod;

use crate::module::ModuleResolver;

/// Resolves a route module (and its sibling middleware module) on every
/// request.
///
/// A failure here reaches the general error handler of the request that
/// triggered it. A module without an export for the request's method
/// resolves to `None`, so the dispatcher can try the catch-all route.
pub(crate) struct LazyModuleRoute {
    pub(crate) resolver: Arc<dyn ModuleResolver>,
    pub(crate) route_key: String,
    pub(crate) middleware_key: Option<String>,
    pub(crate) bypass_cache: bool,
}

impl LazyRoute for LazyModuleRoute {
    fn resolve(&self, method: HttpMethod) -> BoxFuture<'_, KazeResult<Option<Vec<BoxedHandler>>>> {
        Box::pin(async move {
            let module = self.resolver.load_route(&self.route_key, self.bypass_cache).await?;
            let Some(handler) = module.handler_for(method).cloned() else {
                tracing::debug!(module = %self.route_key, method = %method, "lazy route has no export");
                return Ok(None);
            };

            let mut handlers = Vec::new();
            if let Some(key) = &self.middleware_key {
                let module = self.resolver.load_middleware(key, self.bypass_cache).await?;
                handlers.extend(module.handlers().iter().cloned());
            }
            handlers.push(handler);

            tracing::debug!(
                module = %self.route_key,
                method = %method,
                fresh = self.bypass_cache,
                "resolved lazy route"
            );
            Ok(Some(handlers))
        })
    }

    fn describe(&self) -> String {
        self.route_key.clone()
    }
}
