//! Route and middleware modules and how they are resolved.
//!
//! A route directory holds a `route.*` file and, optionally, a
//! `middleware.*` file. The loader never executes those files itself; it
//! asks a [`ModuleResolver`] for the module registered under the file's
//! root-relative path without extension, e.g. `posts/[id]/route`.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use kaze_core::{BoxFuture, BoxedHandler, KazeError, KazeResult};
use kaze_router::HttpMethod;
use parking_lot::RwLock;

/// Named exports of a route module.
///
/// Export names are HTTP method names in any case. `default` is ignored,
/// as are names that are not methods.
#[derive(Clone, Default)]
pub struct RouteModule {
    exports: IndexMap<String, BoxedHandler>,
}

impl std::fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteModule")
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RouteModule {
    /// Creates an empty module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an export.
    #[must_use]
    pub fn export(mut self, name: impl Into<String>, handler: BoxedHandler) -> Self {
        self.exports.insert(name.into(), handler);
        self
    }

    /// Export names in declaration order.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// The handler exported for `method`, matching names case-insensitively.
    #[must_use]
    pub fn handler_for(&self, method: HttpMethod) -> Option<&BoxedHandler> {
        self.exports
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(method.as_str()))
            .map(|(_, handler)| handler)
    }

    /// Every export that names an HTTP method.
    ///
    /// Returns the usable handlers and the names that were skipped
    /// (`default` is dropped without being reported).
    #[must_use]
    pub fn method_handlers(&self) -> (Vec<(HttpMethod, BoxedHandler)>, Vec<String>) {
        let mut handlers = Vec::new();
        let mut skipped = Vec::new();
        for (name, handler) in &self.exports {
            if name == "default" {
                continue;
            }
            match HttpMethod::parse_ignore_case(name) {
                Ok(method) => handlers.push((method, Arc::clone(handler))),
                Err(_) => skipped.push(name.clone()),
            }
        }
        (handlers, skipped)
    }
}

/// Ordered handlers exported by a middleware module.
#[derive(Clone, Default)]
pub struct MiddlewareModule {
    handlers: Vec<BoxedHandler>,
}

impl std::fmt::Debug for MiddlewareModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

impl MiddlewareModule {
    /// Creates a module from handlers in export order.
    #[must_use]
    pub fn new(handlers: impl IntoIterator<Item = BoxedHandler>) -> Self {
        Self {
            handlers: handlers.into_iter().collect(),
        }
    }

    /// The handlers in export order.
    #[must_use]
    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }
}

/// Loads modules by their root-relative key.
///
/// `fresh = true` asks for the module to be rebuilt instead of served from
/// a cache. Lazy routes use it on every request when the loader is
/// configured to bypass the cache.
pub trait ModuleResolver: Send + Sync + 'static {
    /// Loads a route module.
    fn load_route<'a>(&'a self, key: &'a str, fresh: bool) -> BoxFuture<'a, KazeResult<Arc<RouteModule>>>;

    /// Loads a middleware module.
    fn load_middleware<'a>(
        &'a self,
        key: &'a str,
        fresh: bool,
    ) -> BoxFuture<'a, KazeResult<Arc<MiddlewareModule>>>;
}

type RouteFactory = Arc<dyn Fn() -> KazeResult<RouteModule> + Send + Sync>;
type MiddlewareFactory = Arc<dyn Fn() -> KazeResult<MiddlewareModule> + Send + Sync>;

/// In-process [`ModuleResolver`] backed by registered factories.
///
/// # Example
///
/// ```
/// use kaze_core::handler_fn;
/// use kaze_fs_router::{ModuleRegistry, RouteModule};
///
/// let registry = ModuleRegistry::new();
/// registry.register_route("posts/[id]/route", || {
///     Ok(RouteModule::new().export(
///         "GET",
///         handler_fn(|ctx, _next| Box::pin(async move { ctx.send("post") })),
///     ))
/// });
/// assert!(registry.has_route("posts/[id]/route"));
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    route_factories: RwLock<HashMap<String, RouteFactory>>,
    middleware_factories: RwLock<HashMap<String, MiddlewareFactory>>,
    routes: RwLock<HashMap<String, Arc<RouteModule>>>,
    middlewares: RwLock<HashMap<String, Arc<MiddlewareModule>>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("routes", &self.route_factories.read().len())
            .field("middlewares", &self.middleware_factories.read().len())
            .finish()
    }
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route module factory, replacing any earlier one and
    /// dropping its cached module.
    pub fn register_route<F>(&self, key: impl Into<String>, factory: F) -> &Self
    where
        F: Fn() -> KazeResult<RouteModule> + Send + Sync + 'static,
    {
        let key = key.into();
        self.routes.write().remove(&key);
        tracing::debug!(module = %key, "registered route module");
        self.route_factories.write().insert(key, Arc::new(factory));
        self
    }

    /// Registers a middleware module factory.
    pub fn register_middleware<F>(&self, key: impl Into<String>, factory: F) -> &Self
    where
        F: Fn() -> KazeResult<MiddlewareModule> + Send + Sync + 'static,
    {
        let key = key.into();
        self.middlewares.write().remove(&key);
        tracing::debug!(module = %key, "registered middleware module");
        self.middleware_factories.write().insert(key, Arc::new(factory));
        self
    }

    /// Returns `true` if a route module is registered under `key`.
    #[must_use]
    pub fn has_route(&self, key: &str) -> bool {
        self.route_factories.read().contains_key(key)
    }

    /// Returns `true` if a middleware module is registered under `key`.
    #[must_use]
    pub fn has_middleware(&self, key: &str) -> bool {
        self.middleware_factories.read().contains_key(key)
    }

    /// Drops every cached module; factories stay registered.
    pub fn clear_cache(&self) {
        self.routes.write().clear();
        self.middlewares.write().clear();
    }

    fn route(&self, key: &str, fresh: bool) -> KazeResult<Arc<RouteModule>> {
        if !fresh {
            if let Some(module) = self.routes.read().get(key) {
                return Ok(Arc::clone(module));
            }
        }
        let factory = self
            .route_factories
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KazeError::module(key, "no route module registered"))?;
        let module = Arc::new(factory()?);
        self.routes.write().insert(key.to_string(), Arc::clone(&module));
        Ok(module)
    }

    fn middleware(&self, key: &str, fresh: bool) -> KazeResult<Arc<MiddlewareModule>> {
        if !fresh {
            if let Some(module) = self.middlewares.read().get(key) {
                return Ok(Arc::clone(module));
            }
        }
        let factory = self
            .middleware_factories
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KazeError::module(key, "no middleware module registered"))?;
        let module = Arc::new(factory()?);
        self.middlewares
            .write()
            .insert(key.to_string(), Arc::clone(&module));
        Ok(module)
    }
}

impl ModuleResolver for ModuleRegistry {
    fn load_route<'a>(&'a self, key: &'a str, fresh: bool) -> BoxFuture<'a, KazeResult<Arc<RouteModule>>> {
        Box::pin(async move { self.route(key, fresh) })
    }

    fn load_middleware<'a>(
        &'a self,
        key: &'a str,
        fresh: bool,
    ) -> BoxFuture<'a, KazeResult<Arc<MiddlewareModule>>> {
        Box::pin(async move { self.middleware(key, fresh) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaze_core::named_handler_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handler(name: &'static str) -> BoxedHandler {
        named_handler_fn(name, |ctx, _next| Box::pin(async move { ctx.send("ok") }))
    }

    #[test]
    fn test_handler_for_is_case_insensitive() {
        let module = RouteModule::new()
            .export("get", handler("get"))
            .export("Post", handler("post"));

        assert_eq!(module.handler_for(HttpMethod::Get).unwrap().name(), "get");
        assert_eq!(module.handler_for(HttpMethod::Post).unwrap().name(), "post");
        assert!(module.handler_for(HttpMethod::Delete).is_none());
    }

    #[test]
    fn test_method_handlers_skip_unknown() {
        let module = RouteModule::new()
            .export("GET", handler("get"))
            .export("default", handler("default"))
            .export("helper", handler("helper"));

        let (handlers, skipped) = module.method_handlers();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].0, HttpMethod::Get);
        assert_eq!(skipped, vec!["helper".to_string()]);
    }

    #[tokio::test]
    async fn test_registry_caches_until_fresh() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let registry = ModuleRegistry::new();
        registry.register_route("route", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(RouteModule::new().export("GET", handler("get")))
        });

        registry.load_route("route", false).await.unwrap();
        registry.load_route("route", false).await.unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        registry.load_route("route", true).await.unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);

        registry.clear_cache();
        registry.load_route("route", false).await.unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_module() {
        let registry = ModuleRegistry::new();
        let err = registry.load_route("nope/route", false).await.unwrap_err();
        assert!(matches!(err, KazeError::Module { ref path, .. } if path == "nope/route"));

        let err = registry.load_middleware("nope/middleware", false).await.unwrap_err();
        assert!(matches!(err, KazeError::Module { .. }));
    }

    #[tokio::test]
    async fn test_factory_failure_propagates() {
        let registry = ModuleRegistry::new();
        registry.register_middleware("middleware", || Err(KazeError::internal("syntax error")));

        let err = registry.load_middleware("middleware", false).await.unwrap_err();
        assert!(err.to_string().contains("syntax error"));
        assert!(registry.has_middleware("middleware"));
    }
}
