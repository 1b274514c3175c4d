//! Registration API over the route table.
//!
//! [`MapRouter`] stores an [`Endpoint`] per `(method, pattern)` in a
//! [`RouteTable`] and keeps an ordered list of router-level middlewares.
//! It is used both as the application's main router and as a sub-router
//! grafted under a prefix with [`MapRouter::route_group`].

use std::sync::Arc;

use kaze_router::{HttpMethod, RouteMatch, RouteTable};

use crate::endpoint::{Endpoint, LazyRoute};
use crate::error::{KazeError, KazeResult};
use crate::handler::BoxedHandler;

/// Joins a group prefix and a child pattern.
///
/// A `/` prefix keeps the child as is, a `/` child becomes the prefix,
/// anything else is concatenated.
///
/// ```
/// use kaze_core::join_group_path;
///
/// assert_eq!(join_group_path("/", "/users"), "/users");
/// assert_eq!(join_group_path("/api", "/"), "/api");
/// assert_eq!(join_group_path("/api", "/users/:id"), "/api/users/:id");
/// ```
#[must_use]
pub fn join_group_path(prefix: &str, pattern: &str) -> String {
    if prefix == "/" {
        pattern.to_string()
    } else if pattern == "/" {
        prefix.to_string()
    } else {
        format!("{prefix}{pattern}")
    }
}

/// Map-backed router.
///
/// # Example
///
/// ```
/// use kaze_core::{handler_fn, MapRouter};
/// use kaze_router::HttpMethod;
///
/// let mut router = MapRouter::new();
/// router.get("/users/:id", [handler_fn(|ctx, _next| {
///     Box::pin(async move {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         ctx.send(id)
///     })
/// })]);
///
/// let matched = router.fetch_handlers("/users/7", HttpMethod::Get).unwrap();
/// assert_eq!(matched.params().unwrap().get("id"), Some("7"));
/// ```
#[derive(Clone, Default)]
pub struct MapRouter {
    table: RouteTable<Endpoint>,
    middlewares: Vec<BoxedHandler>,
}

impl std::fmt::Debug for MapRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRouter")
            .field("routes", &self.table.len())
            .field(
                "middlewares",
                &self.middlewares.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

macro_rules! method_fns {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers a `", stringify!($method), "` route.")]
            pub fn $name(&mut self, pattern: &str, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
                self.register(HttpMethod::$method, pattern, handlers)
            }
        )*
    };
}

impl MapRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty router with strict static-prefix matching.
    #[must_use]
    pub fn with_strict_static_prefix(strict: bool) -> Self {
        Self {
            table: RouteTable::new().strict_static_prefix(strict),
            middlewares: Vec::new(),
        }
    }

    /// Registers an ordered handler chain for `(method, pattern)`.
    ///
    /// Re-registering the same key replaces the earlier chain.
    pub fn register(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> &mut Self {
        tracing::debug!(method = %method, pattern, "registering route");
        self.table.insert(method, pattern, Endpoint::new(handlers));
        self
    }

    /// Registers by method name; fails for names outside the accepted set.
    pub fn route(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> KazeResult<&mut Self> {
        let method: HttpMethod = method.parse()?;
        Ok(self.register(method, pattern, handlers))
    }

    /// Registers a route whose handlers are resolved per request.
    pub fn register_lazy(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
        route: Arc<dyn LazyRoute>,
    ) -> &mut Self {
        tracing::debug!(method = %method, pattern, origin = %route.describe(), "registering lazy route");
        self.table.insert(method, pattern, Endpoint::lazy(handlers, route));
        self
    }

    /// Registers an already-built endpoint.
    pub fn register_endpoint(&mut self, method: HttpMethod, pattern: &str, endpoint: Endpoint) -> &mut Self {
        self.table.insert(method, pattern, endpoint);
        self
    }

    method_fns! {
        get => Get,
        post => Post,
        put => Put,
        patch => Patch,
        delete => Delete,
        head => Head,
        options => Options,
        trace => Trace,
        connect => Connect,
        link => Link,
        unlink => Unlink,
    }

    /// Registers the chain for every accepted method.
    pub fn all(&mut self, pattern: &str, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        let endpoint = Endpoint::new(handlers);
        self.table.insert_all(pattern, endpoint);
        self
    }

    /// Appends router-level middlewares, keeping registration order.
    ///
    /// On the application router these run before every route. On a
    /// sub-router they are prepended to each route when it is grafted.
    /// Adding the same handler twice is a no-op.
    pub fn middlewares(&mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        for handler in handlers {
            if !self.middlewares.iter().any(|h| Arc::ptr_eq(h, &handler)) {
                self.middlewares.push(handler);
            }
        }
        self
    }

    /// Router-level middlewares in registration order.
    #[must_use]
    pub fn fetch_middlewares(&self) -> &[BoxedHandler] {
        &self.middlewares
    }

    /// Matches a request, falling back to the `*` key.
    pub fn fetch_handlers(&self, path: &str, method: HttpMethod) -> KazeResult<RouteMatch<'_, Endpoint>> {
        self.table
            .resolve(method, path)
            .ok_or_else(|| KazeError::route_not_found(path))
    }

    /// The catch-all `*` route for `method`.
    #[must_use]
    pub fn fetch_catch_all(&self, method: HttpMethod) -> Option<RouteMatch<'_, Endpoint>> {
        self.table.catch_all(method)
    }

    /// The endpoint occupying the table slot for `(method, pattern)`.
    ///
    /// A dynamic pattern shares its slot with every dynamic pattern of the
    /// same segment count.
    #[must_use]
    pub fn endpoint(&self, method: HttpMethod, pattern: &str) -> Option<&Endpoint> {
        self.table.get(method, pattern)
    }

    /// Grafts every route of `router` under `prefix`, with its
    /// middlewares in front of each chain.
    pub fn route_group(&mut self, prefix: &str, router: &MapRouter) -> &mut Self {
        for (method, pattern, endpoint) in router.table.iter() {
            let full = join_group_path(prefix, pattern);
            tracing::debug!(method = %method, pattern = %full, "grafting grouped route");
            self.table
                .insert(method, &full, endpoint.prepend(&router.middlewares));
        }
        self
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &RouteTable<Endpoint> {
        &self.table
    }

    /// Number of registered `(method, pattern)` keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The read side of a route table, as consumed by the dispatcher.
pub trait Router: Send + Sync + std::fmt::Debug {
    /// Middlewares that run in front of every route.
    fn fetch_middlewares(&self) -> &[BoxedHandler];

    /// Matches `method path`, or fails with `KazeError::RouteNotFound`.
    fn fetch_handlers(&self, path: &str, method: HttpMethod) -> KazeResult<RouteMatch<'_, Endpoint>>;

    /// The catch-all `*` route for `method`.
    fn fetch_catch_all(&self, method: HttpMethod) -> Option<RouteMatch<'_, Endpoint>>;
}

impl Router for MapRouter {
    fn fetch_middlewares(&self) -> &[BoxedHandler] {
        MapRouter::fetch_middlewares(self)
    }

    fn fetch_handlers(&self, path: &str, method: HttpMethod) -> KazeResult<RouteMatch<'_, Endpoint>> {
        MapRouter::fetch_handlers(self, path, method)
    }

    fn fetch_catch_all(&self, method: HttpMethod) -> Option<RouteMatch<'_, Endpoint>> {
        MapRouter::fetch_catch_all(self, method)
    }
}
