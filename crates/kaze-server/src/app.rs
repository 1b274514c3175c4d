//! The application builder.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use kaze_config::{ConfigLoader, KazeConfig, DEFAULT_ENV_PREFIX};
use kaze_core::{BoxedHandler, HttpMethod, KazeResult, MapRouter, RenderEngine, Renderer};
use kaze_fs_router::{FileRouteLoader, LoadReport, ModuleResolver};
use kaze_middleware::{BoxedErrorHandler, BoxedValidationHandler, Dispatcher};

use crate::error::ServerError;
use crate::server::Server;
use crate::service::KazeService;
use crate::shutdown::ShutdownSignal;

/// Default configuration file read by [`Kaze::from_env`].
pub const DEFAULT_CONFIG_FILE: &str = "kaze.toml";

/// A Kaze application: routes, global middlewares, failure handlers and
/// the settings used to serve them.
///
/// # Example
///
/// ```no_run
/// use kaze_core::handler_fn;
/// use kaze_server::Kaze;
///
/// # async fn run() -> Result<(), kaze_server::ServerError> {
/// let mut app = Kaze::new();
/// app.get("/", [handler_fn(|ctx, _next| Box::pin(async move { ctx.send("hello") }))]);
/// app.get("/:id", [handler_fn(|ctx, _next| {
///     Box::pin(async move {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         ctx.send(id)
///     })
/// })]);
///
/// app.listen("127.0.0.1:8657").await
/// # }
/// ```
pub struct Kaze {
    config: KazeConfig,
    router: MapRouter,
    error_handler: Option<BoxedErrorHandler>,
    validation_handler: Option<BoxedValidationHandler>,
    renderer: Option<Renderer>,
    dependencies: Option<Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Kaze {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kaze")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("custom_error_handler", &self.error_handler.is_some())
            .field("custom_validation_handler", &self.validation_handler.is_some())
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl Default for Kaze {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_fns {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers a `", stringify!($name), "` route.")]
            pub fn $name(&mut self, pattern: &str, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
                self.router.$name(pattern, handlers);
                self
            }
        )*
    };
}

impl Kaze {
    /// An application with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(KazeConfig::default())
    }

    /// An application using `config`.
    #[must_use]
    pub fn with_config(config: KazeConfig) -> Self {
        Self {
            router: MapRouter::with_strict_static_prefix(config.router.strict_static_prefix),
            config,
            error_handler: None,
            validation_handler: None,
            renderer: None,
            dependencies: None,
        }
    }

    /// Loads `.env`, then `kaze.toml` if present, then `KAZE__*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if any layer fails to load or the
    /// result does not validate.
    pub fn from_env() -> Result<Self, ServerError> {
        let config = ConfigLoader::new()
            .with_dotenv()?
            .with_optional_file(DEFAULT_CONFIG_FILE)?
            .with_env_prefix(DEFAULT_ENV_PREFIX)
            .load()?;
        Ok(Self::with_config(config))
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &KazeConfig {
        &self.config
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> &MapRouter {
        &self.router
    }

    /// Mutable access to the application router.
    pub fn router_mut(&mut self) -> &mut MapRouter {
        &mut self.router
    }

    method_fns!(get, post, put, patch, delete, head, options, trace, connect, link, unlink);

    /// Registers the chain for every method.
    pub fn all(&mut self, pattern: &str, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        self.router.all(pattern, handlers);
        self
    }

    /// Registers by method name.
    ///
    /// # Errors
    ///
    /// Returns `KazeError::InvalidMethod` for names outside the accepted set.
    pub fn route(
        &mut self,
        method: &str,
        pattern: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> KazeResult<&mut Self> {
        self.router.route(method, pattern, handlers)?;
        Ok(self)
    }

    /// Registers a chain for one method.
    pub fn register(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> &mut Self {
        self.router.register(method, pattern, handlers);
        self
    }

    /// Appends global middlewares; they run before every route chain.
    pub fn middlewares(&mut self, handlers: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        self.router.middlewares(handlers);
        self
    }

    /// Mounts every route of `router` under `prefix`.
    pub fn route_group(&mut self, prefix: &str, router: &MapRouter) -> &mut Self {
        self.router.route_group(prefix, router);
        self
    }

    /// Replaces the general error handler.
    pub fn global_error_handler(&mut self, handler: BoxedErrorHandler) -> &mut Self {
        self.error_handler = Some(handler);
        self
    }

    /// Replaces the validation-failure handler.
    pub fn global_validation_handler(&mut self, handler: BoxedValidationHandler) -> &mut Self {
        self.validation_handler = Some(handler);
        self
    }

    /// Configures `ctx.render`: templates are read from `template_dir`,
    /// with `extension` appended to names given without one.
    pub fn render_engine(
        &mut self,
        engine: impl RenderEngine,
        template_dir: impl Into<PathBuf>,
        extension: Option<&str>,
    ) -> &mut Self {
        self.renderer = Some(Renderer::new(engine, template_dir, extension.map(str::to_owned)));
        self
    }

    /// Shares a value with every handler through `ctx.dependencies::<T>()`.
    pub fn dependencies<T: Send + Sync + 'static>(&mut self, dependencies: T) -> &mut Self {
        self.dependencies = Some(Arc::new(dependencies));
        self
    }

    /// Installs routes from the configured routes directory.
    ///
    /// # Errors
    ///
    /// Returns `KazeError::DirectoryRead` if a directory cannot be read.
    pub async fn load_file_routes(&mut self, resolver: Arc<dyn ModuleResolver>) -> KazeResult<LoadReport> {
        let loader = FileRouteLoader::new(resolver)
            .root(&self.config.file_router.root)
            .lazy_bypass_cache(self.config.file_router.lazy_bypass_cache);
        self.load_routes_with(&loader).await
    }

    /// Installs routes with a custom loader.
    ///
    /// # Errors
    ///
    /// Returns `KazeError::DirectoryRead` if a directory cannot be read.
    pub async fn load_routes_with(&mut self, loader: &FileRouteLoader) -> KazeResult<LoadReport> {
        loader.load_into(&mut self.router).await
    }

    /// Freezes the routes into a dispatcher.
    #[must_use]
    pub fn into_dispatcher(self) -> Dispatcher {
        self.into_parts().0
    }

    /// Freezes the routes into a request service.
    #[must_use]
    pub fn into_service(self) -> KazeService {
        let (dispatcher, config) = self.into_parts();
        KazeService::new(dispatcher)
            .https(config.server.https)
            .strip_trailing_slash(config.router.strip_trailing_slash)
    }

    fn into_parts(self) -> (Dispatcher, KazeConfig) {
        let mut dispatcher = Dispatcher::new(self.router).with_dependencies(self.dependencies);
        if let Some(handler) = self.error_handler {
            dispatcher = dispatcher.with_error_handler(handler);
        }
        if let Some(handler) = self.validation_handler {
            dispatcher = dispatcher.with_validation_handler(handler);
        }
        if let Some(renderer) = self.renderer {
            dispatcher = dispatcher.with_renderer(renderer);
        }
        (dispatcher, self.config)
    }

    /// Binds `addr` without serving yet.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the address is invalid or cannot be bound.
    pub async fn bind(self, addr: &str) -> Result<Server, ServerError> {
        let shutdown_timeout = std::time::Duration::from_secs(self.config.server.shutdown_timeout_secs);
        Server::bind(self.into_service(), addr, shutdown_timeout).await
    }

    /// Serves on `addr` until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the listener cannot be bound.
    pub async fn listen(self, addr: &str) -> Result<(), ServerError> {
        self.bind(addr).await?.run().await
    }

    /// Serves on the configured `server.http_addr` until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the listener cannot be bound.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.config.server.http_addr.clone();
        self.listen(&addr).await
    }

    /// Serves on the configured `server.http_addr` until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the listener cannot be bound.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.server.http_addr.clone();
        self.bind(&addr).await?.run_with_shutdown(shutdown).await
    }
}
