//! Directory walking and route installation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kaze_core::{BoxedHandler, KazeError, KazeResult, MapRouter};
use kaze_router::HttpMethod;

use crate::lazy::LazyModuleRoute;
use crate::module::ModuleResolver;
use crate::naming::{pattern_for, DirSegment, FileRouteDescriptor, RouteKind};

/// Default routes directory, relative to the working directory.
pub const DEFAULT_ROOT: &str = "routes";

const ROUTE_STEM: &str = "route";
const MIDDLEWARE_STEM: &str = "middleware";

/// A route file plus the module keys needed to install it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRoute {
    /// Where the route lives and what it maps to.
    pub descriptor: FileRouteDescriptor,
    /// Module key of the route file, e.g. `posts/[id]/route`.
    pub route_key: String,
    /// Module key of the sibling middleware file, if there is one.
    pub middleware_key: Option<String>,
}

/// A route installed by [`FileRouteLoader::load_into`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRoute {
    /// URL pattern.
    pub pattern: String,
    /// How it was installed.
    pub kind: RouteKind,
    /// Route module key.
    pub module: String,
    /// Methods registered for the pattern.
    pub methods: Vec<HttpMethod>,
}

/// A module that could not be loaded and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    /// Module key.
    pub module: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Installed routes, in discovery order.
    pub routes: Vec<LoadedRoute>,
    /// Modules that failed to load or exports that were ignored.
    pub skipped: Vec<SkippedModule>,
}

impl LoadReport {
    /// Number of installed patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if nothing was installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Looks up an installed pattern.
    #[must_use]
    pub fn route(&self, pattern: &str) -> Option<&LoadedRoute> {
        self.routes.iter().find(|r| r.pattern == pattern)
    }
}

/// Builds routes from a directory tree.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use kaze_core::MapRouter;
/// use kaze_fs_router::{FileRouteLoader, ModuleRegistry};
///
/// # async fn run() -> kaze_core::KazeResult<()> {
/// let registry = Arc::new(ModuleRegistry::new());
/// let mut router = MapRouter::new();
///
/// let report = FileRouteLoader::new(registry)
///     .root("routes")
///     .load_into(&mut router)
///     .await?;
/// println!("{} routes", report.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileRouteLoader {
    root: PathBuf,
    lazy_bypass_cache: bool,
    resolver: Arc<dyn ModuleResolver>,
}

impl std::fmt::Debug for FileRouteLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRouteLoader")
            .field("root", &self.root)
            .field("lazy_bypass_cache", &self.lazy_bypass_cache)
            .finish_non_exhaustive()
    }
}

impl FileRouteLoader {
    /// Creates a loader over `routes/` that bypasses the module cache for
    /// lazy routes.
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            lazy_bypass_cache: true,
            resolver,
        }
    }

    /// Sets the routes root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Whether lazy routes rebuild their modules on every request.
    #[must_use]
    pub fn lazy_bypass_cache(mut self, bypass: bool) -> Self {
        self.lazy_bypass_cache = bypass;
        self
    }

    /// The routes root.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Walks the tree and returns every route file, sorted by module key.
    ///
    /// Fails with `DirectoryRead` if any directory cannot be read.
    pub async fn discover(&self) -> KazeResult<Vec<DiscoveredRoute>> {
        let mut found = Vec::new();
        let mut pending: Vec<(PathBuf, Vec<String>)> = vec![(self.root.clone(), Vec::new())];

        while let Some((dir, names)) = pending.pop() {
            let listing = list_dir(&dir).await?;

            if let Some(route_file) = listing.route_file {
                let segments: Vec<DirSegment> = names.iter().map(|n| DirSegment::parse(n)).collect();
                let (pattern, kind) = pattern_for(&segments);
                let prefix = names.join("/");
                let key = |stem: &str| {
                    if prefix.is_empty() {
                        stem.to_string()
                    } else {
                        format!("{prefix}/{stem}")
                    }
                };

                tracing::debug!(path = %route_file.display(), pattern = %pattern, kind = %kind, "discovered route file");
                found.push(DiscoveredRoute {
                    descriptor: FileRouteDescriptor {
                        disk_path: route_file,
                        pattern,
                        kind,
                    },
                    route_key: key(ROUTE_STEM),
                    middleware_key: listing.has_middleware.then(|| key(MIDDLEWARE_STEM)),
                });
            }

            for sub in listing.subdirs {
                let mut child = names.clone();
                child.push(sub.clone());
                pending.push((dir.join(sub), child));
            }
        }

        found.sort_by(|a, b| a.route_key.cmp(&b.route_key));
        Ok(found)
    }

    /// Discovers routes and installs them into `router`.
    ///
    /// Modules that fail to load are skipped with a warning. Lazy routes
    /// resolve their modules per request and are registered for every
    /// method whose slot is not already held by an eager route.
    pub async fn load_into(&self, router: &mut MapRouter) -> KazeResult<LoadReport> {
        let mut report = LoadReport::default();

        for route in self.discover().await? {
            if route.descriptor.kind == RouteKind::LazyGroup {
                self.install_lazy(router, route, &mut report);
            } else {
                self.install(router, route, &mut report).await;
            }
        }

        tracing::info!(
            root = %self.root.display(),
            routes = report.routes.len(),
            skipped = report.skipped.len(),
            "file routes loaded"
        );
        Ok(report)
    }

    fn install_lazy(&self, router: &mut MapRouter, route: DiscoveredRoute, report: &mut LoadReport) {
        let pattern = route.descriptor.pattern;
        let lazy = Arc::new(LazyModuleRoute {
            resolver: Arc::clone(&self.resolver),
            route_key: route.route_key.clone(),
            middleware_key: route.middleware_key,
            bypass_cache: self.lazy_bypass_cache,
        });

        // Slots already held by an eagerly registered route stay with it.
        let mut methods = Vec::with_capacity(HttpMethod::ALL.len());
        for method in HttpMethod::ALL {
            if router.endpoint(method, &pattern).is_some_and(|e| !e.is_lazy()) {
                tracing::debug!(method = %method, pattern = %pattern, "lazy route leaves occupied slot");
                continue;
            }
            router.register_lazy(method, &pattern, [], lazy.clone());
            methods.push(method);
        }

        tracing::info!(pattern = %pattern, module = %route.route_key, "registered lazy route");
        report.routes.push(LoadedRoute {
            pattern,
            kind: RouteKind::LazyGroup,
            module: route.route_key,
            methods,
        });
    }

    async fn install(&self, router: &mut MapRouter, route: DiscoveredRoute, report: &mut LoadReport) {
        let middlewares: Vec<BoxedHandler> = match &route.middleware_key {
            Some(key) => match self.resolver.load_middleware(key, false).await {
                Ok(module) => module.handlers().to_vec(),
                Err(err) => {
                    tracing::warn!(module = %key, error = %err, "skipping middleware module");
                    report.skipped.push(SkippedModule {
                        module: key.clone(),
                        reason: err.to_string(),
                    });
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let module = match self.resolver.load_route(&route.route_key, false).await {
            Ok(module) => module,
            Err(err) => {
                tracing::warn!(module = %route.route_key, error = %err, "skipping route module");
                report.skipped.push(SkippedModule {
                    module: route.route_key,
                    reason: err.to_string(),
                });
                return;
            }
        };

        let (handlers, ignored) = module.method_handlers();
        for name in ignored {
            tracing::warn!(module = %route.route_key, export = %name, "export is not an HTTP method");
            report.skipped.push(SkippedModule {
                module: format!("{}#{name}", route.route_key),
                reason: "export is not an HTTP method".to_string(),
            });
        }

        let pattern = route.descriptor.pattern;
        let mut methods = Vec::with_capacity(handlers.len());
        for (method, handler) in handlers {
            let chain = middlewares.iter().cloned().chain(std::iter::once(handler));
            router.register(method, &pattern, chain);
            methods.push(method);
        }

        tracing::info!(pattern = %pattern, module = %route.route_key, methods = methods.len(), "registered file route");
        report.routes.push(LoadedRoute {
            pattern,
            kind: route.descriptor.kind,
            module: route.route_key,
            methods,
        });
    }
}

#[derive(Debug, Default)]
struct DirListing {
    route_file: Option<PathBuf>,
    has_middleware: bool,
    subdirs: Vec<String>,
}

async fn list_dir(dir: &Path) -> KazeResult<DirListing> {
    let read_error = |source| KazeError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut listing = DirListing::default();
    let mut route_files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
            continue;
        };
        let meta = tokio::fs::metadata(&path).await.map_err(read_error)?;

        if meta.is_dir() {
            listing.subdirs.push(name);
        } else if meta.is_file() {
            match Path::new(&name).file_stem().and_then(|s| s.to_str()) {
                Some(ROUTE_STEM) => route_files.push(path),
                Some(MIDDLEWARE_STEM) => listing.has_middleware = true,
                _ => {}
            }
        }
    }

    route_files.sort();
    if route_files.len() > 1 {
        tracing::warn!(dir = %dir.display(), count = route_files.len(), "several route files; using the first");
    }
    listing.route_file = route_files.into_iter().next();
    Ok(listing)
}
