//! File router integration tests over real directory trees.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::{Method, StatusCode};
use kaze_core::{handler_fn, named_handler_fn, BoxedHandler, Context, KazeError, MapRouter};
use kaze_fs_router::{FileRouteLoader, MiddlewareModule, ModuleRegistry, RouteKind, RouteModule};
use kaze_middleware::Dispatcher;
use kaze_router::HttpMethod;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn reply(text: &'static str) -> BoxedHandler {
    handler_fn(move |ctx, _next| Box::pin(async move { ctx.send(text) }))
}

fn echo(name: &'static str) -> BoxedHandler {
    handler_fn(move |ctx, _next| {
        Box::pin(async move {
            let value = ctx.param(name).unwrap_or_default().to_string();
            ctx.send(value)
        })
    })
}

fn tag(value: &'static str) -> BoxedHandler {
    named_handler_fn("tag", move |ctx, next| {
        Box::pin(async move {
            ctx.header("x-mw", value)?;
            next.run(ctx).await
        })
    })
}

async fn body_of(dispatcher: &Dispatcher, method: Method, target: &str) -> (StatusCode, String) {
    let response = dispatcher.handle(Context::new(method, target)).await;
    let body = String::from_utf8(response.body().to_vec()).unwrap();
    (response.status(), body)
}

#[tokio::test]
async fn param_directory_becomes_param_route() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "posts/[id]/route.ts");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("posts/[id]/route", || Ok(RouteModule::new().export("GET", echo("id"))));

    let mut router = MapRouter::new();
    let report = FileRouteLoader::new(registry)
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();

    let loaded = report.route("/posts/:id").unwrap();
    assert_eq!(loaded.kind, RouteKind::DynamicParam);
    assert_eq!(loaded.methods, vec![HttpMethod::Get]);

    let dispatcher = Dispatcher::new(router);
    assert_eq!(
        body_of(&dispatcher, Method::GET, "/posts/42").await,
        (StatusCode::OK, "42".to_string())
    );
}

#[tokio::test]
async fn naming_conventions() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "route.js");
    touch(dir.path(), "(marketing)/about/route.ts");
    touch(dir.path(), "files/#/route.ts");
    touch(dir.path(), "notes.txt");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("route", || Ok(RouteModule::new().export("get", reply("home"))));
    registry.register_route("(marketing)/about/route", || {
        Ok(RouteModule::new().export("Get", reply("about")))
    });
    registry.register_route("files/#/route", || {
        Ok(RouteModule::new().export("GET", handler_fn(|ctx, _next| {
            Box::pin(async move {
                let rest = ctx.param("*").unwrap_or_default().to_string();
                ctx.send(rest)
            })
        })))
    });

    let loader = FileRouteLoader::new(registry).root(dir.path());
    let discovered = loader.discover().await.unwrap();
    assert_eq!(discovered.len(), 3);

    let mut router = MapRouter::new();
    loader.load_into(&mut router).await.unwrap();
    let dispatcher = Dispatcher::new(router);

    assert_eq!(body_of(&dispatcher, Method::GET, "/").await.1, "home");
    assert_eq!(body_of(&dispatcher, Method::GET, "/about").await.1, "about");
    assert_eq!(body_of(&dispatcher, Method::GET, "/files/a/b.txt").await.1, "a/b.txt");
}

#[tokio::test]
async fn sibling_middleware_is_prepended() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "users/route.ts");
    touch(dir.path(), "users/middleware.ts");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("users/route", || {
        Ok(RouteModule::new()
            .export("GET", reply("list"))
            .export("POST", reply("created"))
            .export("default", reply("ignored"))
            .export("helper", reply("ignored")))
    });
    registry.register_middleware("users/middleware", || Ok(MiddlewareModule::new([tag("users")])));

    let mut router = MapRouter::new();
    let report = FileRouteLoader::new(registry)
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();

    assert_eq!(report.route("/users").unwrap().methods.len(), 2);
    assert_eq!(report.skipped.len(), 1);

    let dispatcher = Dispatcher::new(router);
    let response = dispatcher.handle(Context::new(Method::POST, "/users")).await;
    assert_eq!(response.headers()["x-mw"], "users");
    assert_eq!(response.body().as_ref(), b"created");
}

#[tokio::test]
async fn missing_modules_are_skipped() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "ok/route.ts");
    touch(dir.path(), "broken/route.ts");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("ok/route", || Ok(RouteModule::new().export("GET", reply("ok"))));

    let mut router = MapRouter::new();
    let report = FileRouteLoader::new(registry)
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.skipped[0].module, "broken/route");
    assert!(router.fetch_handlers("/broken", HttpMethod::Get).is_err());
}

#[tokio::test]
async fn unreadable_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let mut router = MapRouter::new();
    let err = FileRouteLoader::new(Arc::new(ModuleRegistry::new()))
        .root(&missing)
        .load_into(&mut router)
        .await
        .unwrap_err();

    assert!(matches!(err, KazeError::DirectoryRead { ref path, .. } if path == &missing));
    assert!(err.to_string().starts_with("Dir Read Error: Directory"));
}

#[tokio::test]
async fn lazy_routes_resolve_per_request() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "@admin/route.ts");

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("@admin/route", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(RouteModule::new().export("GET", reply("admin")))
    });

    let mut router = MapRouter::new();
    let report = FileRouteLoader::new(registry.clone())
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();
    assert_eq!(report.route("/admin").unwrap().kind, RouteKind::LazyGroup);
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let dispatcher = Dispatcher::new(router);
    assert_eq!(body_of(&dispatcher, Method::GET, "/admin").await.1, "admin");
    assert_eq!(body_of(&dispatcher, Method::GET, "/admin").await.1, "admin");
    assert_eq!(builds.load(Ordering::SeqCst), 2);

    let (status, _) = body_of(&dispatcher, Method::DELETE, "/admin").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    registry.register_route("@admin/route", || Err(KazeError::internal("admin module is broken")));
    let (status, body) = body_of(&dispatcher, Method::GET, "/admin").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("admin module is broken"));
}

#[tokio::test]
async fn lazy_routes_can_use_the_cache() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "@reports/route.ts");

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("@reports/route", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(RouteModule::new().export("GET", reply("reports")))
    });

    let mut router = MapRouter::new();
    FileRouteLoader::new(registry)
        .root(dir.path())
        .lazy_bypass_cache(false)
        .load_into(&mut router)
        .await
        .unwrap();

    let dispatcher = Dispatcher::new(router);
    for _ in 0..3 {
        assert_eq!(body_of(&dispatcher, Method::GET, "/reports").await.1, "reports");
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lazy_routes_keep_out_of_eager_slots() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "@admin/[user]/route.ts");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("@admin/[user]/route", || {
        Ok(RouteModule::new().export("GET", echo("user")))
    });

    let mut router = MapRouter::new();
    router.post("/items/:id", [reply("item")]);
    let report = FileRouteLoader::new(registry)
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();

    let loaded = report.route("/admin/:user").unwrap();
    assert!(!loaded.methods.contains(&HttpMethod::Post));
    assert!(loaded.methods.contains(&HttpMethod::Get));

    let dispatcher = Dispatcher::new(router);
    assert_eq!(
        body_of(&dispatcher, Method::POST, "/items/7").await,
        (StatusCode::OK, "item".to_string())
    );
    assert_eq!(body_of(&dispatcher, Method::GET, "/admin/ada").await.1, "ada");

    let (status, body) = body_of(&dispatcher, Method::PUT, "/admin/ada").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("/admin/ada"));
    assert!(!body.contains(":user"));
}

#[tokio::test]
async fn lazy_route_without_export_uses_catch_all() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "@admin/route.ts");

    let registry = Arc::new(ModuleRegistry::new());
    registry.register_route("@admin/route", || Ok(RouteModule::new().export("GET", reply("admin"))));

    let mut router = MapRouter::new();
    router.delete("*", [reply("caught")]);
    FileRouteLoader::new(registry)
        .root(dir.path())
        .load_into(&mut router)
        .await
        .unwrap();

    let dispatcher = Dispatcher::new(router);
    assert_eq!(body_of(&dispatcher, Method::DELETE, "/other").await.1, "caught");
    assert_eq!(
        body_of(&dispatcher, Method::DELETE, "/admin").await,
        (StatusCode::OK, "caught".to_string())
    );
    assert_eq!(body_of(&dispatcher, Method::GET, "/admin").await.1, "admin");
}
