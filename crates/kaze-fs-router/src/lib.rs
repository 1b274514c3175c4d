//! # Kaze File Router
//!
//! Builds routes from a directory tree.
//!
//! ```text
//! routes/
//! ├── route.ts                 GET /
//! ├── middleware.ts            prepended to the chain of `/`
//! ├── posts/
//! │   └── [id]/
//! │       └── route.ts         GET /posts/:id
//! ├── (marketing)/
//! │   └── about/route.ts       GET /about
//! ├── files/#/route.ts         GET /files/*
//! └── @admin/route.ts          /admin, resolved per request
//! ```
//!
//! Files are not executed. Each `route.*` and `middleware.*` file is looked
//! up by its root-relative path without extension through a
//! [`ModuleResolver`]; [`ModuleRegistry`] is the in-process resolver.

#![doc(html_root_url = "https://docs.rs/kaze-fs-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod lazy;
mod loader;
mod module;
mod naming;

pub use loader::{
    DiscoveredRoute, FileRouteLoader, LoadReport, LoadedRoute, SkippedModule, DEFAULT_ROOT,
};
pub use module::{MiddlewareModule, ModuleRegistry, ModuleResolver, RouteModule};
pub use naming::{FileRouteDescriptor, RouteKind};
