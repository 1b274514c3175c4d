//! Route table and path matcher for Kaze.
//!
//! This crate maps an incoming `(method, path)` pair to whatever value was
//! registered for it (in Kaze, an ordered handler chain) and extracts path
//! parameters. It has no knowledge of handlers or requests.
//!
//! # Matching rules
//!
//! - **Exact patterns** (no `:` captures) are looked up verbatim.
//! - **Dynamic patterns** (`/users/:id`) are keyed by their segment count.
//!   A request with the same count matches, and captures are read from the
//!   tail of the request path.
//! - **Wildcard patterns** (`/static/*`) match by prefix and capture the
//!   rest of the path as the `*` parameter.
//! - The literal pattern `*` is an exact key used as a last-resort fallback
//!   by [`RouteTable::resolve`].
//!
//! # Example
//!
//! ```rust
//! use kaze_router::{HttpMethod, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.insert(HttpMethod::Get, "/", "home");
//! table.insert(HttpMethod::Get, "/:id", "item");
//! table.insert(HttpMethod::Delete, "*", "catchAll");
//!
//! let m = table.match_route(HttpMethod::Get, "/5").unwrap();
//! assert_eq!(*m.target(), "item");
//! assert_eq!(m.params().unwrap().get("id"), Some("5"));
//!
//! let m = table.resolve(HttpMethod::Delete, "/widgets").unwrap();
//! assert_eq!(*m.target(), "catchAll");
//! ```
//!
//! # Segment counting
//!
//! ```text
//!   "/users/42"   split on '/'  ->  ["", "users", "42"]   count = 3
//!   "/users/:id"  split on '/'  ->  ["", "users", ":id"]  count = 3
//! ```

mod method;
mod params;
mod pattern;
mod table;

pub use method::{HttpMethod, InvalidMethod};
pub use params::{Params, WILDCARD_PARAM};
pub use pattern::{DynamicPattern, RoutePattern, Segment, WildcardPattern};
pub use table::{DynamicRoute, RouteMatch, RouteTable, WildcardRoute};

/// Strips trailing slashes from a non-root path.
///
/// An empty path and a path made only of slashes normalize to `/`.
///
/// ```rust
/// use kaze_router::normalize_path;
///
/// assert_eq!(normalize_path("/users/"), "/users");
/// assert_eq!(normalize_path("/"), "/");
/// assert_eq!(normalize_path(""), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
