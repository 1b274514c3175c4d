//! The route table and path matcher.
//!
//! This module provides [`RouteTable`], the primary interface for
//! registering and matching routes. It is generic over the value stored per
//! route so the dispatch layer can keep handler chains here without this
//! crate knowing what a handler is.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::method::{HttpMethod, InvalidMethod};
use crate::params::{Params, WILDCARD_PARAM};
use crate::pattern::{DynamicPattern, RoutePattern, WildcardPattern};

/// A dynamic route and its target.
#[derive(Debug, Clone)]
pub struct DynamicRoute<T> {
    /// The parsed pattern
    pub pattern: DynamicPattern,
    /// The registered value
    pub target: T,
}

/// A trailing-wildcard route and its target.
#[derive(Debug, Clone)]
pub struct WildcardRoute<T> {
    /// The parsed pattern
    pub pattern: WildcardPattern,
    /// The registered value
    pub target: T,
}

/// Result of a successful match.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a, T> {
    /// Verbatim lookup hit.
    Exact {
        /// The registered value
        target: &'a T,
        /// The pattern that matched
        pattern: &'a str,
    },
    /// Dynamic or wildcard hit, with captured parameters.
    Dynamic {
        /// The registered value
        target: &'a T,
        /// The pattern that matched
        pattern: &'a str,
        /// Captured parameters
        params: Params,
    },
}

impl<'a, T> RouteMatch<'a, T> {
    /// The registered value.
    #[must_use]
    pub fn target(&self) -> &'a T {
        match self {
            Self::Exact { target, .. } | Self::Dynamic { target, .. } => target,
        }
    }

    /// The pattern that matched.
    #[must_use]
    pub fn pattern(&self) -> &'a str {
        match self {
            Self::Exact { pattern, .. } | Self::Dynamic { pattern, .. } => pattern,
        }
    }

    /// Captured parameters; empty for exact matches.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Exact { .. } => None,
            Self::Dynamic { params, .. } => Some(params),
        }
    }

    /// Splits the match into its value and parameters.
    #[must_use]
    pub fn into_parts(self) -> (&'a T, Params) {
        match self {
            Self::Exact { target, .. } => (target, Params::new()),
            Self::Dynamic { target, params, .. } => (target, params),
        }
    }
}

/// Per-method route storage.
///
/// Exact patterns live in a string-keyed map. Dynamic patterns are keyed by
/// their segment count, so for one method at most one dynamic pattern exists
/// per count: registering a second one replaces the first. Trailing-wildcard
/// patterns are kept sorted by prefix length, longest first.
///
/// The table is built before serving and only read afterwards; matching takes
/// `&self` and never allocates beyond the returned [`Params`].
///
/// # Example
///
/// ```rust
/// use kaze_router::{HttpMethod, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.insert(HttpMethod::Get, "/users", "listUsers");
/// table.insert(HttpMethod::Get, "/users/:id", "getUser");
///
/// let m = table.match_route(HttpMethod::Get, "/users/42").unwrap();
/// assert_eq!(*m.target(), "getUser");
/// assert_eq!(m.params().unwrap().get("id"), Some("42"));
///
/// assert!(table.match_route(HttpMethod::Post, "/users").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    exact: Vec<HashMap<String, T>>,
    dynamic: Vec<HashMap<usize, DynamicRoute<T>>>,
    wildcard: Vec<Vec<WildcardRoute<T>>>,
    strict_static_prefix: bool,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table in the default (segment-count only) mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exact: (0..HttpMethod::COUNT).map(|_| HashMap::new()).collect(),
            dynamic: (0..HttpMethod::COUNT).map(|_| HashMap::new()).collect(),
            wildcard: (0..HttpMethod::COUNT).map(|_| Vec::new()).collect(),
            strict_static_prefix: false,
        }
    }

    /// Requires static segments of dynamic patterns to match and binds
    /// captures by position. Changes which requests match, so it is opt-in.
    #[must_use]
    pub fn strict_static_prefix(mut self, enabled: bool) -> Self {
        self.strict_static_prefix = enabled;
        self
    }

    /// Returns whether strict static-prefix matching is enabled.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict_static_prefix
    }

    /// Registers `target` for `(method, pattern)`, replacing any value
    /// previously stored under the same key.
    pub fn insert(&mut self, method: HttpMethod, pattern: &str, target: T) {
        let idx = method.index();
        match RoutePattern::parse(pattern) {
            RoutePattern::Exact(key) => {
                self.exact[idx].insert(key, target);
            }
            RoutePattern::Dynamic(pattern) => {
                let count = pattern.segment_count();
                self.dynamic[idx].insert(count, DynamicRoute { pattern, target });
            }
            RoutePattern::Wildcard(pattern) => {
                let routes = &mut self.wildcard[idx];
                routes.retain(|r| r.pattern.full_pattern() != pattern.full_pattern());
                let at = routes
                    .iter()
                    .position(|r| r.pattern.prefix_len() < pattern.prefix_len())
                    .unwrap_or(routes.len());
                routes.insert(at, WildcardRoute { pattern, target });
            }
        }
    }

    /// Registers by method name.
    pub fn route(&mut self, method: &str, pattern: &str, target: T) -> Result<(), InvalidMethod> {
        let method: HttpMethod = method.parse()?;
        self.insert(method, pattern, target);
        Ok(())
    }

    /// Registers `target` for every accepted method.
    pub fn insert_all(&mut self, pattern: &str, target: T)
    where
        T: Clone,
    {
        for method in HttpMethod::ALL {
            self.insert(method, pattern, target.clone());
        }
    }

    /// Matches a request path.
    ///
    /// The path is used verbatim: callers strip trailing slashes first (see
    /// [`normalize_path`](crate::normalize_path)). Lookup order is exact
    /// key, then the dynamic pattern with the same segment count, then
    /// trailing-wildcard patterns by longest prefix.
    #[must_use]
    pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_, T>> {
        let idx = method.index();

        if let Some((pattern, target)) = self.exact[idx].get_key_value(path) {
            return Some(RouteMatch::Exact { target, pattern });
        }

        let segments: SmallVec<[&str; 8]> = path.split('/').collect();

        if let Some(route) = self.dynamic[idx].get(&segments.len()) {
            if let Some(params) = route.pattern.bind(&segments, self.strict_static_prefix) {
                return Some(RouteMatch::Dynamic {
                    target: &route.target,
                    pattern: route.pattern.full_pattern(),
                    params,
                });
            }
        }

        self.wildcard[idx].iter().find_map(|route| {
            route.pattern.bind(&segments).map(|params| RouteMatch::Dynamic {
                target: &route.target,
                pattern: route.pattern.full_pattern(),
                params,
            })
        })
    }

    /// Matches a request path, falling back to the catch-all `*` key.
    #[must_use]
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_, T>> {
        self.match_route(method, path)
            .or_else(|| self.catch_all(method))
    }

    /// The catch-all `*` route for `method`.
    #[must_use]
    pub fn catch_all(&self, method: HttpMethod) -> Option<RouteMatch<'_, T>> {
        self.exact[method.index()]
            .get_key_value(WILDCARD_PARAM)
            .map(|(pattern, target)| RouteMatch::Exact { target, pattern })
    }

    /// The value that currently owns the slot `pattern` would be stored in.
    ///
    /// For a dynamic pattern the slot is the method's segment count, so the
    /// returned value may have been registered under a different pattern.
    #[must_use]
    pub fn get(&self, method: HttpMethod, pattern: &str) -> Option<&T> {
        let idx = method.index();
        match RoutePattern::parse(pattern) {
            RoutePattern::Exact(key) => self.exact[idx].get(&key),
            RoutePattern::Dynamic(pattern) => self.dynamic[idx]
                .get(&pattern.segment_count())
                .map(|r| &r.target),
            RoutePattern::Wildcard(pattern) => self.wildcard[idx]
                .iter()
                .find(|r| r.pattern.full_pattern() == pattern.full_pattern())
                .map(|r| &r.target),
        }
    }

    /// Iterates every registered route as `(method, pattern, value)`.
    ///
    /// Within a method, exact routes come first, then dynamic, then
    /// wildcard routes. Order among exact routes is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &str, &T)> + '_ {
        HttpMethod::ALL.into_iter().flat_map(move |method| {
            let idx = method.index();
            let exact = self.exact[idx]
                .iter()
                .map(move |(p, t)| (method, p.as_str(), t));
            let dynamic = self.dynamic[idx]
                .values()
                .map(move |r| (method, r.pattern.full_pattern(), &r.target));
            let wildcard = self.wildcard[idx]
                .iter()
                .map(move |r| (method, r.pattern.full_pattern(), &r.target));
            exact.chain(dynamic).chain(wildcard)
        })
    }

    /// Returns the number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.iter().map(HashMap::len).sum::<usize>()
            + self.dynamic.iter().map(HashMap::len).sum::<usize>()
            + self.wildcard.iter().map(Vec::len).sum::<usize>()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table: RouteTable<&str> = RouteTable::new();
        assert!(table.is_empty());
        assert!(!table.is_strict());
    }

    #[test]
    fn test_exact_match() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users", vec!["auth", "list"]);

        let m = table.match_route(HttpMethod::Get, "/users").unwrap();
        assert_eq!(m.target(), &vec!["auth", "list"]);
        assert_eq!(m.pattern(), "/users");
        assert!(m.params().is_none());
    }

    #[test]
    fn test_exact_overwrite() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users", "first");
        table.insert(HttpMethod::Get, "/users", "second");

        assert_eq!(table.len(), 1);
        let m = table.match_route(HttpMethod::Get, "/users").unwrap();
        assert_eq!(*m.target(), "second");
    }

    #[test]
    fn test_dynamic_match() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users/:id", "getUser");

        let (target, params) = table
            .match_route(HttpMethod::Get, "/users/42")
            .unwrap()
            .into_parts();
        assert_eq!(*target, "getUser");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_same_segment_count_last_write_wins() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users/:id", "users");
        table.insert(HttpMethod::Get, "/posts/:slug", "posts");

        let m = table.match_route(HttpMethod::Get, "/users/42").unwrap();
        assert_eq!(*m.target(), "posts");
        assert_eq!(m.params().unwrap().get("slug"), Some("42"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_default_mode_skips_static_check() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users/:id", "getUser");

        let m = table.match_route(HttpMethod::Get, "/accounts/7").unwrap();
        assert_eq!(m.params().unwrap().get("id"), Some("7"));
    }

    #[test]
    fn test_strict_mode_checks_statics() {
        let mut table = RouteTable::new().strict_static_prefix(true);
        table.insert(HttpMethod::Get, "/users/:id", "getUser");

        assert!(table.match_route(HttpMethod::Get, "/accounts/7").is_none());
        assert!(table.match_route(HttpMethod::Get, "/users/7").is_some());
    }

    #[test]
    fn test_methods_are_isolated() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Post, "/users", "create");

        assert!(table.match_route(HttpMethod::Get, "/users").is_none());
        assert!(table.match_route(HttpMethod::Post, "/users").is_some());
    }

    #[test]
    fn test_route_by_name() {
        let mut table = RouteTable::new();
        table.route("link", "/docs", "link").unwrap();
        assert!(table.match_route(HttpMethod::Link, "/docs").is_some());

        let err = table.route("BREW", "/coffee", "nope").unwrap_err();
        assert_eq!(err.0, "BREW");
    }

    #[test]
    fn test_insert_all() {
        let mut table = RouteTable::new();
        table.insert_all("/health", "health");

        for method in HttpMethod::ALL {
            assert!(table.match_route(method, "/health").is_some());
        }
        assert_eq!(table.len(), HttpMethod::COUNT);
    }

    #[test]
    fn test_root_and_root_param() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/", "root");
        table.insert(HttpMethod::Get, "/:id", "byId");

        assert_eq!(*table.match_route(HttpMethod::Get, "/").unwrap().target(), "root");

        let m = table.match_route(HttpMethod::Get, "/5").unwrap();
        assert_eq!(*m.target(), "byId");
        assert_eq!(m.params().unwrap().get("id"), Some("5"));
    }

    #[test]
    fn test_catch_all_fallback() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Delete, "*", "catchAll");

        assert!(table.match_route(HttpMethod::Delete, "/widgets").is_none());
        let m = table.resolve(HttpMethod::Delete, "/widgets").unwrap();
        assert_eq!(*m.target(), "catchAll");
        assert!(table.resolve(HttpMethod::Get, "/widgets").is_none());
    }

    #[test]
    fn test_wildcard_longest_prefix_wins() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/assets/*", "assets");
        table.insert(HttpMethod::Get, "/assets/img/*", "images");

        let m = table.match_route(HttpMethod::Get, "/assets/img/logo.png").unwrap();
        assert_eq!(*m.target(), "images");
        assert_eq!(m.params().unwrap().get("*"), Some("logo.png"));

        let m = table.match_route(HttpMethod::Get, "/assets/css/site.css").unwrap();
        assert_eq!(*m.target(), "assets");
        assert_eq!(m.params().unwrap().get("*"), Some("css/site.css"));
    }

    #[test]
    fn test_dynamic_preferred_over_wildcard() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/files/*", "rest");
        table.insert(HttpMethod::Get, "/files/:name", "one");

        assert_eq!(*table.match_route(HttpMethod::Get, "/files/a").unwrap().target(), "one");
        assert_eq!(*table.match_route(HttpMethod::Get, "/files/a/b").unwrap().target(), "rest");
    }

    #[test]
    fn test_wildcard_reregistration_replaces() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/static/*", "old");
        table.insert(HttpMethod::Get, "/static/*", "new");

        assert_eq!(table.len(), 1);
        let m = table.match_route(HttpMethod::Get, "/static/x").unwrap();
        assert_eq!(*m.target(), "new");
    }

    #[test]
    fn test_iter_covers_all_kinds() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/", "root");
        table.insert(HttpMethod::Get, "/:id", "byId");
        table.insert(HttpMethod::Put, "/files/*", "files");

        let mut routes: Vec<_> = table.iter().map(|(m, p, t)| (m, p.to_string(), *t)).collect();
        routes.sort();
        assert_eq!(
            routes,
            vec![
                (HttpMethod::Get, "/".to_string(), "root"),
                (HttpMethod::Get, "/:id".to_string(), "byId"),
                (HttpMethod::Put, "/files/*".to_string(), "files"),
            ]
        );
    }

    #[test]
    fn test_get_reports_occupied_slots() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Post, "/items/:id", "item");
        table.insert(HttpMethod::Get, "/about", "about");
        table.insert(HttpMethod::Get, "/static/*", "files");

        assert_eq!(table.get(HttpMethod::Post, "/admin/:user"), Some(&"item"));
        assert_eq!(table.get(HttpMethod::Get, "/admin/:user"), None);
        assert_eq!(table.get(HttpMethod::Get, "/about"), Some(&"about"));
        assert_eq!(table.get(HttpMethod::Get, "/static/*"), Some(&"files"));
        assert_eq!(table.get(HttpMethod::Get, "/assets/*"), None);
    }

    #[test]
    fn test_catch_all_lookup() {
        let mut table = RouteTable::new();
        assert!(table.catch_all(HttpMethod::Delete).is_none());
        table.insert(HttpMethod::Delete, "*", "swept");
        assert_eq!(*table.catch_all(HttpMethod::Delete).unwrap().target(), "swept");
        assert!(table.catch_all(HttpMethod::Get).is_none());
    }

    #[test]
    fn test_matching_is_idempotent() {
        let mut table = RouteTable::new();
        table.insert(HttpMethod::Get, "/users/:id", "getUser");

        let first = table.match_route(HttpMethod::Get, "/users/1");
        let second = table.match_route(HttpMethod::Get, "/users/1");
        assert_eq!(first, second);
    }
}
