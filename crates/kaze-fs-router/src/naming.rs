//! Directory naming conventions.
//!
//! | Directory  | URL segment | Effect                              |
//! |------------|-------------|-------------------------------------|
//! | `users`    | `users`     | literal segment                     |
//! | `[id]`     | `:id`       | named parameter                     |
//! | `(admin)`  | (none)      | grouping only, stripped from URL    |
//! | `@reports` | `reports`   | routes beneath are resolved lazily  |
//! | `#`        | `*`         | catch-all                           |

use std::path::PathBuf;

/// How a discovered route is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Literal segments only.
    Normal,
    /// At least one `[param]` segment.
    DynamicParam,
    /// Below an `@name` directory; handlers are resolved per request.
    LazyGroup,
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::DynamicParam => "dynamic_param",
            Self::LazyGroup => "lazy_group",
        })
    }
}

/// A route found on disk, before it is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRouteDescriptor {
    /// The route module file.
    pub disk_path: PathBuf,
    /// URL pattern computed from the directory names.
    pub pattern: String,
    /// How the route is installed.
    pub kind: RouteKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DirSegment {
    Literal(String),
    Param(String),
    Group,
    Lazy(String),
    CatchAll,
}

impl DirSegment {
    pub(crate) fn parse(name: &str) -> Self {
        if name == "#" {
            return Self::CatchAll;
        }
        if let Some(inner) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            return Self::Param(inner.to_string());
        }
        if name.starts_with('(') && name.ends_with(')') {
            return Self::Group;
        }
        if let Some(rest) = name.strip_prefix('@') {
            return Self::Lazy(rest.to_string());
        }
        Self::Literal(name.to_string())
    }

    fn url_segment(&self) -> Option<String> {
        match self {
            Self::Literal(s) | Self::Lazy(s) => Some(s.clone()),
            Self::Param(name) => Some(format!(":{name}")),
            Self::CatchAll => Some("*".to_string()),
            Self::Group => None,
        }
    }
}

/// Builds the URL pattern and route kind for a directory chain below the
/// routes root. An empty chain is the root route `/`.
pub(crate) fn pattern_for(dirs: &[DirSegment]) -> (String, RouteKind) {
    let segments: Vec<String> = dirs.iter().filter_map(DirSegment::url_segment).collect();
    let pattern = if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    };

    let kind = if dirs.iter().any(|d| matches!(d, DirSegment::Lazy(_))) {
        RouteKind::LazyGroup
    } else if dirs.iter().any(|d| matches!(d, DirSegment::Param(_))) {
        RouteKind::DynamicParam
    } else {
        RouteKind::Normal
    };

    (pattern, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: &[&str]) -> Vec<DirSegment> {
        names.iter().map(|n| DirSegment::parse(n)).collect()
    }

    #[test]
    fn test_parse() {
        assert_eq!(DirSegment::parse("users"), DirSegment::Literal("users".into()));
        assert_eq!(DirSegment::parse("[id]"), DirSegment::Param("id".into()));
        assert_eq!(DirSegment::parse("(admin)"), DirSegment::Group);
        assert_eq!(DirSegment::parse("@reports"), DirSegment::Lazy("reports".into()));
        assert_eq!(DirSegment::parse("#"), DirSegment::CatchAll);
        assert_eq!(DirSegment::parse("[broken"), DirSegment::Literal("[broken".into()));
    }

    #[test]
    fn test_root() {
        assert_eq!(pattern_for(&[]), ("/".to_string(), RouteKind::Normal));
    }

    #[test]
    fn test_param_pattern() {
        let (pattern, kind) = pattern_for(&chain(&["posts", "[id]"]));
        assert_eq!(pattern, "/posts/:id");
        assert_eq!(kind, RouteKind::DynamicParam);
    }

    #[test]
    fn test_group_stripped() {
        let (pattern, kind) = pattern_for(&chain(&["(marketing)", "about"]));
        assert_eq!(pattern, "/about");
        assert_eq!(kind, RouteKind::Normal);

        let (pattern, _) = pattern_for(&chain(&["(only)"]));
        assert_eq!(pattern, "/");
    }

    #[test]
    fn test_catch_all() {
        let (pattern, _) = pattern_for(&chain(&["files", "#"]));
        assert_eq!(pattern, "/files/*");
    }

    #[test]
    fn test_lazy_wins_over_param() {
        let (pattern, kind) = pattern_for(&chain(&["@admin", "[user]"]));
        assert_eq!(pattern, "/admin/:user");
        assert_eq!(kind, RouteKind::LazyGroup);
    }
}
