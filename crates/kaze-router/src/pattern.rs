//! Route pattern classification.
//!
//! Patterns are split on `/` exactly as request paths are, so a pattern and
//! a request path with the same number of `/` have the same segment count.
//! The leading empty segment of an absolute path is counted too.

use crate::params::{Params, WILDCARD_PARAM};

/// One `/`-delimited token of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal segment (e.g. "users", or the empty segment before a leading `/`)
    Static(String),
    /// Named capture (e.g. ":id")
    Param(String),
    /// Lone `*`
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Self::Param(name.to_string())
        } else if raw == "*" {
            Self::Wildcard
        } else {
            Self::Static(raw.to_string())
        }
    }

    fn matches_literal(&self, value: &str) -> bool {
        match self {
            Self::Static(s) => s == value,
            Self::Param(_) | Self::Wildcard => true,
        }
    }
}

/// A parsed route pattern.
///
/// # Example
///
/// ```rust
/// use kaze_router::RoutePattern;
///
/// assert!(matches!(RoutePattern::parse("/users"), RoutePattern::Exact(_)));
/// assert!(matches!(RoutePattern::parse("*"), RoutePattern::Exact(_)));
/// assert!(matches!(RoutePattern::parse("/users/:id"), RoutePattern::Dynamic(_)));
/// assert!(matches!(RoutePattern::parse("/static/*"), RoutePattern::Wildcard(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// No captures; matched by verbatim string lookup. Includes the
    /// catch-all key `*`.
    Exact(String),
    /// At least one `:name` capture; matched by segment count.
    Dynamic(DynamicPattern),
    /// Ends in `/*`; matched by prefix, capturing the rest of the path.
    Wildcard(WildcardPattern),
}

impl RoutePattern {
    /// Classifies a pattern string.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        if pattern == WILDCARD_PARAM {
            return Self::Exact(pattern.to_string());
        }

        let segments: Vec<Segment> = pattern.split('/').map(Segment::parse).collect();

        if segments.len() > 1 && segments.last() == Some(&Segment::Wildcard) {
            let mut prefix = segments;
            prefix.pop();
            return Self::Wildcard(WildcardPattern {
                full: pattern.to_string(),
                prefix,
            });
        }

        let dynamic = segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_) | Segment::Wildcard));
        if dynamic {
            Self::Dynamic(DynamicPattern::new(pattern, segments))
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// Returns the pattern string as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(s) => s,
            Self::Dynamic(d) => &d.full,
            Self::Wildcard(w) => &w.full,
        }
    }
}

/// A pattern with named captures, keyed by its total segment count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicPattern {
    full: String,
    segments: Vec<Segment>,
    param_names: Vec<String>,
    static_prefix: Vec<String>,
}

impl DynamicPattern {
    fn new(full: &str, segments: Vec<Segment>) -> Self {
        let param_names = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        let static_prefix = segments
            .iter()
            .map_while(|s| match s {
                Segment::Static(lit) => Some(lit.clone()),
                _ => None,
            })
            .collect();

        Self {
            full: full.to_string(),
            segments,
            param_names,
            static_prefix,
        }
    }

    /// The pattern string as registered.
    #[must_use]
    pub fn full_pattern(&self) -> &str {
        &self.full
    }

    /// Capture names in pattern order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Literal segments before the first capture.
    #[must_use]
    pub fn static_prefix(&self) -> &[String] {
        &self.static_prefix
    }

    /// Total number of segments, including the leading empty one.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Binds captures against request segments of the same count.
    ///
    /// In the default mode parameters are taken from the tail of the
    /// request: `dyn_start = count - names.len()` and `names[i]` binds
    /// `segments[dyn_start + i]`. Static segments are not compared.
    ///
    /// In strict mode every static segment must equal the request segment
    /// at the same position, and captures bind positionally.
    pub(crate) fn bind(&self, request: &[&str], strict: bool) -> Option<Params> {
        debug_assert_eq!(request.len(), self.segments.len());
        let mut params = Params::with_capacity(self.param_names.len());

        if strict {
            for (segment, value) in self.segments.iter().zip(request) {
                if !segment.matches_literal(value) {
                    return None;
                }
                if let Segment::Param(name) = segment {
                    params.insert(name.as_str(), *value);
                }
            }
        } else {
            let dyn_start = request.len().checked_sub(self.param_names.len())?;
            for (i, name) in self.param_names.iter().enumerate() {
                params.insert(name.as_str(), request[dyn_start + i]);
            }
        }

        Some(params)
    }
}

/// A pattern ending in `/*`, mounted by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    full: String,
    prefix: Vec<Segment>,
}

impl WildcardPattern {
    /// The pattern string as registered.
    #[must_use]
    pub fn full_pattern(&self) -> &str {
        &self.full
    }

    /// Number of segments before the trailing `*`.
    #[must_use]
    pub fn prefix_len(&self) -> usize {
        self.prefix.len()
    }

    /// Matches when the prefix agrees and at least one segment remains.
    /// The remainder is bound to `*`; captures in the prefix bind as usual.
    pub(crate) fn bind(&self, request: &[&str]) -> Option<Params> {
        if request.len() <= self.prefix.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.prefix.iter().zip(request) {
            if !segment.matches_literal(value) {
                return None;
            }
            if let Segment::Param(name) = segment {
                params.insert(name.as_str(), *value);
            }
        }

        params.insert(WILDCARD_PARAM, request[self.prefix.len()..].join("/"));
        Some(params)
    }
}
