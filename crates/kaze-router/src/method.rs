//! HTTP method enumeration.
//!
//! Kaze accepts a fixed set of eleven methods. [`HttpMethod`] is a dense
//! enum so route tables can index per-method maps without hashing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a method name is outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP method: '{0}'")]
pub struct InvalidMethod(pub String);

/// The HTTP methods a route can be registered for.
///
/// # Example
///
/// ```rust
/// use kaze_router::HttpMethod;
///
/// let method: HttpMethod = "unlink".parse().unwrap();
/// assert_eq!(method, HttpMethod::Unlink);
/// assert_eq!(method.as_str(), "UNLINK");
/// assert!("BREW".parse::<HttpMethod>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
    /// CONNECT
    Connect,
    /// LINK
    Link,
    /// UNLINK
    Unlink,
}

impl HttpMethod {
    /// Number of accepted methods.
    pub const COUNT: usize = 11;

    /// Every accepted method, in registration order.
    pub const ALL: [HttpMethod; Self::COUNT] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::Trace,
        Self::Connect,
        Self::Link,
        Self::Unlink,
    ];

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
            Self::Link => "LINK",
            Self::Unlink => "UNLINK",
        }
    }

    /// Dense index in `0..COUNT`, used for per-method storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parses a method name ignoring ASCII case.
    pub fn parse_ignore_case(name: &str) -> Result<Self, InvalidMethod> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| InvalidMethod(name.to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_ignore_case(s)
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = InvalidMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        match *method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::HEAD => Ok(Self::Head),
            http::Method::OPTIONS => Ok(Self::Options),
            http::Method::TRACE => Ok(Self::Trace),
            http::Method::CONNECT => Ok(Self::Connect),
            // LINK and UNLINK are extension methods in `http`
            _ => Self::parse_ignore_case(method.as_str()),
        }
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Head => Self::HEAD,
            HttpMethod::Options => Self::OPTIONS,
            HttpMethod::Trace => Self::TRACE,
            HttpMethod::Connect => Self::CONNECT,
            HttpMethod::Link | HttpMethod::Unlink => {
                // Both names are valid tokens, so this cannot fail.
                Self::from_bytes(method.as_str().as_bytes()).unwrap_or(Self::GET)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_dense() {
        for (i, method) in HttpMethod::ALL.iter().enumerate() {
            assert_eq!(method.index(), i);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert_eq!("LINK".parse::<HttpMethod>().unwrap(), HttpMethod::Link);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "PROPFIND".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, InvalidMethod("PROPFIND".to_string()));
        assert_eq!(err.to_string(), "invalid HTTP method: 'PROPFIND'");
    }

    #[test]
    fn test_from_http_method() {
        assert_eq!(HttpMethod::try_from(&http::Method::PATCH).unwrap(), HttpMethod::Patch);

        let unlink = http::Method::from_bytes(b"UNLINK").unwrap();
        assert_eq!(HttpMethod::try_from(&unlink).unwrap(), HttpMethod::Unlink);

        let propfind = http::Method::from_bytes(b"PROPFIND").unwrap();
        assert!(HttpMethod::try_from(&propfind).is_err());
    }

    #[test]
    fn test_into_http_method() {
        let method: http::Method = HttpMethod::Link.into();
        assert_eq!(method.as_str(), "LINK");
        let method: http::Method = HttpMethod::Options.into();
        assert_eq!(method, http::Method::OPTIONS);
    }
}
