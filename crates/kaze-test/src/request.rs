//! Request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;

/// Builds a buffered `http::Request`.
///
/// Invalid headers or bodies do not panic while chaining; the first
/// problem is reported by [`build`](Self::build).
///
/// ```
/// use http::Method;
/// use kaze_test::TestRequestBuilder;
///
/// let request = TestRequestBuilder::new(Method::POST, "/users?page=2")
///     .header("x-trace", "abc")
///     .body("hello")
///     .build()
///     .unwrap();
/// assert_eq!(request.uri().query(), Some("page=2"));
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    cookies: Vec<String>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// A request for `method uri`.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let (name, value) = (name.as_ref(), value.as_ref());
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => self.fail(TestError::InvalidHeader(format!("{name}: {value}"))),
        }
        self
    }

    /// Sets `Content-Type`.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        match HeaderValue::try_from(content_type.as_ref()) {
            Ok(value) => {
                self.headers.insert(header::CONTENT_TYPE, value);
            }
            Err(_) => self.fail(TestError::InvalidHeader(content_type.as_ref().to_string())),
        }
        self
    }

    /// Adds a `name=value` pair to the `Cookie` header.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.cookies.push(format!("{}={}", name.as_ref(), value.as_ref()));
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Bytes::from(body);
                self.content_type("application/json")
            }
            Err(err) => {
                self.fail(TestError::Json(err));
                self
            }
        }
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first header or body error, or `TestError::RequestBuild`
    /// for an invalid URI.
    pub fn build(self) -> Result<http::Request<Bytes>, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut builder = http::Request::builder().method(self.method).uri(&self.uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
            if !self.cookies.is_empty() {
                let value = HeaderValue::try_from(self.cookies.join("; "))
                    .map_err(|e| TestError::InvalidHeader(e.to_string()))?;
                headers.insert(header::COOKIE, value);
            }
        }
        builder
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }

    fn fail(&mut self, err: TestError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequestBuilder::new(Method::POST, "/users")
            .json(&serde_json::json!({"name": "Ada"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body().as_ref(), br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_cookies_are_joined() {
        let request = TestRequestBuilder::new(Method::GET, "/")
            .cookie("a", "1")
            .cookie("b", "2")
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::COOKIE], "a=1; b=2");
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let err = TestRequestBuilder::new(Method::GET, "/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequestBuilder::new(Method::GET, "http://[::1").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }
}
