//! Buffered responses with assertion helpers.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A fully buffered response.
///
/// The `assert_*` methods panic with a readable message and return `&Self`
/// so they can be chained.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Builds a response from raw parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status code as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// `true` for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `true` for 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// `true` for 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// First value of a header, if it is visible ASCII.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a repeated header, in order.
    #[must_use]
    pub fn header_all(&self, name: impl AsRef<str>) -> Vec<&str> {
        self.headers
            .get_all(name.as_ref())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header_str(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
    }

    /// The value a `Set-Cookie` header assigns to `name`.
    ///
    /// Attributes after the first `;` are ignored.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header_all(header::SET_COOKIE.as_str())
            .into_iter()
            .find_map(|line| {
                let pair = line.split(';').next()?;
                let (key, value) = pair.split_once('=')?;
                (key.trim() == name).then_some(value.trim())
            })
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `TestError::BodyRead` if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Body deserialized from JSON.
    ///
    /// # Errors
    ///
    /// Returns `TestError::Json` if the body does not deserialize into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Body as an untyped JSON value.
    ///
    /// # Errors
    ///
    /// Returns `TestError::Json` if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {:?}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "expected status {expected}, got {}",
            self.status.as_u16()
        );
        self
    }

    /// # Panics
    ///
    /// Panics unless the status is 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(self.is_success(), "expected success status, got {}", self.status);
        self
    }

    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let (name, expected) = (name.as_ref(), expected.as_ref());
        match self.header_str(name) {
            Some(actual) => assert_eq!(actual, expected, "header '{name}' mismatch"),
            None => panic!("header '{name}' not found"),
        }
        self
    }

    /// # Panics
    ///
    /// Panics if `Content-Type` is missing or does not start with `expected`.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        match self.content_type() {
            Some(actual) => assert!(
                actual.starts_with(expected),
                "content type: expected '{expected}', got '{actual}'"
            ),
            None => panic!("Content-Type header not found"),
        }
        self
    }

    /// # Panics
    ///
    /// Panics if the body does not contain `expected`.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(body.contains(expected), "body should contain '{expected}', got: {body}");
        self
    }

    /// # Panics
    ///
    /// Panics if the body differs.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        assert_eq!(String::from_utf8_lossy(&self.body), expected.as_ref(), "body mismatch");
        self
    }

    /// # Panics
    ///
    /// Panics if the body is not JSON equal to `expected`.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body mismatch"),
            Err(err) => panic!("body is not JSON: {err}"),
        }
        self
    }

    /// Checks one field addressed by a dotted path such as `errors.0.message`.
    ///
    /// # Panics
    ///
    /// Panics if the path is missing or its value differs.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json = match self.json_value() {
            Ok(json) => json,
            Err(err) => panic!("body is not JSON: {err}"),
        };
        match json_path(&json, path) {
            Some(actual) => assert_eq!(actual, expected, "JSON field '{path}' mismatch"),
            None => panic!("JSON path '{path}' not found in {json}"),
        }
        self
    }
}

impl From<http::Response<Bytes>> for TestResponse {
    fn from(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.headers, body)
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(segment),
        })
}
