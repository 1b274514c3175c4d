//! Per-request response state.
//!
//! Handlers never write to the transport directly. Each terminal write
//! (`send`, `json`, `html`, ...) fills a [`ResponseState`] and marks it sent;
//! the server turns the state into an HTTP response once the chain returns.
//! A second terminal write fails with [`KazeError::DoubleResponse`] and leaves
//! the first response untouched.

use std::fmt::Write as _;
use std::path::Path;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SET_COOKIE};
use http::StatusCode;

use crate::error::{KazeError, KazeResult};

/// Content type used by `send`.
pub const TEXT_PLAIN: &str = "text/plain";
/// Content type used by `html` and `render`.
pub const TEXT_HTML: &str = "text/html";
/// Content type used by `json`.
pub const APPLICATION_JSON: &str = "application/json";

/// Status, headers and body accumulated for one request.
///
/// Every request starts from the same defaults: status 200, content type
/// `text/plain`, empty body, not sent.
#[derive(Debug, Clone)]
pub struct ResponseState {
    status: StatusCode,
    content_type: String,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: TEXT_PLAIN.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }
}

impl ResponseState {
    /// Current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code. Allowed before or after the body is written.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Content type of the written body.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Extra headers set by handlers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets a header, replacing earlier values.
    pub fn set_header(&mut self, name: &str, value: &str) -> KazeResult<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Adds a header value without removing earlier ones.
    pub fn append_header(&mut self, name: &str, value: &str) -> KazeResult<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` once a terminal write has happened.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Performs a terminal write.
    pub fn write(&mut self, content_type: &str, body: impl Into<Bytes>) -> KazeResult<()> {
        if self.sent {
            return Err(KazeError::DoubleResponse);
        }
        self.content_type = content_type.to_string();
        self.body = body.into();
        self.sent = true;
        Ok(())
    }

    /// Builds the final HTTP response.
    ///
    /// `content-type` and `content-length` always reflect the written body.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        *headers = self.headers;
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
        let len = response.body().len();
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(len));
        response
    }
}

fn parse_header(name: &str, value: &str) -> KazeResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| KazeError::internal_with_source(format!("invalid header name '{name}'"), e))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| KazeError::internal_with_source(format!("invalid value for header '{name}'"), e))?;
    Ok((header_name, header_value))
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl SameSite {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes for a `Set-Cookie` header.
///
/// # Example
///
/// ```
/// use kaze_core::{CookieOptions, SameSite};
///
/// let options = CookieOptions {
///     path: Some("/".into()),
///     max_age: Some(3600),
///     http_only: true,
///     same_site: Some(SameSite::Lax),
///     ..Default::default()
/// };
/// assert_eq!(
///     options.serialize("session", "abc"),
///     "session=abc; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// `Path` attribute
    pub path: Option<String>,
    /// `Domain` attribute
    pub domain: Option<String>,
    /// `Max-Age` in seconds
    pub max_age: Option<i64>,
    /// `Expires`, already formatted as an HTTP date
    pub expires: Option<String>,
    /// `Secure` flag
    pub secure: bool,
    /// `HttpOnly` flag
    pub http_only: bool,
    /// `SameSite` attribute
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Formats a `Set-Cookie` header value.
    #[must_use]
    pub fn serialize(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{name}={value}");
        if let Some(path) = &self.path {
            let _ = write!(cookie, "; Path={path}");
        }
        if let Some(domain) = &self.domain {
            let _ = write!(cookie, "; Domain={domain}");
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(cookie, "; Max-Age={max_age}");
        }
        if let Some(expires) = &self.expires {
            let _ = write!(cookie, "; Expires={expires}");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            let _ = write!(cookie, "; SameSite={}", same_site.as_str());
        }
        cookie
    }
}

pub(crate) fn append_cookie(state: &mut ResponseState, cookie: &str) -> KazeResult<()> {
    state.append_header(SET_COOKIE.as_str(), cookie)
}

/// Detects a MIME type from a file extension.
#[must_use]
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",

        // Documents and media
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "wasm" => "application/wasm",

        _ => "application/octet-stream",
    }
}

/// Renders error text as HTML: escapes markup and turns each line break
/// into `<br/>` followed by a four-space indent.
#[must_use]
pub fn error_text_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '\n' => html.push_str("<br/>&nbsp;&nbsp;&nbsp;&nbsp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '&' => html.push_str("&amp;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            _ => html.push(ch),
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ResponseState::default();
        assert_eq!(state.status(), StatusCode::OK);
        assert_eq!(state.content_type(), TEXT_PLAIN);
        assert!(state.body().is_empty());
        assert!(!state.is_sent());
    }

    #[test]
    fn test_second_write_rejected() {
        let mut state = ResponseState::default();
        state.write(TEXT_PLAIN, "first").unwrap();

        let err = state.write(TEXT_HTML, "second").unwrap_err();
        assert!(err.is_double_response());
        assert_eq!(state.body().as_ref(), b"first");
        assert_eq!(state.content_type(), TEXT_PLAIN);
    }

    #[test]
    fn test_into_http_sets_length_and_type() {
        let mut state = ResponseState::default();
        state.set_status(StatusCode::CREATED);
        state.set_header("x-trace", "abc").unwrap();
        state.write(APPLICATION_JSON, r#"{"ok":true}"#).unwrap();

        let response = state.into_http();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(response.headers()[CONTENT_LENGTH], "11");
        assert_eq!(response.headers()["x-trace"], "abc");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut state = ResponseState::default();
        assert!(state.set_header("bad header", "x").is_err());
        assert!(state.set_header("x-ok", "line\nbreak").is_err());
    }

    #[test]
    fn test_cookie_serialize_minimal() {
        let options = CookieOptions::default();
        assert_eq!(options.serialize("a", "1"), "a=1");
    }

    #[test]
    fn test_cookie_serialize_all() {
        let options = CookieOptions {
            path: Some("/app".into()),
            domain: Some("example.com".into()),
            max_age: Some(60),
            expires: Some("Wed, 21 Oct 2026 07:28:00 GMT".into()),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Strict),
        };
        assert_eq!(
            options.serialize("id", "x"),
            "id=x; Path=/app; Domain=example.com; Max-Age=60; \
             Expires=Wed, 21 Oct 2026 07:28:00 GMT; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("index.HTML")), "text/html; charset=utf-8");
        assert_eq!(mime_type_for(Path::new("a/b/data.json")), "application/json");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_error_text_to_html() {
        assert_eq!(
            error_text_to_html("boom\ncaused by: <x>"),
            "boom<br/>&nbsp;&nbsp;&nbsp;&nbsp;caused by: &lt;x&gt;"
        );
    }
}
