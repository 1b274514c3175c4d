//! Request context types.
//!
//! A [`Context`] is created for every request and owned by the task serving
//! it. It carries the request data (method, path, headers, query, params,
//! body, cookies), typed extensions for middleware, and the response state
//! that handlers write into.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use kaze_router::Params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KazeError, KazeResult};
use crate::render::Renderer;
use crate::response::{
    append_cookie, error_text_to_html, mime_type_for, CookieOptions, ResponseState,
    APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN,
};

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Request cookies, populated by a cookie-parsing middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    /// Parses a `Cookie` header value (`a=1; b=2`).
    #[must_use]
    pub fn parse(header: &str) -> Self {
        Self(
            header
                .split(';')
                .filter_map(|pair| {
                    let (key, value) = pair.trim().split_once('=')?;
                    Some((key.to_string(), value.to_string()))
                })
                .collect(),
        )
    }

    /// Returns the value of a cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no cookie was sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits a raw query string into `key=value` pairs.
///
/// Pairs are split on `&` then on the first `=`; a key without `=` maps to
/// an empty value. Values are not percent-decoded. Repeated keys keep the
/// last value.
#[must_use]
pub fn parse_query(raw: &str) -> IndexMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Per-request state shared by every handler in the chain.
///
/// # Example
///
/// ```
/// use kaze_core::Context;
/// use http::{Method, StatusCode};
///
/// let mut ctx = Context::new(Method::GET, "/search?q=kaze&page=2");
/// assert_eq!(ctx.path(), "/search");
/// assert_eq!(ctx.query_param("q"), Some("kaze"));
///
/// ctx.status(StatusCode::ACCEPTED);
/// ctx.send("ok").unwrap();
/// assert!(ctx.send("again").is_err());
/// ```
pub struct Context {
    request_id: RequestId,
    method: Method,
    path: String,
    raw_query: Option<String>,
    query: IndexMap<String, String>,
    params: Params,
    headers: HeaderMap,
    body: Bytes,
    cookies: Cookies,
    secure: bool,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    dependencies: Option<Arc<dyn Any + Send + Sync>>,
    renderer: Arc<Renderer>,
    response: ResponseState,
    cursor: usize,
    started_at: Instant,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("secure", &self.secure)
            .field("response", &self.response)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a context for `method` and a request target.
    ///
    /// The target may include a query string, which is split off and parsed.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        let query = raw_query.as_deref().map(parse_query).unwrap_or_default();

        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            raw_query,
            query,
            params: Params::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            cookies: Cookies::default(),
            secure: false,
            extensions: HashMap::new(),
            dependencies: None,
            renderer: Arc::new(Renderer::default()),
            response: ResponseState::default(),
            cursor: 0,
            started_at: Instant::now(),
        }
    }

    /// Creates a context from an HTTP request with a collected body.
    #[must_use]
    pub fn from_request(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let mut ctx = Self::new(parts.method, &target);
        ctx.headers = parts.headers;
        ctx.body = body;
        ctx
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Marks the request as received over TLS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Attaches application dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets the template renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    // ---- request side ----

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID (used when one is propagated by the client).
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Raw query string, if any.
    #[must_use]
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Parsed query pairs.
    #[must_use]
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// One query value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Path parameters captured by the matched route.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// One path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Attaches captured parameters. Called by the dispatcher before the
    /// first handler runs.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// One request header as a string.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the request body as JSON.
    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> KazeResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Request cookies.
    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Sets request cookies.
    pub fn set_cookies(&mut self, cookies: Cookies) {
        self.cookies = cookies;
    }

    /// Whether the request arrived over TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Application dependencies, if they are of type `T`.
    #[must_use]
    pub fn dependencies<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.dependencies.as_deref()?.downcast_ref::<T>()
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Index of the handler currently running in the flattened chain.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    // ---- extensions ----

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }

    // ---- response side ----

    /// Current response state.
    #[must_use]
    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    /// Takes the response state, leaving a fresh default in its place.
    pub fn take_response(&mut self) -> ResponseState {
        std::mem::take(&mut self.response)
    }

    /// Sets the response status.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.response.set_status(status);
        self
    }

    /// Sets a response header.
    pub fn header(&mut self, name: &str, value: &str) -> KazeResult<&mut Self> {
        self.response.set_header(name, value)?;
        Ok(self)
    }

    /// Adds a `Set-Cookie` header.
    pub fn set_cookie(&mut self, name: &str, value: &str, options: &CookieOptions) -> KazeResult<()> {
        append_cookie(&mut self.response, &options.serialize(name, value))
    }

    /// Sends a `text/plain` response.
    pub fn send(&mut self, text: impl Into<String>) -> KazeResult<()> {
        self.response.write(TEXT_PLAIN, text.into())
    }

    /// Sends a `text/html` response.
    pub fn html(&mut self, html: impl Into<String>) -> KazeResult<()> {
        self.response.write(TEXT_HTML, html.into())
    }

    /// Serializes `value` and sends it as `application/json`.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> KazeResult<()> {
        if self.response.is_sent() {
            return Err(KazeError::DoubleResponse);
        }
        let body = serde_json::to_vec(value)?;
        self.response.write(APPLICATION_JSON, body)
    }

    /// Sends raw bytes with an explicit content type.
    pub fn send_bytes(&mut self, content_type: &str, body: impl Into<Bytes>) -> KazeResult<()> {
        self.response.write(content_type, body)
    }

    /// Reads a file and sends it with a MIME type detected from its
    /// extension. A read failure is returned before anything is written.
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> KazeResult<()> {
        if self.response.is_sent() {
            return Err(KazeError::DoubleResponse);
        }
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        self.response.write(mime_type_for(path), data)
    }

    /// Renders a template and sends it as HTML.
    ///
    /// If the template cannot be read or the engine fails, an HTML page
    /// describing the failure is sent instead; the status is left as is.
    pub async fn render(&mut self, template: &str, data: Option<serde_json::Value>) -> KazeResult<()> {
        if self.response.is_sent() {
            return Err(KazeError::DoubleResponse);
        }
        let renderer = Arc::clone(&self.renderer);
        match renderer.render(template, data).await {
            Ok(html) => self.html(html),
            Err(err) => {
                tracing::warn!(template, error = %err, "template rendering failed");
                self.html(error_text_to_html(&err.describe()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_query() {
        let ctx = Context::new(Method::GET, "/items?sort=asc&limit=10&flag");
        assert_eq!(ctx.path(), "/items");
        assert_eq!(ctx.raw_query(), Some("sort=asc&limit=10&flag"));
        assert_eq!(ctx.query_param("sort"), Some("asc"));
        assert_eq!(ctx.query_param("limit"), Some("10"));
        assert_eq!(ctx.query_param("flag"), Some(""));
        assert_eq!(ctx.query().len(), 3);
    }

    #[test]
    fn test_parse_query_last_value_wins() {
        let query = parse_query("a=1&a=2&b=x=y");
        assert_eq!(query["a"], "2");
        assert_eq!(query["b"], "x=y");
    }

    #[test]
    fn test_from_request() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("http://localhost/users?active=true")
            .header("content-type", "application/json")
            .body(Bytes::from_static(br#"{"name":"rin"}"#))
            .unwrap();

        let ctx = Context::from_request(request);
        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/users");
        assert_eq!(ctx.query_param("active"), Some("true"));
        assert_eq!(ctx.header_str("content-type"), Some("application/json"));

        let body: serde_json::Value = ctx.body_json().unwrap();
        assert_eq!(body["name"], "rin");
    }

    #[test]
    fn test_cookies_parse() {
        let cookies = Cookies::parse("session=abc; theme=dark;broken");
        assert_eq!(cookies.get("session"), Some("abc"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut ctx = Context::new(Method::GET, "/");
        assert!(ctx.get_extension::<Tenant>().is_none());

        ctx.set_extension(Tenant("acme"));
        assert_eq!(ctx.get_extension::<Tenant>(), Some(&Tenant("acme")));
        assert_eq!(ctx.remove_extension::<Tenant>(), Some(Tenant("acme")));
        assert!(ctx.get_extension::<Tenant>().is_none());
    }

    #[test]
    fn test_dependencies_downcast() {
        struct Db {
            url: &'static str,
        }

        let deps: Arc<dyn Any + Send + Sync> = Arc::new(Db { url: "postgres://" });
        let ctx = Context::new(Method::GET, "/").with_dependencies(Some(deps));

        assert_eq!(ctx.dependencies::<Db>().map(|d| d.url), Some("postgres://"));
        assert!(ctx.dependencies::<String>().is_none());
    }

    #[test]
    fn test_json_response() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.json(&serde_json::json!({ "id": 1 })).unwrap();

        assert_eq!(ctx.response().content_type(), APPLICATION_JSON);
        assert_eq!(ctx.response().body().as_ref(), br#"{"id":1}"#);
        assert!(ctx.json(&1).unwrap_err().is_double_response());
    }

    #[test]
    fn test_status_header_cookie() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.status(StatusCode::CREATED);
        ctx.header("x-powered-by", "kaze").unwrap();
        ctx.set_cookie("a", "1", &CookieOptions::default()).unwrap();
        ctx.set_cookie("b", "2", &CookieOptions::default()).unwrap();
        ctx.html("<h1>made</h1>").unwrap();

        let response = ctx.take_response().into_http();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-powered-by"], "kaze");
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
        assert_eq!(response.headers()["content-type"], TEXT_HTML);
    }

    #[tokio::test]
    async fn test_send_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("style.css");
        std::fs::write(&file, "body{}").unwrap();

        let mut ctx = Context::new(Method::GET, "/");
        ctx.send_file(&file).await.unwrap();
        assert_eq!(ctx.response().content_type(), "text/css; charset=utf-8");
        assert_eq!(ctx.response().body().as_ref(), b"body{}");
    }

    #[tokio::test]
    async fn test_send_missing_file_writes_nothing() {
        let mut ctx = Context::new(Method::GET, "/");
        let err = ctx.send_file("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, KazeError::Io(_)));
        assert!(!ctx.response().is_sent());
    }

    #[tokio::test]
    async fn test_render_failure_sends_error_page() {
        let renderer = Renderer::new(crate::render::Passthrough, "/no-such-views", None);
        let mut ctx = Context::new(Method::GET, "/").with_renderer(Arc::new(renderer));

        ctx.render("index.html", None).await.unwrap();
        assert_eq!(ctx.response().content_type(), TEXT_HTML);
        let body = String::from_utf8(ctx.response().body().to_vec()).unwrap();
        assert!(body.starts_with("IoError"));
    }
}
