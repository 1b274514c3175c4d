//! In-memory client.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use kaze_server::{Kaze, KazeService};
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight into an application's [`KazeService`], without
/// binding a socket.
///
/// Requests go through the same path normalisation and dispatch as the TCP
/// server, so a test sees exactly what a real client would.
///
/// ```
/// use kaze_core::handler_fn;
/// use kaze_server::Kaze;
/// use kaze_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let mut app = Kaze::new();
/// app.get("/ping", [handler_fn(|ctx, _next| Box::pin(async move { ctx.send("pong") }))]);
///
/// let client = TestClient::new(app);
/// client.get("/ping").send().await.assert_status_code(200).assert_body_eq("pong");
/// # });
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    service: Arc<KazeService>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Finalizes `app` and wraps its service.
    pub fn new(app: Kaze) -> Self {
        Self::from_service(app.into_service())
    }

    pub fn from_service(service: KazeService) -> Self {
        Self {
            service: Arc::new(service),
            default_headers: Vec::new(),
        }
    }

    /// Adds a header to every request this client sends.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn service(&self) -> &KazeService {
        &self.service
    }

    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// A request with an arbitrary method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest { client: self, builder }
    }

    /// Sends a prebuilt request.
    pub async fn send_request(&self, request: http::Request<Bytes>) -> TestResponse {
        TestResponse::from(self.service.call(request).await)
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("authorization", value)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built. Use
    /// [`try_send`](Self::try_send) to handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("failed to send test request: {err}"),
        }
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if a header, the body or the URI is invalid.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.send_request(request).await)
    }
}
