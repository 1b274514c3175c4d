//! Transport-independent request service.

use std::sync::Arc;

use bytes::Bytes;
use kaze_middleware::Dispatcher;
use kaze_router::normalize_path;
use kaze_telemetry::InFlightGuard;

/// Turns buffered HTTP requests into responses through a [`Dispatcher`].
///
/// The TCP server and the in-memory test client both go through here, so
/// they see identical behaviour.
#[derive(Debug, Clone)]
pub struct KazeService {
    dispatcher: Arc<Dispatcher>,
    https: bool,
    strip_trailing_slash: bool,
}

impl KazeService {
    /// Wraps a dispatcher. Trailing slashes are stripped; requests are not
    /// marked secure.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            https: false,
            strip_trailing_slash: true,
        }
    }

    /// Marks every request as secure.
    #[must_use]
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Whether `/users/` is matched as `/users`.
    #[must_use]
    pub fn strip_trailing_slash(mut self, strip: bool) -> Self {
        self.strip_trailing_slash = strip;
        self
    }

    /// The wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one request with a fresh context.
    pub async fn call(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let _in_flight = InFlightGuard::new();
        let mut ctx = self.dispatcher.context_for(request, self.https);

        if self.strip_trailing_slash {
            let normalized = normalize_path(ctx.path()).to_owned();
            if normalized != ctx.path() {
                ctx.set_path(normalized);
            }
        }

        self.dispatcher.handle(ctx).await.into_http()
    }
}
