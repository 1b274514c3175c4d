//! The HTTP/1 listener.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;
use crate::service::KazeService;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// A bound listener serving a [`KazeService`].
///
/// Created by [`Kaze::bind`](crate::Kaze::bind).
#[derive(Debug)]
pub struct Server {
    service: Arc<KazeService>,
    listener: TcpListener,
    shutdown_timeout: Duration,
}

impl Server {
    /// Binds `addr`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::InvalidAddress` or `ServerError::Bind`.
    pub async fn bind(service: KazeService, addr: &str, shutdown_timeout: Duration) -> Result<Self, ServerError> {
        let socket: SocketAddr = addr.parse().map_err(|e| ServerError::invalid_address(addr, e))?;
        let listener = TcpListener::bind(socket)
            .await
            .map_err(|source| ServerError::Bind { addr: socket, source })?;

        Ok(Self {
            service: Arc::new(service),
            listener,
            shutdown_timeout,
        })
    }

    /// The bound address (useful after binding port 0).
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Io` if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; accept failures are logged.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered, then waits up to the shutdown
    /// timeout for open connections to finish.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; accept failures are logged.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let tracker = ConnectionTracker::new();
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "kaze listening");
        }

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let service = Arc::clone(&self.service);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(service, stream, shutdown).await {
                                tracing::debug!(%remote_addr, error = %err, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracing::info!(
            timeout_secs = self.shutdown_timeout.as_secs(),
            connections = tracker.active_connections(),
            "waiting for connections to close"
        );
        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(self.shutdown_timeout) => tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    service: Arc<KazeService>,
    stream: TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let svc = service_fn(move |req: Request<Incoming>| {
        let service = Arc::clone(&service);
        async move { handle_request(&service, req).await }
    });

    let conn = http1::Builder::new().serve_connection(io, svc);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle_request(service: &KazeService, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(http.path = %parts.uri.path(), error = %err, "failed to read request body");
            let mut response = Response::new(Full::new(Bytes::from_static(b"Failed to read request body.")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    let response = service.call(Request::from_parts(parts, body)).await;
    Ok(response.map(Full::new))
}
