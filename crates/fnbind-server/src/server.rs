//! The HTTP server.
//!
//! Accepts TCP connections, serves HTTP/1.1 on each with `hyper`, and
//! hands every request to the [`Router`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fnbind_server::{Router, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.post("/greet", greet)?;
//!
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, router).run().await?;
//!     Ok(())
//! }
//! ```

use crate::config::ServerConfig;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;
use crate::HttpResponse;
use fnbind_codec::{Decoder, Encoder, JsonDecoder, JsonEncoder};
use fnbind_core::{RequestContext, StatusedError};
use http::{Request, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::task::TaskTracker;

/// Server error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("Bind error: {0}")]
    BindError(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// An HTTP server around a [`Router`].
#[derive(Debug)]
pub struct Server<D = JsonDecoder, E = JsonEncoder> {
    config: ServerConfig,
    router: Arc<Router<D, E>>,
}

impl<D: Decoder, E: Encoder> Server<D, E> {
    /// Creates a server for `router`.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router<D, E>) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router<D, E> {
        &self.router
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be
    /// bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be
    /// bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!(
                "Invalid address '{}': {}",
                self.config.http_addr(),
                e
            ))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        self.run_with_listener(listener, shutdown).await
    }

    /// Runs on an already bound listener until `shutdown` fires.
    ///
    /// After shutdown, open connections finish their in-flight requests
    /// for up to the configured shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::IoError(e.to_string()))?;
        tracing::info!("Server listening on {}", local_addr);

        let request_timeout = self.config.request_timeout();
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let router = Arc::clone(&self.router);
                            let shutdown = shutdown.clone();

                            tracker.spawn(async move {
                                if let Err(e) = handle_connection(
                                    router,
                                    stream,
                                    remote_addr,
                                    request_timeout,
                                    shutdown,
                                )
                                .await
                                {
                                    tracing::debug!("Connection error from {}: {}", remote_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        tracker.close();

        let shutdown_timeout = self.config.shutdown_timeout();
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.len()
        );

        tokio::select! {
            () = tracker.wait() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.len()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Serves one connection, finishing in-flight requests on shutdown.
async fn handle_connection<D: Decoder, E: Encoder>(
    router: Arc<Router<D, E>>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    request_timeout: Duration,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let request_shutdown = shutdown.clone();

    let service = service_fn(move |request: Request<Incoming>| {
        let router = Arc::clone(&router);
        let context = RequestContext::with_cancellation(request_shutdown.child_token());
        async move {
            Ok::<_, Infallible>(handle_request(&router, request, context, request_timeout).await)
        }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            tracing::debug!("Closing connection from {} for shutdown", remote_addr);
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Serves one request under the request timeout.
async fn handle_request<D, E>(
    router: &Router<D, E>,
    request: Request<Incoming>,
    context: RequestContext,
    request_timeout: Duration,
) -> HttpResponse {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!("{} {}", method, path);

    match tokio::time::timeout(request_timeout, router.serve_with_context(request, context)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("Request timed out for {} {}", method, path);
            router.render_fault(&StatusedError::new(
                StatusCode::GATEWAY_TIMEOUT,
                "request timed out",
            ))
        }
    }
}
