//! HTTP server: the transport in front of the router.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Serve HTTP/1.1 and HTTP/2 via hyper-util's auto builder
//! - Buffer request bodies up to `limits.max_body_size`
//! - Hand each request to [`Router::serve_http`] and send what it wrote
//! - Stop accepting on shutdown, then drain open connections
//!
//! # Design Decisions
//! - One Tokio task per connection; the router is shared by handle
//! - Oversized bodies are answered with 413 before any middleware runs
//! - The peer address travels in request extensions as [`RemoteAddr`]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::context::MIME_APPLICATION_JSON_CHARSET_UTF8;
use crate::error::ErrorBody;
use crate::http::request::RemoteAddr;
use crate::http::response::ResponseWriter;
use crate::lifecycle::Shutdown;
use crate::net::{Accepted, ConnectionTracker, Listener, ListenerError};
use crate::routing::Router;

/// Error type for the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// HTTP server dispatching every request to a [`Router`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    tracker: ConnectionTracker,
}

impl HttpServer {
    pub fn new(router: Router, config: ServerConfig) -> Self {
        Self {
            router,
            config,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Serve until `shutdown` fires, then drain connections for
    /// `shutdown.grace_secs`.
    ///
    /// A coordinator triggered before this call stops the server without
    /// accepting anything.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) -> Result<(), ServerError> {
        let mut signal = shutdown.subscribe();
        if shutdown.is_triggered() {
            tracing::info!("Shutdown already triggered, not serving");
            return Ok(());
        }

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");
        self.router.print_routes();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => self.spawn_connection(accepted, signal.resubscribe()),
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                    }
                    Err(e) => return Err(e.into()),
                },
                _ = signal.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        let grace = Duration::from_secs(self.config.shutdown.grace_secs);
        if !self.tracker.wait_for_drain(grace).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Grace period elapsed with connections still open"
            );
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_connection(&self, accepted: Accepted, mut shutdown: broadcast::Receiver<()>) {
        let Accepted {
            stream,
            peer,
            permit,
        } = accepted;
        let guard = self.tracker.track();
        let router = self.router.clone();
        let max_body = self.config.limits.max_body_size;

        tokio::spawn(async move {
            let _permit = permit;
            let service = service_fn(move |request: Request<Incoming>| {
                let router = router.clone();
                async move { Ok::<_, Infallible>(handle(router, peer, max_body, request).await) }
            });

            let builder = auto::Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.recv() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            };
            if let Err(e) = result {
                tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, error = %e, "Connection error");
            }
            drop(guard);
        });
    }
}

/// Buffer the body, attach the peer address and run the router.
async fn handle(
    router: Router,
    peer: SocketAddr,
    max_body: usize,
    request: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let (mut parts, body) = request.into_parts();
    let body = match Limited::new(body, max_body).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(peer_addr = %peer, path = %parts.uri.path(), max_body, "Request body too large");
            return error_response(StatusCode::PAYLOAD_TOO_LARGE);
        }
        Err(e) => {
            tracing::debug!(peer_addr = %peer, error = %e, "Failed to read request body");
            return error_response(StatusCode::BAD_REQUEST);
        }
    };
    parts.extensions.insert(RemoteAddr(peer));

    let mut writer = ResponseWriter::new();
    router
        .serve_http(&mut writer, Request::from_parts(parts, body))
        .await;
    writer.into_response()
}

fn error_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut writer = ResponseWriter::new();
    writer.set_header(
        CONTENT_TYPE,
        HeaderValue::from_static(MIME_APPLICATION_JSON_CHARSET_UTF8),
    );
    writer.write_header(status);
    writer.write(&serde_json::to_vec(&ErrorBody::canonical(status)).unwrap_or_default());
    writer.into_response()
}
