//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use bytes::Bytes;
use hyper::Request;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use strata::config::ServerConfig;
use strata::http::server::ServerError;
use strata::net::Listener;
use strata::prelude::*;
use strata::{HttpServer, ResponseWriter, Shutdown};

/// Key under which [`marker`] middleware records its visits.
pub const TRAIL: &str = "trail";

/// Middleware that appends `name` to the request's trail before continuing.
pub fn marker(name: &'static str) -> Middleware {
    middleware_fn(move |next: Handler| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                push_trail(ctx, name);
                next(ctx).await
            })
        })
    })
}

pub fn push_trail(ctx: &mut Context, name: &str) {
    let mut trail: Vec<String> = ctx.get::<Vec<String>>(TRAIL).cloned().unwrap_or_default();
    trail.push(name.to_string());
    ctx.set(TRAIL, trail);
}

/// Handler that records itself, then answers with the trail joined by `>`.
pub fn trail_handler() -> Handler {
    handler_fn(|ctx| {
        Box::pin(async move {
            push_trail(ctx, "handler");
            let trail = ctx.get::<Vec<String>>(TRAIL).cloned().unwrap_or_default();
            ctx.text(StatusCode::OK, &trail.join(">"))
        })
    })
}

/// Handler answering a fixed text body.
pub fn reply(body: &'static str) -> Handler {
    handler_fn(move |ctx| Box::pin(async move { ctx.text(StatusCode::OK, body) }))
}

pub fn request(method: &str, uri: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// Dispatch `request` straight through the router, without a socket.
pub async fn dispatch(router: &Router, request: Request<Bytes>) -> ResponseWriter {
    let mut writer = ResponseWriter::new();
    router.serve_http(&mut writer, request).await;
    writer
}

pub fn body_text(writer: &ResponseWriter) -> String {
    String::from_utf8_lossy(writer.body()).into_owned()
}

/// A server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the serve loop to return.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        self.handle.await.expect("server task panicked")
    }
}

pub async fn start_server(router: Router, config: ServerConfig) -> TestServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, config.listener.max_connections).unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(router, config);
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
