//! Request-side helpers shared by the server and the context.
//!
//! # Responsibilities
//! - Carry the peer address from the listener into the request
//! - Resolve the real client address and scheme behind proxies
//! - Define the request ID header name

use std::net::SocketAddr;

use bytes::Bytes;
use hyper::Request;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Peer address of the TCP connection, stored in request extensions by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

fn header<'r>(request: &'r Request<Bytes>, name: &str) -> Option<&'r str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address, preferring proxy headers over the socket peer.
///
/// Order: first `X-Forwarded-For` entry, `X-Real-IP`, then the peer address.
/// Returns an empty string when none is known.
pub fn real_ip(request: &Request<Bytes>) -> String {
    if let Some(forwarded) = header(request, X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    if let Some(real) = header(request, X_REAL_IP) {
        return real.to_string();
    }
    request
        .extensions()
        .get::<RemoteAddr>()
        .map(|addr| addr.0.ip().to_string())
        .unwrap_or_default()
}

/// Request scheme: `X-Forwarded-Proto`, then the URI scheme, then `http`.
pub fn scheme(request: &Request<Bytes>) -> String {
    if let Some(proto) = header(request, X_FORWARDED_PROTO) {
        return proto.to_ascii_lowercase();
    }
    request
        .uri()
        .scheme_str()
        .unwrap_or("http")
        .to_ascii_lowercase()
}
