//! Request correlation IDs.
//!
//! # Design Decisions
//! - An incoming `X-Request-ID` is kept if it is printable ASCII and short
//! - Otherwise a UUID v4 is generated
//! - The ID is echoed on the response and stored in the context

use hyper::header::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::context::Context;
use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};
use crate::http::request::X_REQUEST_ID;

/// Scratch-store key holding the [`RequestId`].
pub const REQUEST_ID_KEY: &str = "request_id";

const MAX_INCOMING_LEN: usize = 128;

/// Correlation ID for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Read the request ID stored by [`request_id`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for Context {
    fn request_id(&self) -> Option<&str> {
        self.get::<RequestId>(REQUEST_ID_KEY).map(|id| id.0.as_str())
    }
}

fn incoming_id(ctx: &Context) -> Option<String> {
    let value = ctx.request().headers().get(X_REQUEST_ID)?.to_str().ok()?;
    let valid = !value.is_empty()
        && value.len() <= MAX_INCOMING_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    valid.then(|| value.to_string())
}

/// Attach a request ID to every request passing through.
pub fn request_id() -> Middleware {
    middleware_fn(|next: Handler| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                let id = incoming_id(ctx).unwrap_or_else(|| Uuid::new_v4().to_string());
                if let Ok(value) = HeaderValue::from_str(&id) {
                    ctx.response_mut()
                        .set_header(HeaderName::from_static(X_REQUEST_ID), value);
                }
                ctx.set(REQUEST_ID_KEY, RequestId(id));
                next(ctx).await
            })
        })
    })
}
