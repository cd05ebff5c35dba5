//! Panic and error recovery.
//!
//! Turns a panicking or failing downstream chain into a JSON error response,
//! so clients never see an empty reply for a handler failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use hyper::StatusCode;

use crate::context::Context;
use crate::error::{Error, ErrorBody};
use crate::handler::{handler_fn, middleware_fn, Handler, HandlerResult, Middleware};

/// Catch panics and `Err` results from everything inside this layer.
///
/// - panic → `500` with a generic message
/// - `Err(e)` → `e.status()`; the error text is only exposed for 4xx statuses
///
/// Nothing is written if the response was already committed. The layer itself
/// always returns `Ok(())` except when writing the error body fails.
pub fn recover() -> Middleware {
    middleware_fn(|next: Handler| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                match AssertUnwindSafe(next(&mut *ctx)).catch_unwind().await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(err)) => {
                        let status = err.status();
                        if status.is_server_error() {
                            tracing::error!(path = %ctx.path(), status = status.as_u16(), error = %err, "Handler failed");
                        } else {
                            tracing::warn!(path = %ctx.path(), status = status.as_u16(), error = %err, "Handler rejected request");
                        }
                        write_error(ctx, status, &err)
                    }
                    Err(panic) => {
                        tracing::error!(
                            path = %ctx.path(),
                            panic = %panic_message(panic.as_ref()),
                            "Handler panicked"
                        );
                        let status = StatusCode::INTERNAL_SERVER_ERROR;
                        write_body(ctx, status, ErrorBody::canonical(status))
                    }
                }
            })
        })
    })
}

fn write_error(ctx: &mut Context, status: StatusCode, err: &Error) -> HandlerResult {
    if status.is_client_error() {
        let message = err.to_string();
        write_body(ctx, status, ErrorBody::new(status, &message))
    } else {
        write_body(ctx, status, ErrorBody::canonical(status))
    }
}

fn write_body(ctx: &mut Context, status: StatusCode, body: ErrorBody<'_>) -> HandlerResult {
    if ctx.response().is_committed() {
        tracing::debug!(status = status.as_u16(), "Response already committed, not writing error");
        return Ok(());
    }
    ctx.json(status, &body)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
