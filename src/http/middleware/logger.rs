//! Request logging.

use std::time::Instant;

use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};
use crate::http::middleware::request_id::RequestIdExt;

/// Log one line per request with method, path, status and latency.
///
/// Failed chains are logged at `warn` with the error; the error is passed on
/// unchanged.
pub fn logger() -> Middleware {
    middleware_fn(|next: Handler| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                let start = Instant::now();
                let method = ctx.method().clone();
                let path = ctx.path().to_string();
                let client = ctx.real_ip();

                let result = next(&mut *ctx).await;

                let status = ctx.response().status().as_u16();
                let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                let request_id = ctx.request_id().unwrap_or("-");
                match &result {
                    Ok(()) => tracing::info!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        client = %client,
                        status,
                        latency_ms,
                        "Request handled"
                    ),
                    Err(err) => tracing::warn!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        client = %client,
                        status,
                        latency_ms,
                        error = %err,
                        "Request failed"
                    ),
                }
                result
            })
        })
    })
}
