//! Bearer token authentication.

use std::sync::Arc;

use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::StatusCode;

use crate::context::Context;
use crate::error::ErrorBody;
use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};

fn bearer_token(ctx: &Context) -> Option<&str> {
    ctx.request()
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Reject requests whose `Authorization` header is not `Bearer <token>`.
///
/// Rejected requests get `401` with a JSON body and a `WWW-Authenticate`
/// challenge; the inner chain is not called.
pub fn bearer_auth(token: impl Into<String>) -> Middleware {
    let token: Arc<str> = Arc::from(token.into());
    middleware_fn(move |next: Handler| {
        let token = token.clone();
        handler_fn(move |ctx| {
            let next = next.clone();
            let token = token.clone();
            Box::pin(async move {
                if bearer_token(ctx) == Some(&*token) {
                    return next(ctx).await;
                }
                tracing::warn!(path = %ctx.path(), client = %ctx.real_ip(), "Rejected unauthenticated request");
                ctx.response_mut()
                    .set_header(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                ctx.json(
                    StatusCode::UNAUTHORIZED,
                    &ErrorBody::canonical(StatusCode::UNAUTHORIZED),
                )
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseWriter;
    use crate::routing::{Router, Routes};
    use bytes::Bytes;
    use hyper::Request;

    async fn call(router: &Router, auth: Option<&str>) -> ResponseWriter {
        let mut builder = Request::builder().uri("/admin/stats");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let mut writer = ResponseWriter::new();
        router
            .serve_http(&mut writer, builder.body(Bytes::new()).unwrap())
            .await;
        writer
    }

    fn router() -> Router {
        let router = Router::new(false);
        let mut admin = router.group("/admin");
        admin.use_middleware(&[bearer_auth("s3cret")]);
        admin.get(
            "/stats",
            handler_fn(|ctx| Box::pin(async move { ctx.text(StatusCode::OK, "stats") })),
            &[],
        );
        router
    }

    #[tokio::test]
    async fn accepts_matching_token() {
        let writer = call(&router(), Some("Bearer s3cret")).await;
        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.body(), b"stats");
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_token() {
        for auth in [None, Some("Bearer nope"), Some("Basic czNjcmV0")] {
            let writer = call(&router(), auth).await;
            assert_eq!(writer.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
            assert_eq!(writer.headers()[WWW_AUTHENTICATE], "Bearer");
            assert_eq!(
                writer.body(),
                br#"{"code":401,"message":"Unauthorized"}"#
            );
        }
    }
}
