//! Request metrics layer.

use std::time::Instant;

use crate::handler::{handler_fn, middleware_fn, Handler, Middleware};
use crate::observability::metrics::record_request;

/// Record a request counter and latency histogram for everything inside.
///
/// Place it inside [`recover`](super::recover) so the recorded status is the
/// one actually sent.
pub fn metrics() -> Middleware {
    middleware_fn(|next: Handler| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                let start = Instant::now();
                let method = ctx.method().as_str().to_string();
                let result = next(&mut *ctx).await;
                record_request(&method, ctx.response().status().as_u16(), start);
                result
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
    use hyper::{Request, StatusCode};
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::MetricKind;

    #[test]
    fn records_counter_and_latency() {
        let router = Router::new(false);
        router.use_middleware(&[metrics()]);
        router.post(
            "/items",
            handler_fn(|ctx| Box::pin(async move { ctx.text(StatusCode::CREATED, "made") })),
            &[],
        );

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let status = metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let request = Request::builder()
                    .method("POST")
                    .uri("/items")
                    .body(Bytes::new())
                    .unwrap();
                let mut writer = ResponseWriter::new();
                router.serve_http(&mut writer, request).await;
                writer.status()
            })
        });
        assert_eq!(status, StatusCode::CREATED);

        let mut requests = None;
        let mut latencies = None;
        for (key, _, _, value) in snapshotter.snapshot().into_vec() {
            let labels: Vec<(String, String)> = key
                .key()
                .labels()
                .map(|l| (l.key().to_string(), l.value().to_string()))
                .collect();
            match (key.kind(), key.key().name(), value) {
                (MetricKind::Counter, "strata_requests_total", DebugValue::Counter(n)) => {
                    assert!(labels.contains(&("method".into(), "POST".into())));
                    assert!(labels.contains(&("status".into(), "201".into())));
                    requests = Some(n);
                }
                (MetricKind::Histogram, "strata_request_duration_seconds", DebugValue::Histogram(v)) => {
                    assert!(labels.contains(&("method".into(), "POST".into())));
                    latencies = Some(v.len());
                }
                _ => {}
            }
        }
        assert_eq!(requests, Some(1));
        assert_eq!(latencies, Some(1));
    }
}
