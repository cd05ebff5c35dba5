//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Own the routing table and the process-wide `pre` / `global` middleware
//! - Fold route middleware into handlers at registration time
//! - Dispatch a request through pre → lookup → global → route chain
//!
//! # Design Decisions
//! - `Router` is a cheap clonable handle; groups hold a clone
//! - State sits behind a `parking_lot::RwLock` so late registration is safe;
//!   the lock is never held across an `.await`
//! - Unmatched requests go to a not-found handler (default: 404 JSON)
//! - Errors escaping the chain are logged and dropped, never surfaced to the transport

use std::sync::{Arc, Weak};

use bytes::Bytes;
use hyper::{Request, StatusCode};
use parking_lot::RwLock;

use crate::context::Context;
use crate::error::ErrorBody;
use crate::handler::{compose, handler_fn, Handler, Middleware};
use crate::http::response::ResponseWriter;
use crate::routing::group::Group;
use crate::routing::method::Method;
use crate::routing::table::{RouteEntry, RouteTable};
use crate::routing::Routes;

struct RouterState {
    table: RouteTable,
    pre: Vec<Middleware>,
    global: Vec<Middleware>,
    not_found: Handler,
}

/// One registered binding, as reported by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    /// Normalized (case-folded) path.
    pub path: String,
    /// Group and route middleware folded into the handler.
    pub middleware: usize,
}

/// Root of the routing table.
#[derive(Clone)]
pub struct Router {
    state: Arc<RwLock<RouterState>>,
    debug: bool,
}

/// Non-owning router handle, for handlers that need to inspect the router
/// they are registered in without keeping it alive.
#[derive(Clone)]
pub struct WeakRouter {
    state: Weak<RwLock<RouterState>>,
    debug: bool,
}

impl WeakRouter {
    pub fn upgrade(&self) -> Option<Router> {
        Some(Router {
            state: self.state.upgrade()?,
            debug: self.debug,
        })
    }
}

impl Router {
    /// Create an empty router. With `debug` set, [`Router::print_routes`]
    /// logs the table.
    pub fn new(debug: bool) -> Self {
        Self {
            state: Arc::new(RwLock::new(RouterState {
                table: RouteTable::new(),
                pre: Vec::new(),
                global: Vec::new(),
                not_found: default_not_found(),
            })),
            debug,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn downgrade(&self) -> WeakRouter {
        WeakRouter {
            state: Arc::downgrade(&self.state),
            debug: self.debug,
        }
    }

    /// Append middleware that runs before route lookup, outermost of all.
    pub fn pre(&self, middleware: &[Middleware]) {
        self.state.write().pre.extend_from_slice(middleware);
    }

    /// Append middleware that wraps every matched route.
    pub fn use_middleware(&self, middleware: &[Middleware]) {
        self.state.write().global.extend_from_slice(middleware);
    }

    /// Replace the handler answering requests with no matching route.
    pub fn set_not_found(&self, handler: Handler) {
        self.state.write().not_found = handler;
    }

    /// Create a group rooted at `prefix` with no middleware of its own.
    pub fn group(&self, prefix: &str) -> Group {
        Group::new(prefix, self.clone())
    }

    /// Stored handler for an exact, case-insensitive (method, path) match.
    pub fn find(&self, method: Method, path: &str) -> Option<Handler> {
        self.state
            .read()
            .table
            .find(method, path)
            .map(|entry| entry.handler.clone())
    }

    /// Every registered binding, sorted by method then path.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.state
            .read()
            .table
            .iter_sorted()
            .into_iter()
            .map(|(method, path, entry)| RouteInfo {
                method,
                path: path.to_string(),
                middleware: entry.middleware,
            })
            .collect()
    }

    /// Log the routing table when the router was built in debug mode.
    pub fn print_routes(&self) {
        if !self.debug {
            return;
        }
        let routes = self.routes();
        tracing::info!(count = routes.len(), "Registered routes");
        for route in routes {
            tracing::info!(
                method = %route.method,
                path = %route.path,
                middleware = route.middleware,
                "  route"
            );
        }
    }

    /// Handle one request, leaving the outcome in `response`.
    ///
    /// Runs `pre(lookup → global(route handler))` with a fresh [`Context`].
    /// Nothing is returned: an error reaching this point means no middleware
    /// handled it, so it is logged and whatever the writer holds is sent.
    pub async fn serve_http(&self, response: &mut ResponseWriter, request: Request<Bytes>) {
        let pre = self.state.read().pre.clone();
        let chain = compose(self.route_step(), &pre);

        let mut ctx = Context::new(request, std::mem::take(response));
        if let Err(err) = chain(&mut ctx).await {
            tracing::debug!(
                method = %ctx.method(),
                path = %ctx.path(),
                committed = ctx.response().is_committed(),
                error = %err,
                "Unhandled error reached the dispatcher"
            );
        }
        *response = ctx.into_response();
    }

    /// Base of the per-request chain: resolve the route and invoke it.
    fn route_step(&self) -> Handler {
        let router = self.clone();
        handler_fn(move |ctx| {
            let router = router.clone();
            Box::pin(async move {
                let handler = router.resolve(ctx.request());
                handler(ctx).await
            })
        })
    }

    /// Matched handler wrapped in global middleware, or the not-found handler.
    ///
    /// Middleware constructors are user code and may touch the router, so
    /// they run only after the read guard is released.
    fn resolve(&self, request: &Request<Bytes>) -> Handler {
        let path = request.uri().path();
        let (matched, global) = {
            let state = self.state.read();
            let matched = Method::from_http(request.method())
                .and_then(|method| state.table.find(method, path))
                .map(|entry| entry.handler.clone());
            match matched {
                Some(handler) => (handler, state.global.clone()),
                None => {
                    tracing::debug!(method = %request.method(), path = %path, "No route matched");
                    return state.not_found.clone();
                }
            }
        };
        compose(matched, &global)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Router")
            .field("routes", &state.table)
            .field("pre", &state.pre.len())
            .field("global", &state.global.len())
            .field("debug", &self.debug)
            .finish()
    }
}

impl Routes for Router {
    fn add(&self, method: Method, path: &str, handler: Handler, middleware: &[Middleware]) {
        let entry = RouteEntry {
            handler: compose(handler, middleware),
            middleware: middleware.len(),
        };
        let replaced = self.state.write().table.insert(method, path, entry);
        if replaced {
            tracing::debug!(method = %method, path = %path, "Route replaced");
        } else {
            tracing::trace!(
                method = %method,
                path = %path,
                middleware = middleware.len(),
                "Route registered"
            );
        }
    }
}

fn default_not_found() -> Handler {
    handler_fn(|ctx| {
        Box::pin(async move {
            ctx.json(
                StatusCode::NOT_FOUND,
                &ErrorBody::canonical(StatusCode::NOT_FOUND),
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::middleware_fn;

    fn reply(body: &'static str) -> Handler {
        handler_fn(move |ctx| Box::pin(async move { ctx.text(StatusCode::OK, body) }))
    }

    async fn dispatch(router: &Router, method: &str, uri: &str) -> ResponseWriter {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap();
        let mut writer = ResponseWriter::new();
        router.serve_http(&mut writer, request).await;
        writer
    }

    #[tokio::test]
    async fn second_registration_wins() {
        let router = Router::new(false);
        router.get("/dup", reply("first"), &[]);
        router.get("/DUP", reply("second"), &[]);

        let writer = dispatch(&router, "GET", "/dup").await;
        assert_eq!(writer.body(), b"second");
        assert_eq!(router.routes().len(), 1);
    }

    #[tokio::test]
    async fn lookup_ignores_case_and_query() {
        let router = Router::new(false);
        router.post("/Foo", reply("foo"), &[]);

        let writer = dispatch(&router, "POST", "/foo?x=1").await;
        assert_eq!(writer.body(), b"foo");
        assert!(router.find(Method::Post, "/FOO").is_some());
        assert!(router.find(Method::Get, "/foo").is_none());
    }

    #[tokio::test]
    async fn unmatched_request_gets_json_404() {
        let router = Router::new(false);
        let writer = dispatch(&router, "GET", "/missing").await;

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(writer.body(), br#"{"code":404,"message":"Not Found"}"#);
    }

    #[tokio::test]
    async fn extension_method_is_not_found() {
        let router = Router::new(false);
        router.any("/dav", reply("dav"), &[]);

        let writer = dispatch(&router, "PROPFIND", "/dav").await;
        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn custom_not_found_handler() {
        let router = Router::new(false);
        router.set_not_found(handler_fn(|ctx| {
            Box::pin(async move { ctx.text(StatusCode::GONE, "gone") })
        }));

        let writer = dispatch(&router, "GET", "/nothing").await;
        assert_eq!(writer.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn pre_middleware_can_rewrite_before_lookup() {
        let router = Router::new(false);
        router.get("/v2/status", reply("v2"), &[]);
        router.pre(&[middleware_fn(|next: Handler| {
            handler_fn(move |ctx| {
                let next = next.clone();
                Box::pin(async move {
                    if ctx.path() == "/status" {
                        *ctx.request_mut().uri_mut() = "/v2/status".parse().unwrap();
                    }
                    next(ctx).await
                })
            })
        })]);

        let writer = dispatch(&router, "GET", "/status").await;
        assert_eq!(writer.body(), b"v2");
    }

    #[tokio::test]
    async fn handler_error_without_recovery_leaves_writer_untouched() {
        let router = Router::new(false);
        router.get(
            "/fail",
            handler_fn(|_ctx| {
                Box::pin(async move {
                    Err(crate::Error::http(StatusCode::BAD_GATEWAY, "upstream down"))
                })
            }),
            &[],
        );

        let writer = dispatch(&router, "GET", "/fail").await;
        assert!(!writer.is_committed());
        assert_eq!(writer.status(), StatusCode::OK);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn weak_handle_does_not_keep_router_alive() {
        let router = Router::new(true);
        let weak = router.downgrade();
        assert!(weak.upgrade().unwrap().is_debug());

        drop(router);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn global_middleware_constructor_may_use_the_router() {
        let router = Router::new(false);
        router.get("/a", reply("a"), &[]);

        let handle = router.clone();
        router.use_middleware(&[middleware_fn(move |next: Handler| {
            handle.get("/lazy", reply("lazy"), &[]);
            let _ = handle.routes();
            next
        })]);

        // Run on its own thread: a lock held across the constructor would
        // block synchronously and never reach the timeout below.
        let (tx, rx) = std::sync::mpsc::channel();
        let dispatcher = router.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let writer = runtime.block_on(dispatch(&dispatcher, "GET", "/a"));
            let _ = tx.send(writer.body().to_vec());
        });

        let body = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("dispatch deadlocked");
        assert_eq!(body, b"a");
        assert!(router.find(Method::Get, "/lazy").is_some());
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn printed_routes(debug: bool) -> String {
        let router = Router::new(debug);
        router.get("/alpha", reply("a"), &[]);
        router.post("/beta", reply("b"), &[]);

        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || router.print_routes());

        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn print_routes_logs_table_in_debug_mode() {
        let output = printed_routes(true);
        assert!(output.contains("Registered routes"), "{output}");
        assert!(output.contains("/alpha"), "{output}");
        assert!(output.contains("/beta"), "{output}");
    }

    #[test]
    fn print_routes_is_silent_without_debug() {
        let output = printed_routes(false);
        assert!(output.is_empty(), "{output}");
    }
}
