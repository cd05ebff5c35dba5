//! Strata: an exact-match HTTP router with layered middleware.
//!
//! Routes map a (method, path) pair to one handler. Middleware wraps that
//! handler at four scopes, outermost first:
//!
//! ```text
//! pre (Router::pre) → global (Router::use_middleware) → group → route → handler
//! ```
//!
//! At every scope the listed order is the execution order.
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! let router = Router::new(false);
//! router.pre(&[middleware::recover()]);
//! router.get("/ping", handler_fn(|ctx| Box::pin(async move {
//!     ctx.json(StatusCode::OK, &"pong")
//! })), &[]);
//!
//! let mut api = router.group("/api");
//! api.use_middleware(&[middleware::request_id()]);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use context::{Context, Cookie};
pub use error::{Error, ErrorBody};
pub use handler::{compose, handler_fn, middleware_fn, Handler, HandlerResult, Middleware};
pub use http::middleware;
pub use http::{HttpServer, ResponseWriter};
pub use lifecycle::Shutdown;
pub use routing::{Group, Method, Router, Routes};

/// Everything needed to register routes and write handlers.
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::Error;
    pub use crate::handler::{handler_fn, middleware_fn, Handler, HandlerResult, Middleware};
    pub use crate::http::middleware;
    pub use crate::http::middleware::RequestIdExt;
    pub use crate::routing::{Group, Method, Router, Routes};
    pub use hyper::StatusCode;
}
