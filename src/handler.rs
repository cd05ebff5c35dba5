//! Handler and middleware types, and the fold that composes them.
//!
//! # Design Decisions
//! - A handler is an `Arc`'d async function over `&mut Context`
//! - A middleware is an `Arc`'d function from handler to handler (decorator)
//! - Composition is an explicit reverse fold: listed order = execution order

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::Error;

/// Outcome of a handler or middleware invocation.
pub type HandlerResult = Result<(), Error>;

/// Terminal request handler, or a handler already wrapped by middleware.
pub type Handler =
    Arc<dyn for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync>;

/// Transformation wrapping a handler with extra behavior.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Turn an async closure into a [`Handler`].
///
/// The closure must box its future so it can borrow the context:
///
/// ```ignore
/// let ping = handler_fn(|ctx| Box::pin(async move {
///     ctx.json(StatusCode::OK, &"pong")
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Turn a handler-to-handler closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap `handler` in `middleware` so that `middleware[0]` runs first.
///
/// Wrapping starts from the last entry, which therefore ends up innermost and
/// runs immediately before `handler`.
pub fn compose(handler: Handler, middleware: &[Middleware]) -> Handler {
    middleware
        .iter()
        .rev()
        .fold(handler, |next, layer| layer(next))
}
