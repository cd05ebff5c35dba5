//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup):
//!     router.get(path, handler, route_mw)      group.post(path, handler, route_mw)
//!         │                                        │ prefix + path, group_mw ++ route_mw
//!         └───────────────┬────────────────────────┘
//!                         ▼
//!     Router::add → compose(handler, middleware) → RouteTable[method][lower(path)]
//!
//! Dispatch (per request):
//!     pre middleware
//!         → lookup RouteTable (miss → not-found handler)
//!         → global middleware
//!         → stored composed handler (group → route → handler)
//! ```
//!
//! # Design Decisions
//! - Exact-match only: no parameters, wildcards or prefix matching
//! - Middleware is folded into the stored handler at registration time
//! - Groups are builders over the router's table; they own no routes
//! - Listed middleware order is execution order at every scope

pub mod group;
pub mod method;
pub mod router;
pub mod table;

pub use group::Group;
pub use method::Method;
pub use router::{RouteInfo, Router, WeakRouter};
pub use table::RouteTable;

use crate::handler::{Handler, Middleware};

/// Verb registration shared by [`Router`] and [`Group`].
///
/// Implementors provide [`Routes::add`]; every verb helper delegates to it.
pub trait Routes {
    /// Register `handler` under `method` and `path`, wrapped in `middleware`
    /// (first entry runs first).
    fn add(&self, method: Method, path: &str, handler: Handler, middleware: &[Middleware]);

    fn connect(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Connect, path, handler, middleware);
    }

    fn delete(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Delete, path, handler, middleware);
    }

    fn get(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Get, path, handler, middleware);
    }

    fn head(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Head, path, handler, middleware);
    }

    fn options(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Options, path, handler, middleware);
    }

    fn patch(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Patch, path, handler, middleware);
    }

    fn post(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Post, path, handler, middleware);
    }

    fn put(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Put, path, handler, middleware);
    }

    fn trace(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.add(Method::Trace, path, handler, middleware);
    }

    /// Register the same handler and middleware under every supported verb.
    fn any(&self, path: &str, handler: Handler, middleware: &[Middleware]) {
        for method in Method::ALL {
            self.add(method, path, handler.clone(), middleware);
        }
    }
}
