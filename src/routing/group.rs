//! Route groups: shared path prefix plus inherited middleware.

use crate::handler::{Handler, Middleware};
use crate::routing::method::Method;
use crate::routing::router::Router;
use crate::routing::Routes;

/// A prefix-and-middleware scope registering into the router's table.
///
/// A child created with [`Group::group`] starts with a copy of its parent's
/// middleware list; extending either one afterwards leaves the other alone.
#[derive(Clone)]
pub struct Group {
    prefix: String,
    middleware: Vec<Middleware>,
    router: Router,
}

impl Group {
    pub fn new(prefix: impl Into<String>, router: Router) -> Self {
        Self {
            prefix: prefix.into(),
            middleware: Vec::new(),
            router,
        }
    }

    /// Full prefix, including every ancestor's.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    /// Append middleware applied to routes registered through this group
    /// from now on. Routes already registered keep their chain.
    pub fn use_middleware(&mut self, middleware: &[Middleware]) {
        self.middleware.extend_from_slice(middleware);
    }

    /// Child group at `self.prefix + prefix`, inheriting a copy of this group's middleware.
    pub fn group(&self, prefix: &str) -> Group {
        Group {
            prefix: format!("{}{}", self.prefix, prefix),
            middleware: self.middleware.clone(),
            router: self.router.clone(),
        }
    }
}

impl Routes for Group {
    /// Registers `prefix + path` with group middleware outside per-route middleware.
    fn add(&self, method: Method, path: &str, handler: Handler, middleware: &[Middleware]) {
        let chain = [self.middleware.as_slice(), middleware].concat();
        self.router
            .add(method, &format!("{}{}", self.prefix, path), handler, &chain);
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
