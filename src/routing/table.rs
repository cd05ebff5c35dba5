//! Exact-match routing table.
//!
//! # Responsibilities
//! - Store one composed handler per (method, normalized path)
//! - Look up a handler for a request, or report no match
//!
//! # Design Decisions
//! - Paths are case-folded on insert and on lookup
//! - Re-registering a key replaces the old handler silently
//! - Every verb has a (possibly empty) entry from construction on

use std::collections::{BTreeMap, HashMap};

use crate::handler::Handler;
use crate::routing::method::Method;

/// Case-fold a path into its table key.
pub fn normalize_path(path: &str) -> String {
    path.to_lowercase()
}

/// A stored route: the composed handler plus bookkeeping for the debug dump.
#[derive(Clone)]
pub struct RouteEntry {
    pub handler: Handler,
    /// Number of group and route middleware folded into `handler`.
    pub middleware: usize,
}

/// Two-level map: method → normalized path → entry.
#[derive(Clone)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        let routes = Method::ALL
            .into_iter()
            .map(|method| (method, HashMap::new()))
            .collect();
        Self { routes }
    }

    /// Insert under the normalized key. Returns `true` if a route was replaced.
    pub fn insert(&mut self, method: Method, path: &str, entry: RouteEntry) -> bool {
        self.routes
            .entry(method)
            .or_default()
            .insert(normalize_path(path), entry)
            .is_some()
    }

    pub fn find(&self, method: Method, path: &str) -> Option<&RouteEntry> {
        self.routes.get(&method)?.get(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All routes sorted by method then path.
    pub fn iter_sorted(&self) -> Vec<(Method, &str, &RouteEntry)> {
        let sorted: BTreeMap<(Method, &str), &RouteEntry> = self
            .routes
            .iter()
            .flat_map(|(method, paths)| {
                paths
                    .iter()
                    .map(move |(path, entry)| ((*method, path.as_str()), entry))
            })
            .collect();
        sorted
            .into_iter()
            .map(|((method, path), entry)| (method, path, entry))
            .collect()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.iter_sorted()
                    .into_iter()
                    .map(|(method, path, _)| format!("{method} {path}")),
            )
            .finish()
    }
}
