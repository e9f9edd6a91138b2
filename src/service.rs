//! A routable unit: a path prefix plus the trie of routes beneath it.

use http::Method;
use std::sync::Arc;
use tracing::warn;

use crate::route::Route;
use crate::router::{Found, RouteConflict, Trie};

/// Named group of routes sharing a path prefix.
///
/// Services are assembled before the engine starts and are immutable
/// afterwards; the engine strips its own prefix and the service prefix from
/// an incoming path and hands the remainder to this trie.
pub struct Service {
    prefix: String,
    trie: Trie,
}

impl Service {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        Self {
            prefix,
            trie: Trie::new(),
        }
    }

    /// The prefix without surrounding slashes.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a route under (method, pattern).
    ///
    /// Re-registering the same (pattern, method) replaces the prior binding;
    /// the replacement is diagnosed here with a warning.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        mut route: Route,
    ) -> Result<&mut Self, RouteConflict> {
        route.finalize();
        let replaced = self.trie.add(method.clone(), pattern, Arc::new(route))?;
        if replaced {
            warn!(
                service = %self.prefix,
                %method,
                pattern,
                "route replaced an existing binding"
            );
        }
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::GET, pattern, route)
    }

    pub fn put(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::PUT, pattern, route)
    }

    pub fn head(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::HEAD, pattern, route)
    }

    pub fn post(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::POST, pattern, route)
    }

    pub fn patch(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::PATCH, pattern, route)
    }

    pub fn trace(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::TRACE, pattern, route)
    }

    pub fn delete(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::DELETE, pattern, route)
    }

    pub fn connect(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::CONNECT, pattern, route)
    }

    pub fn options(&mut self, pattern: &str, route: Route) -> Result<&mut Self, RouteConflict> {
        self.route(Method::OPTIONS, pattern, route)
    }

    pub(crate) fn find(&self, method: &Method, key: &str) -> Found<'_> {
        self.trie.find(method, key)
    }
}
