//! Terminal route binding.
//!
//! A [`Route`] binds a handler to its ordered middleware chain plus optional
//! marshaler and envelope overrides. Routes are created at registration,
//! finalized (middlewares stable-sorted by priority) when the service adds
//! them to the trie, and immutable afterwards.

use crate::envelope::ResponserFactory;
use crate::error::Error;
use crate::marshal::Marshaler;
use crate::middleware::{Middleware, RouteDocs};
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use tracing::debug;

/// The final callable of a route.
pub type Handler = Box<dyn Fn(&mut Request, &mut Response) -> Result<(), Error> + Send + Sync>;

pub struct Route {
    handler: Handler,
    middlewares: Vec<Arc<dyn Middleware>>,
    marshaler: Option<Arc<dyn Marshaler>>,
    responser: Option<ResponserFactory>,
}

impl Route {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            middlewares: Vec::new(),
            marshaler: None,
            responser: None,
        }
    }

    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    pub fn middlewares<I>(mut self, mws: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        self.middlewares.extend(mws);
        self
    }

    /// Override the engine's default marshaler for this route.
    pub fn marshaler(mut self, marshaler: Arc<dyn Marshaler>) -> Self {
        self.marshaler = Some(marshaler);
        self
    }

    /// Override the engine's default response envelope for this route.
    pub fn responser(mut self, factory: ResponserFactory) -> Self {
        self.responser = Some(factory);
        self
    }

    pub(crate) fn marshaler_override(&self) -> Option<Arc<dyn Marshaler>> {
        self.marshaler.clone()
    }

    pub(crate) fn responser_override(&self) -> Option<ResponserFactory> {
        self.responser.clone()
    }

    /// Stable sort by priority; ties keep registration order.
    pub(crate) fn finalize(&mut self) {
        self.middlewares.sort_by_key(|m| m.priority());
    }

    /// Run the chain and the handler.
    ///
    /// `globals` are the engine-level middlewares, already priority-sorted;
    /// they interleave with this route's own chain by priority, globals first
    /// on ties. The first middleware failure aborts the chain and renders the
    /// error; the handler runs only if every middleware succeeded.
    pub(crate) fn run(&self, globals: &[Arc<dyn Middleware>], req: &mut Request, res: &mut Response) {
        let mut chain: Vec<&Arc<dyn Middleware>> =
            Vec::with_capacity(globals.len() + self.middlewares.len());
        let (mut g, mut r) = (0, 0);
        while g < globals.len() && r < self.middlewares.len() {
            if globals[g].priority() <= self.middlewares[r].priority() {
                chain.push(&globals[g]);
                g += 1;
            } else {
                chain.push(&self.middlewares[r]);
                r += 1;
            }
        }
        chain.extend(globals[g..].iter());
        chain.extend(self.middlewares[r..].iter());

        for mw in chain {
            if let Err(err) = mw.handle(req, res) {
                debug!(error = %err, status = err.status(), "middleware short-circuit");
                if !res.flushed() {
                    res.error(&err);
                }
                return;
            }
            if res.flushed() {
                // A middleware terminated the response itself.
                return;
            }
        }

        if let Err(err) = (self.handler)(req, res) {
            debug!(error = %err, status = err.status(), "handler error");
            if !res.flushed() {
                res.error(&err);
            }
            return;
        }
        if !res.flushed() {
            res.without_content(200);
        }
    }

    /// Documentation contributed by the route's middlewares.
    pub fn docs(&self) -> RouteDocs {
        let mut docs = RouteDocs::default();
        for mw in &self.middlewares {
            mw.docs(&mut docs);
        }
        docs
    }
}
