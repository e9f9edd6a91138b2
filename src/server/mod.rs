//! Coroutine HTTP listener.
//!
//! The engine itself is transport-neutral; this module mounts it on a
//! may-based HTTP server. [`EngineService`] adapts wire requests to
//! [`crate::request::RequestParts`] and writes the dispatched
//! [`crate::response::ResponseParts`] back; [`HttpServer`] wraps listener
//! startup and returns a [`ServerHandle`] for readiness, stop, and join.

pub mod http_server;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use service::{EngineService, InFlightGuard, ServerState};

use crate::engine::Engine;
use std::io;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::thread;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber with the given filter directive.
///
/// A malformed directive falls back to `info`; an already-installed
/// subscriber is left in place.
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

impl Engine {
    /// Serve the engine on `addr` until SIGINT or SIGTERM.
    ///
    /// Installs the configured log filter, starts the listener, and blocks.
    /// On a shutdown signal new requests are refused with 503 and in-flight
    /// requests are given up to the configured grace period to finish; only
    /// stragglers past the deadline are cancelled with the listener.
    pub fn serve<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        if let Some(filter) = self.settings().log_filter.clone() {
            init_logging(&filter);
        }
        let grace = self.settings().shutdown_timeout;

        let service = EngineService::new(Arc::new(self));
        let state = service.state();
        let handle = HttpServer(service).start(addr)?;
        handle.wait_ready()?;
        info!(addr = %handle.addr(), "listening");

        wait_for_signal();
        info!(grace_secs = grace.as_secs(), "shutdown signal received, draining");
        state.start_draining();
        if state.drain(grace) {
            info!("drained");
        } else {
            info!(in_flight = state.in_flight(), "drain deadline hit, cancelling");
        }
        handle.stop();
        Ok(())
    }
}

#[cfg(unix)]
fn wait_for_signal() {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            let _ = signals.forever().next();
        }
        Err(_) => thread::park(),
    }
}

#[cfg(not(unix))]
fn wait_for_signal() {
    thread::park();
}
