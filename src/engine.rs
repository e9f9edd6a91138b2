//! Engine assembly and dispatch.
//!
//! The [`Engine`] owns the mounted services, the engine-level middleware
//! chain, and the default marshaler and envelope. [`Engine::dispatch`] is the
//! whole request pipeline in transport-neutral form: the listener adapter
//! reduces its request to [`RequestParts`], calls dispatch, and writes the
//! returned [`ResponseParts`] back to the wire.

use http::Method;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, debug_span, info};

use crate::envelope::{AsObject, ResponserFactory};
use crate::error::Error;
use crate::marshal::{JsonMarshaler, Marshaler};
use crate::middleware::Middleware;
use crate::param::Placement;
use crate::request::{Request, RequestParts};
use crate::response::{Response, ResponseParts};
use crate::router::Found;
use crate::service::Service;

/// Listener and shutdown tuning.
///
/// The defaults suit a service behind a load balancer; hosts embedding the
/// engine in tests never touch this.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tracing filter directive installed by [`Engine::serve`], e.g.
    /// `"info"` or `"viaduct=debug"`. `None` leaves the subscriber alone.
    pub log_filter: Option<String>,
    /// Drain budget after the shutdown signal: in-flight requests get up to
    /// this long to finish before the listener is cancelled.
    pub shutdown_timeout: Duration,
    /// Socket read timeout. The bundled may_minihttp listener exposes no
    /// socket knobs; this binds only when a host mounts
    /// [`Engine::dispatch`](crate::engine::Engine::dispatch) on its own
    /// transport.
    pub read_timeout: Duration,
    /// Socket write timeout; same host-transport caveat as `read_timeout`.
    pub write_timeout: Duration,
    /// Header read timeout; same host-transport caveat as `read_timeout`.
    pub header_read_timeout: Duration,
    /// Keep-alive idle timeout; same host-transport caveat as `read_timeout`.
    pub idle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            shutdown_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            header_read_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// The dispatching front of the framework.
pub struct Engine {
    prefix: String,
    services: Vec<Service>,
    marshaler: Arc<dyn Marshaler>,
    responser: ResponserFactory,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: EngineConfig,
    request_seq: AtomicU64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the JSON marshaler and the object envelope.
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            services: Vec::new(),
            marshaler: Arc::new(JsonMarshaler),
            responser: AsObject::factory(),
            middlewares: Vec::new(),
            config: EngineConfig::default(),
            request_seq: AtomicU64::new(1),
        }
    }

    /// Path prefix stripped from every request before service selection.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Default marshaler for routes without an override.
    pub fn marshaler(mut self, marshaler: Arc<dyn Marshaler>) -> Self {
        self.marshaler = marshaler;
        self
    }

    /// Default envelope factory for routes without an override.
    pub fn responser(mut self, factory: ResponserFactory) -> Self {
        self.responser = factory;
        self
    }

    /// Tracing filter installed when the engine starts serving.
    pub fn logger(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = Some(filter.into());
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Engine-level middleware, run on every dispatched route.
    ///
    /// The chain is kept priority-sorted; same-priority middlewares keep
    /// registration order and run before route-level middlewares of equal
    /// priority.
    pub fn middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self.middlewares.sort_by_key(|m| m.priority());
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        info!(prefix = service.prefix(), "service mounted");
        self.services.push(service);
        self
    }

    pub(crate) fn settings(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline for one request.
    pub fn dispatch(&self, parts: RequestParts) -> ResponseParts {
        let request_id = self.request_seq.fetch_add(1, Ordering::Relaxed);
        let span = debug_span!("dispatch", request_id, method = %parts.method, path = %parts.path);
        let _enter = span.enter();

        let path = parts.path.split('?').next().unwrap_or("/");
        let Some(key) = strip_prefix(path, &self.prefix) else {
            return self.error_parts(&Error::PathNotFound(path.to_string()));
        };

        if parts.method == Method::GET && key == "health" {
            let mut res = self.response();
            res.ok(json!({"status": "ok"}));
            return res.into_parts();
        }

        // Longest matching service prefix wins.
        let mut best: Option<(&Service, &str)> = None;
        for svc in &self.services {
            if let Some(rest) = strip_prefix(key, svc.prefix()) {
                if best.map_or(true, |(b, _)| svc.prefix().len() > b.prefix().len()) {
                    best = Some((svc, rest));
                }
            }
        }
        let Some((service, rest)) = best else {
            return self.error_parts(&Error::PathNotFound(path.to_string()));
        };

        match service.find(&parts.method, rest) {
            Found::Route { route, bindings } => {
                let marshaler = route
                    .marshaler_override()
                    .unwrap_or_else(|| self.marshaler.clone());
                let responser = route
                    .responser_override()
                    .unwrap_or_else(|| self.responser.clone());
                let mut res = Response::new(marshaler, responser());
                let mut req = Request::new(parts);
                req.set_parameters(Placement::Path, bindings);
                route.run(&self.middlewares, &mut req, &mut res);
                res.into_parts()
            }
            Found::MethodNotAllowed { allowed } => {
                debug!(?allowed, "path bound under other methods");
                let mut res = self.response();
                let names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                res.set_header("Allow", names.join(", "));
                res.error(&Error::MethodNotApplicable(path.to_string()));
                res.into_parts()
            }
            Found::NotFound => self.error_parts(&Error::PathNotFound(path.to_string())),
        }
    }

    fn response(&self) -> Response {
        Response::new(self.marshaler.clone(), (self.responser)())
    }

    fn error_parts(&self, err: &Error) -> ResponseParts {
        let mut res = self.response();
        res.error(err);
        res.into_parts()
    }
}

/// Strip `prefix` from `path` on a segment boundary.
///
/// Both sides are read without surrounding slashes; `None` means the prefix
/// does not apply. The empty prefix applies to everything.
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let path = path.trim_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;

    #[test]
    fn test_strip_prefix_segment_boundary() {
        assert_eq!(strip_prefix("/api/users", "api"), Some("users"));
        assert_eq!(strip_prefix("/api", "api"), Some(""));
        assert_eq!(strip_prefix("/apifoo", "api"), None);
        assert_eq!(strip_prefix("/other", "api"), None);
        assert_eq!(strip_prefix("/anything", ""), Some("anything"));
    }

    #[test]
    fn test_health_endpoint() {
        let engine = Engine::new().prefix("/api");
        let parts = engine.dispatch(RequestParts::new(Method::GET, "/api/health"));
        assert_eq!(parts.status, 200);
        assert_eq!(parts.body, br#"{"result":{"status":"ok"}}"#);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let engine = Engine::new();
        let parts = engine.dispatch(RequestParts::new(Method::GET, "/nope"));
        assert_eq!(parts.status, 404);
    }

    #[test]
    fn test_longest_service_prefix_wins() {
        let mut admin = Service::new("users/admin");
        admin
            .get("/", Route::new(|_req, res| {
                res.ok(json!("admin"));
                Ok(())
            }))
            .unwrap();
        let mut users = Service::new("users");
        users
            .get("/admin", Route::new(|_req, res| {
                res.ok(json!("users"));
                Ok(())
            }))
            .unwrap();
        let engine = Engine::new().service(users).service(admin);

        let parts = engine.dispatch(RequestParts::new(Method::GET, "/users/admin"));
        assert_eq!(parts.body, br#"{"result":"admin"}"#);
    }

    #[test]
    fn test_method_mismatch_reports_allow() {
        let mut svc = Service::new("notes");
        svc.get("/", Route::new(|_req, res| {
            res.ok(json!([]));
            Ok(())
        }))
        .unwrap();
        let engine = Engine::new().service(svc);

        let parts = engine.dispatch(RequestParts::new(Method::POST, "/notes"));
        assert_eq!(parts.status, 404);
        assert!(parts
            .headers
            .iter()
            .any(|(n, v)| n == "Allow" && v == "GET"));
        assert!(String::from_utf8_lossy(&parts.body).contains("method not applicable"));
    }
}
