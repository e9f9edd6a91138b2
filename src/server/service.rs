use crate::engine::Engine;
use crate::request::RequestParts;
use crate::response::status_reason;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// may_minihttp takes 'static header lines. The framework emits a small,
// finite set of them, so each distinct line is leaked exactly once and
// reused; memory is bounded by distinct headers, not by request count.
static HEADER_LINES: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn intern_header_line(name: &str, value: &str) -> &'static str {
    let line = format!("{name}: {value}");
    let mut lines = HEADER_LINES.lock().unwrap_or_else(|e| e.into_inner());
    match lines.get(line.as_str()) {
        Some(interned) => interned,
        None => {
            let interned: &'static str = Box::leak(line.into_boxed_str());
            lines.insert(interned);
            interned
        }
    }
}

/// Listener-side request accounting shared between the service clones and
/// the shutdown path.
#[derive(Default)]
pub struct ServerState {
    in_flight: AtomicUsize,
    draining: AtomicBool,
}

impl ServerState {
    /// Admit a request. Returns `None` once draining started; otherwise the
    /// guard holds the in-flight slot until dropped.
    pub fn begin_request(self: &Arc<Self>) -> Option<InFlightGuard> {
        if self.draining.load(Ordering::Acquire) {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        // Re-check so a request racing the drain flag is counted out again.
        if self.draining.load(Ordering::Acquire) {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(InFlightGuard(Arc::clone(self)))
    }

    /// Refuse new requests from now on.
    pub fn start_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every admitted request finished, up to `timeout`.
    ///
    /// Returns true when the count reached zero within the budget.
    pub fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        true
    }
}

/// Releases the in-flight slot when the request ends, on any path.
pub struct InFlightGuard(Arc<ServerState>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Adapter mounting an [`Engine`] as a may_minihttp service.
///
/// One clone per connection coroutine; the engine behind the `Arc` is
/// immutable once serving starts.
#[derive(Clone)]
pub struct EngineService {
    engine: Arc<Engine>,
    state: Arc<ServerState>,
}

impl EngineService {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            state: Arc::new(ServerState::default()),
        }
    }

    /// The accounting shared with the shutdown path.
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }
}

impl HttpService for EngineService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let Some(_guard) = self.state.begin_request() else {
            res.status_code(503, "Service Unavailable");
            res.header("Connection: close");
            return Ok(());
        };
        let method = match Method::from_bytes(req.method().as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                res.status_code(400, status_reason(400));
                return Ok(());
            }
        };
        let path = req.path().to_string();
        let headers: Vec<(String, String)> = req
            .headers()
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).to_string(),
                )
            })
            .collect();
        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let out = self.engine.dispatch(RequestParts {
            method,
            path,
            headers,
            body,
        });

        res.status_code(out.status as usize, status_reason(out.status));
        for (name, value) in &out.headers {
            res.header(intern_header_line(name, value));
        }
        res.body_vec(out.body);
        Ok(())
    }
}
