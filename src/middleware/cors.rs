//! CORS checks, split into the three prioritized steps of the chain:
//! origin (10), headers (11), methods (12).
//!
//! Same-origin requests (no `Origin` header) skip every check. The headers
//! and methods checks apply only to preflight `OPTIONS` requests; a missing
//! `Access-Control-Request-Method` on a non-preflight request is not an
//! error.

use http::Method;

use super::{Middleware, PRIORITY_CORS_HEADERS, PRIORITY_CORS_METHODS, PRIORITY_CORS_ORIGIN};
use crate::error::Error;
use crate::param::Placement;
use crate::request::Request;
use crate::response::Response;

const WILDCARD: &str = "*";

/// Validates the request `Origin` against an allow list and reflects it in
/// `Access-Control-Allow-Origin`.
pub struct CorsOrigin {
    allowed: Vec<String>,
}

impl CorsOrigin {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// Allow every origin.
    pub fn any() -> Self {
        Self {
            allowed: vec![WILDCARD.to_string()],
        }
    }
}

impl Middleware for CorsOrigin {
    fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let origin = req.get("origin", Placement::Header);
        if origin.is_empty() {
            return Ok(());
        }
        if self.allowed.iter().any(|a| a == WILDCARD) {
            res.set_header("Access-Control-Allow-Origin", WILDCARD);
            return Ok(());
        }
        if self.allowed.iter().any(|a| a == &origin) {
            res.set_header("Access-Control-Allow-Origin", origin);
            return Ok(());
        }
        Err(Error::OriginNotAllowed(origin))
    }

    fn priority(&self) -> i32 {
        PRIORITY_CORS_ORIGIN
    }
}

/// Validates `Access-Control-Request-Headers` on preflight requests and
/// advertises the allowed set in `Access-Control-Allow-Headers`.
pub struct CorsHeaders {
    allowed: Vec<String>,
}

impl CorsHeaders {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn any() -> Self {
        Self {
            allowed: vec![WILDCARD.to_string()],
        }
    }
}

impl Middleware for CorsHeaders {
    fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        if req.method() != Method::OPTIONS || req.get("origin", Placement::Header).is_empty() {
            return Ok(());
        }
        let requested = req.get("access-control-request-headers", Placement::Header);
        if !self.allowed.iter().any(|a| a == WILDCARD) {
            for header in requested.split(',').map(str::trim).filter(|h| !h.is_empty()) {
                if !self.allowed.iter().any(|a| a.eq_ignore_ascii_case(header)) {
                    return Err(Error::HeaderNotAllowed(header.to_string()));
                }
            }
        }
        res.set_header("Access-Control-Allow-Headers", self.allowed.join(", "));
        Ok(())
    }

    fn priority(&self) -> i32 {
        PRIORITY_CORS_HEADERS
    }
}

/// Validates `Access-Control-Request-Method` on preflight requests.
pub struct CorsMethods {
    allowed: Vec<Method>,
}

impl CorsMethods {
    pub fn new(allowed: Vec<Method>) -> Self {
        Self { allowed }
    }
}

impl Middleware for CorsMethods {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        if req.method() != Method::OPTIONS || req.get("origin", Placement::Header).is_empty() {
            return Ok(());
        }
        let requested = req.get("access-control-request-method", Placement::Header);
        if requested.is_empty() {
            return Ok(());
        }
        match requested.parse::<Method>() {
            Ok(m) if self.allowed.contains(&m) => Ok(()),
            _ => Err(Error::HeaderNotAllowed(format!(
                "Access-Control-Request-Method {requested}"
            ))),
        }
    }

    fn priority(&self) -> i32 {
        PRIORITY_CORS_METHODS
    }
}
