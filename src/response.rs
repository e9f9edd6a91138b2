//! Buffered response writer.
//!
//! The response owns the active marshaler and envelope. Terminal calls
//! (`object`, `error`, `without_content` and the status shortcuts) encode the
//! envelope and buffer status, headers, and body into [`ResponseParts`];
//! the transport adapter writes those exactly once.

use crate::envelope::Responser;
use crate::error::Error;
use crate::marshal::Marshaler;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Reason phrase for the statuses the framework emits.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Buffered wire form of a response.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: 0,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Per-request response writer.
pub struct Response {
    parts: ResponseParts,
    flushed: bool,
    marshaler: Arc<dyn Marshaler>,
    responser: Box<dyn Responser>,
}

impl Response {
    pub fn new(marshaler: Arc<dyn Marshaler>, responser: Box<dyn Responser>) -> Self {
        Self {
            parts: ResponseParts::default(),
            flushed: false,
            marshaler,
            responser,
        }
    }

    /// Set a header, replacing any previous value of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.parts
            .headers
            .retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.parts.headers.push((name, value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a terminal call already ran.
    pub fn flushed(&self) -> bool {
        self.flushed
    }

    /// Envelope the payload and write it with the given status.
    pub fn object(&mut self, status: u16, payload: Value) {
        if self.claim() {
            self.responser.set_payload(payload);
            self.encode(status);
        }
    }

    /// Envelope the error message and write it with the error's status.
    pub fn error(&mut self, err: &Error) {
        self.error_with(err.status(), err.to_string());
    }

    /// Envelope an error message under an explicit status.
    pub fn error_with(&mut self, status: u16, message: impl Into<String>) {
        if self.claim() {
            self.responser.set_error(message.into());
            self.encode(status);
        }
    }

    /// Write the status with no body.
    pub fn without_content(&mut self, status: u16) {
        if self.claim() {
            self.parts.status = status;
        }
    }

    pub fn ok(&mut self, payload: Value) {
        self.object(200, payload);
    }

    pub fn created(&mut self, payload: Value) {
        self.object(201, payload);
    }

    pub fn no_content(&mut self) {
        self.without_content(204);
    }

    pub fn bad_request(&mut self, message: impl Into<String>) {
        self.error_with(400, message);
    }

    pub fn unauthorized(&mut self, message: impl Into<String>) {
        self.error_with(401, message);
    }

    pub fn forbidden(&mut self, message: impl Into<String>) {
        self.error_with(403, message);
    }

    pub fn not_found(&mut self, message: impl Into<String>) {
        self.error_with(404, message);
    }

    pub fn method_not_allowed(&mut self, message: impl Into<String>) {
        self.error_with(405, message);
    }

    pub fn internal_server_error(&mut self, message: impl Into<String>) {
        self.error_with(500, message);
    }

    /// Take the buffered wire form. Unflushed responses surface as 500.
    pub fn into_parts(mut self) -> ResponseParts {
        if !self.flushed {
            self.parts.status = 500;
        }
        self.parts
    }

    // At most one status write per response.
    fn claim(&mut self) -> bool {
        if self.flushed {
            warn!("response already flushed, terminal call ignored");
            return false;
        }
        self.flushed = true;
        true
    }

    fn encode(&mut self, status: u16) {
        match self.marshaler.marshal(self.responser.view()) {
            Ok(bytes) => {
                if let Some(ct) = self.marshaler.content_type() {
                    if self.header("Content-Type").is_none() {
                        self.parts.headers.push(("Content-Type".into(), ct.into()));
                    }
                }
                self.parts.status = status;
                self.parts.body = bytes;
            }
            Err(e) => {
                // The transport falls back to a raw 500.
                error!(error = %e, "envelope encoding failed");
                self.parts.status = 500;
                self.parts.headers.clear();
                self.parts.body = Vec::new();
            }
        }
    }
}
