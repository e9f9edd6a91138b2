//! Request wrapper and typed accessors.
//!
//! [`RequestParts`] is the transport-neutral wire form: whatever listener the
//! engine is mounted on reduces its request to method, path, headers, and
//! body bytes. [`Request`] owns the per-call parameter store built from those
//! parts; the routing trie adds path parameters at dispatch time and the
//! parameter middlewares set typed values on it.

use crate::error::Error;
use crate::param::{ParamStore, ParamValue, Parameter, Placement};
use chrono::NaiveDateTime;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Transport-neutral request data.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    /// Request path, query string included.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RequestParts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Parse cookies out of a `Cookie` header value.
pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Parse query string parameters from a URL path, preserving repeats.
pub fn parse_query_params(path: &str) -> Vec<(String, String)> {
    match path.find('?') {
        Some(pos) => url::form_urlencoded::parse(path[pos + 1..].as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// Standard truthy tokens for on-demand boolean access.
fn parse_bool_token(raw: &str) -> bool {
    matches!(raw, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Per-request view of the transport request.
///
/// Created at dispatch time, mutated only by the middleware chain, and
/// discarded when the handler returns.
pub struct Request {
    method: Method,
    path: String,
    params: ParamStore,
    body: Parameter,
}

impl Request {
    /// Build the request from its wire parts, populating the query, header,
    /// and cookie placements. The path placement stays empty until the
    /// routing trie fills it.
    pub fn new(parts: RequestParts) -> Self {
        let path = parts
            .path
            .split('?')
            .next()
            .unwrap_or("/")
            .to_string();

        let mut params = ParamStore::new();
        for (name, value) in &parts.headers {
            let lowered = name.to_ascii_lowercase();
            if lowered == "cookie" {
                for (ck, cv) in parse_cookies(value) {
                    params.append_raw(Placement::Cookie, &ck, cv);
                }
            }
            params.append_raw(Placement::Header, &lowered, value.clone());
        }
        for (name, value) in parse_query_params(&parts.path) {
            params.append_raw(Placement::Query, &name, value);
        }

        let payload = String::from_utf8_lossy(&parts.body).into_owned();
        debug!(
            method = %parts.method,
            path = %path,
            header_count = parts.headers.len(),
            body_bytes = parts.body.len(),
            "request parsed"
        );

        Self {
            method: parts.method,
            path,
            params,
            body: Parameter::new(Placement::Body, "body", vec![payload]),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path with the query string stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn key(name: &str, placement: Placement) -> String {
        if placement == Placement::Header {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn parameter(&self, name: &str, placement: Placement) -> Option<&Parameter> {
        if placement == Placement::Body {
            return Some(&self.body);
        }
        self.params.get(placement, &Self::key(name, placement))
    }

    pub fn parameter_mut(&mut self, name: &str, placement: Placement) -> Option<&mut Parameter> {
        if placement == Placement::Body {
            return Some(&mut self.body);
        }
        self.params.get_mut(placement, &Self::key(name, placement))
    }

    /// Joined raw value, or the empty string when the parameter is absent.
    pub fn get(&self, name: &str, placement: Placement) -> String {
        self.parameter(name, placement)
            .map(Parameter::joined)
            .unwrap_or_default()
    }

    /// Record a path parameter bound by the routing trie.
    ///
    /// Stores the raw segment only; `requested` stays false so typed access
    /// parses on demand unless a declared extractor runs first.
    pub fn add_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params
            .insert(Parameter::new(Placement::Path, name, vec![value.into()]));
    }

    /// Bulk variant of [`Request::add_path_param`].
    pub fn set_parameters<I, K, V>(&mut self, placement: Placement, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in bindings {
            self.params
                .insert(Parameter::new(placement, name, vec![value.into()]));
        }
    }

    /// Typed boolean access; zero value `false` on absence or parse failure.
    pub fn bool(&self, name: &str, placement: Placement) -> bool {
        match self.parameter(name, placement) {
            Some(p) if p.requested => p.parsed.as_ref().and_then(ParamValue::as_bool).unwrap_or(false),
            Some(p) => parse_bool_token(p.first_raw()),
            None => false,
        }
    }

    /// Typed integer access; zero on absence or parse failure.
    pub fn int64(&self, name: &str, placement: Placement) -> i64 {
        match self.parameter(name, placement) {
            Some(p) if p.requested => p.parsed.as_ref().and_then(ParamValue::as_int).unwrap_or(0),
            Some(p) => p.first_raw().parse().unwrap_or(0),
            None => 0,
        }
    }

    /// Typed float access; zero on absence or parse failure.
    pub fn float64(&self, name: &str, placement: Placement) -> f64 {
        match self.parameter(name, placement) {
            Some(p) if p.requested => p.parsed.as_ref().and_then(ParamValue::as_float).unwrap_or(0.0),
            Some(p) => p.first_raw().parse().unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Typed string access; the empty string on absence.
    pub fn string(&self, name: &str, placement: Placement) -> String {
        match self.parameter(name, placement) {
            Some(p) if p.requested => p
                .parsed
                .as_ref()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            Some(p) => p.joined(),
            None => String::new(),
        }
    }

    /// Typed timestamp access with a caller-supplied strftime layout;
    /// the epoch on absence or parse failure.
    pub fn time(&self, name: &str, placement: Placement, layout: &str) -> NaiveDateTime {
        match self.parameter(name, placement) {
            Some(p) if p.requested => p
                .parsed
                .as_ref()
                .and_then(ParamValue::as_time)
                .unwrap_or_default(),
            Some(p) => NaiveDateTime::parse_from_str(p.first_raw(), layout).unwrap_or_default(),
            None => NaiveDateTime::default(),
        }
    }

    /// The body parameter.
    pub fn body(&self) -> &Parameter {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut Parameter {
        &mut self.body
    }

    /// The decoded body value, if a body middleware ran.
    pub fn body_value(&self) -> Option<&Value> {
        if self.body.requested {
            self.body.parsed.as_ref().and_then(ParamValue::as_data)
        } else {
            None
        }
    }

    /// Deserialize the decoded body into a caller type.
    ///
    /// Decoding happens at most once per request: if a body middleware
    /// already parsed the payload the stored value is reused, otherwise the
    /// raw payload is decoded as JSON here.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match self.body_value() {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| Error::BodyMalformed(e.to_string())),
            None => serde_json::from_str(self.body.first_raw())
                .map_err(|e| Error::BodyMalformed(e.to_string())),
        }
    }
}
