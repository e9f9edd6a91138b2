//! Declared parameter extractors, priority 100.
//!
//! For each declared parameter a middleware reads the raw value at
//! (placement, name), applies the type-specific parser, stores the typed
//! value on the request, and then runs the configured checks. Failures are
//! 400s naming the parameter. Each type also carries a regular expression
//! used for documentation and path-segment validation.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Middleware, ParamDoc, RouteDocs, PRIORITY_PARAMS};
use crate::error::Error;
use crate::param::{ParamValue, Placement};
use crate::request::Request;
use crate::response::Response;

const INT_PATTERN: &str = r"((\+|-)?\d+)";
const FLOAT_PATTERN: &str = r"((\+|-)?\d+(\.\d+)?((e|E)(\+|-)?\d+)?)";
const BOOL_PATTERN: &str = "(1|t|T|TRUE|true|True|0|f|F|FALSE|false|False)";
const STRING_PATTERN: &str = "(.+)";

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&anchored(INT_PATTERN)).unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&anchored(FLOAT_PATTERN)).unwrap());
static BOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&anchored(BOOL_PATTERN)).unwrap());

fn anchored(pattern: &str) -> String {
    format!("^{pattern}$")
}

/// The declared type of a parameter.
#[derive(Debug, Clone)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    Str,
    /// Timestamp with a strftime layout, e.g. `%Y-%m-%d %H:%M:%S`.
    Time { layout: String },
}

impl ParamKind {
    fn parse(&self, raw: &str) -> Result<ParamValue, ()> {
        match self {
            ParamKind::Bool => {
                if !BOOL_RE.is_match(raw) {
                    return Err(());
                }
                Ok(ParamValue::Bool(matches!(
                    raw,
                    "1" | "t" | "T" | "TRUE" | "true" | "True"
                )))
            }
            ParamKind::Int => raw.parse().map(ParamValue::Int).map_err(|_| ()),
            ParamKind::Float => raw.parse().map(ParamValue::Float).map_err(|_| ()),
            ParamKind::Str => Ok(ParamValue::Str(raw.to_string())),
            ParamKind::Time { layout } => NaiveDateTime::parse_from_str(raw, layout)
                .map(ParamValue::Time)
                .map_err(|_| ()),
        }
    }

    /// Regular expression describing accepted values, for docs and
    /// path-segment validation.
    pub fn pattern(&self) -> String {
        match self {
            ParamKind::Bool => BOOL_PATTERN.to_string(),
            ParamKind::Int => INT_PATTERN.to_string(),
            ParamKind::Float => FLOAT_PATTERN.to_string(),
            ParamKind::Str => STRING_PATTERN.to_string(),
            ParamKind::Time { layout } => layout_pattern(layout),
        }
    }

    /// Whether a raw segment matches this type's pattern.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            ParamKind::Bool => BOOL_RE.is_match(raw),
            ParamKind::Int => INT_RE.is_match(raw),
            ParamKind::Float => FLOAT_RE.is_match(raw),
            ParamKind::Str => !raw.is_empty(),
            ParamKind::Time { .. } => Regex::new(&anchored(&self.pattern()))
                .map(|re| re.is_match(raw))
                .unwrap_or(false),
        }
    }
}

/// Derive a value pattern from a strftime layout by replacing the digit
/// specifiers with digit classes and escaping everything else.
fn layout_pattern(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut chars = layout.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(r"\d{4}"),
            Some('y') | Some('m') | Some('d') | Some('H') | Some('M') | Some('S') => {
                out.push_str(r"\d{2}")
            }
            Some('f') => out.push_str(r"\d+"),
            Some('%') => out.push('%'),
            Some(other) => out.push_str(&regex::escape(&other.to_string())),
            None => {}
        }
    }
    out
}

/// A validation applied to the parsed value. Combinators nest.
#[derive(Debug, Clone)]
pub enum Check {
    /// String value must be non-empty.
    NotEmpty,
    /// Numeric value must be strictly greater.
    Greater(f64),
    /// Numeric value must be strictly less.
    Less(f64),
    /// Every inner check must pass.
    All(Vec<Check>),
    /// At least one inner check must pass.
    Any(Vec<Check>),
}

impl Check {
    fn apply(&self, value: &ParamValue) -> Result<(), String> {
        match self {
            Check::NotEmpty => match value {
                ParamValue::Str(s) if s.is_empty() => Err("value is empty".to_string()),
                _ => Ok(()),
            },
            Check::Greater(limit) => match value.as_float() {
                Some(n) if n > *limit => Ok(()),
                Some(n) => Err(format!("{n} is not greater than {limit}")),
                None => Err(format!("value is not comparable to {limit}")),
            },
            Check::Less(limit) => match value.as_float() {
                Some(n) if n < *limit => Ok(()),
                Some(n) => Err(format!("{n} is not less than {limit}")),
                None => Err(format!("value is not comparable to {limit}")),
            },
            Check::All(checks) => checks.iter().try_for_each(|c| c.apply(value)),
            Check::Any(checks) => {
                let mut last = String::from("no check passed");
                for c in checks {
                    match c.apply(value) {
                        Ok(()) => return Ok(()),
                        Err(reason) => last = reason,
                    }
                }
                Err(last)
            }
        }
    }
}

/// Extractor middleware for one declared parameter.
pub struct Param {
    placement: Placement,
    name: String,
    kind: ParamKind,
    checks: Vec<Check>,
    description: Option<String>,
}

macro_rules! param_ctors {
    ($($fn_name:ident => $placement:expr, $kind:expr;)*) => {
        $(
            pub fn $fn_name(name: impl Into<String>) -> Self {
                Self::new($placement, name, $kind)
            }
        )*
    };
}

impl Param {
    pub fn new(placement: Placement, name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            placement,
            name: name.into(),
            kind,
            checks: Vec::new(),
            description: None,
        }
    }

    param_ctors! {
        path_bool => Placement::Path, ParamKind::Bool;
        path_int => Placement::Path, ParamKind::Int;
        path_float => Placement::Path, ParamKind::Float;
        path_string => Placement::Path, ParamKind::Str;
        query_bool => Placement::Query, ParamKind::Bool;
        query_int => Placement::Query, ParamKind::Int;
        query_float => Placement::Query, ParamKind::Float;
        query_string => Placement::Query, ParamKind::Str;
        header_bool => Placement::Header, ParamKind::Bool;
        header_int => Placement::Header, ParamKind::Int;
        header_float => Placement::Header, ParamKind::Float;
        header_string => Placement::Header, ParamKind::Str;
        cookie_bool => Placement::Cookie, ParamKind::Bool;
        cookie_int => Placement::Cookie, ParamKind::Int;
        cookie_float => Placement::Cookie, ParamKind::Float;
        cookie_string => Placement::Cookie, ParamKind::Str;
    }

    pub fn path_time(name: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::new(Placement::Path, name, ParamKind::Time { layout: layout.into() })
    }

    pub fn query_time(name: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::new(Placement::Query, name, ParamKind::Time { layout: layout.into() })
    }

    pub fn header_time(name: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::new(Placement::Header, name, ParamKind::Time { layout: layout.into() })
    }

    pub fn cookie_time(name: impl Into<String>, layout: impl Into<String>) -> Self {
        Self::new(Placement::Cookie, name, ParamKind::Time { layout: layout.into() })
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn not_empty(self) -> Self {
        self.check(Check::NotEmpty)
    }

    pub fn greater(self, limit: f64) -> Self {
        self.check(Check::Greater(limit))
    }

    pub fn less(self, limit: f64) -> Self {
        self.check(Check::Less(limit))
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl Middleware for Param {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        let raw = match req.parameter(&self.name, self.placement) {
            Some(p) => p.first_raw().to_string(),
            None => return Err(Error::ParameterMissing(self.name.clone())),
        };
        let value = self.kind.parse(&raw).map_err(|_| Error::ParameterMalformed {
            name: self.name.clone(),
            value: raw.clone(),
        })?;
        for check in &self.checks {
            check.apply(&value).map_err(|reason| Error::ParameterValidationFailed {
                name: self.name.clone(),
                reason,
            })?;
        }
        // parameter() above guarantees presence
        if let Some(param) = req.parameter_mut(&self.name, self.placement) {
            param.parsed = Some(value);
            param.requested = true;
            if param.description.is_none() {
                param.description = self.description.clone();
            }
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        PRIORITY_PARAMS
    }

    fn docs(&self, docs: &mut RouteDocs) {
        docs.parameters.push(ParamDoc {
            name: self.name.clone(),
            placement: self.placement,
            pattern: Some(self.kind.pattern()),
            description: self.description.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AsObject;
    use crate::marshal::JsonMarshaler;
    use crate::request::RequestParts;
    use http::Method;
    use std::sync::Arc;

    fn response() -> Response {
        Response::new(Arc::new(JsonMarshaler), Box::new(AsObject::new()))
    }

    fn query_request(query: &str) -> Request {
        Request::new(RequestParts::new(Method::GET, format!("/items?{query}")))
    }

    #[test]
    fn test_int_extraction() {
        let mw = Param::query_int("id");
        let mut req = query_request("id=7");
        let mut res = response();
        mw.handle(&mut req, &mut res).unwrap();
        assert_eq!(req.int64("id", Placement::Query), 7);
        assert!(req.parameter("id", Placement::Query).unwrap().requested);
    }

    #[test]
    fn test_missing_parameter() {
        let mw = Param::query_int("id");
        let mut req = query_request("other=1");
        let err = mw.handle(&mut req, &mut response()).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_malformed_parameter_names_value() {
        let mw = Param::query_int("id");
        let mut req = query_request("id=abc");
        let err = mw.handle(&mut req, &mut response()).unwrap_err();
        assert_eq!(err.status(), 400);
        let msg = err.to_string();
        assert!(msg.contains("id") && msg.contains("abc"));
    }

    #[test]
    fn test_range_checks() {
        let mw = Param::query_int("id").greater(0.0).less(10.0);

        let mut req = query_request("id=7");
        assert!(mw.handle(&mut req, &mut response()).is_ok());

        let mut req = query_request("id=11");
        let err = mw.handle(&mut req, &mut response()).unwrap_err();
        assert!(err.to_string().contains("failed check"));

        let mut req = query_request("id=0");
        assert!(mw.handle(&mut req, &mut response()).is_err());
    }

    #[test]
    fn test_any_combinator() {
        let mw = Param::query_int("n").check(Check::Any(vec![
            Check::Less(0.0),
            Check::Greater(100.0),
        ]));

        let mut req = query_request("n=-5");
        assert!(mw.handle(&mut req, &mut response()).is_ok());
        let mut req = query_request("n=200");
        assert!(mw.handle(&mut req, &mut response()).is_ok());
        let mut req = query_request("n=50");
        assert!(mw.handle(&mut req, &mut response()).is_err());
    }

    #[test]
    fn test_not_empty_check() {
        let mw = Param::query_string("q").not_empty();
        let mut req = query_request("q=");
        assert!(mw.handle(&mut req, &mut response()).is_err());
        let mut req = query_request("q=term");
        assert!(mw.handle(&mut req, &mut response()).is_ok());
    }

    #[test]
    fn test_bool_strict_parse() {
        let mw = Param::query_bool("flag");
        for (raw, expected) in [("true", true), ("T", true), ("0", false), ("False", false)] {
            let mut req = query_request(&format!("flag={raw}"));
            mw.handle(&mut req, &mut response()).unwrap();
            assert_eq!(req.bool("flag", Placement::Query), expected, "raw {raw}");
        }
        let mut req = query_request("flag=yes");
        assert!(mw.handle(&mut req, &mut response()).is_err());
    }

    #[test]
    fn test_time_extraction() {
        let mw = Param::query_time("at", "%Y-%m-%d %H:%M:%S");
        let mut req = query_request("at=2024-05-01 10:30:00");
        mw.handle(&mut req, &mut response()).unwrap();
        let t = req.time("at", Placement::Query, "%Y-%m-%d %H:%M:%S");
        assert_eq!(t.format("%H:%M").to_string(), "10:30");
    }

    #[test]
    fn test_patterns() {
        assert_eq!(ParamKind::Int.pattern(), r"((\+|-)?\d+)");
        assert!(ParamKind::Int.matches("-42"));
        assert!(!ParamKind::Int.matches("4.2"));
        assert!(ParamKind::Float.matches("4.2e1"));
        assert!(ParamKind::Bool.matches("TRUE"));
        assert!(!ParamKind::Bool.matches("yes"));
        let layout = ParamKind::Time {
            layout: "%Y-%m-%d".into(),
        };
        assert_eq!(layout.pattern(), r"\d{4}\-\d{2}\-\d{2}");
        assert!(layout.matches("2024-05-01"));
        assert!(!layout.matches("05-01-2024"));
    }

    #[test]
    fn test_docs_contribution() {
        let mw = Param::query_int("id").description("item id");
        let mut docs = RouteDocs::default();
        mw.docs(&mut docs);
        assert_eq!(docs.parameters.len(), 1);
        assert_eq!(docs.parameters[0].name, "id");
        assert_eq!(docs.parameters[0].pattern.as_deref(), Some(INT_PATTERN));
    }
}
