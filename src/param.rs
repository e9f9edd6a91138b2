//! Request parameter model.
//!
//! A [`Parameter`] is one input value keyed by placement and name. It keeps
//! the raw wire strings alongside an optional typed value; the `requested`
//! flag records whether a declared parameter middleware parsed it eagerly.
//! Accessors use the parsed value only when that flag is set, otherwise they
//! reparse on demand from the raw strings.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Path => "path",
            Placement::Query => "query",
            Placement::Header => "header",
            Placement::Cookie => "cookie",
            Placement::Body => "body",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of a parsed parameter.
///
/// Typed accessors assert the tag; a tag mismatch is a bug in the declaring
/// code, not a client error, so the accessors fall back to the zero value
/// rather than failing the request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Time(NaiveDateTime),
    /// Opaque decoded body.
    Data(Value),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            ParamValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            ParamValue::Data(v) => Some(v),
            _ => None,
        }
    }
}

/// One request input value.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub placement: Placement,
    pub name: String,
    /// Raw wire strings; multi-valued headers and query keys are preserved
    /// in arrival order. Never empty while the parameter exists.
    pub raw: Vec<String>,
    /// Typed value, set only after a successful extraction.
    pub parsed: Option<ParamValue>,
    /// True iff a declared parameter middleware parsed this input.
    pub requested: bool,
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(placement: Placement, name: impl Into<String>, raw: Vec<String>) -> Self {
        Self {
            placement,
            name: name.into(),
            raw,
            parsed: None,
            requested: false,
            description: None,
        }
    }

    /// The raw values joined the way multi-valued headers join: `", "`.
    pub fn joined(&self) -> String {
        self.raw.join(", ")
    }

    /// First raw value, the common single-valued case.
    pub fn first_raw(&self) -> &str {
        self.raw.first().map(String::as_str).unwrap_or("")
    }
}

/// Per-request store of parameters keyed by placement and name.
#[derive(Debug, Default)]
pub struct ParamStore {
    entries: HashMap<Placement, HashMap<String, Parameter>>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, placement: Placement, name: &str) -> Option<&Parameter> {
        self.entries.get(&placement).and_then(|m| m.get(name))
    }

    pub fn get_mut(&mut self, placement: Placement, name: &str) -> Option<&mut Parameter> {
        self.entries.get_mut(&placement).and_then(|m| m.get_mut(name))
    }

    /// Insert a parameter, replacing any previous value of the same name.
    pub fn insert(&mut self, param: Parameter) {
        self.entries
            .entry(param.placement)
            .or_default()
            .insert(param.name.clone(), param);
    }

    /// Append a raw value, creating the parameter if it does not exist yet.
    pub fn append_raw(&mut self, placement: Placement, name: &str, value: String) {
        match self.get_mut(placement, name) {
            Some(p) => p.raw.push(value),
            None => self.insert(Parameter::new(placement, name, vec![value])),
        }
    }

    pub fn names(&self, placement: Placement) -> Vec<&str> {
        self.entries
            .get(&placement)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keyed_by_placement_and_name() {
        let mut store = ParamStore::new();
        store.insert(Parameter::new(Placement::Query, "id", vec!["7".into()]));
        store.insert(Parameter::new(Placement::Header, "id", vec!["other".into()]));

        assert_eq!(store.get(Placement::Query, "id").unwrap().first_raw(), "7");
        assert_eq!(
            store.get(Placement::Header, "id").unwrap().first_raw(),
            "other"
        );
        assert!(store.get(Placement::Cookie, "id").is_none());
    }

    #[test]
    fn test_append_raw_preserves_order() {
        let mut store = ParamStore::new();
        store.append_raw(Placement::Query, "tag", "a".into());
        store.append_raw(Placement::Query, "tag", "b".into());

        let p = store.get(Placement::Query, "tag").unwrap();
        assert_eq!(p.raw, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(p.joined(), "a, b");
    }

    #[test]
    fn test_param_value_tags() {
        assert_eq!(ParamValue::Int(3).as_int(), Some(3));
        assert_eq!(ParamValue::Int(3).as_float(), Some(3.0));
        assert_eq!(ParamValue::Int(3).as_bool(), None);
        assert_eq!(ParamValue::Str("x".into()).as_str(), Some("x"));
    }
}
