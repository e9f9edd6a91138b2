//! Envelope encoding and body decoding.
//!
//! A [`Marshaler`] is an (encode, content-type) pair used to serialize a
//! response envelope. Body decoding goes the other way: the request
//! `Content-Type` selects an unmarshaler producing an opaque
//! [`serde_json::Value`] that handlers deserialize into their own types.

use crate::envelope::EnvelopeView;
use crate::error::Error;
use serde_json::{json, Value};

/// Content-type-specific encoder for a response envelope.
pub trait Marshaler: Send + Sync {
    /// `Content-Type` written alongside the encoded body, if any.
    fn content_type(&self) -> Option<&'static str>;
    /// Encode the envelope view into the response body bytes.
    fn marshal(&self, envelope: EnvelopeView<'_>) -> Result<Vec<u8>, Error>;
}

/// JSON encoder, `application/json`.
pub struct JsonMarshaler;

impl Marshaler for JsonMarshaler {
    fn content_type(&self) -> Option<&'static str> {
        Some("application/json")
    }

    fn marshal(&self, envelope: EnvelopeView<'_>) -> Result<Vec<u8>, Error> {
        let value = match envelope {
            // Verbatim strings go out as-is, unquoted.
            EnvelopeView::Verbatim(Value::String(s)) => return Ok(s.clone().into_bytes()),
            EnvelopeView::Verbatim(v) => v.clone(),
            EnvelopeView::Object { result, error } => match (result, error) {
                (_, Some(e)) => json!({ "error": e }),
                (Some(r), None) => json!({ "result": r }),
                (None, None) => json!({ "result": Value::Null }),
            },
        };
        serde_json::to_vec(&value).map_err(|e| Error::EncodingFailed(e.to_string()))
    }
}

/// XML encoder, `application/xml`. Prepends the standard XML declaration
/// and wraps object envelopes in a `response` element.
pub struct XmlMarshaler;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

impl Marshaler for XmlMarshaler {
    fn content_type(&self) -> Option<&'static str> {
        Some("application/xml")
    }

    fn marshal(&self, envelope: EnvelopeView<'_>) -> Result<Vec<u8>, Error> {
        let mut out = String::from(XML_DECL);
        match envelope {
            EnvelopeView::Verbatim(Value::String(s)) => out.push_str(s),
            EnvelopeView::Verbatim(v) => write_element(&mut out, "response", v),
            EnvelopeView::Object { result, error } => {
                out.push_str("<response>");
                match (result, error) {
                    (_, Some(e)) => {
                        out.push_str("<error>");
                        out.push_str(&quick_xml::escape::escape(e));
                        out.push_str("</error>");
                    }
                    (r, None) => {
                        write_element(&mut out, "result", r.unwrap_or(&Value::Null));
                    }
                }
                out.push_str("</response>");
            }
        }
        Ok(out.into_bytes())
    }
}

fn write_element(out: &mut String, tag: &str, value: &Value) {
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(tag);
            out.push_str("/>");
        }
        Value::Object(map) => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            for (k, v) in map {
                write_element(out, k, v);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        // Arrays repeat the enclosing element.
        Value::Array(items) => {
            for item in items {
                write_element(out, tag, item);
            }
        }
        Value::String(s) => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(&quick_xml::escape::escape(s.as_str()));
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        other => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(&other.to_string());
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Decode a request body according to its `Content-Type`.
///
/// Supported types: `application/json`, `application/xml` (and `text/xml`),
/// `text/plain`. Anything else is rejected with a 400.
pub fn unmarshal_body(content_type: &str, raw: &str) -> Result<Value, Error> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "application/json" => {
            serde_json::from_str(raw).map_err(|e| Error::BodyMalformed(e.to_string()))
        }
        "application/xml" | "text/xml" => {
            quick_xml::de::from_str(raw).map_err(|e| Error::BodyMalformed(e.to_string()))
        }
        "text/plain" => Ok(Value::String(raw.to_string())),
        other => Err(Error::BodyUnsupportedType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{AsIs, AsObject, Responser};

    #[test]
    fn test_json_object_envelope_round_trip() {
        let mut env = AsObject::new();
        env.set_payload(json!({ "a": 1, "b": ["x", "y"] }));
        let bytes = JsonMarshaler.marshal(env.view()).unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back["result"], json!({ "a": 1, "b": ["x", "y"] }));
    }

    #[test]
    fn test_json_error_envelope() {
        let mut env = AsObject::new();
        env.set_error("went wrong".into());
        let bytes = JsonMarshaler.marshal(env.view()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"error":"went wrong"}"#
        );
    }

    #[test]
    fn test_json_as_is_string_unwrapped() {
        let mut env = AsIs::new();
        env.set_payload(Value::String("raw text".into()));
        let bytes = JsonMarshaler.marshal(env.view()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "raw text");
    }

    #[test]
    fn test_xml_result_envelope() {
        let mut env = AsObject::new();
        env.set_payload(Value::String("ok".into()));
        let bytes = XmlMarshaler.marshal(env.view()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.ends_with("<response><result>ok</result></response>"));
    }

    #[test]
    fn test_xml_error_envelope_escapes() {
        let mut env = AsObject::new();
        env.set_error("a < b".into());
        let bytes = XmlMarshaler.marshal(env.view()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<response><error>a &lt; b</error></response>"));
    }

    #[test]
    fn test_unmarshal_json_body() {
        let v = unmarshal_body("application/json; charset=utf-8", r#"{"note":"x"}"#).unwrap();
        assert_eq!(v["note"], "x");
    }

    #[test]
    fn test_unmarshal_plain_text_body() {
        let v = unmarshal_body("text/plain", "hello").unwrap();
        assert_eq!(v, Value::String("hello".into()));
    }

    #[test]
    fn test_unmarshal_unknown_content_type() {
        let err = unmarshal_body("application/octet-stream", "...").unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(matches!(err, Error::BodyUnsupportedType(_)));
    }
}
