//! Response envelopes.
//!
//! An envelope (the "responser") is the outer shape written to the response
//! body. It receives either a payload or an error, never both, and a
//! marshaler turns the resulting [`EnvelopeView`] into bytes.

use serde_json::Value;
use std::sync::Arc;

/// Read-only view a marshaler encodes.
pub enum EnvelopeView<'a> {
    /// Written verbatim, no wrapping.
    Verbatim(&'a Value),
    /// Wrapped with `result` / `error` fields; exactly one is populated.
    Object {
        result: Option<&'a Value>,
        error: Option<&'a str>,
    },
}

/// A pluggable response envelope.
pub trait Responser: Send {
    /// Record the success payload. Clears any previously set error.
    fn set_payload(&mut self, payload: Value);
    /// Record the error message. Clears any previously set payload.
    fn set_error(&mut self, message: String);
    /// The view handed to the marshaler.
    fn view(&self) -> EnvelopeView<'_>;
}

/// Builds a fresh envelope per request.
pub type ResponserFactory = Arc<dyn Fn() -> Box<dyn Responser> + Send + Sync>;

/// Payload or error written verbatim.
#[derive(Default)]
pub struct AsIs {
    value: Value,
}

impl AsIs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ResponserFactory {
        Arc::new(|| Box::new(AsIs::new()))
    }
}

impl Responser for AsIs {
    fn set_payload(&mut self, payload: Value) {
        self.value = payload;
    }

    fn set_error(&mut self, message: String) {
        self.value = Value::String(message);
    }

    fn view(&self) -> EnvelopeView<'_> {
        EnvelopeView::Verbatim(&self.value)
    }
}

/// Wrapper with `result` and `error` fields.
#[derive(Default)]
pub struct AsObject {
    result: Option<Value>,
    error: Option<String>,
}

impl AsObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> ResponserFactory {
        Arc::new(|| Box::new(AsObject::new()))
    }
}

impl Responser for AsObject {
    fn set_payload(&mut self, payload: Value) {
        self.result = Some(payload);
        self.error = None;
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.result = None;
    }

    fn view(&self) -> EnvelopeView<'_> {
        EnvelopeView::Object {
            result: self.result.as_ref(),
            error: self.error.as_deref(),
        }
    }
}
