//! Status-carrying error kinds for the request pipeline.
//!
//! Every failure a middleware or handler can produce maps to exactly one HTTP
//! status. The route renders the error through the active response envelope,
//! so the client always receives a single enveloped error body.

use thiserror::Error;

/// Errors surfaced by the dispatch pipeline.
///
/// Middlewares return these to short-circuit the chain; handlers return them
/// to control the response status. An error without a dedicated kind is
/// `Unexpected` and renders as 500.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared parameter was absent from the request.
    #[error("parameter not found: {0}")]
    ParameterMissing(String),

    /// A declared parameter was present but failed type parsing.
    #[error("parameter {name} is malformed: {value}")]
    ParameterMalformed { name: String, value: String },

    /// A declared parameter parsed but failed a configured check.
    #[error("parameter {name} failed check: {reason}")]
    ParameterValidationFailed { name: String, reason: String },

    /// A required body was absent or empty.
    #[error("no required body provided")]
    BodyMissing,

    /// The body carried a `Content-Type` no unmarshaler is registered for.
    #[error("unsupported body content type: {0}")]
    BodyUnsupportedType(String),

    /// The body was present but could not be decoded.
    #[error("malformed body: {0}")]
    BodyMalformed(String),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request `Origin` is not in the allowed set.
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),

    /// A preflight-requested header or method is not in the allowed set.
    #[error("header not allowed: {0}")]
    HeaderNotAllowed(String),

    /// No route pattern matched the path.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The path matched but nothing is bound under the request method.
    #[error("method not applicable: {0}")]
    MethodNotApplicable(String),

    /// The marshaler failed to encode the envelope.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// Anything else; renders as an internal server error.
    #[error("{0}")]
    Unexpected(String),
}

impl Error {
    /// The HTTP status this error renders with.
    pub fn status(&self) -> u16 {
        match self {
            Error::ParameterMissing(_)
            | Error::ParameterMalformed { .. }
            | Error::ParameterValidationFailed { .. }
            | Error::BodyMissing
            | Error::BodyUnsupportedType(_)
            | Error::BodyMalformed(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::OriginNotAllowed(_) | Error::HeaderNotAllowed(_) => 403,
            Error::PathNotFound(_) | Error::MethodNotApplicable(_) => 404,
            Error::EncodingFailed(_) | Error::Unexpected(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(Error::ParameterMissing("id".into()).status(), 400);
        assert_eq!(Error::BodyMissing.status(), 400);
        assert_eq!(Error::Unauthorized("no token".into()).status(), 401);
        assert_eq!(Error::OriginNotAllowed("http://x".into()).status(), 403);
        assert_eq!(Error::PathNotFound("/y".into()).status(), 404);
        assert_eq!(Error::Unexpected("boom".into()).status(), 500);
    }

    #[test]
    fn test_error_messages_name_the_parameter() {
        let err = Error::ParameterMalformed {
            name: "id".into(),
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("id"));
        assert!(msg.contains("abc"));
    }
}
