//! Authentication middlewares, priority 20.
//!
//! Supported schemes: HTTP Basic, Bearer (static token or caller-supplied
//! validator), and API key carried in a header, query parameter, or cookie.
//! "No authentication" is simply the absence of any of these on a route.

use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use super::{Middleware, PRIORITY_AUTH};
use crate::error::Error;
use crate::param::Placement;
use crate::request::Request;
use crate::response::Response;

/// HTTP Basic credentials check.
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Middleware for BasicAuth {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        let header = req.get("authorization", Placement::Header);
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| Error::Unauthorized("missing basic credentials".into()))?;
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| Error::Unauthorized("invalid basic credentials".into()))?;
        let decoded = String::from_utf8_lossy(&decoded);
        let mut parts = decoded.splitn(2, ':');
        let user = parts.next().unwrap_or("");
        let pass = parts.next().unwrap_or("");
        if user == self.username && pass == self.password {
            Ok(())
        } else {
            Err(Error::Unauthorized("invalid basic credentials".into()))
        }
    }

    fn priority(&self) -> i32 {
        PRIORITY_AUTH
    }
}

/// Bearer token validation callback.
pub type BearerValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Bearer token check against a static token or a validator.
pub struct BearerAuth {
    token: Option<String>,
    validator: Option<BearerValidator>,
}

impl BearerAuth {
    /// Accept exactly this token.
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            validator: None,
        }
    }

    /// Accept any token the validator approves.
    pub fn validator<F>(validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            token: None,
            validator: Some(Arc::new(validator)),
        }
    }
}

impl Middleware for BearerAuth {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        let header = req.get("authorization", Placement::Header);
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("missing bearer token".into()))?;
        let valid = match (&self.token, &self.validator) {
            (Some(expected), _) => token == expected,
            (None, Some(validate)) => validate(token),
            (None, None) => false,
        };
        if valid {
            Ok(())
        } else {
            Err(Error::Unauthorized("invalid bearer token".into()))
        }
    }

    fn priority(&self) -> i32 {
        PRIORITY_AUTH
    }
}

/// Static API key carried in a header, query parameter, or cookie.
pub struct ApiKeyAuth {
    placement: Placement,
    name: String,
    key: String,
}

impl ApiKeyAuth {
    /// Build the check. Keys cannot be read from the path or the body;
    /// declaring either placement fails here, at registration.
    pub fn new(
        placement: Placement,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, Error> {
        match placement {
            Placement::Header | Placement::Query | Placement::Cookie => Ok(Self {
                placement,
                name: name.into(),
                key: key.into(),
            }),
            other => Err(Error::Unexpected(format!(
                "api key cannot be read from {other} placement"
            ))),
        }
    }
}

impl Middleware for ApiKeyAuth {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        let provided = req.get(&self.name, self.placement);
        if provided == self.key {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("invalid api key {}", self.name)))
        }
    }

    fn priority(&self) -> i32 {
        PRIORITY_AUTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AsObject;
    use crate::marshal::JsonMarshaler;
    use crate::request::RequestParts;
    use http::Method;

    fn response() -> Response {
        Response::new(Arc::new(JsonMarshaler), Box::new(AsObject::new()))
    }

    fn request_with_header(name: &str, value: &str) -> Request {
        Request::new(RequestParts::new(Method::GET, "/x").header(name, value))
    }

    #[test]
    fn test_basic_auth() {
        let auth = BasicAuth::new("user", "pass");
        let mut res = response();

        // "user:pass"
        let mut req = request_with_header("Authorization", "Basic dXNlcjpwYXNz");
        assert!(auth.handle(&mut req, &mut res).is_ok());

        let mut req = request_with_header("Authorization", "Basic dXNlcjp3cm9uZw==");
        let err = auth.handle(&mut req, &mut res).unwrap_err();
        assert_eq!(err.status(), 401);

        let mut req = Request::new(RequestParts::new(Method::GET, "/x"));
        assert!(auth.handle(&mut req, &mut res).is_err());
    }

    #[test]
    fn test_bearer_static_token() {
        let auth = BearerAuth::token("sekrit");
        let mut res = response();

        let mut req = request_with_header("Authorization", "Bearer sekrit");
        assert!(auth.handle(&mut req, &mut res).is_ok());

        let mut req = request_with_header("Authorization", "Bearer nope");
        assert!(auth.handle(&mut req, &mut res).is_err());
    }

    #[test]
    fn test_bearer_validator() {
        let auth = BearerAuth::validator(|t| t.starts_with("v1."));
        let mut res = response();

        let mut req = request_with_header("Authorization", "Bearer v1.abc");
        assert!(auth.handle(&mut req, &mut res).is_ok());

        let mut req = request_with_header("Authorization", "Bearer v2.abc");
        assert!(auth.handle(&mut req, &mut res).is_err());
    }

    #[test]
    fn test_api_key_placements() {
        let mut res = response();

        let header_auth = ApiKeyAuth::new(Placement::Header, "x-api-key", "k1").unwrap();
        let mut req = request_with_header("X-Api-Key", "k1");
        assert!(header_auth.handle(&mut req, &mut res).is_ok());

        let query_auth = ApiKeyAuth::new(Placement::Query, "key", "k1").unwrap();
        let mut req = Request::new(RequestParts::new(Method::GET, "/x?key=k1"));
        assert!(query_auth.handle(&mut req, &mut res).is_ok());

        let cookie_auth = ApiKeyAuth::new(Placement::Cookie, "key", "k1").unwrap();
        let mut req = request_with_header("Cookie", "key=k1");
        assert!(cookie_auth.handle(&mut req, &mut res).is_ok());

        let mut req = Request::new(RequestParts::new(Method::GET, "/x?key=wrong"));
        assert!(query_auth.handle(&mut req, &mut res).is_err());
    }

    #[test]
    fn test_api_key_in_path_fails_to_register() {
        assert!(ApiKeyAuth::new(Placement::Path, "key", "k1").is_err());
        assert!(ApiKeyAuth::new(Placement::Body, "key", "k1").is_err());
    }
}
