//! Required-body extractor, priority 100.
//!
//! Decodes the request payload at most once per request: a second body
//! middleware (or a handler accessor) reuses the stored value. The request
//! `Content-Type` selects the unmarshaler; an empty payload on a route that
//! declares a body is a 400.

use super::{Middleware, ParamDoc, RouteDocs, PRIORITY_PARAMS};
use crate::error::Error;
use crate::marshal::unmarshal_body;
use crate::param::{ParamValue, Placement};
use crate::request::Request;
use crate::response::Response;

/// Declares that the route requires a decodable body.
#[derive(Default)]
pub struct Body {
    description: Option<String>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl Middleware for Body {
    fn handle(&self, req: &mut Request, _res: &mut Response) -> Result<(), Error> {
        if req.body().requested {
            return Ok(());
        }
        let raw = req.body().first_raw().to_string();
        if raw.is_empty() {
            return Err(Error::BodyMissing);
        }
        let content_type = req.get("content-type", Placement::Header);
        let value = unmarshal_body(&content_type, &raw)?;
        let body = req.body_mut();
        body.parsed = Some(ParamValue::Data(value));
        body.requested = true;
        if body.description.is_none() {
            body.description = self.description.clone();
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        PRIORITY_PARAMS
    }

    fn docs(&self, docs: &mut RouteDocs) {
        docs.parameters.push(ParamDoc {
            name: "body".to_string(),
            placement: Placement::Body,
            pattern: None,
            description: self.description.clone(),
        });
    }
}
