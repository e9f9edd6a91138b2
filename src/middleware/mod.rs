//! Pluggable request middleware.
//!
//! Everything that runs between routing and the handler is a [`Middleware`]:
//! CORS checks, authentication, parameter extraction, body decoding, and any
//! user-supplied steps. The chain is stable-sorted by [`Middleware::priority`]
//! ascending; the numeric values below are the contract, not the positions.

mod auth;
mod body;
mod cors;
mod params;

pub use auth::{ApiKeyAuth, BasicAuth, BearerAuth, BearerValidator};
pub use body::Body;
pub use cors::{CorsHeaders, CorsMethods, CorsOrigin};
pub use params::{Check, Param, ParamKind};

use crate::error::Error;
use crate::param::Placement;
use crate::request::Request;
use crate::response::Response;

pub const PRIORITY_CORS_ORIGIN: i32 = 10;
pub const PRIORITY_CORS_HEADERS: i32 = 11;
pub const PRIORITY_CORS_METHODS: i32 = 12;
pub const PRIORITY_AUTH: i32 = 20;
pub const PRIORITY_PARAMS: i32 = 100;

/// One step of the request pipeline.
pub trait Middleware: Send + Sync {
    /// Run the step. Returning an error short-circuits the chain; the error
    /// is rendered through the response envelope with its status.
    fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error>;

    /// Execution position; lower runs earlier, ties keep registration order.
    fn priority(&self) -> i32 {
        PRIORITY_PARAMS
    }

    /// Optional doc contribution.
    fn docs(&self, _docs: &mut RouteDocs) {}
}

/// Documentation collected from a route's middleware chain.
#[derive(Debug, Default)]
pub struct RouteDocs {
    pub parameters: Vec<ParamDoc>,
}

/// One documented parameter.
#[derive(Debug)]
pub struct ParamDoc {
    pub name: String,
    pub placement: Placement,
    /// Regular expression describing accepted values.
    pub pattern: Option<String>,
    pub description: Option<String>,
}
