//! # Viaduct
//!
//! **Viaduct** is a coroutine-powered HTTP service framework for Rust: a
//! per-method routing trie, a priority-ordered middleware chain, typed
//! parameter extraction, and a pluggable response envelope, served on the
//! `may` runtime.
//!
//! ## Overview
//!
//! A service is assembled from routes (`pattern` + handler + middleware
//! chain), mounted on an [`engine::Engine`] under path prefixes, and served
//! over `may_minihttp`. Every request flows through the same pipeline:
//!
//! 1. the engine strips its prefix and selects the service with the longest
//!    matching prefix;
//! 2. the service's routing trie resolves the path and binds `:param` /
//!    `*catchall` segments;
//! 3. engine-level and route-level middlewares run interleaved by priority,
//!    short-circuiting on the first error;
//! 4. the handler writes a payload or error through the response envelope,
//!    which the active marshaler encodes onto the wire.
//!
//! ## Modules
//!
//! - **[`router`]** - Path matching and route resolution over a segment trie
//! - **[`route`]** - Handler plus middleware chain and per-route overrides
//! - **[`service`]** / **[`engine`]** - Assembly and dispatch
//! - **[`middleware`]** - CORS, authentication, parameter and body extraction
//! - **[`param`]** / **[`request`]** - Typed parameter store and accessors
//! - **[`envelope`]** / **[`marshal`]** - Response envelopes and codecs
//! - **[`server`]** - `may_minihttp` listener adapter
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use viaduct::middleware::Param;
//! use viaduct::{Engine, Route, Service};
//!
//! let mut users = Service::new("/users");
//! users
//!     .get(
//!         "/:id",
//!         Route::new(|req, res| {
//!             let id = req.int64("id", viaduct::Placement::Path);
//!             res.ok(serde_json::json!({ "id": id }));
//!             Ok(())
//!         })
//!         .middleware(Arc::new(Param::path_int("id").greater(0.0))),
//!     )
//!     .unwrap();
//!
//! Engine::new()
//!     .prefix("/api")
//!     .logger("info")
//!     .service(users)
//!     .serve("0.0.0.0:8080")
//!     .unwrap();
//! ```

pub mod engine;
pub mod envelope;
pub mod error;
pub mod marshal;
pub mod middleware;
pub mod param;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod server;
pub mod service;

pub use engine::{Engine, EngineConfig};
pub use envelope::{AsIs, AsObject, EnvelopeView, Responser, ResponserFactory};
pub use error::Error;
pub use marshal::{JsonMarshaler, Marshaler, XmlMarshaler};
pub use param::{ParamValue, Parameter, Placement};
pub use request::{Request, RequestParts};
pub use response::{Response, ResponseParts};
pub use route::{Handler, Route};
pub use router::RouteConflict;
pub use service::Service;
