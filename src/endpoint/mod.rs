//! # Endpoint Module
//!
//! Registration records for the endpoints of a generated API contract.
//!
//! An [`EndpointRegistration`] ties a path template and method to a handler
//! function and the parameters that must be bound before the handler runs.
//! Registrations are immutable once handed to a
//! [`HandleMapper`](crate::mapper::HandleMapper); the mapper compiles each
//! [`ParameterMeta`] into a [`ParameterRule`] at registration time so no schema
//! compilation happens on the request path.
//!
//! ```rust
//! use brrtdispatch::endpoint::{EndpointRegistration, ParameterMeta};
//! use brrtdispatch::response::HandlerResponse;
//! use http::Method;
//! use serde_json::json;
//!
//! let get_item = EndpointRegistration::new(Method::GET, "/items/{id}", |_ctx, req| {
//!     Ok(HandlerResponse::ok_json(json!({ "id": req.param("id") })).boxed())
//! })
//! .parameter(ParameterMeta::path("id").schema(json!({ "type": "integer" })));
//! assert_eq!(get_item.operation, "GET /items/{id}");
//! ```

mod registration;
mod types;

pub use registration::{
    EndpointRegistration, HandlerFunc, ParameterRule, PathTemplate, SUPPORTED_METHODS,
};
pub use types::{ParameterLocation, ParameterMeta, ParameterStyle};
