//! # brrtdispatch
//!
//! **brrtdispatch** is the request dispatch and parameter-validation layer
//! between a generated API contract (paths, methods, parameter shapes) and
//! whatever HTTP runtime hosts it.
//!
//! ## Overview
//!
//! For every declared endpoint it creates a per-request context, binds and
//! validates the incoming request data into parameters, invokes the handler,
//! and hands the response to the context for emission. The web framework
//! underneath is reached only through narrow traits; a `may_minihttp`
//! adapter ships in [`server`].
//!
//! ## Architecture
//!
//! Leaf-first:
//!
//! - **[`validator`]** - checks one bound value against its parameter rule
//! - **[`consumer`]** - content-type-keyed body decoders
//! - **[`binder`]** - extracts path, query, header, cookie and body values and converts them
//! - **[`context`]** - the per-request capability bundle and its factory, the one seam a host implements
//! - **[`mapper`]** - startup registration of `(method, path)` handlers
//! - **[`router`]** - the frozen radix-tree router produced by a mapper
//! - **[`dispatcher`]** - the shim that owns one request's lifecycle
//! - **[`server`]** - `may_minihttp` hosting adapter
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host<br/>(server::DispatchService)
//!     participant Router as Router
//!     participant Shim as dispatcher::dispatch
//!     participant Factory as ContextFactory
//!     participant Ctx as RequestContext
//!     participant Binder as RequestBinder
//!     participant Val as ParameterValidator
//!     participant Handler as Handler
//!
//!     Host->>Router: serve(RawRequest, writer)
//!     Router->>Router: radix match (method, path)
//!     alt No route
//!         Router-->>Host: 404 / 405 + Allow
//!     end
//!     Router->>Shim: dispatch(route, request)
//!     Shim->>Factory: new_context(&request)
//!     Factory-->>Shim: Box<dyn RequestContext>
//!     Shim->>Ctx: new_validator_factory()
//!     Shim->>Ctx: new_request_binder(&request)
//!     Shim->>Binder: bind(rules)
//!     Binder->>Binder: decode body (Consumer)
//!     loop each parameter, fail-fast
//!         Binder->>Val: validate(rule)
//!     end
//!     alt Binding failed
//!         Shim->>Ctx: new_bind_error_response(err)
//!     else Bound
//!         Shim->>Handler: handler(ctx, HandlerRequest)
//!         Handler-->>Shim: Box<dyn Responder> / Err / panic
//!     end
//!     Shim->>Ctx: done(writer, response)
//!     Ctx-->>Host: status, headers, body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtdispatch::context::BasicContextFactory;
//! use brrtdispatch::factory::new_handle_mapper;
//! use brrtdispatch::mapper::HandleMapper;
//! use brrtdispatch::{
//!     BufferedResponse, EndpointRegistration, HandlerResponse, ParameterMeta, RawRequest,
//! };
//! use http::Method;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut mapper = new_handle_mapper();
//! mapper.put_handler(
//!     EndpointRegistration::new(Method::GET, "/items/{id}", |_ctx, req| {
//!         let id: i64 = req.param_as("id")?.unwrap_or_default();
//!         Ok(HandlerResponse::ok_json(json!({ "id": id })).boxed())
//!     })
//!     .parameter(ParameterMeta::path("id").schema(json!({"type": "integer"}))),
//! )?;
//! let router = mapper.new_router(BasicContextFactory::default());
//!
//! let mut out = BufferedResponse::new();
//! router.serve(RawRequest::new(Method::GET, "/items/42"), &mut out);
//! assert_eq!(out.status_or_default(), 200);
//! assert_eq!(out.json()?, json!({ "id": 42 }));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for the `BRRTR_*` environment variables and the
//! YAML service file, and [`logging`] for subscriber setup.

pub mod binder;
pub mod consumer;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod ids;
pub mod logging;
pub mod mapper;
pub mod request;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod validator;

pub use context::{BasicContextFactory, ContextFactory, RequestContext};
pub use dispatcher::DispatchOutcome;
pub use endpoint::{EndpointRegistration, ParameterLocation, ParameterMeta, ParameterStyle};
pub use error::{BindError, ConsumeError, RegistrationError, ValidationError};
pub use mapper::{DefaultHandleMapper, DuplicatePolicy, HandleMapper};
pub use request::{BoundParams, HandlerRequest, RawRequest};
pub use response::{BufferedResponse, HandlerResponse, Responder, ResponseWriter};
pub use router::Router;
