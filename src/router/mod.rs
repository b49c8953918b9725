//! # Router Module
//!
//! Path matching and dispatch entry point.
//!
//! A [`Router`] is produced by
//! [`HandleMapper::new_router`](crate::mapper::HandleMapper::new_router) and is
//! immutable from then on. Matching runs on a radix tree:
//!
//! - literal segments (`/items/new`) are tried before variables (`/items/{id}`)
//! - a literal branch that dead-ends falls back to the variable branch
//! - variable values are percent-decoded
//!
//! [`Router::serve`] resolves the route, fills the request's path parameters
//! and hands it to the dispatch shim.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::context::BasicContextFactory;
//! use brrtdispatch::factory::new_handle_mapper;
//! use brrtdispatch::mapper::HandleMapper;
//! use brrtdispatch::router::RouteLookup;
//! use brrtdispatch::{EndpointRegistration, HandlerResponse};
//! use http::Method;
//!
//! let mut mapper = new_handle_mapper();
//! mapper
//!     .put_handler(EndpointRegistration::new(Method::GET, "/pets/{id}", |_, _| {
//!         Ok(HandlerResponse::text(200, "pet").boxed())
//!     }))
//!     .unwrap();
//! let router = mapper.new_router(BasicContextFactory::default());
//!
//! match router.route(&Method::GET, "/pets/7") {
//!     RouteLookup::Found(m) => assert_eq!(m.get_path_param("id"), Some("7")),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;
mod radix;
#[cfg(test)]
mod tests;

pub use self::core::{Route, RouteLookup, RouteMatch, Router};
