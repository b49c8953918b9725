//! # Server Module
//!
//! Hosting adapter for the `may_minihttp` coroutine HTTP server.
//!
//! [`DispatchService`] converts each inbound request into a
//! [`RawRequest`](crate::request::RawRequest), enforces the body size limit
//! (413 beyond it), serves it through a [`Router`](crate::router::Router) into
//! a buffered response, and copies that onto the wire. [`HttpServer`] and
//! [`ServerHandle`] start, wait for and stop the listener.
//!
//! Any other runtime can host a router the same way: build a `RawRequest`,
//! call [`Router::serve`](crate::router::Router::serve) with a
//! [`ResponseWriter`](crate::response::ResponseWriter) over its response type.
//!
//! ## Limitations
//!
//! `may_minihttp` takes header lines as `&'static str`. Lines for a fixed set
//! of low-cardinality headers (`content-type`, `allow`, ...) are interned up to
//! [`MAX_INTERNED_HEADERS`]; every other line is leaked for its own response.
//! `X-Request-Id` is not forwarded.

mod http_server;
mod service;

pub use self::http_server::{HttpServer, ServerHandle};
pub use self::service::{DispatchService, MAX_INTERNED_HEADERS};
