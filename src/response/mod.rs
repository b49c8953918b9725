//! # Response Module
//!
//! Outbound side of the dispatch boundary. Handlers and bind-error paths
//! produce a [`Responder`]; the request context's `done` hook writes it into a
//! [`ResponseWriter`] supplied by the hosting adapter.
//!
//! [`HandlerResponse`] is the default responder (JSON or plain text body,
//! RFC 7807 problem details for binding failures) and [`BufferedResponse`] is
//! an in-memory writer used by tests and by the `may_minihttp` adapter.

mod core;

pub use self::core::{status_reason, BufferedResponse, HandlerResponse, Responder, ResponseWriter};
