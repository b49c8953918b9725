//! # Context Module
//!
//! The per-request seam between the dispatch core and the hosting
//! application.
//!
//! A [`ContextFactory`] is supplied once, to
//! [`HandleMapper::new_router`](crate::mapper::HandleMapper::new_router). For
//! every dispatched request the shim asks it for a fresh [`RequestContext`],
//! which hands out the validator factory and binder for that request, renders
//! bind failures, and finally receives the response in
//! [`RequestContext::done`].
//!
//! [`BasicContextFactory`] covers the common case.

mod basic;
mod core;

pub use self::basic::{BasicContext, BasicContextFactory, REQUEST_ID_HEADER};
pub use self::core::{ContextFactory, RequestContext};
