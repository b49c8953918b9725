//! # Dispatcher Module
//!
//! The dispatch shim every route runs through. For one request it:
//!
//! 1. asks the [`ContextFactory`](crate::context::ContextFactory) for a fresh context
//! 2. obtains the validator factory and binder from the context
//! 3. binds the route's parameters (fail-fast)
//! 4. answers a bind failure with the context's bind-error response, or
//!    invokes the handler
//! 5. hands the response to the context's `done` hook
//!
//! Handler errors and panics are caught and turned into a 500 response; step 5
//! still runs. Panic recovery relies on unwinding, so builds must not set
//! `panic = "abort"`.

mod core;

pub use self::core::{dispatch, DispatchOutcome};
