//! # Mapper Module
//!
//! Startup registration of endpoint handlers.
//!
//! Registrations go into a [`HandleMapper`] one at a time with
//! [`HandleMapper::put_handler`]; path templates are validated and parameter
//! schemas compiled as they arrive, so a bad contract fails startup rather
//! than the first request. [`HandleMapper::new_router`] consumes the mapper:
//! once the router exists there is nothing left to mutate.
//!
//! Duplicate `(method, path)` registrations are rejected by default. Opt into
//! last-wins with [`DuplicatePolicy::Replace`].

mod core;

pub use self::core::{DefaultHandleMapper, DuplicatePolicy, HandleMapper};
