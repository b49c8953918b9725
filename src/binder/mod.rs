//! # Binder Module
//!
//! Turns raw request data into bound parameters. [`RequestBinder`] is the
//! contract the dispatch shim drives; [`BasicRequestBinder`] is the default
//! implementation, reading path, query, header and cookie values from the
//! [`RawRequest`](crate::request::RawRequest) and delegating bodies to a
//! [`ConsumerFactory`](crate::consumer::ConsumerFactory).
//!
//! ## Conversion
//!
//! String-sourced values are converted by the schema `type`:
//!
//! | type      | raw                  | bound            |
//! |-----------|----------------------|------------------|
//! | `integer` | `42`                 | `42`             |
//! | `boolean` | `true`               | `true`           |
//! | `array`   | `a,b` or repeated    | `["a", "b"]`     |
//! | `object`  | `{"k":1}`            | `{"k": 1}`       |
//!
//! A value that does not convert fails with
//! [`BindError::MalformedParameter`](crate::error::BindError::MalformedParameter).

mod core;
mod decode;

pub use self::core::{BasicRequestBinder, RequestBinder, DEFAULT_BODY_MEDIA_TYPE};
