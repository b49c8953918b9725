//! # Validator Module
//!
//! Per-value parameter validation. A [`ValidatorFactory`] is obtained from the
//! request context and builds one [`ParameterValidator`] per bound value, so
//! contexts can switch strategy (strict or lenient) without the binder knowing.
//!
//! Absence is carried as `Option<&Value>`: `None` is an absent parameter,
//! `Some(&Value::String(String::new()))` a present empty one.

mod core;

pub use self::core::{
    DefaultValidatorFactory, ParameterValidator, PresenceValidator, SchemaValidator,
    ValidationMode, ValidatorFactory,
};
