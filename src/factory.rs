//! Constructors for the default implementations.
//!
//! These are what generated glue code calls; each returns the trait object or
//! concrete default so callers never name the implementation types.

use serde_json::Value;
use std::sync::Arc;

use crate::binder::{BasicRequestBinder, RequestBinder};
use crate::consumer::ConsumerFactory;
use crate::mapper::DefaultHandleMapper;
use crate::request::RawRequest;
use crate::validator::{DefaultValidatorFactory, ParameterValidator, SchemaValidator, ValidatorFactory};

/// Strict validator over `value`; `None` is an absent parameter.
#[must_use]
pub fn new_validator(value: Option<&Value>) -> Box<dyn ParameterValidator + '_> {
    Box::new(SchemaValidator::new(value))
}

/// Strict validator factory.
#[must_use]
pub fn new_validator_factory() -> Box<dyn ValidatorFactory> {
    Box::new(DefaultValidatorFactory::default())
}

/// Empty handle mapper rejecting duplicate registrations.
#[must_use]
pub fn new_handle_mapper() -> DefaultHandleMapper {
    DefaultHandleMapper::new()
}

/// Binder over `request`, decoding bodies with `consumers`.
pub fn new_request_binder<'r>(
    request: &'r RawRequest,
    consumers: Arc<dyn ConsumerFactory>,
) -> Box<dyn RequestBinder + 'r> {
    Box::new(BasicRequestBinder::new(request, consumers))
}
