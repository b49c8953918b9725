use crate::binder::RequestBinder;
use crate::error::BindError;
use crate::request::RawRequest;
use crate::response::{Responder, ResponseWriter};
use crate::validator::ValidatorFactory;

/// Per-request capability bundle.
///
/// Created by a [`ContextFactory`] for exactly one request and owned by the
/// dispatch shim handling it. `done` consumes the context, so it runs once.
pub trait RequestContext {
    /// Validator factory for this request.
    fn new_validator_factory(&self) -> Box<dyn ValidatorFactory>;

    /// Binder over `request`.
    fn new_request_binder<'r>(&self, request: &'r RawRequest) -> Box<dyn RequestBinder + 'r>;

    /// Response for a binding failure. Must always produce a well-formed response.
    fn new_bind_error_response(&self, err: &BindError) -> Box<dyn Responder>;

    /// Completion hook: write `response` and release per-request resources.
    ///
    /// Called on every exit path of the shim: success, binding failure,
    /// handler error and handler panic.
    fn done(self: Box<Self>, writer: &mut dyn ResponseWriter, response: Box<dyn Responder>);
}

/// Builds a [`RequestContext`] per inbound request.
///
/// This is the integration point a hosting application implements. Any
/// `Fn(&RawRequest) -> Box<dyn RequestContext>` closure is a factory.
pub trait ContextFactory: Send + Sync {
    fn new_context(&self, request: &RawRequest) -> Box<dyn RequestContext>;
}

impl<F> ContextFactory for F
where
    F: Fn(&RawRequest) -> Box<dyn RequestContext> + Send + Sync,
{
    fn new_context(&self, request: &RawRequest) -> Box<dyn RequestContext> {
        self(request)
    }
}
