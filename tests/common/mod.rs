#![allow(dead_code)]

use brrtdispatch::binder::RequestBinder;
use brrtdispatch::context::{BasicContextFactory, ContextFactory, RequestContext};
use brrtdispatch::validator::{ParameterValidator, ValidationMode, ValidatorFactory};
use brrtdispatch::{BindError, HandlerRequest, RawRequest, Responder, ResponseWriter};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters shared by a [`RecordingContextFactory`] and every context it builds.
#[derive(Debug, Default)]
pub struct Counters {
    pub contexts: AtomicUsize,
    pub done: AtomicUsize,
    pub validators: AtomicUsize,
    pub bind_errors: AtomicUsize,
    pub handler_calls: AtomicUsize,
}

impl Counters {
    pub fn contexts(&self) -> usize {
        self.contexts.load(Ordering::SeqCst)
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    pub fn validators(&self) -> usize {
        self.validators.load(Ordering::SeqCst)
    }

    pub fn bind_errors(&self) -> usize {
        self.bind_errors.load(Ordering::SeqCst)
    }

    pub fn handler_calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }
}

/// Context factory wrapping [`BasicContextFactory`] and counting lifecycle calls.
#[derive(Clone)]
pub struct RecordingContextFactory {
    inner: BasicContextFactory,
    pub counters: Arc<Counters>,
}

impl RecordingContextFactory {
    pub fn new() -> Self {
        Self::with_mode(ValidationMode::Strict)
    }

    pub fn with_mode(mode: ValidationMode) -> Self {
        Self {
            inner: BasicContextFactory::with_mode(mode),
            counters: Arc::new(Counters::default()),
        }
    }
}

impl ContextFactory for RecordingContextFactory {
    fn new_context(&self, request: &RawRequest) -> Box<dyn RequestContext> {
        self.counters.contexts.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingContext {
            inner: self.inner.new_context(request),
            counters: Arc::clone(&self.counters),
        })
    }
}

struct RecordingContext {
    inner: Box<dyn RequestContext>,
    counters: Arc<Counters>,
}

impl RequestContext for RecordingContext {
    fn new_validator_factory(&self) -> Box<dyn ValidatorFactory> {
        Box::new(CountingValidatorFactory {
            inner: self.inner.new_validator_factory(),
            counters: Arc::clone(&self.counters),
        })
    }

    fn new_request_binder<'r>(&self, request: &'r RawRequest) -> Box<dyn RequestBinder + 'r> {
        self.inner.new_request_binder(request)
    }

    fn new_bind_error_response(&self, err: &BindError) -> Box<dyn Responder> {
        self.counters.bind_errors.fetch_add(1, Ordering::SeqCst);
        self.inner.new_bind_error_response(err)
    }

    fn done(self: Box<Self>, writer: &mut dyn ResponseWriter, response: Box<dyn Responder>) {
        self.counters.done.fetch_add(1, Ordering::SeqCst);
        self.inner.done(writer, response);
    }
}

/// Validator factory that counts the validators it builds.
pub struct CountingValidatorFactory {
    inner: Box<dyn ValidatorFactory>,
    counters: Arc<Counters>,
}

impl ValidatorFactory for CountingValidatorFactory {
    fn new_validator<'v>(&self, value: Option<&'v Value>) -> Box<dyn ParameterValidator + 'v> {
        self.counters.validators.fetch_add(1, Ordering::SeqCst);
        self.inner.new_validator(value)
    }
}

/// Wrap a handler body so every invocation bumps `counters.handler_calls`.
pub fn counted<F>(
    counters: &Arc<Counters>,
    f: F,
) -> impl Fn(&mut dyn RequestContext, &HandlerRequest) -> anyhow::Result<Box<dyn Responder>>
       + Send
       + Sync
       + 'static
where
    F: Fn(&HandlerRequest) -> anyhow::Result<Box<dyn Responder>> + Send + Sync + 'static,
{
    let counters = Arc::clone(counters);
    move |_ctx, req| {
        counters.handler_calls.fetch_add(1, Ordering::SeqCst);
        f(req)
    }
}
