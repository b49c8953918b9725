use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::context::{ContextFactory, RequestContext};
use crate::request::{HandlerRequest, RawRequest};
use crate::response::{HandlerResponse, Responder, ResponseWriter};
use crate::router::Route;

/// How a request left the dispatch shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler returned a response
    Handled { status: u16 },
    /// Binding failed; the handler was not called
    BindingFailed { status: u16 },
    /// The handler returned an error
    HandlerFailed,
    /// The handler panicked
    HandlerPanicked,
    /// No route matched the path
    NotFound,
    /// The path matched but not the method
    MethodNotAllowed,
}

impl DispatchOutcome {
    /// Status written to the client.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchOutcome::Handled { status } | DispatchOutcome::BindingFailed { status } => {
                *status
            }
            DispatchOutcome::HandlerFailed | DispatchOutcome::HandlerPanicked => 500,
            DispatchOutcome::NotFound => 404,
            DispatchOutcome::MethodNotAllowed => 405,
        }
    }

    /// Whether the registered handler ran to completion.
    #[must_use]
    pub fn handler_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }
}

enum Completion {
    Handled(Box<dyn Responder>),
    BindFailed(Box<dyn Responder>),
    HandlerFailed(anyhow::Error),
}

/// Run the per-request lifecycle for a matched route.
///
/// The context comes from `factory`; binding failures are answered by the
/// context, handler errors and panics become a 500. Whatever happens after
/// the context exists, its `done` hook receives the response exactly once.
pub fn dispatch(
    route: &Route,
    factory: &dyn ContextFactory,
    request: RawRequest,
    writer: &mut dyn ResponseWriter,
) -> DispatchOutcome {
    let started = Instant::now();
    let request_id = request.request_id;
    let mut ctx = factory.new_context(&request);
    debug!(
        request_id = %request_id,
        operation = %route.operation,
        "Dispatching request"
    );

    let result = panic::catch_unwind(AssertUnwindSafe(|| run(route, ctx.as_mut(), request)));

    let (response, outcome) = match result {
        Ok(Completion::Handled(response)) => {
            let status = response.status();
            (response, DispatchOutcome::Handled { status })
        }
        Ok(Completion::BindFailed(response)) => {
            let status = response.status();
            (response, DispatchOutcome::BindingFailed { status })
        }
        Ok(Completion::HandlerFailed(err)) => {
            error!(
                request_id = %request_id,
                operation = %route.operation,
                error = %err,
                "Handler returned an error"
            );
            (
                HandlerResponse::error(500, "Internal Server Error").boxed(),
                DispatchOutcome::HandlerFailed,
            )
        }
        Err(payload) => {
            error!(
                request_id = %request_id,
                operation = %route.operation,
                panic_message = %panic_message(payload.as_ref()),
                "Handler panicked"
            );
            (
                HandlerResponse::error(500, "Internal Server Error").boxed(),
                DispatchOutcome::HandlerPanicked,
            )
        }
    };

    ctx.done(writer, response);

    info!(
        request_id = %request_id,
        operation = %route.operation,
        status = outcome.status(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Request dispatched"
    );
    outcome
}

fn run(route: &Route, ctx: &mut dyn RequestContext, request: RawRequest) -> Completion {
    let bound = {
        let validators = ctx.new_validator_factory();
        let mut binder = ctx.new_request_binder(&request);
        binder.bind(&route.rules, validators.as_ref())
    };

    let params = match bound {
        Ok(params) => params,
        Err(err) => {
            warn!(
                request_id = %request.request_id,
                operation = %route.operation,
                kind = err.kind(),
                parameter = err.parameter().unwrap_or(""),
                error = %err,
                "Request binding failed"
            );
            return Completion::BindFailed(ctx.new_bind_error_response(&err));
        }
    };

    debug!(
        request_id = %request.request_id,
        bound = params.len(),
        "Parameters bound"
    );
    let handler_request = HandlerRequest {
        raw: request,
        params,
        operation: Arc::clone(&route.operation),
    };
    match (route.handler)(ctx, &handler_request) {
        Ok(response) => Completion::Handled(response),
        Err(err) => Completion::HandlerFailed(err),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
