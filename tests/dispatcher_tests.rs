//! Tests for the dispatch shim and the per-request context lifecycle
//!
//! Every request that reaches a handler route must create exactly one
//! context and call its `done` hook exactly once, whichever way it leaves:
//! success, binding failure, handler error or handler panic.

use brrtdispatch::context::{BasicContextFactory, ContextFactory, RequestContext};
use brrtdispatch::mapper::HandleMapper;
use brrtdispatch::validator::ValidationMode;
use brrtdispatch::{
    BufferedResponse, DefaultHandleMapper, DispatchOutcome, EndpointRegistration,
    HandlerResponse, ParameterMeta, RawRequest, Router,
};
use http::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::Level;

mod common;
use common::{counted, Counters, RecordingContextFactory};
use tracing_util::TestTracing;

fn router_with(registration: EndpointRegistration) -> (Router, Arc<Counters>) {
    let factory = RecordingContextFactory::new();
    let counters = Arc::clone(&factory.counters);
    let mut mapper = DefaultHandleMapper::new();
    mapper.put_handler(registration).unwrap();
    (mapper.new_router(factory), counters)
}

#[test]
fn test_done_called_once_on_success() {
    let _tracing = TestTracing::init();
    let factory = RecordingContextFactory::new();
    let counters = Arc::clone(&factory.counters);
    let mut mapper = DefaultHandleMapper::new();
    mapper
        .put_handler(
            EndpointRegistration::new(
                Method::GET,
                "/ping",
                counted(&counters, |_| Ok(HandlerResponse::text(200, "pong").boxed())),
            )
            .operation("ping"),
        )
        .unwrap();
    let router = mapper.new_router(factory);

    let mut out = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/ping"), &mut out);

    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(out.text(), "pong");
    assert_eq!(counters.contexts(), 1);
    assert_eq!(counters.done(), 1);
    assert_eq!(counters.handler_calls(), 1);
}

#[test]
fn test_done_called_once_on_bind_failure() {
    let counters_for_handler = Arc::new(Counters::default());
    let (router, counters) = router_with(
        EndpointRegistration::new(
            Method::GET,
            "/search",
            counted(&counters_for_handler, |_| {
                Ok(HandlerResponse::text(200, "found").boxed())
            }),
        )
        .parameter(ParameterMeta::query("q").required(true)),
    );

    let mut out = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/search"), &mut out);

    assert_eq!(outcome, DispatchOutcome::BindingFailed { status: 400 });
    assert_eq!(counters.done(), 1);
    assert_eq!(counters.bind_errors(), 1);
    assert_eq!(counters_for_handler.handler_calls(), 0);

    let body = out.json().unwrap();
    assert_eq!(body["parameter"], "q");
    assert_eq!(body["status"], 400);
}

#[test]
fn test_done_called_once_on_handler_error() {
    let tracing = TestTracing::init();
    let (router, counters) = router_with(EndpointRegistration::new(
        Method::POST,
        "/fail",
        |_, _| Err(anyhow::anyhow!("database unavailable")),
    ));

    let mut out = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::POST, "/fail"), &mut out);

    assert_eq!(outcome, DispatchOutcome::HandlerFailed);
    assert_eq!(out.status, Some(500));
    assert_eq!(counters.done(), 1);
    let event = tracing
        .find(Level::ERROR, "Handler returned an error")
        .expect("handler error logged");
    assert_eq!(event.field("error"), Some("database unavailable"));
}

#[test]
fn test_done_called_once_on_handler_panic() {
    let tracing = TestTracing::init();
    let (router, counters) = router_with(EndpointRegistration::new(
        Method::GET,
        "/panic",
        |_, _| panic!("handler exploded"),
    ));

    let mut out = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/panic"), &mut out);

    assert_eq!(outcome, DispatchOutcome::HandlerPanicked);
    assert_eq!(out.status, Some(500));
    assert_eq!(out.json().unwrap(), json!({"error": "Internal Server Error"}));
    assert_eq!(counters.contexts(), 1);
    assert_eq!(counters.done(), 1);
    let event = tracing
        .find(Level::ERROR, "Handler panicked")
        .expect("panic logged");
    assert_eq!(event.field("panic_message"), Some("handler exploded"));
}

#[test]
fn test_router_still_serves_after_panic() {
    let (router, counters) = router_with(EndpointRegistration::new(
        Method::GET,
        "/flaky/{n}",
        |_, req| {
            if req.get_path_param("n") == Some("0") {
                panic!("zero");
            }
            Ok(HandlerResponse::text(200, "ok").boxed())
        },
    ));

    let mut first = BufferedResponse::new();
    router.serve(RawRequest::new(Method::GET, "/flaky/0"), &mut first);
    let mut second = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/flaky/1"), &mut second);

    assert_eq!(first.status, Some(500));
    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(counters.done(), 2);
}

#[test]
fn test_no_context_for_unknown_path_or_method() {
    let (router, counters) = router_with(EndpointRegistration::new(
        Method::GET,
        "/items/{id}",
        |_, _| Ok(HandlerResponse::text(200, "item").boxed()),
    ));

    let mut missing = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/nope"), &mut missing);
    assert_eq!(outcome, DispatchOutcome::NotFound);
    assert_eq!(missing.status, Some(404));

    let mut wrong_method = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::PUT, "/items/1"), &mut wrong_method);
    assert_eq!(outcome, DispatchOutcome::MethodNotAllowed);
    assert_eq!(wrong_method.status, Some(405));
    assert_eq!(wrong_method.header("allow"), Some("GET"));

    assert_eq!(counters.contexts(), 0);
    assert_eq!(counters.done(), 0);
}

#[test]
fn test_handler_sees_context_and_bound_params() {
    let (router, _) = router_with(
        EndpointRegistration::new(Method::GET, "/users/{user}/posts", |_, req| {
            Ok(HandlerResponse::ok_json(json!({
                "operation": req.operation.as_ref(),
                "params": req.params.to_object(),
                "raw_path": req.path,
            }))
            .boxed())
        })
        .operation("list_posts")
        .parameter(ParameterMeta::path("user"))
        .parameter(ParameterMeta::query("limit").schema(json!({"type": "integer"})))
        .parameter(ParameterMeta::query("cursor")),
    );

    let mut out = BufferedResponse::new();
    router.serve(
        RawRequest::new(Method::GET, "/users/ada%20l/posts?limit=5"),
        &mut out,
    );

    let body = out.json().unwrap();
    assert_eq!(body["operation"], "list_posts");
    assert_eq!(body["params"], json!({"user": "ada l", "limit": 5}));
    assert_eq!(body["raw_path"], "/users/ada%20l/posts");
}

#[test]
fn test_request_id_header_echoed() {
    let (router, _) = router_with(EndpointRegistration::new(Method::GET, "/id", |_, req| {
        Ok(HandlerResponse::text(200, req.request_id.to_string()).boxed())
    }));

    let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let mut out = BufferedResponse::new();
    router.serve(
        RawRequest::new(Method::GET, "/id").with_header("X-Request-Id", id),
        &mut out,
    );
    assert_eq!(out.text(), id);
    assert_eq!(out.header("x-request-id"), Some(id));
}

#[test]
fn test_closure_context_factory() {
    let lenient = BasicContextFactory::with_mode(ValidationMode::Lenient);
    let factory = move |req: &RawRequest| -> Box<dyn RequestContext> {
        if req.get_header("x-api-version") == Some("1") {
            lenient.new_context(req)
        } else {
            BasicContextFactory::default().new_context(req)
        }
    };
    let mut mapper = DefaultHandleMapper::new();
    mapper
        .put_handler(
            EndpointRegistration::new(Method::GET, "/page", |_, req| {
                Ok(HandlerResponse::ok_json(req.params.to_object()).boxed())
            })
            .parameter(ParameterMeta::query("size").schema(json!({"type": "integer", "maximum": 10}))),
        )
        .unwrap();
    let router = mapper.new_router(factory);

    let mut strict = BufferedResponse::new();
    let outcome = router.serve(RawRequest::new(Method::GET, "/page?size=50"), &mut strict);
    assert_eq!(outcome, DispatchOutcome::BindingFailed { status: 400 });

    let mut legacy = BufferedResponse::new();
    let outcome = router.serve(
        RawRequest::new(Method::GET, "/page?size=50").with_header("X-Api-Version", "1"),
        &mut legacy,
    );
    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(legacy.json().unwrap(), json!({"size": 50}));
}
