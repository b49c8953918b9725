//! Tests for body consumers and media-type resolution

use brrtdispatch::consumer::{Consumer, ConsumerFactory, ConsumerRegistry, JsonConsumer, TextConsumer};
use brrtdispatch::context::BasicContextFactory;
use brrtdispatch::mapper::HandleMapper;
use brrtdispatch::validator::ValidationMode;
use brrtdispatch::{
    BufferedResponse, ConsumeError, DefaultHandleMapper, DispatchOutcome, EndpointRegistration,
    HandlerResponse, ParameterMeta, RawRequest, Router,
};
use http::Method;
use serde_json::{json, Value};
use std::sync::Arc;

fn echo_router(consumers: Arc<dyn ConsumerFactory>) -> Router {
    let mut mapper = DefaultHandleMapper::new();
    mapper
        .put_handler(
            EndpointRegistration::new(Method::POST, "/echo", |_, req| {
                let body = req.param("doc").cloned().unwrap_or(Value::Null);
                Ok(HandlerResponse::ok_json(body).boxed())
            })
            .parameter(ParameterMeta::body("doc")),
        )
        .unwrap();
    mapper.new_router(BasicContextFactory::new(consumers, ValidationMode::Strict))
}

fn post(router: &Router, content_type: &str, body: &str) -> (DispatchOutcome, BufferedResponse) {
    let mut out = BufferedResponse::new();
    let req = RawRequest::new(Method::POST, "/echo")
        .with_header("Content-Type", content_type)
        .with_body(body.to_string());
    let outcome = router.serve(req, &mut out);
    (outcome, out)
}

#[test]
fn test_default_media_types() {
    let router = echo_router(Arc::new(ConsumerRegistry::with_defaults()));

    let (_, out) = post(&router, "application/json", r#"{"a":1}"#);
    assert_eq!(out.json().unwrap(), json!({"a": 1}));

    let (_, out) = post(&router, "application/yaml", "a: 1\nb: [x, y]\n");
    assert_eq!(out.json().unwrap(), json!({"a": 1, "b": ["x", "y"]}));

    let (_, out) = post(&router, "application/x-www-form-urlencoded", "t=a&t=b&n=1");
    assert_eq!(out.json().unwrap(), json!({"t": ["a", "b"], "n": "1"}));

    let (_, out) = post(&router, "text/plain; charset=utf-8", "hello");
    assert_eq!(out.json().unwrap(), json!("hello"));
}

#[test]
fn test_structured_suffix_resolves_to_base() {
    let router = echo_router(Arc::new(ConsumerRegistry::with_defaults()));
    let (outcome, out) = post(&router, "application/vnd.api+json", r#"{"data":[]}"#);
    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(out.json().unwrap(), json!({"data": []}));
}

#[test]
fn test_wildcard_registration() {
    let mut registry = ConsumerRegistry::new();
    registry.register("text/*", TextConsumer);
    let router = echo_router(Arc::new(registry));

    let (outcome, out) = post(&router, "text/csv", "a,b");
    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(out.json().unwrap(), json!("a,b"));

    let (outcome, _) = post(&router, "application/json", "{}");
    assert_eq!(outcome, DispatchOutcome::BindingFailed { status: 415 });
}

#[test]
fn test_closure_consumer_factory() {
    let factory = |media: &str| -> Option<Arc<dyn Consumer>> {
        (media == "application/x-ndjson").then(|| Arc::new(LinesConsumer) as Arc<dyn Consumer>)
    };
    let router = echo_router(Arc::new(factory));

    let (outcome, out) = post(&router, "application/x-ndjson", "{\"n\":1}\n{\"n\":2}\n");
    assert_eq!(outcome, DispatchOutcome::Handled { status: 200 });
    assert_eq!(out.json().unwrap(), json!([{"n": 1}, {"n": 2}]));

    let (outcome, _) = post(&router, "application/json", "{}");
    assert_eq!(outcome, DispatchOutcome::BindingFailed { status: 415 });
}

#[test]
fn test_malformed_bodies() {
    assert!(matches!(
        JsonConsumer.decode("application/json", b"{"),
        Err(ConsumeError::Json(_))
    ));
    assert!(matches!(
        TextConsumer.decode("text/plain", &[0xff, 0xfe]),
        Err(ConsumeError::Utf8(_))
    ));
}

/// Newline-delimited JSON, decoded to an array.
struct LinesConsumer;

impl Consumer for LinesConsumer {
    fn decode(&self, _content_type: &str, body: &[u8]) -> Result<Value, ConsumeError> {
        let text = std::str::from_utf8(body)?;
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(ConsumeError::from))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}
