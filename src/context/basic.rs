use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::core::{ContextFactory, RequestContext};
use crate::binder::{BasicRequestBinder, RequestBinder};
use crate::consumer::{ConsumerFactory, ConsumerRegistry};
use crate::error::BindError;
use crate::ids::RequestId;
use crate::request::RawRequest;
use crate::response::{HandlerResponse, Responder, ResponseWriter};
use crate::validator::{DefaultValidatorFactory, ValidationMode, ValidatorFactory};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ready-made context: default binder and validators, problem-details bind
/// errors, and a `done` hook that writes the response with its request id.
pub struct BasicContext {
    request_id: RequestId,
    method: String,
    path: String,
    started: Instant,
    consumers: Arc<dyn ConsumerFactory>,
    mode: ValidationMode,
}

impl BasicContext {
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn validation_mode(&self) -> ValidationMode {
        self.mode
    }
}

impl RequestContext for BasicContext {
    fn new_validator_factory(&self) -> Box<dyn ValidatorFactory> {
        Box::new(DefaultValidatorFactory::new(self.mode))
    }

    fn new_request_binder<'r>(&self, request: &'r RawRequest) -> Box<dyn RequestBinder + 'r> {
        Box::new(BasicRequestBinder::new(request, Arc::clone(&self.consumers)))
    }

    fn new_bind_error_response(&self, err: &BindError) -> Box<dyn Responder> {
        let mut response = HandlerResponse::problem(err);
        if let Some(body) = response.body.as_object_mut() {
            body.insert(
                "instance".to_string(),
                serde_json::Value::String(self.path.clone()),
            );
        }
        response.boxed()
    }

    fn done(self: Box<Self>, writer: &mut dyn ResponseWriter, response: Box<dyn Responder>) {
        let status = response.status();
        let request_id = self.request_id.to_string();
        let mut writer = RequestIdWriter {
            inner: writer,
            request_id: &request_id,
        };
        response.write_response(&mut writer);
        info!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            status = status,
            latency_ms = self.started.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
}

/// Adds `X-Request-Id` right after the status line and drops any duplicate.
struct RequestIdWriter<'a> {
    inner: &'a mut dyn ResponseWriter,
    request_id: &'a str,
}

impl ResponseWriter for RequestIdWriter<'_> {
    fn write_status(&mut self, status: u16) {
        self.inner.write_status(status);
        self.inner.write_header(REQUEST_ID_HEADER, self.request_id);
    }

    fn write_header(&mut self, name: &str, value: &str) {
        if !name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.inner.write_header(name, value);
        }
    }

    fn write_body(&mut self, body: &[u8]) {
        self.inner.write_body(body);
    }
}

/// Factory for [`BasicContext`].
#[derive(Clone)]
pub struct BasicContextFactory {
    consumers: Arc<dyn ConsumerFactory>,
    mode: ValidationMode,
}

impl BasicContextFactory {
    pub fn new(consumers: Arc<dyn ConsumerFactory>, mode: ValidationMode) -> Self {
        Self { consumers, mode }
    }

    /// Default consumers, given validation mode.
    #[must_use]
    pub fn with_mode(mode: ValidationMode) -> Self {
        Self::new(Arc::new(ConsumerRegistry::with_defaults()), mode)
    }
}

impl Default for BasicContextFactory {
    fn default() -> Self {
        Self::with_mode(ValidationMode::default())
    }
}

impl ContextFactory for BasicContextFactory {
    fn new_context(&self, request: &RawRequest) -> Box<dyn RequestContext> {
        debug!(
            request_id = %request.request_id,
            mode = %self.mode,
            "Request context created"
        );
        Box::new(BasicContext {
            request_id: request.request_id,
            method: request.method.to_string(),
            path: request.path.clone(),
            started: Instant::now(),
            consumers: Arc::clone(&self.consumers),
            mode: self.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ParameterLocation;
    use crate::response::BufferedResponse;
    use http::Method;

    #[test]
    fn test_done_writes_request_id_once() {
        let req = RawRequest::new(Method::GET, "/items");
        let ctx = BasicContextFactory::default().new_context(&req);
        let mut response = HandlerResponse::text(200, "ok");
        response.set_header("X-Request-Id", "other".to_string());

        let mut out = BufferedResponse::new();
        ctx.done(&mut out, response.boxed());

        let ids: Vec<_> = out
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].1, req.request_id.to_string());
        assert_eq!(out.text(), "ok");
    }

    #[test]
    fn test_bind_error_response_is_problem_details() {
        let req = RawRequest::new(Method::GET, "/items");
        let ctx = BasicContextFactory::default().new_context(&req);
        let err = BindError::MissingParameter {
            parameter: "id".into(),
            location: ParameterLocation::Query,
        };
        let response = ctx.new_bind_error_response(&err);
        assert_eq!(response.status(), 400);

        let mut out = BufferedResponse::new();
        ctx.done(&mut out, response);
        let body = out.json().unwrap();
        assert_eq!(body["parameter"], "id");
        assert_eq!(body["instance"], "/items");
        assert_eq!(out.header("content-type"), Some("application/problem+json"));
    }
}
