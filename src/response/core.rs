use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::BindError;
use crate::request::HeaderVec;

/// Canonical reason phrase for `status`, `"Unknown"` for unregistered codes.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown"),
    }
}

/// Sink a [`Responder`] writes itself into.
///
/// Implemented by hosting adapters over their native response type and by
/// [`BufferedResponse`] for in-memory use.
pub trait ResponseWriter {
    fn write_status(&mut self, status: u16);
    fn write_header(&mut self, name: &str, value: &str);
    fn write_body(&mut self, body: &[u8]);
}

/// Opaque response produced by handlers and bind-error paths.
///
/// Consumed exactly once, by the request context's `done` hook.
pub trait Responder: Send {
    /// Status the response will be written with; used for logging.
    fn status(&self) -> u16;

    fn write_response(self: Box<Self>, writer: &mut dyn ResponseWriter);
}

/// Default responder: status, headers and a JSON (or plain text) body.
///
/// A `Value::String` body is written as `text/plain`, anything else as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a `content-type: application/json` header.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn ok_json(body: Value) -> Self {
        Self::json(200, body)
    }

    /// JSON body serialized from any `Serialize` value.
    pub fn ok<T: Serialize>(body: &T) -> anyhow::Result<Self> {
        Ok(Self::json(200, serde_json::to_value(body)?))
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self {
            status,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    /// RFC 7807 problem details for a binding failure.
    #[must_use]
    pub fn problem(err: &BindError) -> Self {
        let status = err.status_code();
        let mut body = json!({
            "type": format!("about:blank#{}", err.kind()),
            "title": status_reason(status),
            "status": status,
            "detail": err.to_string(),
        });
        if let (Some(parameter), Some(obj)) = (err.parameter(), body.as_object_mut()) {
            obj.insert("parameter".to_string(), Value::String(parameter.to_string()));
        }
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("content-type"),
            "application/problem+json".to_string(),
        ));
        Self {
            status,
            headers,
            body,
        }
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn boxed(self) -> Box<dyn Responder> {
        Box::new(self)
    }
}

impl Responder for HandlerResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn write_response(self: Box<Self>, writer: &mut dyn ResponseWriter) {
        let HandlerResponse {
            status,
            headers,
            body,
        } = *self;
        writer.write_status(status);
        let declared = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.contains("json"));
        for (name, value) in &headers {
            writer.write_header(name, value);
        }
        match body {
            Value::Null if status == 204 => {}
            // String bodies go out verbatim unless the declared type is JSON
            Value::String(s) if declared != Some(true) => {
                if declared.is_none() {
                    writer.write_header("content-type", "text/plain");
                }
                writer.write_body(s.as_bytes());
            }
            other => {
                if declared.is_none() {
                    writer.write_header("content-type", "application/json");
                }
                writer.write_body(other.to_string().as_bytes());
            }
        }
    }
}

/// In-memory [`ResponseWriter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedResponse {
    /// `None` until a status is written
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl BufferedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Written status, 200 when a responder wrote none.
    #[must_use]
    pub fn status_or_default(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseWriter for BufferedResponse {
    fn write_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn write_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write_body(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ParameterLocation;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(415), "Unsupported Media Type");
        assert_eq!(status_reason(418), "I'm a teapot");
        assert_eq!(status_reason(502), "Bad Gateway");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_json_response_written_to_buffer() {
        let mut out = BufferedResponse::new();
        HandlerResponse::ok_json(json!({"id": 42}))
            .boxed()
            .write_response(&mut out);
        assert_eq!(out.status, Some(200));
        assert_eq!(out.header("Content-Type"), Some("application/json"));
        assert_eq!(out.json().unwrap(), json!({"id": 42}));
    }

    #[test]
    fn test_text_body_defaults_to_plain() {
        let mut out = BufferedResponse::new();
        HandlerResponse::new(201, HeaderVec::new(), Value::String("made".into()))
            .boxed()
            .write_response(&mut out);
        assert_eq!(out.status_or_default(), 201);
        assert_eq!(out.header("content-type"), Some("text/plain"));
        assert_eq!(out.text(), "made");
    }

    #[test]
    fn test_problem_names_parameter() {
        let err = BindError::MissingParameter {
            parameter: "id".into(),
            location: ParameterLocation::Path,
        };
        let resp = HandlerResponse::problem(&err);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["parameter"], "id");
        assert_eq!(resp.get_header("content-type"), Some("application/problem+json"));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut resp = HandlerResponse::ok_json(Value::Null);
        resp.set_header("Content-Type", "application/vnd.item+json".into());
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.get_header("content-type"), Some("application/vnd.item+json"));
    }
}
