//! Request types shared by the router, binder and handlers.

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::io::Cursor;
use std::ops::Deref;
use std::sync::Arc;

use super::parse::{media_type, parse_cookies, parse_query_params, split_path_and_query};
use crate::ids::RequestId;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated name/value storage for path and query parameters.
///
/// Names use `Arc<str>`: path variable names come from the route tree and are
/// shared across requests.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header/cookie storage. Header names are lowercased.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Inbound request as seen by the dispatch core.
///
/// Hosting adapters build one per request; the router fills in `path_params`
/// after matching.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    /// Correlation id, from `X-Request-Id` when it parses, generated otherwise
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
    pub query_params: ParamVec,
    pub path_params: ParamVec,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Build a request for `target`, which may carry a query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_path_and_query(target);
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            query_params: query.map(parse_query_params).unwrap_or_default(),
            path_params: ParamVec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header. `Cookie` headers are also split into `cookies` and
    /// `X-Request-Id` replaces the generated id when it is a valid ULID.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push_header(name, value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn push_header(&mut self, name: &str, value: String) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "cookie" => self.cookies.extend(parse_cookies(&value)),
            "x-request-id" => {
                self.request_id = RequestId::resolve(Some(&value));
            }
            _ => {}
        }
        self.headers.push((Arc::from(name), value));
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: for `?limit=10&limit=20` this returns `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Media type of the body with parameters stripped, if a content type is declared.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.content_type().map(media_type).filter(|m| !m.is_empty())
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Readable stream over the body bytes.
    #[must_use]
    pub fn body_reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.body.as_slice())
    }
}

/// Parameters produced by a successful bind, in declaration order.
///
/// `None` marks a declared parameter that was absent from the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    values: SmallVec<[(Arc<str>, Option<Value>); MAX_INLINE_PARAMS]>,
}

impl BoundParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: Option<Value>) {
        self.values.retain(|(k, _)| k.as_ref() != name);
        self.values.push((Arc::from(name), value));
    }

    /// Value of a present parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether `name` was declared and bound, present or not.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(k, _)| k.as_ref() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    /// JSON object of the present parameters.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Request handed to a handler: the raw request plus its bound parameters.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub raw: RawRequest,
    pub params: BoundParams,
    /// Operation name of the matched registration
    pub operation: Arc<str>,
}

impl HandlerRequest {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Deserialize one bound parameter; `Ok(None)` when it was absent.
    pub fn param_as<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        self.params
            .get(name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(|e| anyhow::anyhow!("parameter '{name}': {e}"))
    }

    /// Deserialize every present parameter into one struct.
    pub fn params_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(self.params.to_object())?)
    }
}

impl Deref for HandlerRequest {
    type Target = RawRequest;

    fn deref(&self) -> &RawRequest {
        &self.raw
    }
}
