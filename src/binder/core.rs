use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use super::decode::{coerce_field, decode_deep_object, decode_param_values};
use crate::consumer::ConsumerFactory;
use crate::endpoint::{ParameterLocation, ParameterRule, ParameterStyle};
use crate::error::BindError;
use crate::request::{BoundParams, RawRequest};
use crate::validator::ValidatorFactory;

/// Media type assumed for a body sent without a `Content-Type` header.
pub const DEFAULT_BODY_MEDIA_TYPE: &str = "application/octet-stream";

/// Extracts and converts parameters from one request.
///
/// A binder is built per request by the request context and dropped once
/// binding completes.
pub trait RequestBinder {
    /// Decode the request body through the consumer for its media type.
    ///
    /// Calling it again after a successful decode is a no-op.
    fn decode_body(&mut self) -> Result<(), BindError>;

    /// Extract, convert and validate one parameter.
    ///
    /// `Ok(None)` is an absent optional parameter.
    fn bind_param(
        &mut self,
        rule: &ParameterRule,
        validators: &dyn ValidatorFactory,
    ) -> Result<Option<Value>, BindError>;

    /// Bind every rule in declaration order, stopping at the first failure.
    ///
    /// The body is decoded up front when any rule reads it, so an unsupported
    /// media type is reported before any validator runs.
    fn bind(
        &mut self,
        rules: &[ParameterRule],
        validators: &dyn ValidatorFactory,
    ) -> Result<BoundParams, BindError> {
        if rules.iter().any(|r| r.location().reads_body()) {
            self.decode_body()?;
        }
        let mut params = BoundParams::new();
        for rule in rules {
            let value = self.bind_param(rule, validators)?;
            params.insert(rule.name(), value);
        }
        Ok(params)
    }
}

#[derive(Debug)]
enum BodyState {
    Pending,
    Decoded(Option<Value>),
}

/// Binder over a [`RawRequest`] with pluggable body consumers.
pub struct BasicRequestBinder<'r> {
    request: &'r RawRequest,
    consumers: Arc<dyn ConsumerFactory>,
    body: BodyState,
}

impl<'r> BasicRequestBinder<'r> {
    pub fn new(request: &'r RawRequest, consumers: Arc<dyn ConsumerFactory>) -> Self {
        Self {
            request,
            consumers,
            body: BodyState::Pending,
        }
    }

    /// Decoded body, if it has been decoded and was non-empty.
    #[must_use]
    pub fn decoded_body(&self) -> Option<&Value> {
        match &self.body {
            BodyState::Decoded(v) => v.as_ref(),
            BodyState::Pending => None,
        }
    }

    fn raw_values(&self, rule: &ParameterRule) -> SmallVec<[&'r str; 4]> {
        let name = rule.name();
        let req = self.request;
        match rule.location() {
            ParameterLocation::Path => req.get_path_param(name).into_iter().collect(),
            ParameterLocation::Query => req
                .query_params
                .iter()
                .filter(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_str())
                .collect(),
            ParameterLocation::Header => req
                .headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
                .collect(),
            ParameterLocation::Cookie => req.get_cookie(name).into_iter().collect(),
            ParameterLocation::Body | ParameterLocation::FormData => SmallVec::new(),
        }
    }

    /// `(key, value)` pairs of `name[key]=value` query parameters.
    fn deep_object_pairs(&self, name: &str) -> SmallVec<[(&'r str, &'r str); 4]> {
        let req = self.request;
        req.query_params
            .iter()
            .filter_map(|(k, v)| {
                let key: &'r str = k;
                let key = key.strip_prefix(name)?.strip_prefix('[')?.strip_suffix(']')?;
                Some((key, v.as_str()))
            })
            .collect()
    }

    fn body_value(&mut self, rule: &ParameterRule) -> Result<Option<Value>, BindError> {
        self.decode_body()?;
        let BodyState::Decoded(body) = &self.body else {
            return Ok(None);
        };
        let meta = &rule.meta;
        match rule.location() {
            ParameterLocation::Body => Ok(body.clone()),
            _ => match body.as_ref().and_then(|b| b.get(rule.name())) {
                Some(field) => coerce_field(field.clone(), meta)
                    .map(Some)
                    .map_err(|reason| malformed(rule, reason)),
                None => Ok(None),
            },
        }
    }
}

fn malformed(rule: &ParameterRule, reason: String) -> BindError {
    BindError::MalformedParameter {
        parameter: rule.name().to_string(),
        location: rule.location(),
        reason,
    }
}

impl RequestBinder for BasicRequestBinder<'_> {
    fn decode_body(&mut self) -> Result<(), BindError> {
        if matches!(self.body, BodyState::Decoded(_)) {
            return Ok(());
        }

        let req = self.request;
        if !req.has_body() && req.content_type().is_none() {
            self.body = BodyState::Decoded(None);
            return Ok(());
        }

        let content_type = req.content_type().unwrap_or(DEFAULT_BODY_MEDIA_TYPE);
        let media = req
            .media_type()
            .unwrap_or_else(|| DEFAULT_BODY_MEDIA_TYPE.to_string());
        let consumer = self.consumers.consumer_for(&media).ok_or_else(|| {
            BindError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            }
        })?;

        let decoded = if req.has_body() {
            let value = consumer
                .decode(content_type, &req.body)
                .map_err(|e| BindError::UndecodableBody {
                    content_type: content_type.to_string(),
                    reason: e.to_string(),
                })?;
            Some(value)
        } else {
            None
        };
        debug!(
            request_id = %req.request_id,
            media_type = %media,
            body_bytes = req.body.len(),
            "Request body decoded"
        );
        self.body = BodyState::Decoded(decoded);
        Ok(())
    }

    fn bind_param(
        &mut self,
        rule: &ParameterRule,
        validators: &dyn ValidatorFactory,
    ) -> Result<Option<Value>, BindError> {
        let value = if rule.location().reads_body() {
            self.body_value(rule)?
        } else if rule.meta.style == Some(ParameterStyle::DeepObject) {
            let pairs = self.deep_object_pairs(rule.name());
            if pairs.is_empty() {
                None
            } else {
                Some(
                    decode_deep_object(&pairs, &rule.meta)
                        .map_err(|reason| malformed(rule, reason))?,
                )
            }
        } else {
            let raw = self.raw_values(rule);
            if raw.is_empty() {
                None
            } else {
                Some(
                    decode_param_values(&raw, &rule.meta)
                        .map_err(|reason| malformed(rule, reason))?,
                )
            }
        };

        validators
            .new_validator(value.as_ref())
            .validate(rule)
            .map_err(|e| BindError::from_validation(e, rule.location()))?;

        debug!(
            request_id = %self.request.request_id,
            parameter = %rule.name(),
            location = %rule.location(),
            present = value.is_some(),
            "Parameter bound"
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::ConsumerRegistry;
    use crate::endpoint::ParameterMeta;
    use crate::validator::DefaultValidatorFactory;
    use http::Method;
    use serde_json::json;

    fn consumers() -> Arc<dyn ConsumerFactory> {
        Arc::new(ConsumerRegistry::with_defaults())
    }

    fn rule(meta: ParameterMeta) -> ParameterRule {
        ParameterRule::compile(meta, "/t").unwrap()
    }

    #[test]
    fn test_repeated_header_values_form_array() {
        let req = RawRequest::new(Method::GET, "/t")
            .with_header("X-Tag", "a")
            .with_header("x-tag", "b");
        let mut binder = BasicRequestBinder::new(&req, consumers());
        let r = rule(ParameterMeta::header("X-Tag").schema(json!({"type": "array"})));
        let v = binder
            .bind_param(&r, &DefaultValidatorFactory::default())
            .unwrap();
        assert_eq!(v, Some(json!(["a", "b"])));
    }

    #[test]
    fn test_empty_body_with_content_type_binds_absent() {
        let req = RawRequest::new(Method::POST, "/t").with_header("Content-Type", "application/json");
        let mut binder = BasicRequestBinder::new(&req, consumers());
        binder.decode_body().unwrap();
        assert!(binder.decoded_body().is_none());
    }

    #[test]
    fn test_body_without_content_type_is_octet_stream() {
        let req = RawRequest::new(Method::POST, "/t").with_body("abc");
        let mut binder = BasicRequestBinder::new(&req, consumers());
        assert_eq!(
            binder.decode_body(),
            Err(BindError::UnsupportedMediaType {
                content_type: DEFAULT_BODY_MEDIA_TYPE.to_string()
            })
        );
    }
}
