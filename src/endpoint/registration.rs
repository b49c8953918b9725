use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::types::{ParameterLocation, ParameterMeta, ParameterStyle};
use crate::context::RequestContext;
use crate::error::RegistrationError;
use crate::request::HandlerRequest;
use crate::response::Responder;

/// Methods a router will dispatch. `CONNECT` and extension methods are refused.
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

static PATH_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_.-]*)\}$").expect("path variable regex is valid")
});

/// Handler invoked by the dispatch shim once every parameter is bound.
pub type HandlerFunc = Arc<
    dyn Fn(&mut dyn RequestContext, &HandlerRequest) -> anyhow::Result<Box<dyn Responder>>
        + Send
        + Sync,
>;

/// Handling data registered for one API endpoint and method.
#[derive(Clone)]
pub struct EndpointRegistration {
    /// Path template, e.g. `/items/{id}`
    pub path: String,
    /// GET, POST, PUT...
    pub method: Method,
    /// Name used in logs; defaults to `"{METHOD} {path}"`
    pub operation: String,
    /// Declared parameters, bound in this order
    pub parameters: Vec<ParameterMeta>,
    pub handler: HandlerFunc,
}

impl EndpointRegistration {
    pub fn new<F>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut dyn RequestContext, &HandlerRequest) -> anyhow::Result<Box<dyn Responder>>
            + Send
            + Sync
            + 'static,
    {
        let path = path.into();
        Self {
            operation: format!("{method} {path}"),
            path,
            method,
            parameters: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operation = name.into();
        self
    }

    #[must_use]
    pub fn parameter(mut self, param: ParameterMeta) -> Self {
        self.parameters.push(param);
        self
    }

    #[must_use]
    pub fn parameters(mut self, params: impl IntoIterator<Item = ParameterMeta>) -> Self {
        self.parameters.extend(params);
        self
    }
}

impl fmt::Debug for EndpointRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistration")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("operation", &self.operation)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A declared parameter with its schema compiled for validation.
#[derive(Clone)]
pub struct ParameterRule {
    pub meta: ParameterMeta,
    compiled: Option<Arc<jsonschema::Validator>>,
}

impl ParameterRule {
    /// Compile the parameter schema. `path` is only used for error context.
    pub fn compile(meta: ParameterMeta, path: &str) -> Result<Self, RegistrationError> {
        check_style(&meta, path)?;
        let compiled = match &meta.schema {
            Some(schema) => Some(Arc::new(jsonschema::validator_for(schema).map_err(
                |e| RegistrationError::InvalidSchema {
                    path: path.to_string(),
                    parameter: meta.name.clone(),
                    reason: e.to_string(),
                },
            )?)),
            None => None,
        };
        Ok(Self { meta, compiled })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[must_use]
    pub fn location(&self) -> ParameterLocation {
        self.meta.location
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.meta.required
    }

    /// Check `value` against the compiled schema; `Err` carries the first violation.
    pub fn check_shape(&self, value: &Value) -> Result<(), String> {
        match &self.compiled {
            Some(validator) => validator.validate(value).map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

fn check_style(meta: &ParameterMeta, path: &str) -> Result<(), RegistrationError> {
    let Some(style) = meta.style else {
        return Ok(());
    };
    let unsupported = |reason: String| RegistrationError::UnsupportedStyle {
        path: path.to_string(),
        parameter: meta.name.clone(),
        style,
        reason,
    };
    if !style.allowed_at(meta.location) {
        return Err(unsupported(format!(
            "not valid for {} parameters",
            meta.location
        )));
    }
    let is_object = meta.schema_type() == Some("object");
    match style {
        ParameterStyle::DeepObject if !is_object => {
            Err(unsupported("deepObject needs an object schema".to_string()))
        }
        ParameterStyle::Form | ParameterStyle::SpaceDelimited | ParameterStyle::PipeDelimited
            if is_object && meta.explode != Some(false) =>
        {
            Err(unsupported(
                "exploded objects are only read with deepObject".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

impl fmt::Debug for ParameterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRule")
            .field("meta", &self.meta)
            .field("compiled", &self.compiled.is_some())
            .finish()
    }
}

/// Parsed and validated path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// Path segments without the leading slash; variables keep their braces.
    pub segments: Vec<String>,
    /// Variable names in order of appearance
    pub variables: Vec<String>,
}

impl PathTemplate {
    /// Parse `/items/{id}` style templates.
    ///
    /// Empty segments are dropped, so `/items/` and `/items` are the same template.
    pub fn parse(path: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if !path.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut variables = Vec::new();
        let mut seen = HashSet::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(caps) = PATH_VARIABLE.captures(segment) {
                let name = caps[1].to_string();
                if !seen.insert(name.clone()) {
                    return Err(invalid(&format!("path variable '{name}' is repeated")));
                }
                variables.push(name);
            } else if segment.contains('{') || segment.contains('}') {
                return Err(invalid(&format!(
                    "segment '{segment}' must be a literal or a whole '{{name}}' variable"
                )));
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            segments,
            variables,
        })
    }

    /// Shape key with variable names erased: `/items/{id}` and `/items/{key}` collide.
    #[must_use]
    pub fn shape(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut key = String::new();
        for segment in &self.segments {
            key.push('/');
            if segment.starts_with('{') {
                key.push_str("{}");
            } else {
                key.push_str(segment);
            }
        }
        key
    }
}
