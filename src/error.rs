//! Error taxonomy for registration, binding and validation.
//!
//! Registration errors surface at startup and are fatal to it. Binding and
//! validation errors are recovered by the dispatch shim and turned into a
//! bind-error response; the handler never sees them.

use http::Method;
use thiserror::Error;

use crate::endpoint::{ParameterLocation, ParameterStyle};

/// Failure while registering an endpoint with a handle mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A handler is already registered for the same method and path shape.
    #[error("handler already registered for {method} {path} (existing: {existing})")]
    Conflict {
        method: Method,
        path: String,
        existing: String,
    },
    /// The path template is not a valid `/literal/{var}` template.
    #[error("invalid path template '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    /// The method is not one of the standard verbs the router dispatches.
    #[error("unsupported method {method} for {path}")]
    UnsupportedMethod { method: Method, path: String },
    /// The parameter style cannot be read from its location or schema type.
    #[error("unsupported style {style} for parameter '{parameter}' on {path}: {reason}")]
    UnsupportedStyle {
        path: String,
        parameter: String,
        style: ParameterStyle,
        reason: String,
    },
    /// A parameter schema failed to compile.
    #[error("invalid schema for parameter '{parameter}' on {path}: {reason}")]
    InvalidSchema {
        path: String,
        parameter: String,
        reason: String,
    },
}

/// Failure of a single parameter check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required parameter '{parameter}'")]
    Missing { parameter: String },
    #[error("invalid parameter '{parameter}': {reason}")]
    Invalid { parameter: String, reason: String },
}

impl ValidationError {
    /// Name of the offending parameter.
    #[must_use]
    pub fn parameter(&self) -> &str {
        match self {
            ValidationError::Missing { parameter } | ValidationError::Invalid { parameter, .. } => {
                parameter
            }
        }
    }
}

/// Failure reported by a body [`Consumer`](crate::consumer::Consumer).
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed YAML body: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Other(String),
}

/// Failure while binding request data into parameters.
///
/// Binding is fail-fast: the first error aborts binding of the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("missing required {location} parameter '{parameter}'")]
    MissingParameter {
        parameter: String,
        location: ParameterLocation,
    },
    #[error("invalid {location} parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: String,
        location: ParameterLocation,
        reason: String,
    },
    #[error("malformed {location} parameter '{parameter}': {reason}")]
    MalformedParameter {
        parameter: String,
        location: ParameterLocation,
        reason: String,
    },
    #[error("unsupported media type '{content_type}'")]
    UnsupportedMediaType { content_type: String },
    #[error("could not decode '{content_type}' body: {reason}")]
    UndecodableBody {
        content_type: String,
        reason: String,
    },
}

impl BindError {
    /// Attach the parameter location to a validator failure.
    #[must_use]
    pub fn from_validation(err: ValidationError, location: ParameterLocation) -> Self {
        match err {
            ValidationError::Missing { parameter } => {
                BindError::MissingParameter { parameter, location }
            }
            ValidationError::Invalid { parameter, reason } => BindError::InvalidParameter {
                parameter,
                location,
                reason,
            },
        }
    }

    /// HTTP status a bind-error response should carry.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            BindError::UnsupportedMediaType { .. } => 415,
            _ => 400,
        }
    }

    /// The offending parameter, if the failure is parameter-level.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            BindError::MissingParameter { parameter, .. }
            | BindError::InvalidParameter { parameter, .. }
            | BindError::MalformedParameter { parameter, .. } => Some(parameter),
            BindError::UnsupportedMediaType { .. } | BindError::UndecodableBody { .. } => None,
        }
    }

    /// Short machine-readable kind, used as the problem `type` suffix.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            BindError::MissingParameter { .. } => "missing-parameter",
            BindError::InvalidParameter { .. } => "invalid-parameter",
            BindError::MalformedParameter { .. } => "malformed-parameter",
            BindError::UnsupportedMediaType { .. } => "unsupported-media-type",
            BindError::UndecodableBody { .. } => "undecodable-body",
        }
    }
}
