use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::endpoint::ParameterRule;
use crate::error::ValidationError;

/// Checks one bound value against its parameter rule.
///
/// A validator is built for a single value and used once. `None` means the
/// parameter was absent from the request; `Some(Value::String(""))` is a
/// present empty value.
pub trait ParameterValidator {
    fn validate(&self, rule: &ParameterRule) -> Result<(), ValidationError>;
}

/// Picks and builds the validator strategy for a request.
pub trait ValidatorFactory: Send + Sync {
    fn new_validator<'v>(&self, value: Option<&'v Value>) -> Box<dyn ParameterValidator + 'v>;
}

/// How strictly parameters are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Presence and schema shape
    #[default]
    Strict,
    /// Presence only
    Lenient,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationMode::Strict),
            "lenient" => Ok(ValidationMode::Lenient),
            other => Err(format!(
                "unknown validation mode '{other}' (expected 'strict' or 'lenient')"
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Strict => f.write_str("strict"),
            ValidationMode::Lenient => f.write_str("lenient"),
        }
    }
}

fn check_presence(value: Option<&Value>, rule: &ParameterRule) -> Result<(), ValidationError> {
    if value.is_none() && rule.is_required() {
        return Err(ValidationError::Missing {
            parameter: rule.name().to_string(),
        });
    }
    Ok(())
}

/// Strict strategy: presence, then the compiled schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'v> {
    value: Option<&'v Value>,
}

impl<'v> SchemaValidator<'v> {
    #[must_use]
    pub fn new(value: Option<&'v Value>) -> Self {
        Self { value }
    }
}

impl ParameterValidator for SchemaValidator<'_> {
    fn validate(&self, rule: &ParameterRule) -> Result<(), ValidationError> {
        check_presence(self.value, rule)?;
        match self.value {
            Some(value) => rule
                .check_shape(value)
                .map_err(|reason| ValidationError::Invalid {
                    parameter: rule.name().to_string(),
                    reason,
                }),
            None => Ok(()),
        }
    }
}

/// Lenient strategy: only required parameters are checked, and only for presence.
#[derive(Debug, Clone, Copy)]
pub struct PresenceValidator<'v> {
    value: Option<&'v Value>,
}

impl<'v> PresenceValidator<'v> {
    #[must_use]
    pub fn new(value: Option<&'v Value>) -> Self {
        Self { value }
    }
}

impl ParameterValidator for PresenceValidator<'_> {
    fn validate(&self, rule: &ParameterRule) -> Result<(), ValidationError> {
        check_presence(self.value, rule)
    }
}

/// Validator factory selecting a strategy by [`ValidationMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultValidatorFactory {
    pub mode: ValidationMode,
}

impl DefaultValidatorFactory {
    #[must_use]
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }
}

impl ValidatorFactory for DefaultValidatorFactory {
    fn new_validator<'v>(&self, value: Option<&'v Value>) -> Box<dyn ParameterValidator + 'v> {
        match self.mode {
            ValidationMode::Strict => Box::new(SchemaValidator::new(value)),
            ValidationMode::Lenient => Box::new(PresenceValidator::new(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ParameterMeta;
    use serde_json::json;

    fn rule(meta: ParameterMeta) -> ParameterRule {
        ParameterRule::compile(meta, "/test").unwrap()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<ValidationMode>(), Ok(ValidationMode::Strict));
        assert_eq!(" Lenient ".parse::<ValidationMode>(), Ok(ValidationMode::Lenient));
        assert!("loose".parse::<ValidationMode>().is_err());
        assert_eq!(ValidationMode::Lenient.to_string(), "lenient");
    }

    #[test]
    fn test_optional_absent_passes() {
        let r = rule(ParameterMeta::query("limit").schema(json!({"type": "integer"})));
        assert!(SchemaValidator::new(None).validate(&r).is_ok());
    }

    #[test]
    fn test_schema_violation_names_parameter() {
        let r = rule(ParameterMeta::query("limit").schema(json!({"type": "integer", "maximum": 10})));
        let v = json!(50);
        let err = SchemaValidator::new(Some(&v)).validate(&r).unwrap_err();
        assert_eq!(err.parameter(), "limit");
        assert!(matches!(err, ValidationError::Invalid { .. }));
    }

    #[test]
    fn test_lenient_ignores_shape() {
        let r = rule(ParameterMeta::query("limit").schema(json!({"type": "integer", "maximum": 10})));
        let v = json!(50);
        assert!(PresenceValidator::new(Some(&v)).validate(&r).is_ok());
    }
}
