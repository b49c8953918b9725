//! Tests for the parameter validators and their factory

use brrtdispatch::endpoint::ParameterRule;
use brrtdispatch::factory::{new_validator, new_validator_factory};
use brrtdispatch::validator::{
    DefaultValidatorFactory, ParameterValidator, PresenceValidator, SchemaValidator, ValidationMode,
    ValidatorFactory,
};
use brrtdispatch::{ParameterMeta, ValidationError};
use serde_json::json;

fn rule(meta: ParameterMeta) -> ParameterRule {
    ParameterRule::compile(meta, "/v").unwrap()
}

#[test]
fn test_required_absent_vs_present_empty() {
    let required = rule(ParameterMeta::query("q").required(true));
    let empty = json!("");

    assert!(new_validator(Some(&empty)).validate(&required).is_ok());
    assert_eq!(
        new_validator(None).validate(&required),
        Err(ValidationError::Missing {
            parameter: "q".into()
        })
    );
}

#[test]
fn test_optional_absent_passes() {
    let optional = rule(ParameterMeta::query("q").schema(json!({"type": "integer"})));
    assert!(new_validator(None).validate(&optional).is_ok());
}

#[test]
fn test_schema_constraints() {
    let limit = rule(ParameterMeta::query("limit").schema(json!({
        "type": "integer",
        "minimum": 1,
        "maximum": 50
    })));

    assert!(SchemaValidator::new(Some(&json!(10))).validate(&limit).is_ok());
    let err = SchemaValidator::new(Some(&json!(0)))
        .validate(&limit)
        .unwrap_err();
    assert_eq!(err.parameter(), "limit");
    assert!(matches!(err, ValidationError::Invalid { .. }));
    assert!(SchemaValidator::new(Some(&json!("ten")))
        .validate(&limit)
        .is_err());
}

#[test]
fn test_enum_and_pattern() {
    let sort = rule(ParameterMeta::query("sort").schema(json!({"enum": ["asc", "desc"]})));
    assert!(new_validator(Some(&json!("asc"))).validate(&sort).is_ok());
    assert!(new_validator(Some(&json!("up"))).validate(&sort).is_err());

    let sku = rule(ParameterMeta::path("sku").schema(json!({"type": "string", "pattern": "^[A-Z]{3}-[0-9]+$"})));
    assert!(new_validator(Some(&json!("ABC-12"))).validate(&sku).is_ok());
    assert!(new_validator(Some(&json!("abc"))).validate(&sku).is_err());
}

#[test]
fn test_presence_validator_ignores_schema() {
    let limit = rule(
        ParameterMeta::query("limit")
            .required(true)
            .schema(json!({"type": "integer", "maximum": 5})),
    );
    assert!(PresenceValidator::new(Some(&json!(500))).validate(&limit).is_ok());
    assert!(PresenceValidator::new(None).validate(&limit).is_err());
}

#[test]
fn test_factory_modes() {
    let limit = rule(ParameterMeta::query("limit").schema(json!({"maximum": 5})));
    let big = json!(500);

    assert!(new_validator_factory()
        .new_validator(Some(&big))
        .validate(&limit)
        .is_err());
    assert!(DefaultValidatorFactory::new(ValidationMode::Lenient)
        .new_validator(Some(&big))
        .validate(&limit)
        .is_ok());
}

#[test]
fn test_validation_mode_parsing() {
    assert_eq!("strict".parse::<ValidationMode>(), Ok(ValidationMode::Strict));
    assert_eq!("LENIENT".parse::<ValidationMode>(), Ok(ValidationMode::Lenient));
    assert!("loose".parse::<ValidationMode>().is_err());
    assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    assert_eq!(ValidationMode::Lenient.to_string(), "lenient");
}
