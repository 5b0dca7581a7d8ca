//! Runtime schema checks at trust boundaries.
//!
//! DTOs derive `validator::Validate`; outgoing payloads are checked with
//! [`ensure_valid`] before a request is built, and untrusted input (form
//! submissions, response bodies a caller wants checked) goes through
//! [`parse_validated`]. Extra fields are ignored unless the type opts into
//! `#[serde(deny_unknown_fields)]`.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

pub fn ensure_valid<T: Validate + ?Sized>(value: &T) -> Result<(), ApiError> {
    value.validate().map_err(ApiError::Validation)
}

/// Deserialize JSON bytes and run the type's constraints.
pub fn parse_validated<T: DeserializeOwned + Validate>(bytes: &[u8]) -> Result<T, ApiError> {
    let value: T = serde_json::from_slice(bytes).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    ensure_valid(&value)?;
    Ok(value)
}

/// Build a struct-level error with a fixed message.
pub(crate) fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Rejects strings made only of whitespace; length rules alone let "   " through.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "Value must not be blank"));
    }
    Ok(())
}

/// Codes are upper-case ASCII letters, digits, `-` and `_`.
pub(crate) fn code_format(value: &str) -> Result<(), ValidationError> {
    let ok = value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !ok {
        return Err(rule_error(
            "code_format",
            "Code may only contain A-Z, 0-9, '-' and '_'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Form {
        #[validate(length(min = 2))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct StrictForm {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn accepts_extra_fields_by_default() {
        let form: Form = parse_validated(br#"{"name":"Math","extra":1}"#).unwrap();
        assert_eq!(form.name, "Math");
    }

    #[test]
    fn strict_types_reject_extra_fields() {
        let err = parse_validated::<StrictForm>(br#"{"name":"Math","extra":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = parse_validated::<Form>(br#"{}"#).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn constraint_violation_is_a_validation_error() {
        let err = parse_validated::<Form>(br#"{"name":""}"#).unwrap_err();
        match err {
            ApiError::Validation(errors) => assert!(errors.field_errors().contains_key("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn custom_rules() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank(" a ").is_ok());
        assert!(code_format("ENG-101").is_ok());
        assert!(code_format("eng 101").is_err());
    }
}
