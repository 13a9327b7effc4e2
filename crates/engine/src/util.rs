//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and normalization so every entity enforces the same rules.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the stored text, `Some("")` clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

pub(crate) fn require_positive(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::Validation(format!("{label} must be > 0")));
    }
    Ok(())
}

pub(crate) fn require_non_negative(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::Validation(format!("{label} must be >= 0")));
    }
    Ok(())
}

/// `value + delta`, or a validation error when the result leaves `i64`.
pub(crate) fn checked_apply(value: i64, delta: i64, label: &str) -> ResultEngine<i64> {
    value
        .checked_add(delta)
        .ok_or_else(|| EngineError::Validation(format!("{label} overflows")))
}

/// Sum of `values`; overflow is a validation error like [`checked_apply`].
pub(crate) fn checked_total(
    values: impl IntoIterator<Item = i64>,
    label: &str,
) -> ResultEngine<i64> {
    values
        .into_iter()
        .try_fold(0_i64, |total, value| total.checked_add(value))
        .ok_or_else(|| EngineError::Validation(format!("{label} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_patch_keeps_clears_or_replaces() {
        let existing = Some("old".to_string());
        assert_eq!(apply_optional_text_patch(existing.clone(), None), existing);
        assert_eq!(apply_optional_text_patch(existing.clone(), Some("  ")), None);
        assert_eq!(
            apply_optional_text_patch(existing, Some(" new ")),
            Some("new".to_string())
        );
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(normalize_required_name(" Cash ", "account").unwrap(), "Cash");
        assert!(normalize_required_name("   ", "account").is_err());
    }

    #[test]
    fn overflowing_arithmetic_is_a_validation_error() {
        assert_eq!(checked_apply(10, -3, "balance").unwrap(), 7);
        assert!(matches!(
            checked_apply(i64::MAX, 1, "balance"),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(checked_total([1, 2, 3], "sales").unwrap(), 6);
        assert!(checked_total([i64::MAX, 1], "sales").is_err());
    }
}
