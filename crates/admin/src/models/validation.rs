//! Field-level validation helpers shared by the form types.

use thiserror::Error;

/// A single invalid form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    /// Name of the offending form field.
    pub field: &'static str,
    /// The constraint that was violated, phrased for the end user.
    pub reason: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, message));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field; blank input becomes `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Reject text longer than `max` characters.
pub(crate) fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}
