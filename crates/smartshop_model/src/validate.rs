//! Field validation.
//!
//! Validation runs before a record touches either store; a rejected record
//! is surfaced synchronously to the caller.

use crate::Record;
use thiserror::Error;

/// A caller-supplied record violates a field constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Name is empty or whitespace-only.
    #[error("name must not be blank")]
    BlankName,

    /// Price is negative, NaN, or infinite.
    #[error("price must be a finite non-negative number, got {0}")]
    InvalidPrice(f64),
}

/// Validates the caller-editable fields of a record.
pub fn validate(record: &Record) -> Result<(), ValidationError> {
    if record.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if !record.price.is_finite() || record.price < 0.0 {
        return Err(ValidationError::InvalidPrice(record.price));
    }
    Ok(())
}
