//! Validation Error Types

use alert_model::{AlertError, ParseEnumError};
use thiserror::Error;

/// A single problem found in an alert payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Missing or blank required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Value outside a closed enum
    #[error("{0}")]
    UnknownVariant(#[from] ParseEnumError),

    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Non-finite number
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    /// Text longer than the configured limit
    #[error("{field} is {len} characters, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl ValidationError {
    /// Collapse a list of problems into the engine-wide error
    pub fn into_alert_error(errors: Vec<ValidationError>) -> AlertError {
        AlertError::Validation {
            id: None,
            problems: errors.iter().map(ToString::to_string).collect(),
        }
    }
}
