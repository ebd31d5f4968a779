//! Alert Payload Validation
//!
//! Checks externally supplied alert payloads for required fields, closed-enum
//! membership, and numeric ranges before they reach the store. Only schema
//! conformance is checked here, never domain correctness.

mod error;
mod input;
mod normalizer;
mod validator;

pub use error::ValidationError;
pub use input::AlertInput;
pub use normalizer::{normalize_list, normalize_optional, normalize_text};
pub use validator::{ValidationConfig, ValidationResult, Validator};
