//! Alert Engine Error Taxonomy

use crate::alert::AlertId;
use crate::enums::{AlertStatus, LifecycleAction};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the alert engine
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertError {
    /// Unknown alert id
    #[error("alert {id} not found")]
    NotFound { id: AlertId },

    /// Missing or malformed field, or a value outside a closed enum
    #[error("validation failed: {}", .problems.join("; "))]
    Validation {
        id: Option<AlertId>,
        problems: Vec<String>,
    },

    /// The alert's status forbids the requested action
    #[error("cannot {action} alert {id} while it is {status}")]
    InvalidTransition {
        id: AlertId,
        action: LifecycleAction,
        status: AlertStatus,
    },

    /// Write attempted against a stale version
    #[error("alert {id} changed concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        id: AlertId,
        expected: u64,
        actual: u64,
    },

    /// Bulk action finished with per-id failures
    #[error("bulk {action} failed for {} alert(s)", .failed.len())]
    PartialBulkFailure {
        action: LifecycleAction,
        succeeded: Vec<AlertId>,
        failed: Vec<BulkFailure>,
    },

    /// Backing store fault
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl AlertError {
    pub fn validation(id: Option<AlertId>, problem: impl Into<String>) -> Self {
        AlertError::Validation {
            id,
            problems: vec![problem.into()],
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AlertError::Storage {
            message: message.into(),
        }
    }

    /// Stable machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            AlertError::NotFound { .. } => "not_found",
            AlertError::Validation { .. } => "validation",
            AlertError::InvalidTransition { .. } => "invalid_transition",
            AlertError::ConcurrentModification { .. } => "concurrent_modification",
            AlertError::PartialBulkFailure { .. } => "partial_bulk_failure",
            AlertError::Storage { .. } => "storage",
        }
    }

    /// Only a stale-version write is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, AlertError::ConcurrentModification { .. })
    }
}

/// One id that a bulk action could not transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: AlertId,
    pub error: AlertError,
}
