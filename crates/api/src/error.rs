//! HTTP error mapping

use alert_model::AlertError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Alert(#[from] AlertError),

    /// Query string or path value that does not parse
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
}

impl ApiError {
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Alert(e) => match e {
                AlertError::NotFound { .. } => StatusCode::NOT_FOUND,
                AlertError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AlertError::InvalidTransition { .. } => StatusCode::CONFLICT,
                AlertError::ConcurrentModification { .. } => StatusCode::CONFLICT,
                AlertError::PartialBulkFailure { .. } => StatusCode::MULTI_STATUS,
                AlertError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Alert(e) => e.kind(),
            ApiError::InvalidParameter { .. } => "validation",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::Alert(e) => e.is_retryable(),
            ApiError::InvalidParameter { .. } => false,
        }
    }
}

/// Wire shape of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        metrics::counter!("api_errors_total", "kind" => self.kind()).increment(1);

        let body = ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.retryable(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{AlertId, AlertStatus, LifecycleAction};

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = AlertError::NotFound { id: AlertId(1) }.into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid: ApiError = AlertError::InvalidTransition {
            id: AlertId(1),
            action: LifecycleAction::Acknowledge,
            status: AlertStatus::Resolved,
        }
        .into();
        assert_eq!(invalid.status(), StatusCode::CONFLICT);
        assert!(!invalid.retryable());

        let stale: ApiError = AlertError::ConcurrentModification {
            id: AlertId(1),
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert!(stale.retryable());

        assert_eq!(
            ApiError::invalid("window", "bad").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(AlertError::storage("poisoned")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
