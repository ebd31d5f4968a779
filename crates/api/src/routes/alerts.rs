//! Alert Routes

use alert_model::{Alert, AlertError, AlertId, LifecycleAction};
use alerting::{BulkAction, BulkOutcome};
use analytics::paginate;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use data_validator::AlertInput;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{AlertPath, AlertQueryParams, Operator, ValidJson, ValidQuery};
use crate::error::ApiError;
use crate::AppState;

/// Response for the alert list endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertListResponse {
    pub data: Vec<Alert>,
    /// Matching alerts before pagination
    pub count: usize,
    pub snapshot_version: u64,
}

/// Single alert with its concurrency version and the actions it allows
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetail {
    pub alert: Alert,
    pub version: u64,
    pub allowed_actions: Vec<LifecycleAction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AcknowledgeRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveRequest {
    pub resolution: String,
    pub actions_taken: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee: String,
}

/// Bulk body: `{"ids": [..], "action": "resolve", "resolution": ".."}`
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub ids: Vec<AlertId>,
    #[serde(flatten)]
    pub action: BulkAction,
}

/// Ingest a new alert
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<AlertInput>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    let alert = state.store.ingest(input)?;
    metrics::counter!("alerts_ingested_total", "severity" => alert.severity.as_str()).increment(1);
    Ok((StatusCode::CREATED, Json(alert)))
}

/// Filter, sort and page alerts
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<AlertQueryParams>,
) -> Result<Json<AlertListResponse>, ApiError> {
    let criteria = params.criteria()?;
    let snapshot = state.store.snapshot()?;
    let matched = state.queries.get_or_compute(&snapshot, &criteria);

    Ok(Json(AlertListResponse {
        data: paginate(&matched, params.page()).to_vec(),
        count: matched.len(),
        snapshot_version: snapshot.version(),
    }))
}

pub async fn get_alert(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
) -> Result<Json<AlertDetail>, ApiError> {
    let versioned = state.store.get_versioned(id)?;
    let allowed_actions = versioned.alert.status.allowed_actions();
    Ok(Json(AlertDetail {
        alert: versioned.alert,
        version: versioned.version,
        allowed_actions,
    }))
}

pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
    Operator(actor): Operator,
    body: Bytes,
) -> Result<Json<Alert>, ApiError> {
    let request: AcknowledgeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AcknowledgeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AlertError::validation(Some(id), e.to_string()))?
    };
    let alert = state
        .lifecycle
        .acknowledge(id, &actor, request.notes.as_deref())?;
    Ok(Json(alert))
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
    Operator(actor): Operator,
    ValidJson(request): ValidJson<ResolveRequest>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state.lifecycle.resolve(
        id,
        &actor,
        &request.resolution,
        request.actions_taken,
    )?;
    Ok(Json(alert))
}

pub async fn escalate(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
    Operator(actor): Operator,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.lifecycle.escalate(id, &actor)?))
}

pub async fn mark_false_positive(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
    Operator(actor): Operator,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.lifecycle.mark_false_positive(id, &actor)?))
}

pub async fn assign(
    State(state): State<Arc<AppState>>,
    AlertPath(id): AlertPath,
    Operator(actor): Operator,
    ValidJson(request): ValidJson<AssignRequest>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.lifecycle.assign(id, &actor, &request.assignee)?))
}

/// Apply one action to many alerts; per-id failures are reported, not fatal
///
/// The batch is not cut short by the request timeout; its size is capped by
/// `bulk.max_ids` instead.
pub async fn bulk(
    State(state): State<Arc<AppState>>,
    Operator(actor): Operator,
    ValidJson(request): ValidJson<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    if request.ids.len() > state.max_bulk_ids {
        return Err(AlertError::validation(
            None,
            format!(
                "bulk request names {} ids, at most {} allowed",
                request.ids.len(),
                state.max_bulk_ids
            ),
        )
        .into());
    }
    info!(
        "Bulk {} requested by {} for {} alert(s)",
        request.action.lifecycle_action(),
        actor,
        request.ids.len()
    );
    let outcome = state
        .bulk
        .apply_bulk_parallel(&request.ids, request.action, &actor)
        .await;
    Ok(Json(outcome))
}
