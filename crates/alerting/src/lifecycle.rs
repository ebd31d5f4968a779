//! Alert Lifecycle Implementation

use alert_model::{Alert, AlertError, AlertId, Clock, LifecycleAction};
use chrono::{DateTime, Utc};
use data_validator::{normalize_list, normalize_optional, normalize_text};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::AlertStore;
use tracing::{debug, info, warn};

/// Lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Re-read and retry attempts after a stale-version write (default: 3)
    pub retry_limit: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { retry_limit: 3 }
    }
}

/// State-machine executor for operator transitions
#[derive(Debug)]
pub struct AlertLifecycle {
    store: Arc<AlertStore>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
}

impl AlertLifecycle {
    /// Create a lifecycle over `store`, stamping with the store's clock
    pub fn new(store: Arc<AlertStore>, config: LifecycleConfig) -> Self {
        let clock = store.clock();
        info!("Creating alert lifecycle with config: {:?}", config);
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    /// Mark an active alert as seen by `actor`
    pub fn acknowledge(
        &self,
        id: AlertId,
        actor: &str,
        notes: Option<&str>,
    ) -> Result<Alert, AlertError> {
        let notes = normalize_optional(notes.map(str::to_string));
        self.transition(id, LifecycleAction::Acknowledge, actor, |alert, at| {
            alert.acknowledged_date = Some(at);
            alert.acknowledged_by = Some(actor.to_string());
            alert.acknowledgement_notes = notes.clone();
            Ok(())
        })
    }

    /// Close an alert with a resolution and the actions taken
    pub fn resolve(
        &self,
        id: AlertId,
        actor: &str,
        resolution: &str,
        actions_taken: Vec<String>,
    ) -> Result<Alert, AlertError> {
        let resolution = normalize_text(resolution);
        let actions = normalize_list(actions_taken);
        self.transition(id, LifecycleAction::Resolve, actor, |alert, at| {
            if resolution.is_empty() {
                return Err(AlertError::validation(Some(alert.id), "resolution is required"));
            }
            alert.resolved_date = Some(at);
            alert.resolved_by = Some(actor.to_string());
            alert.resolution = Some(resolution.clone());
            alert.actions_taken.extend(actions.iter().cloned());
            Ok(())
        })
    }

    /// Hand an alert to the next level of response
    pub fn escalate(&self, id: AlertId, actor: &str) -> Result<Alert, AlertError> {
        self.transition(id, LifecycleAction::Escalate, actor, |alert, at| {
            alert.escalated_date = Some(at);
            alert.escalated_by = Some(actor.to_string());
            Ok(())
        })
    }

    /// Close an alert as not reflecting a real condition
    pub fn mark_false_positive(&self, id: AlertId, actor: &str) -> Result<Alert, AlertError> {
        self.transition(id, LifecycleAction::MarkFalsePositive, actor, |alert, at| {
            alert.false_positive_date = Some(at);
            alert.false_positive_by = Some(actor.to_string());
            Ok(())
        })
    }

    /// Set the responsible operator on an open alert
    pub fn assign(&self, id: AlertId, actor: &str, assignee: &str) -> Result<Alert, AlertError> {
        let assignee = normalize_text(assignee);
        self.transition(id, LifecycleAction::Assign, actor, |alert, _| {
            if assignee.is_empty() {
                return Err(AlertError::validation(Some(alert.id), "assignee is required"));
            }
            alert.assigned_to = Some(assignee.clone());
            Ok(())
        })
    }

    /// Check the table, stamp fields, and commit against the version read
    ///
    /// A stale version is re-read and retried up to `retry_limit` times; every
    /// other error is returned immediately with the alert untouched.
    fn transition<F>(
        &self,
        id: AlertId,
        action: LifecycleAction,
        actor: &str,
        stamp: F,
    ) -> Result<Alert, AlertError>
    where
        F: Fn(&mut Alert, DateTime<Utc>) -> Result<(), AlertError>,
    {
        let mut attempt = 0;
        loop {
            let current = self.store.get_versioned(id)?;
            let now = self.clock.now();

            let result = self.store.apply_transition(id, current.version, |alert| {
                let next = alert
                    .status
                    .apply(action)
                    .ok_or(AlertError::InvalidTransition {
                        id,
                        action,
                        status: alert.status,
                    })?;
                let mut updated = alert.clone();
                stamp(&mut updated, alert.stamp(now))?;
                updated.status = next;
                Ok(updated)
            });

            match result {
                Ok(committed) => {
                    info!(
                        "Alert {} {} by {}: {} -> {}",
                        id,
                        action,
                        actor,
                        current.alert.status,
                        committed.alert.status
                    );
                    metrics::counter!("alert_transitions_total", "action" => action.as_str())
                        .increment(1);
                    return Ok(committed.alert);
                }
                Err(err) if err.is_retryable() && attempt < self.config.retry_limit => {
                    attempt += 1;
                    debug!("Retrying {} on alert {} (attempt {})", action, id, attempt);
                }
                Err(err) => {
                    warn!("Rejected {} on alert {} by {}: {}", action, id, actor, err);
                    metrics::counter!("alert_transitions_rejected_total", "kind" => err.kind())
                        .increment(1);
                    return Err(err);
                }
            }
        }
    }

    /// Actions currently permitted for an alert
    pub fn allowed_actions(&self, id: AlertId) -> Result<Vec<LifecycleAction>, AlertError> {
        Ok(self.store.get(id)?.status.allowed_actions())
    }
}
