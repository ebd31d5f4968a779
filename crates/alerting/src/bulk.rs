//! Bulk Transition Coordinator

use alert_model::{Alert, AlertError, AlertId, BulkFailure, LifecycleAction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::lifecycle::AlertLifecycle;

/// One transition, with its payload, to apply to every selected alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    Acknowledge {
        #[serde(default)]
        notes: Option<String>,
    },
    Resolve {
        resolution: String,
        #[serde(default, rename = "actionsTaken")]
        actions_taken: Vec<String>,
    },
    Escalate,
    MarkFalsePositive,
    Assign {
        assignee: String,
    },
}

impl BulkAction {
    pub fn lifecycle_action(&self) -> LifecycleAction {
        match self {
            BulkAction::Acknowledge { .. } => LifecycleAction::Acknowledge,
            BulkAction::Resolve { .. } => LifecycleAction::Resolve,
            BulkAction::Escalate => LifecycleAction::Escalate,
            BulkAction::MarkFalsePositive => LifecycleAction::MarkFalsePositive,
            BulkAction::Assign { .. } => LifecycleAction::Assign,
        }
    }

    fn apply(
        &self,
        lifecycle: &AlertLifecycle,
        id: AlertId,
        actor: &str,
    ) -> Result<Alert, AlertError> {
        match self {
            BulkAction::Acknowledge { notes } => lifecycle.acknowledge(id, actor, notes.as_deref()),
            BulkAction::Resolve {
                resolution,
                actions_taken,
            } => lifecycle.resolve(id, actor, resolution, actions_taken.clone()),
            BulkAction::Escalate => lifecycle.escalate(id, actor),
            BulkAction::MarkFalsePositive => lifecycle.mark_false_positive(id, actor),
            BulkAction::Assign { assignee } => lifecycle.assign(id, actor, assignee),
        }
    }
}

/// Per-id result of a bulk action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub action: LifecycleAction,
    pub succeeded: Vec<AlertId>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    fn new(action: LifecycleAction) -> Self {
        Self {
            action,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn record(&mut self, id: AlertId, result: Result<Alert, AlertError>) {
        match result {
            Ok(_) => self.succeeded.push(id),
            Err(error) => self.failed.push(BulkFailure { id, error }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn per-id failures into `PartialBulkFailure`
    pub fn into_result(self) -> Result<Vec<AlertId>, AlertError> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(AlertError::PartialBulkFailure {
                action: self.action,
                succeeded: self.succeeded,
                failed: self.failed,
            })
        }
    }
}

/// Blocking tasks one parallel batch may occupy at once unless configured
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Applies one action to many alerts, each independently
#[derive(Debug, Clone)]
pub struct BulkActionCoordinator {
    lifecycle: Arc<AlertLifecycle>,
    max_in_flight: usize,
}

impl BulkActionCoordinator {
    pub fn new(lifecycle: Arc<AlertLifecycle>) -> Self {
        Self {
            lifecycle,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Limit how many transitions of one parallel batch run concurrently
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Apply `action` to each id in order; failures are recorded, never fatal
    pub fn apply_bulk(&self, ids: &[AlertId], action: &BulkAction, actor: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::new(action.lifecycle_action());
        for id in dedup(ids) {
            outcome.record(id, action.apply(&self.lifecycle, id, actor));
        }
        log_outcome(&outcome);
        outcome
    }

    /// Fan the batch out across at most `max_in_flight` blocking tasks
    ///
    /// Each id still commits atomically on its own; only the reported order is
    /// restored to the request order. The batch runs on a spawned task, so it
    /// finishes every id even when the returned future is dropped.
    pub async fn apply_bulk_parallel(
        &self,
        ids: &[AlertId],
        action: BulkAction,
        actor: &str,
    ) -> BulkOutcome {
        let lifecycle_action = action.lifecycle_action();
        let ids = dedup(ids);
        let batch = self.clone();
        let actor = actor.to_string();
        let driver = tokio::spawn({
            let ids = ids.clone();
            async move { batch.run_parallel(ids, action, actor).await }
        });

        match driver.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Bulk {} batch failed to complete: {}", lifecycle_action, e);
                let mut outcome = BulkOutcome::new(lifecycle_action);
                for id in ids {
                    let error = AlertError::storage(format!("bulk batch for alert {} aborted", id));
                    outcome.record(id, Err(error));
                }
                outcome
            }
        }
    }

    async fn run_parallel(
        self,
        ids: Vec<AlertId>,
        action: BulkAction,
        actor: String,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::new(action.lifecycle_action());
        let action = Arc::new(action);
        let actor: Arc<str> = actor.into();
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (position, id) in ids.iter().copied().enumerate() {
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Bulk {} stopped before alert {}: {}", outcome.action, id, e);
                    break;
                }
            };
            let lifecycle = Arc::clone(&self.lifecycle);
            let action = Arc::clone(&action);
            let actor = Arc::clone(&actor);
            tasks.spawn_blocking(move || {
                let result = action.apply(&lifecycle, id, &actor);
                drop(permit);
                (position, result)
            });
        }

        let mut results: Vec<Option<Result<Alert, AlertError>>> = vec![None; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => results[position] = Some(result),
                Err(e) => warn!("Bulk task failed to complete: {}", e),
            }
        }

        for (id, result) in ids.into_iter().zip(results) {
            let result = result.unwrap_or_else(|| {
                Err(AlertError::storage(format!("transition task for alert {} aborted", id)))
            });
            outcome.record(id, result);
        }
        log_outcome(&outcome);
        outcome
    }
}

/// Drop repeated ids, keeping first-occurrence order
fn dedup(ids: &[AlertId]) -> Vec<AlertId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn log_outcome(outcome: &BulkOutcome) {
    if outcome.failed.is_empty() {
        info!(
            "Bulk {} applied to {} alert(s)",
            outcome.action,
            outcome.succeeded.len()
        );
    } else {
        warn!(
            "Bulk {}: {} succeeded, {} failed",
            outcome.action,
            outcome.succeeded.len(),
            outcome.failed.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleConfig;
    use alert_model::{AlertStatus, Clock};
    use chrono::{DateTime, TimeZone, Utc};
    use data_validator::AlertInput;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::AlertStore;

    fn coordinator() -> BulkActionCoordinator {
        let store = Arc::new(AlertStore::new());
        BulkActionCoordinator::new(Arc::new(AlertLifecycle::new(
            store,
            LifecycleConfig::default(),
        )))
    }

    fn ingest(coordinator: &BulkActionCoordinator, title: &str) -> AlertId {
        coordinator
            .lifecycle
            .store()
            .ingest(AlertInput::new(title, "msg", "Dock", "low", "operational", "manual"))
            .unwrap()
            .id
    }

    #[test]
    fn test_partial_failure_continues() {
        let bulk = coordinator();
        let x = ingest(&bulk, "x");
        let y = ingest(&bulk, "y");
        let z = ingest(&bulk, "z");
        bulk.lifecycle.resolve(y, "op", "done", vec![]).unwrap();

        let outcome = bulk.apply_bulk(&[x, y, z], &BulkAction::Acknowledge { notes: None }, "op");

        assert_eq!(outcome.succeeded, vec![x, z]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, y);
        assert!(matches!(
            outcome.failed[0].error,
            AlertError::InvalidTransition {
                status: AlertStatus::Resolved,
                ..
            }
        ));

        let store = bulk.lifecycle.store();
        assert_eq!(store.get(x).unwrap().status, AlertStatus::Acknowledged);
        assert_eq!(store.get(y).unwrap().status, AlertStatus::Resolved);
        assert_eq!(store.get(z).unwrap().status, AlertStatus::Acknowledged);
    }

    #[test]
    fn test_unknown_and_invalid_payload_are_reported() {
        let bulk = coordinator();
        let x = ingest(&bulk, "x");
        let missing = AlertId(404);

        let outcome = bulk.apply_bulk(
            &[missing, x],
            &BulkAction::Resolve {
                resolution: "".to_string(),
                actions_taken: vec![],
            },
            "op",
        );

        assert!(outcome.succeeded.is_empty());
        assert_eq!(
            outcome.failed[0].error,
            AlertError::NotFound { id: missing }
        );
        assert!(matches!(outcome.failed[1].error, AlertError::Validation { .. }));
        assert_eq!(bulk.lifecycle.store().get(x).unwrap().status, AlertStatus::Active);
    }

    #[test]
    fn test_duplicate_ids_processed_once() {
        let bulk = coordinator();
        let x = ingest(&bulk, "x");

        let outcome = bulk.apply_bulk(&[x, x], &BulkAction::Escalate, "op");
        assert_eq!(outcome.succeeded, vec![x]);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_into_result() {
        let bulk = coordinator();
        let x = ingest(&bulk, "x");
        let ok = bulk.apply_bulk(&[x], &BulkAction::MarkFalsePositive, "op");
        assert_eq!(ok.into_result(), Ok(vec![x]));

        let again = bulk.apply_bulk(&[x], &BulkAction::MarkFalsePositive, "op");
        assert!(matches!(
            again.into_result(),
            Err(AlertError::PartialBulkFailure { .. })
        ));
    }

    #[test]
    fn test_action_wire_format() {
        let action: BulkAction = serde_json::from_str(
            r#"{"action":"resolve","resolution":"reset breaker","actionsTaken":["inspected panel"]}"#,
        )
        .unwrap();
        assert_eq!(action.lifecycle_action(), LifecycleAction::Resolve);

        let action: BulkAction = serde_json::from_str(r#"{"action":"mark_false_positive"}"#).unwrap();
        assert_eq!(action, BulkAction::MarkFalsePositive);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential_semantics() {
        let bulk = coordinator();
        let ids: Vec<_> = (0..6).map(|i| ingest(&bulk, &format!("a{}", i))).collect();
        bulk.lifecycle.mark_false_positive(ids[2], "op").unwrap();

        let outcome = bulk
            .apply_bulk_parallel(&ids, BulkAction::Escalate, "op")
            .await;

        let expected: Vec<_> = ids.iter().copied().filter(|id| *id != ids[2]).collect();
        assert_eq!(outcome.succeeded, expected);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, ids[2]);
    }

    /// Holds each caller briefly and records the peak overlap
    #[derive(Debug)]
    struct OverlapClock {
        at: DateTime<Utc>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Clock for OverlapClock {
        fn now(&self) -> DateTime<Utc> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.at
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_batch_respects_in_flight_limit() {
        let clock = Arc::new(OverlapClock {
            at: Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap(),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let store = Arc::new(AlertStore::with_clock(clock.clone()));
        let bulk = BulkActionCoordinator::new(Arc::new(AlertLifecycle::new(
            store,
            LifecycleConfig::default(),
        )))
        .with_max_in_flight(2);
        let ids: Vec<_> = (0..12).map(|i| ingest(&bulk, &format!("a{}", i))).collect();

        let outcome = bulk
            .apply_bulk_parallel(&ids, BulkAction::Escalate, "op")
            .await;

        assert_eq!(outcome.succeeded, ids);
        let peak = clock.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "{} transitions overlapped", peak);
    }

    #[test]
    fn test_in_flight_limit_is_at_least_one() {
        let bulk = coordinator().with_max_in_flight(0);
        assert_eq!(bulk.max_in_flight, 1);
        assert_eq!(coordinator().max_in_flight, DEFAULT_MAX_IN_FLIGHT);
    }

    #[tokio::test]
    async fn test_parallel_batch_finishes_after_caller_gives_up() {
        let bulk = coordinator().with_max_in_flight(1);
        let ids: Vec<_> = (0..5).map(|i| ingest(&bulk, &format!("a{}", i))).collect();

        let gave_up = tokio::select! {
            biased;
            _ = bulk.apply_bulk_parallel(&ids, BulkAction::Escalate, "op") => false,
            _ = std::future::ready(()) => true,
        };
        assert!(gave_up);

        let store = Arc::clone(bulk.lifecycle.store());
        let all_escalated = || {
            ids.iter().all(|id| {
                store
                    .get(*id)
                    .map(|a| a.status == AlertStatus::Escalated)
                    .unwrap_or(false)
            })
        };
        for _ in 0..200 {
            if all_escalated() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(all_escalated());
    }
}
