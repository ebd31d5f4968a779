//! Alert Dashboard Service
//!
//! Combines one query and one statistics computation over the same snapshot,
//! so the list and the figures next to it always agree.

use alert_model::{Alert, AlertError};
use analytics::{compute_statistics, paginate, AlertCriteria, Page, QueryMemo, Statistics, StatsWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use storage::AlertStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One consistent dashboard read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub snapshot_version: u64,
    pub generated_at: DateTime<Utc>,
    /// Requested page of the matching alerts
    pub alerts: Vec<Alert>,
    /// Total number of matching alerts before pagination
    pub matching: usize,
    pub statistics: Statistics,
}

/// Read-only composition of query and statistics
#[derive(Debug)]
pub struct AlertDashboardService {
    store: Arc<AlertStore>,
    memo: QueryMemo,
}

impl AlertDashboardService {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self {
            store,
            memo: QueryMemo::new(),
        }
    }

    pub fn memo(&self) -> &QueryMemo {
        &self.memo
    }

    /// Build a view from a fresh snapshot
    pub fn view(
        &self,
        criteria: &AlertCriteria,
        window: StatsWindow,
        page: Page,
    ) -> Result<DashboardView, AlertError> {
        let snapshot = self.store.snapshot()?;
        let matched = self.memo.get_or_compute(&snapshot, criteria);
        let statistics = compute_statistics(snapshot.alerts(), window, snapshot.taken_at());

        debug!(
            "Dashboard view at version {}: {} matching alert(s)",
            snapshot.version(),
            matched.len()
        );

        Ok(DashboardView {
            snapshot_version: snapshot.version(),
            generated_at: snapshot.taken_at(),
            alerts: paginate(&matched, page).to_vec(),
            matching: matched.len(),
            statistics,
        })
    }

    /// Recompute the view every `interval` and publish it on a watch channel
    ///
    /// The task ends once every receiver has been dropped.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        criteria: AlertCriteria,
        window: StatsWindow,
        page: Page,
        interval: Duration,
    ) -> Result<(JoinHandle<()>, watch::Receiver<DashboardView>), AlertError> {
        let initial = self.view(&criteria, window, page)?;
        let (tx, rx) = watch::channel(initial);
        let service = Arc::clone(self);

        info!("Starting dashboard refresh every {:?} ({} window)", interval, window);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately; the initial view is already published
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }

                match service.view(&criteria, window, page) {
                    Ok(view) => {
                        let changed = view.snapshot_version != tx.borrow().snapshot_version;
                        if changed && tx.send(view).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dashboard refresh failed: {}", e),
                }
            }
            debug!("Dashboard refresh stopped");
        });

        Ok((handle, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{AlertStatus, ManualClock};
    use alerting::{AlertLifecycle, LifecycleConfig};
    use analytics::SortKey;
    use chrono::TimeZone;
    use data_validator::AlertInput;

    fn setup() -> (Arc<ManualClock>, Arc<AlertStore>, Arc<AlertDashboardService>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(AlertStore::with_clock(clock.clone()));
        let service = Arc::new(AlertDashboardService::new(Arc::clone(&store)));
        (clock, store, service)
    }

    fn ingest(store: &AlertStore, title: &str, severity: &str) -> Alert {
        store
            .ingest(AlertInput::new(title, "msg", "Substation 4", severity, "equipment", "sensor"))
            .unwrap()
    }

    #[test]
    fn test_view_combines_query_and_statistics() {
        let (_clock, store, service) = setup();
        ingest(&store, "Transformer hot", "critical");
        ingest(&store, "Fan noise", "low");
        ingest(&store, "Oil level", "high");

        let criteria = AlertCriteria {
            sort_by: SortKey::Severity,
            ..Default::default()
        };
        let view = service
            .view(&criteria, StatsWindow::Last24Hours, Page { offset: 0, limit: 2 })
            .unwrap();

        assert_eq!(view.matching, 3);
        assert_eq!(view.alerts.len(), 2);
        assert_eq!(view.alerts[0].title, "Transformer hot");
        assert_eq!(view.statistics.total, 3);
        assert_eq!(view.statistics.open_critical, 1);
        assert_eq!(view.snapshot_version, store.version().unwrap());
    }

    #[test]
    fn test_view_reflects_new_writes() {
        let (clock, store, service) = setup();
        let alert = ingest(&store, "Transformer hot", "critical");
        let lifecycle = AlertLifecycle::new(Arc::clone(&store), LifecycleConfig::default());
        let criteria = AlertCriteria {
            active_only: true,
            ..Default::default()
        };

        let before = service
            .view(&criteria, StatsWindow::Last24Hours, Page::default())
            .unwrap();
        assert_eq!(before.matching, 1);

        clock.advance(chrono::Duration::minutes(5));
        lifecycle.resolve(alert.id, "op-1", "replaced fan", vec![]).unwrap();

        let after = service
            .view(&criteria, StatsWindow::Last24Hours, Page::default())
            .unwrap();
        assert_eq!(after.matching, 0);
        assert_eq!(after.statistics.resolved, 1);
        assert_eq!(after.statistics.resolution_time.avg, 5);
        assert_eq!(store.get(alert.id).unwrap().status, AlertStatus::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_new_versions() {
        let (_clock, store, service) = setup();
        ingest(&store, "first", "low");

        let (handle, mut rx) = service
            .spawn_refresh(
                AlertCriteria::default(),
                StatsWindow::Last24Hours,
                Page::default(),
                Duration::from_secs(10),
            )
            .unwrap();
        assert_eq!(rx.borrow().matching, 1);

        ingest(&store, "second", "high");
        tokio::time::advance(Duration::from_secs(11)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().matching, 2);

        drop(rx);
        tokio::time::advance(Duration::from_secs(11)).await;
        handle.await.unwrap();
    }
}
