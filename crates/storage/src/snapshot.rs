//! Point-in-time view of the store

use alert_model::{Alert, AlertId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Immutable copy of every alert at one store version
///
/// Cloning is cheap; the alerts are shared, never mutated, and hold no
/// references back into the store.
#[derive(Debug, Clone)]
pub struct AlertSnapshot {
    version: u64,
    taken_at: DateTime<Utc>,
    alerts: Arc<[Alert]>,
}

impl AlertSnapshot {
    /// Build a snapshot from already-owned alerts
    pub fn new(version: u64, taken_at: DateTime<Utc>, alerts: Vec<Alert>) -> Self {
        Self {
            version,
            taken_at,
            alerts: alerts.into(),
        }
    }

    /// Store version the snapshot was taken at
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Alerts in ingestion order
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Alert> {
        self.alerts.iter()
    }
}

impl<'a> IntoIterator for &'a AlertSnapshot {
    type Item = &'a Alert;
    type IntoIter = std::slice::Iter<'a, Alert>;

    fn into_iter(self) -> Self::IntoIter {
        self.alerts.iter()
    }
}
