//! Alert Store Implementation

use alert_model::{Alert, AlertError, AlertId, AlertStatus, Clock, NewAlert, SystemClock};
use data_validator::{AlertInput, Validator};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::persist::{decode_snapshot, encode_snapshot, PersistError};
use crate::snapshot::AlertSnapshot;

/// An alert together with the version a writer must present to change it
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedAlert {
    pub alert: Alert,
    pub version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    /// Ingestion order
    alerts: Vec<VersionedAlert>,
    /// Id to position in `alerts`
    index: HashMap<AlertId, usize>,
    next_id: u64,
    /// Advances on every committed write
    version: u64,
}

impl Inner {
    fn slot(&self, id: AlertId) -> Result<usize, AlertError> {
        self.index.get(&id).copied().ok_or(AlertError::NotFound { id })
    }

    fn push(&mut self, alert: Alert) {
        self.next_id = self.next_id.max(alert.id.0 + 1);
        self.index.insert(alert.id, self.alerts.len());
        self.alerts.push(VersionedAlert { alert, version: 1 });
        self.version += 1;
    }
}

/// Canonical alert collection
#[derive(Debug)]
pub struct AlertStore {
    inner: RwLock<Inner>,
    validator: Validator,
    clock: Arc<dyn Clock>,
}

impl AlertStore {
    /// Create an empty store on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping detection times from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        info!("Creating in-memory alert store");
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                ..Default::default()
            }),
            validator: Validator::default(),
            clock,
        }
    }

    /// Replace the payload validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Validate a raw payload and store it as a new active alert
    pub fn ingest(&self, input: AlertInput) -> Result<Alert, AlertError> {
        let new = self.validator.validate(input)?;
        self.insert(new)
    }

    /// Store an already-validated alert; assigns id and detection time
    pub fn insert(&self, new: NewAlert) -> Result<Alert, AlertError> {
        let detected = self.clock.now();
        let mut inner = self.write()?;

        let id = AlertId(inner.next_id);
        let alert = Alert::from_new(id, new, detected);
        inner.push(alert.clone());

        info!(
            "Ingested alert {} ({} {} from {})",
            id, alert.severity, alert.category, alert.source
        );
        Ok(alert)
    }

    /// Load a previously persisted alert, keeping its id and history
    pub fn import(&self, alert: Alert) -> Result<(), AlertError> {
        check_invariants(&alert)?;
        let mut inner = self.write()?;
        if inner.index.contains_key(&alert.id) {
            return Err(AlertError::validation(
                Some(alert.id),
                format!("alert id {} already exists", alert.id),
            ));
        }
        debug!("Imported alert {}", alert.id);
        inner.push(alert);
        Ok(())
    }

    /// Look up one alert
    pub fn get(&self, id: AlertId) -> Result<Alert, AlertError> {
        self.get_versioned(id).map(|v| v.alert)
    }

    /// Look up one alert with its current version
    pub fn get_versioned(&self, id: AlertId) -> Result<VersionedAlert, AlertError> {
        let inner = self.read()?;
        let slot = inner.slot(id)?;
        Ok(inner.alerts[slot].clone())
    }

    /// Point-in-time copy of every alert
    pub fn snapshot(&self) -> Result<AlertSnapshot, AlertError> {
        let inner = self.read()?;
        let alerts = inner.alerts.iter().map(|v| v.alert.clone()).collect();
        debug!("Snapshot at store version {}", inner.version);
        Ok(AlertSnapshot::new(inner.version, self.clock.now(), alerts))
    }

    /// Optimistic-concurrency update of a single alert
    ///
    /// `mutator` receives the current alert and returns its replacement. The
    /// write commits only if the alert is still at `expected_version`; a
    /// mutator error or a failed invariant leaves the alert untouched.
    pub fn apply_transition<F>(
        &self,
        id: AlertId,
        expected_version: u64,
        mutator: F,
    ) -> Result<VersionedAlert, AlertError>
    where
        F: FnOnce(&Alert) -> Result<Alert, AlertError>,
    {
        let mut inner = self.write()?;
        let slot = inner.slot(id)?;
        let current = &inner.alerts[slot];

        if current.version != expected_version {
            warn!(
                "Stale write on alert {}: expected version {}, found {}",
                id, expected_version, current.version
            );
            return Err(AlertError::ConcurrentModification {
                id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let updated = mutator(&current.alert)?;
        if updated.id != current.alert.id {
            return Err(AlertError::validation(Some(id), "id is immutable"));
        }
        if updated.detected_date != current.alert.detected_date {
            return Err(AlertError::validation(Some(id), "detectedDate is immutable"));
        }
        check_invariants(&updated)?;

        let committed = VersionedAlert {
            alert: updated,
            version: current.version + 1,
        };
        inner.alerts[slot] = committed.clone();
        inner.version += 1;

        debug!("Alert {} now at version {}", id, committed.version);
        Ok(committed)
    }

    /// Store-wide write counter
    pub fn version(&self) -> Result<u64, AlertError> {
        Ok(self.read()?.version)
    }

    pub fn len(&self) -> Result<usize, AlertError> {
        Ok(self.read()?.alerts.len())
    }

    pub fn is_empty(&self) -> Result<bool, AlertError> {
        Ok(self.len()? == 0)
    }

    /// Serialize the current contents
    pub fn export(&self) -> Result<Vec<u8>, AlertError> {
        let snapshot = self.snapshot()?;
        encode_snapshot(&snapshot).map_err(|e| AlertError::storage(e.to_string()))
    }

    /// Rebuild a store from an export
    pub fn restore(bytes: &[u8], clock: Arc<dyn Clock>) -> Result<Self, AlertError> {
        let (version, alerts) =
            decode_snapshot(bytes).map_err(|e: PersistError| AlertError::storage(e.to_string()))?;
        let store = Self::with_clock(clock);
        let count = alerts.len();
        for alert in alerts {
            store.import(alert)?;
        }
        {
            let mut inner = store.write()?;
            inner.version = inner.version.max(version);
        }
        info!("Restored {} alert(s) at store version {}", count, version);
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, AlertError> {
        self.inner
            .read()
            .map_err(|e| AlertError::storage(format!("Lock error: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, AlertError> {
        self.inner
            .write()
            .map_err(|e| AlertError::storage(format!("Lock error: {}", e)))
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that hold for every stored alert
fn check_invariants(alert: &Alert) -> Result<(), AlertError> {
    let mut problems = Vec::new();
    let resolved = alert.status == AlertStatus::Resolved;

    if resolved != alert.resolved_date.is_some() {
        problems.push("resolvedDate must be set exactly when status is resolved".to_string());
    }
    let stamps = [
        ("acknowledgedDate", alert.acknowledged_date),
        ("resolvedDate", alert.resolved_date),
        ("escalatedDate", alert.escalated_date),
        ("falsePositiveDate", alert.false_positive_date),
    ];
    for (field, stamp) in stamps {
        if matches!(stamp, Some(at) if at < alert.detected_date) {
            problems.push(format!("{} precedes detectedDate", field));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AlertError::Validation {
            id: Some(alert.id),
            problems,
        })
    }
}
