//! Query memoization keyed by snapshot version

use alert_model::Alert;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use storage::AlertSnapshot;
use tracing::debug;

use crate::query::{query, AlertCriteria};

#[derive(Debug)]
struct Entry {
    version: u64,
    criteria: AlertCriteria,
    result: Arc<Vec<Alert>>,
}

/// Caches the most recent query result
///
/// A cached result is reused only for the same criteria against the same
/// snapshot version, so every committed mutation invalidates it.
#[derive(Debug, Default)]
pub struct QueryMemo {
    entry: Mutex<Option<Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result or run the query against `snapshot`
    pub fn get_or_compute(
        &self,
        snapshot: &AlertSnapshot,
        criteria: &AlertCriteria,
    ) -> Arc<Vec<Alert>> {
        let version = snapshot.version();
        {
            let entry = self.entry.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entry.as_ref() {
                if entry.version == version && entry.criteria == *criteria {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Arc::clone(&entry.result);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = Arc::new(query(snapshot.alerts(), criteria));
        debug!("Query memo refreshed at snapshot version {}", version);

        let mut entry = self.entry.lock().unwrap_or_else(|e| e.into_inner());
        // keep whichever entry is newer if another reader raced ahead
        let stale = entry.as_ref().map_or(true, |e| e.version <= version);
        if stale {
            *entry = Some(Entry {
                version,
                criteria: criteria.clone(),
                result: Arc::clone(&result),
            });
        }
        result
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        *self.entry.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
