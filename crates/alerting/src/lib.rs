//! Alert Lifecycle
//!
//! Validates and executes operator transitions against the lifecycle table,
//! and applies one transition across many alerts without letting a single
//! failure abort the batch.

mod bulk;
mod lifecycle;

pub use bulk::{BulkAction, BulkActionCoordinator, BulkOutcome, DEFAULT_MAX_IN_FLIGHT};
pub use lifecycle::{AlertLifecycle, LifecycleConfig};
