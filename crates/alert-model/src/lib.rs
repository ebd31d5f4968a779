//! Alert Model
//!
//! Defines the alert entity shared by every engine component: the closed
//! classification enums, the lifecycle state table, the error taxonomy, and
//! the clock abstraction used to stamp timestamps.

mod alert;
mod clock;
mod enums;
mod error;

pub use alert::{AiAnalysis, Alert, AlertId, Impact, NewAlert, SensorReading};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enums::{AlertCategory, AlertSource, AlertStatus, LifecycleAction, ParseEnumError, Severity};
pub use error::{AlertError, BulkFailure};
