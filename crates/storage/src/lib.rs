//! Alert Storage
//!
//! Canonical in-memory collection of alerts. Every alert carries a version
//! that advances on each committed transition; writers must present the
//! version they read, and readers work from immutable snapshots.

mod persist;
mod snapshot;
mod store;

pub use persist::{decode_snapshot, encode_snapshot, PersistError};
pub use snapshot::AlertSnapshot;
pub use store::{AlertStore, VersionedAlert};
