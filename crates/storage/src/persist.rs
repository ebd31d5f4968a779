//! Binary export and import of store contents

use alert_model::Alert;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::AlertSnapshot;

/// Export format errors
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),
    #[error("Unsupported export format version {0}")]
    UnsupportedFormat(u16),
}

const FORMAT_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct Export {
    format: u16,
    store_version: u64,
    alerts: Vec<Alert>,
}

/// Encode a snapshot with postcard
pub fn encode_snapshot(snapshot: &AlertSnapshot) -> Result<Vec<u8>, PersistError> {
    let export = Export {
        format: FORMAT_VERSION,
        store_version: snapshot.version(),
        alerts: snapshot.alerts().to_vec(),
    };
    Ok(postcard::to_allocvec(&export)?)
}

/// Decode an export back into its store version and alerts
pub fn decode_snapshot(bytes: &[u8]) -> Result<(u64, Vec<Alert>), PersistError> {
    let export: Export = postcard::from_bytes(bytes)?;
    if export.format != FORMAT_VERSION {
        return Err(PersistError::UnsupportedFormat(export.format));
    }
    Ok((export.store_version, export.alerts))
}
