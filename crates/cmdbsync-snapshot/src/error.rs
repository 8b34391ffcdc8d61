//! Error types for the snapshot boundary.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid record #{index}: {detail}")]
    InvalidRecord { index: usize, detail: String },

    #[error("{method} failed: {detail}")]
    Api { method: String, detail: String },

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}
