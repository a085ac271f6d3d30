//! Library error types

use std::io;

/// Failures of the persistence layer and its mutation queue
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize database: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to start mutation queue: {0}")]
    Spawn(#[source] io::Error),

    #[error("mutation queue is closed")]
    QueueClosed,

    #[error("store used from inside a queued update or change listener")]
    Reentrant,

    #[error("update panicked: {0}")]
    Panicked(String),
}
