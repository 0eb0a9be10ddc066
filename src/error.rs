use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid slot index {index} (expected 0..{slots})")]
    InvalidSlotIndex { index: usize, slots: usize },

    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDateFormat { input: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode tracker state: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Slot table must contain at least one slot")]
    Empty,

    #[error("Invalid slot time \"{label}\" (expected e.g. \"8:45 AM\" or \"17:00\")")]
    InvalidTime { label: String },

    #[error("Slot \"{label}\" is not later than the slot before it")]
    OutOfOrder { label: String },
}
