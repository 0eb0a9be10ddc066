use squats::{ScheduleError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid date \"{input}\" (expected YYYYMMDD, YYYY-MM-DD or \"today\")")]
    InvalidDate { input: String },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Unknown slot \"{input}\" (expected an index 0..{slots} or a time label)")]
    UnknownSlot { input: String, slots: usize },

    #[error("Invalid slot table in config: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}
