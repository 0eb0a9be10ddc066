//! Progress store and its persistence backend

mod backend;
mod events;
mod summary;
mod tracker;
mod types;

pub use backend::{BackupOutcome, FileBackend, LoadOutcome, LoadStatus, SaveReport, decode, encode};
pub use events::{
    ActivityLog, InitIntent, LogFanout, MemoryLog, ProgressLog, StoreEvent, TracingLog,
};
pub use summary::{DaySummary, WeekSummary};
pub use tracker::{FlushPolicy, ProgressStore, ResetPolicy, StoreOptions};
pub use types::{DayRecord, Normalization, TrackerState};
