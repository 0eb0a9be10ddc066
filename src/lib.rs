//! Progress tracking for periodic exercise reminders.
//!
//! The crate owns the weekly completion grid: a fixed table of daily time
//! slots ([`schedule::SlotTable`]), a per-date completion record, and a
//! [`store::ProgressStore`] that persists every mutation through an
//! atomic-replace file backend with a rolling backup.

pub mod clock;
pub mod consts;
pub mod error;
pub mod schedule;
pub mod store;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ScheduleError, StoreError};
pub use schedule::{SlotStatus, SlotTable, TimeSlot};
pub use store::{
    ActivityLog, DayRecord, DaySummary, FileBackend, FlushPolicy, LoadStatus, LogFanout,
    MemoryLog, ProgressLog, ProgressStore, ResetPolicy, StoreEvent, StoreOptions, TracingLog,
    TrackerState, WeekSummary,
};
