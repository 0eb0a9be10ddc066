//! Observability sink for the store
//!
//! The store reports every mutation, save and load outcome as a [`StoreEvent`]
//! through an injected [`ProgressLog`]. [`TracingLog`] forwards to `tracing`,
//! [`ActivityLog`] appends timestamped lines to a text file, [`MemoryLog`]
//! keeps events for inspection in tests.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate};

use super::backend::BackupOutcome;
use super::types::Normalization;

/// Why a fresh week was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitIntent {
    Initialize,
    ResetWeek,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Initialized {
        intent: InitIntent,
        start: NaiveDate,
        /// Days kept from the previous state under `ResetPolicy::Retain`
        retained: usize,
    },
    SlotSet {
        date: NaiveDate,
        slot: usize,
        label: String,
        completed: bool,
        previous: bool,
    },
    SlotToggled {
        date: NaiveDate,
        slot: usize,
        label: String,
        completed: bool,
    },
    Saved {
        path: PathBuf,
        bytes: usize,
        backup: BackupOutcome,
    },
    SaveFailed {
        path: PathBuf,
        error: String,
        backup: BackupOutcome,
    },
    /// Primary write and backup both failed in the same save cycle
    DurabilityWarning {
        path: PathBuf,
        write_error: String,
        backup_error: String,
    },
    Loaded {
        path: PathBuf,
        days: usize,
    },
    Corrupt {
        path: PathBuf,
        reason: String,
        quarantined: Option<PathBuf>,
    },
    RecoveredFromBackup {
        path: PathBuf,
        days: usize,
    },
    Reinitialized {
        start: NaiveDate,
        /// Neither the canonical file nor the backup existed
        first_run: bool,
    },
    Normalized(Normalization),
}

impl StoreEvent {
    pub fn level(&self) -> tracing::Level {
        match self {
            StoreEvent::SaveFailed { .. } | StoreEvent::DurabilityWarning { .. } => {
                tracing::Level::ERROR
            }
            StoreEvent::Corrupt { .. }
            | StoreEvent::RecoveredFromBackup { .. }
            | StoreEvent::Reinitialized {
                first_run: false, ..
            }
            | StoreEvent::Normalized(_) => tracing::Level::WARN,
            StoreEvent::Saved {
                backup: BackupOutcome::Failed(_),
                ..
            } => tracing::Level::WARN,
            _ => tracing::Level::INFO,
        }
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreEvent::Initialized {
                intent,
                start,
                retained,
            } => {
                let verb = match intent {
                    InitIntent::Initialize => "Initialized tracker",
                    InitIntent::ResetWeek => "Started new week",
                };
                write!(f, "{verb} at {start}")?;
                if *retained > 0 {
                    write!(f, " ({retained} other days kept)")?;
                }
                Ok(())
            }
            StoreEvent::SlotSet {
                date,
                label,
                completed,
                previous,
                ..
            } => match (previous, completed) {
                (false, true) => write!(f, "User completed squats for {label} on {date}."),
                (true, false) => write!(f, "User undid squats for {label} on {date}."),
                (_, true) => write!(f, "Squats for {label} on {date} already completed."),
                (_, false) => write!(f, "Squats for {label} on {date} already open."),
            },
            StoreEvent::SlotToggled {
                date,
                label,
                completed,
                ..
            } => {
                if *completed {
                    write!(f, "User completed squats for {label} on {date}.")
                } else {
                    write!(f, "User undid squats for {label} on {date}.")
                }
            }
            StoreEvent::Saved {
                path,
                bytes,
                backup,
            } => {
                write!(f, "Saved {bytes} bytes to {}", path.display())?;
                if let BackupOutcome::Failed(e) = backup {
                    write!(f, " (backup failed: {e})")?;
                }
                Ok(())
            }
            StoreEvent::SaveFailed { path, error, .. } => {
                write!(f, "Failed to save {}: {error}", path.display())
            }
            StoreEvent::DurabilityWarning {
                path,
                write_error,
                backup_error,
            } => write!(
                f,
                "Durability warning for {}: write failed ({write_error}) and backup failed ({backup_error}); progress is only held in memory",
                path.display()
            ),
            StoreEvent::Loaded { path, days } => {
                write!(f, "Loaded {days} days from {}", path.display())
            }
            StoreEvent::Corrupt {
                path,
                reason,
                quarantined,
            } => {
                write!(f, "Corrupt tracker file {}: {reason}", path.display())?;
                if let Some(q) = quarantined {
                    write!(f, " (moved to {})", q.display())?;
                }
                Ok(())
            }
            StoreEvent::RecoveredFromBackup { path, days } => {
                write!(f, "Recovered {days} days from backup {}", path.display())
            }
            StoreEvent::Reinitialized {
                start,
                first_run: true,
            } => write!(f, "Created tracker with a fresh week at {start}"),
            StoreEvent::Reinitialized {
                start,
                first_run: false,
            } => write!(
                f,
                "No usable tracker or backup file; started a fresh week at {start}"
            ),
            StoreEvent::Normalized(n) => write!(
                f,
                "Record for {} had {} slots, normalized to {} ({} completions dropped)",
                n.date, n.found, n.expected, n.dropped_completions
            ),
        }
    }
}

/// Sink the store reports to. Must be callable from any thread.
pub trait ProgressLog: Send + Sync {
    fn record(&self, event: &StoreEvent);
}

/// Forward events to `tracing` at a level chosen per event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ProgressLog for TracingLog {
    fn record(&self, event: &StoreEvent) {
        let level = event.level();
        if level == tracing::Level::ERROR {
            tracing::error!(target: "squats::store", "{event}");
        } else if level == tracing::Level::WARN {
            tracing::warn!(target: "squats::store", "{event}");
        } else {
            tracing::info!(target: "squats::store", "{event}");
        }
    }
}

/// Append `YYYY-MM-DD HH:MM:SS: message` lines to a file
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ActivityLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl ProgressLog for ActivityLog {
    fn record(&self, event: &StoreEvent) {
        // Routine successful I/O stays out of the activity log
        if matches!(
            event,
            StoreEvent::Loaded { .. }
                | StoreEvent::Saved {
                    backup: BackupOutcome::Copied | BackupOutcome::NoPrevious,
                    ..
                }
        ) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{timestamp}: {event}\n");
        if let Err(e) = self.append(&line) {
            tracing::warn!("Failed to write activity log {}: {e}", self.path.display());
        }
    }
}

/// Keep every event in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    events: Mutex<Vec<StoreEvent>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn any(&self, pred: impl Fn(&StoreEvent) -> bool) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(pred)
    }
}

impl ProgressLog for MemoryLog {
    fn record(&self, event: &StoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Send each event to several sinks in order
#[derive(Default, Clone)]
pub struct LogFanout {
    sinks: Vec<Arc<dyn ProgressLog>>,
}

impl LogFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ProgressLog>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ProgressLog for LogFanout {
    fn record(&self, event: &StoreEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
