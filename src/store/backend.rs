//! JSON file backend with atomic replace, rolling backup and recovery
//!
//! Layout next to the canonical file `tracker.json`:
//! - `tracker.json.bak`: the previous canonical contents, refreshed right
//!   before every replace
//! - `tracker.json.corrupt` / `tracker.json.bak.corrupt`: files that failed
//!   to parse, moved aside on load so they are never rotated into the backup
//! - `tracker.json.unreadable`: a canonical file that exists but could not be
//!   read, moved aside so recovery does not replace it
//!
//! Writes go to a temp file in the same directory which is fsynced and then
//! renamed over the canonical path, so readers only ever see a complete file.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::consts::{
    BACKUP_SUFFIX, CORRUPT_SUFFIX, DATE_FORMAT, FORMAT_VERSION, TRACKER_FILE, UNREADABLE_SUFFIX,
};
use crate::error::StoreError;
use crate::schedule::SlotTable;

use super::events::{ProgressLog, StoreEvent};
use super::types::{DayRecord, Normalization, TrackerState};

/// On-disk envelope, as written
#[derive(Serialize)]
struct TrackerFileOut<'a> {
    version: u32,
    slots: Vec<&'a str>,
    days: BTreeMap<String, &'a [bool]>,
}

/// On-disk envelope, as read
#[derive(Deserialize)]
struct TrackerFileIn {
    version: u32,
    days: BTreeMap<String, Vec<bool>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Envelope(TrackerFileIn),
    /// Bare `{ "YYYY-MM-DD": [bool, ...] }` object without an envelope
    Legacy(BTreeMap<String, Vec<bool>>),
}

/// What happened to the backup during a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Copied,
    /// No canonical file existed yet
    NoPrevious,
    /// The temp file could not be written, so the backup step never ran
    NotAttempted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub bytes: usize,
    pub backup: BackupOutcome,
}

/// Which branch of the load cascade produced the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    RecoveredFromBackup,
    /// Neither file was usable. `first_run` is set when neither existed at all.
    Reinitialized { first_run: bool },
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub state: TrackerState,
    pub status: LoadStatus,
    pub normalized: Vec<Normalization>,
    /// Whether the canonical file on disk now matches `state`
    pub persisted: bool,
}

enum ReadError {
    Missing,
    Unreadable(io::Error),
    Corrupt(String),
}

#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    backup_path: PathBuf,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Serialize `state` into the envelope format.
pub fn encode(state: &TrackerState, slots: &SlotTable) -> Result<Vec<u8>, StoreError> {
    let file = TrackerFileOut {
        version: FORMAT_VERSION,
        slots: slots.iter().map(|s| s.label.as_str()).collect(),
        days: state
            .iter()
            .map(|(date, record)| (date.format(DATE_FORMAT).to_string(), record.as_slice()))
            .collect(),
    };
    let mut bytes = serde_json::to_vec_pretty(&file)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a tracker file, normalizing every record to `slot_count` entries.
pub fn decode(
    bytes: &[u8],
    slot_count: usize,
) -> Result<(TrackerState, Vec<Normalization>), String> {
    // Parse to a value first so syntax errors (e.g. truncation) keep their position
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let stored: StoredFile = serde_json::from_value(value)
        .map_err(|_| "unrecognized tracker document layout".to_string())?;
    let days = match stored {
        StoredFile::Envelope(file) => {
            if file.version > FORMAT_VERSION {
                return Err(format!("unsupported format version {}", file.version));
            }
            file.days
        }
        StoredFile::Legacy(days) => days,
    };

    let mut state = TrackerState::empty(slot_count);
    let mut notes = Vec::new();
    for (key, flags) in days {
        let date = NaiveDate::parse_from_str(&key, DATE_FORMAT)
            .map_err(|_| format!("invalid date key \"{key}\""))?;
        let (record, note) = DayRecord::normalized(date, flags, slot_count);
        notes.extend(note);
        state.insert(date, record);
    }
    Ok((state, notes))
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = with_suffix(&path, BACKUP_SUFFIX);
        FileBackend { path, backup_path }
    }

    /// Backend for `<dir>/tracker.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(TRACKER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// Durably write `state`, rotating the previous canonical file into the backup.
    pub fn save(
        &self,
        state: &TrackerState,
        slots: &SlotTable,
        log: &dyn ProgressLog,
    ) -> Result<SaveReport, StoreError> {
        let result = encode(state, slots).map_err(|e| (e, BackupOutcome::NotAttempted));
        let result = result.and_then(|bytes| {
            let backup = self.replace(&bytes)?;
            Ok(SaveReport {
                bytes: bytes.len(),
                backup,
            })
        });

        match result {
            Ok(report) => {
                log.record(&StoreEvent::Saved {
                    path: self.path.clone(),
                    bytes: report.bytes,
                    backup: report.backup.clone(),
                });
                Ok(report)
            }
            Err((err, backup)) => {
                log.record(&StoreEvent::SaveFailed {
                    path: self.path.clone(),
                    error: err.to_string(),
                    backup: backup.clone(),
                });
                if let BackupOutcome::Failed(backup_error) = backup {
                    log.record(&StoreEvent::DurabilityWarning {
                        path: self.path.clone(),
                        write_error: err.to_string(),
                        backup_error,
                    });
                }
                Err(err)
            }
        }
    }

    /// temp write → fsync → backup previous → rename over canonical
    fn replace(&self, bytes: &[u8]) -> Result<BackupOutcome, (StoreError, BackupOutcome)> {
        let dir = self.dir();
        let fail = |e: io::Error| (StoreError::io(dir, e), BackupOutcome::NotAttempted);

        fs::create_dir_all(dir).map_err(fail)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
        tmp.write_all(bytes).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;

        let backup = self.backup_previous();

        if let Err(e) = tmp.persist(&self.path) {
            return Err((StoreError::io(&self.path, e.error), backup));
        }
        sync_dir(dir);
        Ok(backup)
    }

    fn backup_previous(&self) -> BackupOutcome {
        let previous = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BackupOutcome::NoPrevious,
            Err(e) => return BackupOutcome::Failed(e.to_string()),
        };
        let write = || -> io::Result<()> {
            let mut tmp = NamedTempFile::new_in(self.dir())?;
            tmp.write_all(&previous)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&self.backup_path).map_err(|e| e.error)?;
            Ok(())
        };
        match write() {
            Ok(()) => BackupOutcome::Copied,
            Err(e) => BackupOutcome::Failed(e.to_string()),
        }
    }

    fn read(&self, path: &Path, slot_count: usize) -> Result<(TrackerState, Vec<Normalization>), ReadError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ReadError::Missing),
            Err(e) => return Err(ReadError::Unreadable(e)),
        };
        decode(&bytes, slot_count).map_err(ReadError::Corrupt)
    }

    /// Report a failed read; corrupt files are moved aside.
    fn note_failure(&self, path: &Path, err: ReadError, log: &dyn ProgressLog) -> bool {
        match err {
            ReadError::Missing => {
                tracing::debug!("{} not found", path.display());
                false
            }
            ReadError::Unreadable(e) => {
                log.record(&StoreEvent::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("unreadable: {e}"),
                    quarantined: move_aside(path, UNREADABLE_SUFFIX),
                });
                true
            }
            ReadError::Corrupt(reason) => {
                log.record(&StoreEvent::Corrupt {
                    path: path.to_path_buf(),
                    reason,
                    quarantined: move_aside(path, CORRUPT_SUFFIX),
                });
                true
            }
        }
    }

    /// Load through the canonical → backup → fresh-week cascade.
    ///
    /// Never fails: the worst case is a fresh week starting at `fresh_start`,
    /// which is written out immediately.
    pub fn load(&self, slots: &SlotTable, fresh_start: NaiveDate, log: &dyn ProgressLog) -> LoadOutcome {
        let slot_count = slots.len();

        let canonical_err = match self.read(&self.path, slot_count) {
            Ok((state, normalized)) => {
                log.record(&StoreEvent::Loaded {
                    path: self.path.clone(),
                    days: state.len(),
                });
                for note in &normalized {
                    log.record(&StoreEvent::Normalized(note.clone()));
                }
                let persisted = normalized.is_empty();
                return LoadOutcome {
                    state,
                    status: LoadStatus::Loaded,
                    normalized,
                    persisted,
                };
            }
            Err(e) => self.note_failure(&self.path, e, log),
        };

        let backup_err = match self.read(&self.backup_path, slot_count) {
            Ok((state, normalized)) => {
                log.record(&StoreEvent::RecoveredFromBackup {
                    path: self.backup_path.clone(),
                    days: state.len(),
                });
                for note in &normalized {
                    log.record(&StoreEvent::Normalized(note.clone()));
                }
                let persisted = self.save(&state, slots, log).is_ok();
                return LoadOutcome {
                    state,
                    status: LoadStatus::RecoveredFromBackup,
                    normalized,
                    persisted,
                };
            }
            Err(e) => self.note_failure(&self.backup_path, e, log),
        };

        let first_run = !canonical_err && !backup_err;
        let state = TrackerState::fresh_week(fresh_start, slot_count);
        log.record(&StoreEvent::Reinitialized {
            start: fresh_start,
            first_run,
        });
        let persisted = self.save(&state, slots, log).is_ok();
        LoadOutcome {
            state,
            status: LoadStatus::Reinitialized { first_run },
            normalized: Vec::new(),
            persisted,
        }
    }
}

/// Rename `path` to `<path>.<suffix>` so later saves cannot replace its bytes.
fn move_aside(path: &Path, suffix: &str) -> Option<PathBuf> {
    let target = with_suffix(path, suffix);
    match fs::rename(path, &target) {
        Ok(()) => Some(target),
        Err(e) => {
            tracing::warn!("Could not move {} aside: {e}", path.display());
            None
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(d) = fs::File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
