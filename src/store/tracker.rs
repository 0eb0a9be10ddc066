//! The progress store: sole owner of the completion grid.
//!
//! Every operation takes the store's mutex for its whole duration, including
//! the file write, so callers on different threads never observe or persist a
//! half-applied mutation. With [`FlushPolicy::Immediate`] (the default) each
//! mutation is on disk before it returns; with [`FlushPolicy::Deferred`] the
//! state is written by [`ProgressStore::flush`] or when the store is dropped.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::schedule::{SlotStatus, SlotTable};
use crate::utils::week_start;

use super::backend::{FileBackend, LoadStatus};
use super::events::{InitIntent, ProgressLog, StoreEvent, TracingLog};
use super::summary::{DaySummary, WeekSummary};
use super::types::{DayRecord, TrackerState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Persist before every mutating call returns
    #[default]
    Immediate,
    /// Persist on `flush()` and on drop
    Deferred,
}

/// What `initialize` / `reset_week` do with days outside the new window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Replace the whole state with the fresh week
    #[default]
    Discard,
    /// Keep records outside the new week; days inside it start blank
    Retain,
}

#[derive(Clone)]
pub struct StoreOptions {
    pub flush: FlushPolicy,
    pub reset: ResetPolicy,
    pub clock: Arc<dyn Clock>,
    pub log: Arc<dyn ProgressLog>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            flush: FlushPolicy::default(),
            reset: ResetPolicy::default(),
            clock: Arc::new(SystemClock),
            log: Arc::new(TracingLog),
        }
    }
}

impl StoreOptions {
    pub fn with_flush(mut self, flush: FlushPolicy) -> Self {
        self.flush = flush;
        self
    }

    pub fn with_reset(mut self, reset: ResetPolicy) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn ProgressLog>) -> Self {
        self.log = log;
        self
    }
}

struct Inner {
    state: TrackerState,
    /// In-memory state differs from the canonical file
    dirty: bool,
}

pub struct ProgressStore {
    inner: Mutex<Inner>,
    backend: FileBackend,
    slots: SlotTable,
    options: StoreOptions,
    load_status: LoadStatus,
}

impl ProgressStore {
    /// Load state from `backend`, recovering from the backup or starting a
    /// fresh week (Monday-aligned on the clock's today) when needed.
    pub fn open(backend: FileBackend, slots: SlotTable, options: StoreOptions) -> Self {
        let fresh_start = week_start(options.clock.today());
        let outcome = backend.load(&slots, fresh_start, options.log.as_ref());
        let store = ProgressStore {
            inner: Mutex::new(Inner {
                state: outcome.state,
                dirty: !outcome.persisted,
            }),
            backend,
            slots,
            options,
            load_status: outcome.status,
        };
        if store.options.flush == FlushPolicy::Immediate {
            if let Err(e) = store.flush() {
                tracing::debug!("Initial write after load failed: {e}");
            }
        }
        store
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load_status
    }

    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    pub fn today(&self) -> NaiveDate {
        self.options.clock.today()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, event: StoreEvent) {
        self.options.log.record(&event);
    }

    fn write(&self, inner: &mut Inner) -> Result<(), StoreError> {
        self.backend
            .save(&inner.state, &self.slots, self.options.log.as_ref())?;
        inner.dirty = false;
        Ok(())
    }

    /// Mark the state changed and write it out unless flushing is deferred.
    fn persist(&self, inner: &mut Inner) -> Result<(), StoreError> {
        inner.dirty = true;
        match self.options.flush {
            FlushPolicy::Immediate => self.write(inner),
            FlushPolicy::Deferred => Ok(()),
        }
    }

    /// Write pending changes. A no-op when nothing changed since the last save.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.dirty {
            return Ok(());
        }
        self.write(&mut inner)
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Replace the state with seven blank days starting at `start`
    /// (default: Monday of the current week), then persist.
    pub fn initialize(&self, start: Option<NaiveDate>) -> Result<(), StoreError> {
        self.rebuild(start, InitIntent::Initialize)
    }

    /// Same as [`initialize`](Self::initialize); called when a new week begins.
    pub fn reset_week(&self, start: Option<NaiveDate>) -> Result<(), StoreError> {
        self.rebuild(start, InitIntent::ResetWeek)
    }

    fn rebuild(&self, start: Option<NaiveDate>, intent: InitIntent) -> Result<(), StoreError> {
        let start = start.unwrap_or_else(|| week_start(self.today()));
        let fresh = TrackerState::fresh_week(start, self.slots.len());

        let mut inner = self.lock();
        let mut retained = 0;
        let next = match self.options.reset {
            ResetPolicy::Discard => fresh,
            ResetPolicy::Retain => {
                let previous = std::mem::replace(&mut inner.state, TrackerState::empty(0));
                let mut next = fresh;
                for (date, record) in previous.into_days() {
                    if !next.contains(date) {
                        next.insert(date, record);
                        retained += 1;
                    }
                }
                next
            }
        };
        inner.state = next;
        self.log(StoreEvent::Initialized {
            intent,
            start,
            retained,
        });
        self.persist(&mut inner)
    }

    /// The record for `date`, or `None` when the date has never been touched.
    pub fn get(&self, date: NaiveDate) -> Option<DayRecord> {
        self.lock().state.get(date).cloned()
    }

    pub fn snapshot(&self) -> TrackerState {
        self.lock().state.clone()
    }

    /// Set slot `index` of `date` to `completed`, creating the day if needed.
    ///
    /// Idempotent: repeating the call leaves the same state and writes the
    /// same bytes. An out-of-range index fails before anything is touched.
    /// If the write fails the in-memory change is kept and retried on the
    /// next save.
    pub fn set_slot(&self, date: NaiveDate, index: usize, completed: bool) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let previous = inner.state.set(date, index, completed)?;
        self.log(StoreEvent::SlotSet {
            date,
            slot: index,
            label: self.slots.label(index),
            completed,
            previous,
        });
        self.persist(&mut inner)
    }

    /// Flip slot `index` of `date` and return the new value.
    ///
    /// This models a toggle button and is deliberately not idempotent: two
    /// calls restore the original value. Use [`set_slot`](Self::set_slot)
    /// when the target value is known.
    pub fn toggle_slot(&self, date: NaiveDate, index: usize) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let current = inner
            .state
            .get(date)
            .and_then(|r| r.get(index))
            .unwrap_or(false);
        let completed = !current;
        inner.state.set(date, index, completed)?;
        self.log(StoreEvent::SlotToggled {
            date,
            slot: index,
            label: self.slots.label(index),
            completed,
        });
        self.persist(&mut inner)?;
        Ok(completed)
    }

    /// Mark the first open slot of `date` as done. Returns the slot marked,
    /// or `None` when the day is already complete.
    pub fn complete_next(&self, date: NaiveDate) -> Result<Option<usize>, StoreError> {
        let mut inner = self.lock();
        let next = match inner.state.get(date) {
            Some(record) => record.first_incomplete(),
            None => (!self.slots.is_empty()).then_some(0),
        };
        let Some(index) = next else {
            return Ok(None);
        };
        let previous = inner.state.set(date, index, true)?;
        self.log(StoreEvent::SlotSet {
            date,
            slot: index,
            label: self.slots.label(index),
            completed: true,
            previous,
        });
        self.persist(&mut inner)?;
        Ok(Some(index))
    }

    /// True iff `date` exists and every slot is done.
    pub fn all_slots_complete(&self, date: NaiveDate) -> bool {
        self.lock()
            .state
            .get(date)
            .is_some_and(DayRecord::is_complete)
    }

    pub fn day_summary(&self, date: NaiveDate) -> DaySummary {
        let inner = self.lock();
        DaySummary::new(date, inner.state.get(date), self.slots.len())
    }

    /// Summary of the 7 days from `start` (default: Monday of the current week).
    pub fn week_summary(&self, start: Option<NaiveDate>) -> WeekSummary {
        let start = start.unwrap_or_else(|| week_start(self.today()));
        WeekSummary::from_state(&self.lock().state, start)
    }

    /// Status of each slot of `date` as seen from the clock's current time.
    pub fn statuses(&self, date: NaiveDate) -> Vec<SlotStatus> {
        let now = self.options.clock.now();
        let inner = self.lock();
        let flags = inner
            .state
            .get(date)
            .map(|r| r.as_slice().to_vec())
            .unwrap_or_else(|| vec![false; self.slots.len()]);
        self.slots.statuses(&flags, date, now)
    }
}

impl Drop for ProgressStore {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.dirty {
            let _ = self
                .backend
                .save(&inner.state, &self.slots, self.options.log.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::events::MemoryLog;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        dir: tempfile::TempDir,
        log: Arc<MemoryLog>,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                dir: tempfile::tempdir().unwrap(),
                log: Arc::new(MemoryLog::new()),
            }
        }

        fn backend(&self) -> FileBackend {
            FileBackend::in_dir(self.dir.path())
        }

        fn options(&self) -> StoreOptions {
            StoreOptions::default()
                // Wednesday
                .with_clock(Arc::new(FixedClock::on(ymd(2025, 4, 2))))
                .with_log(self.log.clone())
        }

        fn open(&self) -> ProgressStore {
            self.open_with(self.options())
        }

        fn open_with(&self, options: StoreOptions) -> ProgressStore {
            ProgressStore::open(self.backend(), SlotTable::default(), options)
        }

        fn bytes(&self) -> Vec<u8> {
            fs::read(self.backend().path()).unwrap()
        }
    }

    #[test]
    fn first_open_writes_current_week() {
        let fx = Fixture::new();
        let store = fx.open();
        assert_eq!(store.load_status(), LoadStatus::Reinitialized { first_run: true });
        let dates: Vec<_> = store.snapshot().dates().collect();
        assert_eq!(dates.first(), Some(&ymd(2025, 3, 31)));
        assert_eq!(dates.len(), 7);
        assert!(fx.backend().path().exists());
    }

    #[test]
    fn initialize_builds_exact_week() {
        let fx = Fixture::new();
        let store = fx.open();
        store.set_slot(ymd(2025, 1, 1), 0, true).unwrap();
        store.initialize(Some(ymd(2025, 3, 31))).unwrap();

        let state = store.snapshot();
        let dates: Vec<_> = state.dates().map(|d| d.to_string()).collect();
        assert_eq!(
            dates,
            vec![
                "2025-03-31",
                "2025-04-01",
                "2025-04-02",
                "2025-04-03",
                "2025-04-04",
                "2025-04-05",
                "2025-04-06"
            ]
        );
        for (_, record) in state.iter() {
            assert_eq!(record.as_slice(), &[false; 13]);
        }
        assert!(fx.log.any(|e| matches!(
            e,
            StoreEvent::Initialized {
                intent: InitIntent::Initialize,
                ..
            }
        )));
    }

    #[test]
    fn initialize_defaults_to_monday_of_this_week() {
        let fx = Fixture::new();
        let store = fx.open();
        store.reset_week(None).unwrap();
        assert_eq!(store.snapshot().dates().next(), Some(ymd(2025, 3, 31)));
    }

    #[test]
    fn get_missing_date_is_none() {
        let fx = Fixture::new();
        let store = fx.open();
        assert!(store.get(ymd(2024, 12, 25)).is_none());
        assert_eq!(store.get(ymd(2025, 4, 2)).unwrap().len(), 13);
    }

    #[test]
    fn set_slot_is_idempotent_on_disk() {
        let fx = Fixture::new();
        let store = fx.open();
        store.set_slot(ymd(2025, 4, 2), 3, true).unwrap();
        let state_once = store.snapshot();
        let bytes_once = fx.bytes();

        store.set_slot(ymd(2025, 4, 2), 3, true).unwrap();
        assert_eq!(store.snapshot(), state_once);
        assert_eq!(fx.bytes(), bytes_once);
    }

    #[test]
    fn set_slot_creates_missing_date() {
        let fx = Fixture::new();
        let store = fx.open();
        store.set_slot(ymd(2025, 5, 20), 12, true).unwrap();
        let record = store.get(ymd(2025, 5, 20)).unwrap();
        assert_eq!(record.completed_count(), 1);
        assert_eq!(record.get(12), Some(true));
    }

    #[test]
    fn toggle_twice_restores_state() {
        let fx = Fixture::new();
        let store = fx.open();
        let before = store.snapshot();
        let before_bytes = fx.bytes();

        assert!(store.toggle_slot(ymd(2025, 4, 2), 5).unwrap());
        assert!(!store.toggle_slot(ymd(2025, 4, 2), 5).unwrap());
        assert_eq!(store.snapshot(), before);
        assert_eq!(fx.bytes(), before_bytes);
    }

    #[test]
    fn invalid_slot_leaves_memory_and_disk_untouched() {
        let fx = Fixture::new();
        let store = fx.open();
        store.set_slot(ymd(2025, 4, 1), 0, true).unwrap();
        let before = store.snapshot();
        let before_bytes = fx.bytes();

        let err = store.set_slot(ymd(2025, 4, 1), 13, true).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSlotIndex { index: 13, slots: 13 }));
        let err = store.toggle_slot(ymd(2030, 1, 1), 99).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSlotIndex { .. }));

        assert_eq!(store.snapshot(), before);
        assert_eq!(fx.bytes(), before_bytes);
        assert!(store.get(ymd(2030, 1, 1)).is_none());
    }

    #[test]
    fn all_slots_complete_requires_every_slot() {
        let fx = Fixture::new();
        let store = fx.open();
        let day = ymd(2025, 4, 2);
        for i in 0..12 {
            store.set_slot(day, i, true).unwrap();
        }
        assert!(!store.all_slots_complete(day));
        store.set_slot(day, 12, true).unwrap();
        assert!(store.all_slots_complete(day));
        assert!(!store.all_slots_complete(ymd(2026, 1, 1)));
    }

    #[test]
    fn complete_next_walks_open_slots() {
        let fx = Fixture::new();
        let store = fx.open();
        let day = ymd(2025, 4, 2);
        store.set_slot(day, 0, true).unwrap();
        assert_eq!(store.complete_next(day).unwrap(), Some(1));
        for _ in 2..13 {
            store.complete_next(day).unwrap();
        }
        assert!(store.all_slots_complete(day));
        assert_eq!(store.complete_next(day).unwrap(), None);
    }

    #[test]
    fn state_survives_reopen() {
        let fx = Fixture::new();
        let expected = {
            let store = fx.open();
            store.set_slot(ymd(2025, 4, 2), 4, true).unwrap();
            store.toggle_slot(ymd(2025, 4, 3), 0).unwrap();
            store.snapshot()
        };
        let store = fx.open();
        assert_eq!(store.load_status(), LoadStatus::Loaded);
        assert_eq!(store.snapshot(), expected);
    }

    #[test]
    fn deferred_flush_writes_on_flush_and_drop() {
        let fx = Fixture::new();
        let options = fx.options().with_flush(FlushPolicy::Deferred);
        let store = fx.open_with(options.clone());
        let initial = fx.bytes();

        store.set_slot(ymd(2025, 4, 2), 0, true).unwrap();
        assert!(store.is_dirty());
        assert_eq!(fx.bytes(), initial);

        store.flush().unwrap();
        assert!(!store.is_dirty());
        assert_ne!(fx.bytes(), initial);

        store.set_slot(ymd(2025, 4, 2), 1, true).unwrap();
        let expected = store.snapshot();
        drop(store);

        let reopened = fx.open_with(options);
        assert_eq!(reopened.snapshot(), expected);
    }

    #[test]
    fn retain_policy_keeps_days_outside_new_week() {
        let fx = Fixture::new();
        let store = fx.open_with(fx.options().with_reset(ResetPolicy::Retain));
        store.set_slot(ymd(2025, 4, 2), 0, true).unwrap();
        store.set_slot(ymd(2025, 4, 9), 0, true).unwrap();

        store.reset_week(Some(ymd(2025, 4, 7))).unwrap();
        let state = store.snapshot();
        // Old week kept, new week blank (including the lazily-created 04-09)
        assert_eq!(state.get(ymd(2025, 4, 2)).unwrap().get(0), Some(true));
        assert_eq!(state.get(ymd(2025, 4, 9)).unwrap().get(0), Some(false));
        assert_eq!(state.len(), 14);
    }

    #[test]
    fn discard_policy_drops_everything_else() {
        let fx = Fixture::new();
        let store = fx.open();
        store.set_slot(ymd(2025, 6, 1), 0, true).unwrap();
        store.reset_week(Some(ymd(2025, 4, 7))).unwrap();
        assert_eq!(store.snapshot().len(), 7);
        assert!(store.get(ymd(2025, 6, 1)).is_none());
    }

    #[test]
    fn corrupt_canonical_recovers_from_backup_on_open() {
        let fx = Fixture::new();
        let backed_up = {
            let store = fx.open();
            store.set_slot(ymd(2025, 4, 1), 2, true).unwrap();
            let snapshot = store.snapshot();
            store.set_slot(ymd(2025, 4, 1), 3, true).unwrap();
            snapshot
        };
        let path = fx.backend().path().to_path_buf();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..10]).unwrap();

        let store = fx.open();
        assert_eq!(store.load_status(), LoadStatus::RecoveredFromBackup);
        assert_eq!(store.snapshot(), backed_up);
        assert!(fx.log.any(|e| matches!(e, StoreEvent::Corrupt { .. })));
    }

    #[test]
    fn concurrent_toggles_on_different_dates_are_all_persisted() {
        let fx = Fixture::new();
        let store = Arc::new(fx.open());
        let days = [ymd(2025, 3, 31), ymd(2025, 4, 1), ymd(2025, 4, 2), ymd(2025, 4, 3)];

        let handles: Vec<_> = days
            .iter()
            .copied()
            .map(|day| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    // Odd number of toggles per slot leaves every slot set
                    for _ in 0..3 {
                        for slot in 0..13 {
                            store.toggle_slot(day, slot).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for day in days {
            assert!(store.all_slots_complete(day));
        }
        let (on_disk, _) = crate::store::decode(&fx.bytes(), 13).unwrap();
        assert_eq!(on_disk, store.snapshot());
    }

    #[test]
    fn slot_events_reach_the_log() {
        let fx = Fixture::new();
        let store = fx.open();
        store.toggle_slot(ymd(2025, 4, 2), 0).unwrap();
        store.set_slot(ymd(2025, 4, 2), 0, false).unwrap();

        let messages: Vec<String> = fx
            .log
            .events()
            .iter()
            .filter(|e| matches!(e, StoreEvent::SlotSet { .. } | StoreEvent::SlotToggled { .. }))
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "User completed squats for 8:00 AM on 2025-04-02.",
                "User undid squats for 8:00 AM on 2025-04-02."
            ]
        );
        assert!(fx.log.any(|e| matches!(e, StoreEvent::Saved { .. })));
    }

    #[test]
    fn statuses_use_the_store_clock() {
        let fx = Fixture::new();
        let store = fx.open();
        // FixedClock::on pins noon: 11:45 AM is current, 12:30 PM upcoming
        let statuses = store.statuses(ymd(2025, 4, 2));
        assert_eq!(statuses[0], SlotStatus::Missed);
        assert_eq!(statuses[5], SlotStatus::Current);
        assert_eq!(statuses[6], SlotStatus::Upcoming);
    }
}
