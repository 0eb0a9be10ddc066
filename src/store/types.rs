use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::utils::week_dates;

/// Per-date completion flags, one per slot of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    slots: Vec<bool>,
}

/// What load-time normalization did to a record whose length disagreed with the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalization {
    pub date: NaiveDate,
    pub found: usize,
    pub expected: usize,
    /// `true` entries lost to truncation
    pub dropped_completions: usize,
}

impl DayRecord {
    pub fn new(slot_count: usize) -> Self {
        DayRecord {
            slots: vec![false; slot_count],
        }
    }

    /// Build a record of exactly `slot_count` entries from stored flags,
    /// padding with `false` or truncating. Returns what changed, if anything.
    pub(crate) fn normalized(
        date: NaiveDate,
        mut flags: Vec<bool>,
        slot_count: usize,
    ) -> (Self, Option<Normalization>) {
        let found = flags.len();
        if found == slot_count {
            return (DayRecord { slots: flags }, None);
        }
        let dropped_completions = flags.iter().skip(slot_count).filter(|b| **b).count();
        flags.resize(slot_count, false);
        let note = Normalization {
            date,
            found,
            expected: slot_count,
            dropped_completions,
        };
        (DayRecord { slots: flags }, Some(note))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.slots.get(index).copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.slots
    }

    /// Caller has already validated `index`.
    pub(crate) fn set(&mut self, index: usize, completed: bool) -> bool {
        let previous = self.slots[index];
        self.slots[index] = completed;
        previous
    }

    pub fn completed_count(&self) -> usize {
        self.slots.iter().filter(|b| **b).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|b| *b)
    }

    pub fn first_incomplete(&self) -> Option<usize> {
        self.slots.iter().position(|b| !*b)
    }
}

/// The whole completion grid: date → record.
///
/// Every record has exactly `slot_count` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    slot_count: usize,
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl TrackerState {
    pub fn empty(slot_count: usize) -> Self {
        TrackerState {
            slot_count,
            days: BTreeMap::new(),
        }
    }

    /// Seven all-`false` days beginning at `start`.
    pub fn fresh_week(start: NaiveDate, slot_count: usize) -> Self {
        let days = week_dates(start)
            .map(|d| (d, DayRecord::new(slot_count)))
            .collect();
        TrackerState { slot_count, days }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayRecord)> {
        self.days.iter().map(|(d, r)| (*d, r))
    }

    /// Records must already be normalized to `slot_count`.
    pub(crate) fn insert(&mut self, date: NaiveDate, record: DayRecord) {
        debug_assert_eq!(record.len(), self.slot_count);
        self.days.insert(date, record);
    }

    /// Set one slot, creating the day lazily. Returns the previous value.
    pub fn set(&mut self, date: NaiveDate, index: usize, completed: bool) -> Result<bool, StoreError> {
        if index >= self.slot_count {
            return Err(StoreError::InvalidSlotIndex {
                index,
                slots: self.slot_count,
            });
        }
        let slot_count = self.slot_count;
        let record = self
            .days
            .entry(date)
            .or_insert_with(|| DayRecord::new(slot_count));
        Ok(record.set(index, completed))
    }

    pub(crate) fn into_days(self) -> impl Iterator<Item = (NaiveDate, DayRecord)> {
        self.days.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fresh_week_has_seven_blank_days() {
        let state = TrackerState::fresh_week(ymd(2025, 3, 31), 13);
        let dates: Vec<_> = state.dates().collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates.first(), Some(&ymd(2025, 3, 31)));
        assert_eq!(dates.last(), Some(&ymd(2025, 4, 6)));
        for (_, record) in state.iter() {
            assert_eq!(record.len(), 13);
            assert_eq!(record.completed_count(), 0);
        }
    }

    #[test]
    fn set_creates_missing_day() {
        let mut state = TrackerState::fresh_week(ymd(2025, 3, 31), 3);
        let outside = ymd(2025, 5, 1);
        assert!(!state.contains(outside));
        let previous = state.set(outside, 2, true).unwrap();
        assert!(!previous);
        assert_eq!(state.get(outside).unwrap().as_slice(), &[false, false, true]);
        assert_eq!(state.len(), 8);
    }

    #[test]
    fn set_rejects_out_of_range_without_touching_state() {
        let mut state = TrackerState::fresh_week(ymd(2025, 3, 31), 3);
        let before = state.clone();
        let err = state.set(ymd(2025, 5, 1), 3, true).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSlotIndex { index: 3, slots: 3 }));
        assert_eq!(state, before);
    }

    #[test]
    fn normalization_pads_short_records() {
        let date = ymd(2025, 4, 1);
        let (record, note) = DayRecord::normalized(date, vec![true, false], 4);
        assert_eq!(record.as_slice(), &[true, false, false, false]);
        let note = note.unwrap();
        assert_eq!((note.found, note.expected, note.dropped_completions), (2, 4, 0));
    }

    #[test]
    fn normalization_truncates_and_counts_lost_completions() {
        let date = ymd(2025, 4, 1);
        let (record, note) = DayRecord::normalized(date, vec![true, false, true, true], 2);
        assert_eq!(record.as_slice(), &[true, false]);
        assert_eq!(note.unwrap().dropped_completions, 2);
    }

    #[test]
    fn normalization_is_silent_for_matching_length() {
        let (_, note) = DayRecord::normalized(ymd(2025, 4, 1), vec![false; 3], 3);
        assert!(note.is_none());
    }

    #[test]
    fn completeness_helpers() {
        let mut record = DayRecord::new(3);
        assert_eq!(record.first_incomplete(), Some(0));
        record.set(0, true);
        record.set(1, true);
        assert!(!record.is_complete());
        assert_eq!(record.first_incomplete(), Some(2));
        record.set(2, true);
        assert!(record.is_complete());
        assert_eq!(record.first_incomplete(), None);
        assert!(!DayRecord::new(0).is_complete());
    }
}
