//! Daily time-slot table
//!
//! The table is the schema shared by every [`DayRecord`](crate::store::DayRecord):
//! slot `i` of a record refers to `table.get(i)`. It is built once and never
//! changes while a store is open.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use crate::consts::DEFAULT_SLOT_LABELS;
use crate::error::ScheduleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub label: String,
    pub time: NaiveTime,
}

impl TimeSlot {
    pub fn parse(label: &str) -> Result<Self, ScheduleError> {
        let trimmed = label.trim();
        let time = NaiveTime::parse_from_str(trimmed, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map_err(|_| ScheduleError::InvalidTime {
                label: trimmed.to_string(),
            })?;
        Ok(TimeSlot {
            label: trimmed.to_string(),
            time,
        })
    }
}

/// How a slot looks from a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Completed,
    Current,
    Missed,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: Vec<TimeSlot>,
}

impl Default for SlotTable {
    fn default() -> Self {
        // The built-in labels are valid and ordered; see `default_table_has_thirteen_slots`.
        Self::from_labels(DEFAULT_SLOT_LABELS).unwrap_or(SlotTable { slots: Vec::new() })
    }
}

impl SlotTable {
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: Vec<TimeSlot> = Vec::new();
        for label in labels {
            let slot = TimeSlot::parse(label.as_ref())?;
            if let Some(prev) = slots.last()
                && prev.time >= slot.time
            {
                return Err(ScheduleError::OutOfOrder { label: slot.label });
            }
            slots.push(slot);
        }
        if slots.is_empty() {
            return Err(ScheduleError::Empty);
        }
        Ok(SlotTable { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimeSlot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.label.clone()).collect()
    }

    /// Label for `index`, or `"slot N"` when out of range
    pub fn label(&self, index: usize) -> String {
        self.get(index)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| format!("slot {index}"))
    }

    /// Resolve user input to a slot index: a plain index or a label
    /// (case-insensitive, whitespace-trimmed).
    pub fn resolve(&self, input: &str) -> Option<usize> {
        let trimmed = input.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return (index < self.len()).then_some(index);
        }
        self.slots
            .iter()
            .position(|s| s.label.eq_ignore_ascii_case(trimmed))
    }

    /// Length of the interval that starts at slot `index`.
    ///
    /// Each slot runs until the next one begins; the last slot reuses the
    /// interval before it (or one hour for a single-slot table).
    fn interval(&self, index: usize) -> TimeDelta {
        if let Some(next) = self.slots.get(index + 1) {
            return next.time - self.slots[index].time;
        }
        if index > 0 {
            return self.slots[index].time - self.slots[index - 1].time;
        }
        TimeDelta::hours(1)
    }

    /// Classify every slot of `date` as seen at `now`.
    pub fn statuses(&self, completed: &[bool], date: NaiveDate, now: NaiveDateTime) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                if completed.get(i).copied().unwrap_or(false) {
                    return SlotStatus::Completed;
                }
                let start = date.and_time(slot.time);
                let end = start
                    .checked_add_signed(self.interval(i))
                    .unwrap_or(NaiveDateTime::MAX);
                if now < start {
                    SlotStatus::Upcoming
                } else if now < end {
                    SlotStatus::Current
                } else {
                    SlotStatus::Missed
                }
            })
            .collect()
    }
}
