//! Same-day and same-week aggregation over the completion grid.

use chrono::NaiveDate;
use serde::Serialize;

use super::types::{DayRecord, TrackerState};
use crate::utils::week_dates;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Whether the date has a record at all
    pub present: bool,
    pub completed: usize,
    pub total: usize,
    /// First slot still open, if any
    pub next_slot: Option<usize>,
}

impl DaySummary {
    pub fn new(date: NaiveDate, record: Option<&DayRecord>, total: usize) -> Self {
        match record {
            Some(r) => DaySummary {
                date,
                present: true,
                completed: r.completed_count(),
                total,
                next_slot: r.first_incomplete(),
            },
            None => DaySummary {
                date,
                present: false,
                completed: 0,
                total,
                next_slot: (total > 0).then_some(0),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.present && self.total > 0 && self.completed == self.total
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    pub start: NaiveDate,
    pub days: Vec<DaySummary>,
}

impl WeekSummary {
    pub fn from_state(state: &TrackerState, start: NaiveDate) -> Self {
        let total = state.slot_count();
        let days = week_dates(start)
            .map(|d| DaySummary::new(d, state.get(d), total))
            .collect();
        WeekSummary { start, days }
    }

    pub fn completed(&self) -> usize {
        self.days.iter().map(|d| d.completed).sum()
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(|d| d.total).sum()
    }

    pub fn perfect_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_complete()).count()
    }

    pub fn ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.completed() as f64 / total as f64
        }
    }
}
