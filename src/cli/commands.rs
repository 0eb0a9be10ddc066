//! CLI subcommand definitions

use clap::{Subcommand, ValueEnum};

/// Target value for `set`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SlotState {
    Done,
    Undone,
}

impl SlotState {
    pub(crate) fn completed(self) -> bool {
        matches!(self, SlotState::Done)
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Show today's slots and progress (default)
    Today,
    /// Show the slots of one date
    Show {
        /// YYYY-MM-DD, YYYYMMDD or "today"
        date: String,
    },
    /// Show seven days of progress
    Week {
        /// First day of the week (default: Monday of the current week)
        #[arg(long, value_name = "DATE")]
        start: Option<String>,
    },
    /// List the daily time slots
    Slots,
    /// Mark a slot as done or undone
    Set {
        date: String,
        /// Slot index or time label (e.g. "2" or "9:30 AM")
        slot: String,
        #[arg(value_enum)]
        state: SlotState,
    },
    /// Flip a slot between done and undone
    Toggle { date: String, slot: String },
    /// Mark the next open slot of a date as done
    Next {
        /// Defaults to today
        date: Option<String>,
    },
    /// Start a fresh week
    Reset {
        /// First day of the new week (default: Monday of the current week)
        #[arg(long, value_name = "DATE")]
        start: Option<String>,
    },
}
