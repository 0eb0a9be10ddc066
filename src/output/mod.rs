mod action;
mod day;
mod format;
mod week;

pub(crate) use action::{ActionReport, output_action_json, print_action};
pub(crate) use day::{output_day_json, output_slots_json, print_day_table, print_slot_table};
pub(crate) use week::{output_week_json, print_week_table};
