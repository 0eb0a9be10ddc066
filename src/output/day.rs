use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Color, Table};
use serde::Serialize;

use squats::{DaySummary, SlotStatus, SlotTable};

use crate::output::format::{
    create_styled_table, format_percent, header_cell, progress_bar, right_cell, status_cell,
    styled_cell,
};

const ENCOURAGEMENTS: [&str; 5] = [
    "Keep up the fantastic effort!",
    "Way to go! You're doing great!",
    "Your body thanks you for staying active!",
    "Amazing! You're hitting your goals!",
    "Fantastic progress, keep crushing it!",
];

/// One of the encouragement lines, stable for a given date
pub(crate) fn encouragement(date: NaiveDate) -> &'static str {
    ENCOURAGEMENTS[date.ordinal0() as usize % ENCOURAGEMENTS.len()]
}

#[derive(Serialize)]
struct SlotJson<'a> {
    index: usize,
    time: &'a str,
    done: bool,
    status: SlotStatus,
}

#[derive(Serialize)]
struct DayJson<'a> {
    date: NaiveDate,
    completed: usize,
    total: usize,
    complete: bool,
    next_slot: Option<usize>,
    slots: Vec<SlotJson<'a>>,
}

fn build_day_table(slots: &SlotTable, statuses: &[SlotStatus], use_color: bool) -> Table {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("#", use_color),
        header_cell("Time", use_color),
        header_cell("Status", use_color),
    ]);
    for (i, (slot, status)) in slots.iter().zip(statuses).enumerate() {
        table.add_row(vec![
            right_cell(&i.to_string(), None, false),
            Cell::new(&slot.label),
            status_cell(*status, use_color),
        ]);
    }
    table
}

pub(crate) fn print_day_table(
    summary: &DaySummary,
    slots: &SlotTable,
    statuses: &[SlotStatus],
    use_color: bool,
) {
    let title = format!("{} ({})", summary.date, summary.date.format("%A"));
    println!("\n  {title}\n");
    println!("{}", build_day_table(slots, statuses, use_color));

    let bar = progress_bar(summary.completed, summary.total, 20);
    println!(
        "\n  {bar} {}/{} ({})",
        summary.completed,
        summary.total,
        format_percent(summary.ratio())
    );
    if summary.is_complete() {
        let line = format!("All slots done! {}", encouragement(summary.date));
        if use_color {
            println!("  \x1b[32m{line}\x1b[0m\n");
        } else {
            println!("  {line}\n");
        }
    } else if let Some(next) = summary.next_slot {
        println!("  Next open slot: {}\n", slots.label(next));
    } else {
        println!();
    }
}

pub(crate) fn output_day_json(
    summary: &DaySummary,
    slots: &SlotTable,
    statuses: &[SlotStatus],
) -> Result<String, serde_json::Error> {
    let day = DayJson {
        date: summary.date,
        completed: summary.completed,
        total: summary.total,
        complete: summary.is_complete(),
        next_slot: summary.next_slot,
        slots: slots
            .iter()
            .zip(statuses)
            .enumerate()
            .map(|(index, (slot, status))| SlotJson {
                index,
                time: &slot.label,
                done: *status == SlotStatus::Completed,
                status: *status,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&day)
}

pub(crate) fn print_slot_table(slots: &SlotTable, use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![header_cell("#", use_color), header_cell("Time", use_color)]);
    let cyan = if use_color { Some(Color::Cyan) } else { None };
    for (i, slot) in slots.iter().enumerate() {
        table.add_row(vec![
            right_cell(&i.to_string(), None, false),
            styled_cell(&slot.label, cyan, false),
        ]);
    }
    println!("\n  Daily Slots\n");
    println!("{table}");
}

pub(crate) fn output_slots_json(slots: &SlotTable) -> Result<String, serde_json::Error> {
    let rows: Vec<_> = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            serde_json::json!({
                "index": index,
                "time": slot.label,
                "at": slot.time.format("%H:%M").to_string(),
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}
