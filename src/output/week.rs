use comfy_table::{Cell, Color, Table};
use serde::Serialize;

use squats::WeekSummary;

use crate::output::format::{
    create_styled_table, format_percent, header_cell, progress_bar, right_cell, styled_cell,
};

#[derive(Serialize)]
struct WeekJson<'a> {
    #[serde(flatten)]
    summary: &'a WeekSummary,
    completed: usize,
    total: usize,
    perfect_days: usize,
}

fn build_week_table(week: &WeekSummary, use_color: bool) -> Table {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Date", use_color),
        header_cell("Day", use_color),
        header_cell("Done", use_color),
        header_cell("Progress", use_color),
    ]);

    let green = if use_color { Some(Color::Green) } else { None };
    for day in &week.days {
        let width = day.total.max(1);
        let done = if day.present {
            format!("{}/{}", day.completed, day.total)
        } else {
            "-".to_string()
        };
        let color = if day.is_complete() { green } else { None };
        table.add_row(vec![
            Cell::new(day.date.to_string()),
            Cell::new(day.date.format("%a").to_string()),
            right_cell(&done, color, false),
            styled_cell(&progress_bar(day.completed, day.total, width), color, false),
        ]);
    }

    let cyan = if use_color { Some(Color::Cyan) } else { None };
    table.add_row(vec![
        styled_cell("TOTAL", cyan, true),
        Cell::new(""),
        right_cell(&format!("{}/{}", week.completed(), week.total()), cyan, true),
        styled_cell(&format_percent(week.ratio()), cyan, true),
    ]);
    table
}

pub(crate) fn print_week_table(week: &WeekSummary, use_color: bool) {
    println!("\n  Week of {}\n", week.start);
    println!("{}", build_week_table(week, use_color));
    let perfect = week.perfect_days();
    let plural = if perfect == 1 { "" } else { "s" };
    println!("\n  {perfect} perfect day{plural} this week\n");
}

pub(crate) fn output_week_json(week: &WeekSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&WeekJson {
        summary: week,
        completed: week.completed(),
        total: week.total(),
        perfect_days: week.perfect_days(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use squats::TrackerState;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_week() -> WeekSummary {
        let mut state = TrackerState::fresh_week(ymd(2025, 3, 31), 2);
        state.set(ymd(2025, 3, 31), 0, true).unwrap();
        state.set(ymd(2025, 3, 31), 1, true).unwrap();
        state.set(ymd(2025, 4, 1), 0, true).unwrap();
        WeekSummary::from_state(&state, ymd(2025, 3, 31))
    }

    #[test]
    fn week_json_has_totals_and_days() {
        let value: serde_json::Value =
            serde_json::from_str(&output_week_json(&sample_week()).unwrap()).unwrap();
        assert_eq!(value["start"], "2025-03-31");
        assert_eq!(value["completed"], 3);
        assert_eq!(value["total"], 14);
        assert_eq!(value["perfect_days"], 1);
        assert_eq!(value["days"].as_array().unwrap().len(), 7);
        assert_eq!(value["days"][1]["next_slot"], 1);
    }

    #[test]
    fn week_table_has_total_row() {
        let rendered = build_week_table(&sample_week(), false).to_string();
        assert!(rendered.contains("2025-04-06"));
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains("3/14"));
        assert!(rendered.contains("Mon"));
    }
}
