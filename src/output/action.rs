use chrono::NaiveDate;
use serde::Serialize;

use crate::output::day::encouragement;

/// Outcome of a mutating command (`set`, `toggle`, `next`)
#[derive(Debug, Serialize)]
pub(crate) struct ActionReport {
    pub(crate) date: NaiveDate,
    /// `None` when `next` found nothing left to mark
    pub(crate) slot: Option<usize>,
    pub(crate) time: Option<String>,
    pub(crate) completed: bool,
    pub(crate) day_complete: bool,
}

fn describe(report: &ActionReport) -> String {
    match (&report.time, report.completed) {
        (Some(time), true) => format!("Marked {time} on {} as done.", report.date),
        (Some(time), false) => format!("Marked {time} on {} as not done.", report.date),
        (None, _) => format!("Every slot on {} is already done.", report.date),
    }
}

pub(crate) fn print_action(report: &ActionReport, use_color: bool) {
    println!("{}", describe(report));
    if report.completed && report.slot.is_some() {
        let line = if report.day_complete {
            format!("That's every slot for the day! {}", encouragement(report.date))
        } else {
            encouragement(report.date).to_string()
        };
        if use_color {
            println!("\x1b[32m{line}\x1b[0m");
        } else {
            println!("{line}");
        }
    }
}

pub(crate) fn output_action_json(report: &ActionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(time: Option<&str>, completed: bool) -> ActionReport {
        ActionReport {
            date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            slot: time.map(|_| 0),
            time: time.map(str::to_string),
            completed,
            day_complete: false,
        }
    }

    #[test]
    fn describes_each_outcome() {
        assert_eq!(
            describe(&report(Some("8:00 AM"), true)),
            "Marked 8:00 AM on 2025-04-02 as done."
        );
        assert_eq!(
            describe(&report(Some("8:00 AM"), false)),
            "Marked 8:00 AM on 2025-04-02 as not done."
        );
        assert_eq!(
            describe(&report(None, true)),
            "Every slot on 2025-04-02 is already done."
        );
    }

    #[test]
    fn json_uses_null_slot_when_nothing_marked() {
        let value: serde_json::Value =
            serde_json::from_str(&output_action_json(&report(None, true)).unwrap()).unwrap();
        assert!(value["slot"].is_null());
        assert_eq!(value["date"], "2025-04-02");
    }
}
