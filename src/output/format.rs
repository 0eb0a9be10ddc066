use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};

use squats::SlotStatus;

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

/// Create a table with the standard preset, inner borders, and normalized header separator.
pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}

pub(super) fn right_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn status_label(status: SlotStatus) -> &'static str {
    match status {
        SlotStatus::Completed => "✓ done",
        SlotStatus::Current => "● now",
        SlotStatus::Missed => "✗ missed",
        SlotStatus::Upcoming => "upcoming",
    }
}

pub(super) fn status_cell(status: SlotStatus, use_color: bool) -> Cell {
    let color = match status {
        SlotStatus::Completed => Some(Color::Green),
        SlotStatus::Current => Some(Color::Yellow),
        SlotStatus::Missed => Some(Color::Red),
        SlotStatus::Upcoming => None,
    };
    let bold = status == SlotStatus::Current;
    styled_cell(status_label(status), color.filter(|_| use_color), bold)
}

pub(super) fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Fixed-width progress bar, e.g. `█████░░░░░`
pub(super) fn progress_bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        (done * width).div_ceil(total).min(width)
    };
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_percent_rounds() {
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(5.0 / 13.0), "38%");
        assert_eq!(format_percent(1.0), "100%");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 13, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(13, 13, 10), "██████████");
        assert_eq!(progress_bar(1, 13, 10), "█░░░░░░░░░");
        assert_eq!(progress_bar(0, 0, 4), "░░░░");
    }

    #[test]
    fn status_labels_are_distinct() {
        let labels = [
            SlotStatus::Completed,
            SlotStatus::Current,
            SlotStatus::Missed,
            SlotStatus::Upcoming,
        ]
        .map(status_label);
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
