//! Terminal rendering for vcal types.
//!
//! Layout is computed on plain text first and colored afterwards, so ANSI
//! escapes never throw off column widths.

use owo_colors::OwoColorize;
use vcal_core::grid::{DayCell, MonthGrid};
use vcal_core::{DEFAULT_COLOR, Event};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Event {
    fn render(&self) -> String {
        let (r, g, b) = event_rgb(self);
        let mut line = format!("{} {}", "●".truecolor(r, g, b), self.title);

        if let Some(time) = &self.start_time {
            let span = match &self.end_time {
                Some(end) => format!("{}–{}", time, end),
                None => time.clone(),
            };
            line = format!("{} {}", span.dimmed(), line);
        }
        if self.is_recurring() {
            line.push_str(&format!(" {}", format!("↻ {}", self.recurrence.rule).dimmed()));
        }
        line
    }
}

/// Width of one day column, excluding the separator.
const CELL_WIDTH: usize = 14;

/// Event lines per day before collapsing into "+N more".
const MAX_EVENT_LINES: usize = 3;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn render_month(grid: &MonthGrid) -> String {
    let total_width = CELL_WIDTH * 7 + 6;
    let mut lines = Vec::new();

    let label = format!("{:^width$}", grid.month_label(), width = total_width);
    lines.push(label.bold().to_string());

    let header: Vec<String> = WEEKDAYS
        .iter()
        .map(|day| format!("{:<width$}", day, width = CELL_WIDTH).dimmed().to_string())
        .collect();
    lines.push(header.join(" "));

    for week in grid.weeks() {
        lines.push("─".repeat(total_width).dimmed().to_string());

        let numbers: Vec<String> = week.iter().map(render_day_number).collect();
        lines.push(numbers.join(" "));

        let week_lines: Vec<Vec<CellLine>> = week.iter().map(event_lines).collect();
        let rows = week_lines.iter().map(Vec::len).max().unwrap_or(0);
        for row in 0..rows {
            let cells: Vec<String> = week_lines
                .iter()
                .map(|cell_lines| match cell_lines.get(row) {
                    Some(line) => line.colored.clone(),
                    None => " ".repeat(CELL_WIDTH),
                })
                .collect();
            lines.push(cells.join(" "));
        }
    }

    lines.join("\n")
}

fn render_day_number(cell: &DayCell) -> String {
    let text = format!("{:<width$}", cell.date.format("%-d").to_string(), width = CELL_WIDTH);

    if cell.is_today {
        text.reversed().bold().to_string()
    } else if cell.is_current_month {
        text.bold().to_string()
    } else {
        text.dimmed().to_string()
    }
}

struct CellLine {
    colored: String,
}

/// The padded, colored lines shown under a day number.
fn event_lines(cell: &DayCell) -> Vec<CellLine> {
    let total = cell.occurrences.len();
    let shown = if total > MAX_EVENT_LINES {
        MAX_EVENT_LINES - 1
    } else {
        total
    };

    let mut lines: Vec<CellLine> = cell.occurrences[..shown]
        .iter()
        .map(|event| {
            let (r, g, b) = event_rgb(event);
            let text = fit(&event.title, CELL_WIDTH);
            let colored = if cell.is_current_month {
                text.truecolor(r, g, b).to_string()
            } else {
                text.truecolor(r, g, b).dimmed().to_string()
            };
            CellLine { colored }
        })
        .collect();

    if shown < total {
        let more = fit(&format!("+{} more", total - shown), CELL_WIDTH);
        lines.push(CellLine {
            colored: more.dimmed().to_string(),
        });
    }

    lines
}

/// Truncate (with an ellipsis) or pad `text` to exactly `width` columns.
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{}{}", text, " ".repeat(width - count));
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn event_rgb(event: &Event) -> (u8, u8, u8) {
    parse_hex(&event.color)
        .or_else(|| parse_hex(DEFAULT_COLOR))
        .unwrap_or((0, 123, 255))
}

/// "#rrggbb" or "#rgb".
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vcal_core::EventDraft;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("Gym", 6), "Gym   ");
        assert_eq!(fit("Quarterly review", 8), "Quarter…");
        assert_eq!(fit("Exactly", 7), "Exactly");
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#007bff"), Some((0, 123, 255)));
        assert_eq!(parse_hex("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex("blue"), None);
        assert_eq!(parse_hex("#12345"), None);
    }

    #[test]
    fn unknown_color_falls_back_to_default() {
        let mut event = Event::from_draft("a", EventDraft::new("A", date(2024, 1, 1)));
        event.color = "tomato".into();
        assert_eq!(event_rgb(&event), (0, 123, 255));
    }

    #[test]
    fn crowded_days_collapse() {
        let day = date(2024, 2, 14);
        let events: Vec<Event> = (0..5)
            .map(|i| Event::from_draft(i.to_string(), EventDraft::new(format!("E{}", i), day)))
            .collect();

        let grid = MonthGrid::build(day, day, &events);
        let cell = grid.cells.iter().find(|c| c.date == day).unwrap();

        let lines = event_lines(cell);
        assert_eq!(lines.len(), MAX_EVENT_LINES);
        assert!(lines[2].colored.contains("+3 more"));
    }

    #[test]
    fn month_has_header_and_weeks() {
        let events = Vec::new();
        let grid = MonthGrid::build(date(2024, 2, 15), date(2024, 2, 15), &events);

        let out = render_month(&grid);
        assert!(out.contains("February 2024"));
        assert!(out.contains("Sun"));
        // title + weekday header + (separator + numbers) per week
        assert_eq!(out.lines().count(), 2 + grid.weeks().count() * 2);
    }
}
