//! Month grid construction.
//!
//! A grid covers whole Sunday-to-Saturday weeks, padding the displayed month
//! with trailing days of the previous month and leading days of the next.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;

use crate::event::Event;
use crate::occurrence::occurrences_on;

pub const DAYS_PER_WEEK: usize = 7;

/// One day of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    /// Sorted by start time, untimed events first.
    pub occurrences: Vec<&'a Event>,
}

/// The cells of one displayed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid<'a> {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    /// Build the grid for the month containing `reference`.
    ///
    /// `today` only drives the `is_today` flag, so the result is fully
    /// determined by the arguments. Months at the very ends of the date
    /// range get a partial first or last week.
    pub fn build(reference: NaiveDate, today: NaiveDate, events: &'a [Event]) -> Self {
        let (first, last) = month_bounds(reference);

        let lead = first.weekday().num_days_from_sunday();
        let trail = 6 - last.weekday().num_days_from_sunday();
        // Padding stops at the ends of the representable date range.
        let start = first
            .checked_sub_signed(Duration::days(i64::from(lead)))
            .unwrap_or(NaiveDate::MIN);
        let end = last
            .checked_add_signed(Duration::days(i64::from(trail)))
            .unwrap_or(NaiveDate::MAX);

        let cells = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let mut occurrences = occurrences_on(date, events);
                occurrences.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

                DayCell {
                    date,
                    is_current_month: date.year() == first.year() && date.month() == first.month(),
                    is_today: date == today,
                    occurrences,
                }
            })
            .collect();

        MonthGrid {
            year: first.year(),
            month: first.month(),
            cells,
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell<'a>]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.cells.first().map(|c| c.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.cells.last().map(|c| c.date)
    }

    /// e.g. "February 2024"
    pub fn month_label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }
}

/// Grid for the month containing `reference`, with today taken from the local clock.
pub fn build_grid(reference: NaiveDate, events: &[Event]) -> MonthGrid<'_> {
    MonthGrid::build(reference, Local::now().date_naive(), events)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date - Duration::days(i64::from(date.day0()));
    let last = first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .last()
        .unwrap_or(first);
    (first, last)
}
