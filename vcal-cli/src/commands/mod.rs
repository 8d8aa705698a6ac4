pub mod config;
pub mod day;
pub mod delete;
pub mod edit;
pub mod month;
pub mod new;
pub mod show;
pub mod watch;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Args;
use tracing::debug;
use vcal_core::{CalendarApp, EventDraft, Recurrence, RecurrenceRule, StoreKind, VcalConfig};

use crate::utils::date::{parse_date, parse_time};
use crate::utils::tui;

/// Optional event fields shared by `new` and `edit`.
#[derive(Args, Debug, Default)]
pub struct EventFields {
    /// Start date (YYYY-MM-DD, "tomorrow", "next fri", ...)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Last day of the event (inclusive)
    #[arg(long, conflicts_with = "span")]
    pub end: Option<String>,

    /// Length instead of an end date (e.g. "3days", "1week")
    #[arg(long = "for", id = "span", value_name = "DURATION")]
    pub span: Option<String>,

    /// Start time (HH:MM)
    #[arg(long)]
    pub start_time: Option<String>,

    /// End time (HH:MM)
    #[arg(long)]
    pub end_time: Option<String>,

    #[arg(short, long)]
    pub location: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Display color, e.g. "#ff6600"
    #[arg(long)]
    pub color: Option<String>,

    /// none, daily, weekly, monthly or yearly
    #[arg(short, long)]
    pub repeat: Option<RecurrenceRule>,

    /// Last day of the series (inclusive)
    #[arg(long)]
    pub until: Option<String>,
}

impl EventFields {
    /// Apply the given fields on top of `draft`. An empty string clears an
    /// optional text field.
    pub fn apply(self, mut draft: EventDraft) -> Result<EventDraft> {
        if let Some(date) = self.date {
            let start = parse_date(&date)?;
            let length = draft.end_date - draft.start_date;
            draft.start_date = start;
            draft.end_date = start + length;
        }

        if let Some(end) = self.end {
            draft.end_date = parse_date(&end)?;
        }

        if let Some(span) = self.span {
            let std_dur = humantime::parse_duration(&span)
                .with_context(|| format!("Could not parse duration: \"{}\"", span))?;
            let days = Duration::from_std(std_dur).context("Duration too large")?.num_days();
            // "1day" covers only the start date.
            draft.end_date = draft.start_date + Duration::days((days - 1).max(0));
        }

        if let Some(time) = self.start_time {
            draft.start_time = optional(time).map(|t| parse_time(&t)).transpose()?;
        }
        if let Some(time) = self.end_time {
            draft.end_time = optional(time).map(|t| parse_time(&t)).transpose()?;
        }
        if let Some(location) = self.location {
            draft.location = optional(location);
        }
        if let Some(description) = self.description {
            draft.description = optional(description);
        }
        if let Some(color) = self.color {
            draft.color = color;
        }

        let until = match self.until {
            Some(until) => optional(until).map(|u| parse_date(&u)).transpose()?,
            None => draft.recurrence.until,
        };
        let rule = self.repeat.unwrap_or_else(|| draft.recurrence.rule.clone());
        draft.recurrence = Recurrence::new(rule, until);

        Ok(draft)
    }
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Open the configured store and load the events, showing `reference`'s month.
pub async fn open_app(config: &VcalConfig, reference: NaiveDate) -> Result<CalendarApp> {
    debug!("Opening {:?} store", config.store);
    let store = config.open_store().await?;

    let spinner = match config.store {
        StoreKind::Remote => Some(tui::create_spinner(format!("Connecting to {}", config.server_url))),
        StoreKind::Local => None,
    };

    let result = CalendarApp::load(store, reference).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    result.with_context(|| match config.store {
        StoreKind::Remote => format!("Could not load events from {}", config.server_url),
        StoreKind::Local => "Could not load events".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn moving_start_keeps_length() {
        let mut draft = EventDraft::new("Trip", date(2024, 3, 1));
        draft.end_date = date(2024, 3, 3);

        let fields = EventFields {
            date: Some("2024-04-10".into()),
            ..Default::default()
        };
        let draft = fields.apply(draft).unwrap();

        assert_eq!(draft.start_date, date(2024, 4, 10));
        assert_eq!(draft.end_date, date(2024, 4, 12));
    }

    #[test]
    fn span_sets_inclusive_end() {
        let fields = EventFields {
            span: Some("3days".into()),
            ..Default::default()
        };
        let draft = fields.apply(EventDraft::new("Trip", date(2024, 3, 1))).unwrap();
        assert_eq!(draft.end_date, date(2024, 3, 3));
    }

    #[test]
    fn empty_values_clear_fields() {
        let mut draft = EventDraft::new("Lunch", date(2024, 3, 1));
        draft.location = Some("Cafe".into());
        draft.start_time = Some("12:00".into());

        let fields = EventFields {
            location: Some(String::new()),
            start_time: Some(String::new()),
            ..Default::default()
        };
        let draft = fields.apply(draft).unwrap();

        assert_eq!(draft.location, None);
        assert_eq!(draft.start_time, None);
    }

    #[test]
    fn repeat_and_until() {
        let fields = EventFields {
            repeat: Some(RecurrenceRule::Weekly),
            until: Some("2024-06-30".into()),
            ..Default::default()
        };
        let draft = fields.apply(EventDraft::new("Standup", date(2024, 3, 4))).unwrap();

        assert_eq!(draft.recurrence.rule, RecurrenceRule::Weekly);
        assert_eq!(draft.recurrence.until, Some(date(2024, 6, 30)));
    }

    #[test]
    fn until_without_repeat_is_dropped() {
        let fields = EventFields {
            until: Some("2024-06-30".into()),
            ..Default::default()
        };
        let draft = fields.apply(EventDraft::new("Once", date(2024, 3, 4))).unwrap();
        assert_eq!(draft.recurrence.until, None);
    }
}
