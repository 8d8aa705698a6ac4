//! Event types.
//!
//! Records are stored and sent over the wire as camelCase JSON, the same
//! shape the browser client writes.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{VcalError, VcalResult};
use crate::recurrence::{Recurrence, RecurrenceRule};
use crate::serde_util::{empty_as_none, null_as_default};

pub const DEFAULT_COLOR: &str = "#007bff";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// A stored base event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Time of day ("HH:MM"). Only used to order events within a day.
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub recurrence: Recurrence,
}

/// Everything needed to create an event; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub recurrence: Recurrence,
}

impl EventDraft {
    /// A single-day, non-repeating draft on `date`.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        EventDraft {
            title: title.into(),
            start_date: date,
            end_date: date,
            start_time: None,
            end_time: None,
            location: None,
            description: None,
            color: default_color(),
            recurrence: Recurrence::default(),
        }
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule, until: Option<NaiveDate>) -> Self {
        self.recurrence = Recurrence::new(rule, until);
        self
    }

    pub fn validate(&self) -> VcalResult<()> {
        if self.title.trim().is_empty() {
            return Err(VcalError::InvalidEvent("title must not be empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(VcalError::InvalidEvent(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

impl Event {
    pub fn from_draft(id: impl Into<String>, draft: EventDraft) -> Self {
        Event {
            id: id.into(),
            title: draft.title,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: draft.location,
            description: draft.description,
            color: draft.color,
            recurrence: draft.recurrence,
        }
    }

    /// A new event with a freshly generated id.
    pub fn create(draft: EventDraft) -> Self {
        Event::from_draft(uuid::Uuid::new_v4().to_string(), draft)
    }

    /// The editable fields of this event, e.g. to pre-fill an edit form.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            recurrence: self.recurrence.clone(),
        }
    }

    pub fn validate(&self) -> VcalResult<()> {
        if self.id.trim().is_empty() {
            return Err(VcalError::InvalidEvent("id must not be empty".into()));
        }
        self.to_draft().validate()
    }

    /// Key for ordering events within a day. Untimed events sort first.
    pub fn sort_key(&self) -> &str {
        self.start_time.as_deref().unwrap_or("")
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    /// Human-readable span, e.g. "2024-03-01 09:00 → 2024-03-03".
    pub fn render_span(&self) -> String {
        let with_time = |date: NaiveDate, time: &Option<String>| match time {
            Some(t) => format!("{} {}", date, t),
            None => date.to_string(),
        };

        let start = with_time(self.start_date, &self.start_time);
        if self.start_date == self.end_date && self.end_time.is_none() {
            return start;
        }
        if self.start_date == self.end_date
            && let Some(end_time) = &self.end_time
        {
            return format!("{}–{}", start, end_time);
        }
        format!("{} → {}", start, with_time(self.end_date, &self.end_time))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
