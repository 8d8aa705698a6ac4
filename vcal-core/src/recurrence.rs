//! Recurrence rules.
//!
//! A rule only answers "does `date` fall on the cadence that starts at
//! `start`". Series bounds (`start` and `until`) are applied by
//! [`Event::occurs_on`](crate::event::Event::occurs_on).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::serde_util::optional_date;

/// How a base event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum RecurrenceRule {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// A rule name this version does not know. Never matches.
    Unrecognized(String),
}

impl RecurrenceRule {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceRule::None)
    }

    /// Day test for a series starting at `start`.
    ///
    /// Monthly and yearly compare calendar fields literally: a series that
    /// starts on the 31st skips every month without a 31st, and one that
    /// starts on Feb 29 only lands in leap years.
    pub fn matches(&self, start: NaiveDate, date: NaiveDate) -> bool {
        match self {
            RecurrenceRule::None => date == start,
            RecurrenceRule::Daily => true,
            RecurrenceRule::Weekly => date.weekday() == start.weekday(),
            RecurrenceRule::Monthly => date.day() == start.day(),
            RecurrenceRule::Yearly => date.day() == start.day() && date.month() == start.month(),
            RecurrenceRule::Unrecognized(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecurrenceRule::None => "none",
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekly => "weekly",
            RecurrenceRule::Monthly => "monthly",
            RecurrenceRule::Yearly => "yearly",
            RecurrenceRule::Unrecognized(raw) => raw,
        }
    }
}

impl From<Option<String>> for RecurrenceRule {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") | Some("none") => RecurrenceRule::None,
            Some("daily") => RecurrenceRule::Daily,
            Some("weekly") => RecurrenceRule::Weekly,
            Some("monthly") => RecurrenceRule::Monthly,
            Some("yearly") => RecurrenceRule::Yearly,
            Some(other) => RecurrenceRule::Unrecognized(other.to_string()),
        }
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.as_str().to_string()
    }
}

impl FromStr for RecurrenceRule {
    type Err = String;

    /// Strict parse for user input; unknown names are rejected here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match RecurrenceRule::from(Some(s.to_lowercase())) {
            RecurrenceRule::Unrecognized(raw) => Err(format!(
                "Unknown recurrence rule '{}'. Expected one of: none, daily, weekly, monthly, yearly",
                raw
            )),
            rule => Ok(rule),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence settings of a base event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(default)]
    pub rule: RecurrenceRule,

    /// Last date (inclusive) of the series. Unbounded when absent.
    /// Ignored when `rule` is `None`.
    #[serde(default, deserialize_with = "optional_date")]
    pub until: Option<NaiveDate>,
}

impl Recurrence {
    pub fn new(rule: RecurrenceRule, until: Option<NaiveDate>) -> Self {
        // A non-repeating event carries no end date for its series.
        let until = if rule.is_recurring() { until } else { None };
        Recurrence { rule, until }
    }

    pub fn is_recurring(&self) -> bool {
        self.rule.is_recurring()
    }
}
