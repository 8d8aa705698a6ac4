//! Occurrence engine: which events fall on a given day.

use chrono::NaiveDate;

use crate::event::Event;

impl Event {
    /// Whether this event has an occurrence on `date`.
    ///
    /// Non-repeating events cover their whole `[start_date, end_date]` span.
    /// Repeating events are bounded by `start_date` and `recurrence.until`
    /// only; `end_date` plays no part in the series.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        let rule = &self.recurrence.rule;

        if !rule.is_recurring() {
            return self.start_date <= date && date <= self.end_date;
        }

        if date < self.start_date {
            return false;
        }
        if let Some(until) = self.recurrence.until
            && date > until
        {
            return false;
        }

        rule.matches(self.start_date, date)
    }
}

/// Events from `events` that occur on `date`, at most once each.
///
/// Order follows `events`; callers sort for display.
pub fn occurrences_on(date: NaiveDate, events: &[Event]) -> Vec<&Event> {
    events.iter().filter(|event| event.occurs_on(date)).collect()
}
