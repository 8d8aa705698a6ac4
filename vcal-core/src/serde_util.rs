//! Lenient field decoders.
//!
//! Event records come from form submissions, where an untouched input is an
//! empty string rather than a missing key.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::event::Event;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// `""` (or whitespace) reads as `None`.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Optional `YYYY-MM-DD`; `""` reads as `None`. A full timestamp is cut to its date.
pub(crate) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = value.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{}': {}", raw, e)))
}

/// `null` reads as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a list of events, skipping (and logging) entries that do not decode.
pub(crate) fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<Event>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = Option::deserialize(deserializer)?.unwrap_or_default();
    Ok(decode_events(values))
}

pub(crate) fn decode_events(values: Vec<serde_json::Value>) -> Vec<Event> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Event>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed event: {}", e);
                None
            }
        })
        .collect()
}
