//! Instant parsing and ISO-8601 serialization helpers.
//!
//! Resolved records render instants as `2019-02-05T12:50:00.000Z` (millisecond
//! precision, `Z` suffix). Incoming strings are accepted as RFC 3339, as a date-time
//! without an offset (read as UTC), or as a bare `YYYY-MM-DD` date, which is read as
//! midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

/// Parses a timestamp string into an instant.
///
/// Returns `None` when the string is not RFC 3339, an offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` or a `YYYY-MM-DD` date.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats an instant the way resolved records expose it.
pub fn format_instant(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod iso_millis {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_instant(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                parse_instant(&raw)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
            })
            .transpose()
    }
}

/// Serde adapter for patch fields where `null` and absence mean different things.
///
/// Use together with `#[serde(default)]`: an absent field stays `None`, an explicit
/// `null` becomes `Some(None)`.
pub mod nullable_iso_millis {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::iso_millis::deserialize(deserializer).map(Some)
    }
}

/// Deserializes a present field into `Some`, so `Option<Option<T>>` can tell `null` from absence.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
