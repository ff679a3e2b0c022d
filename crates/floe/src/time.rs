//! Timestamp parsing and formatting for bookmarks and the start date.
//!
//! Bookmarks are written as RFC 3339 with an explicit `+00:00` offset.
//! Parsing is lenient so hand-written configs and older state files work:
//!
//! ```
//! use floe::time::{format_timestamp, parse_timestamp};
//!
//! let ts = parse_timestamp("2020-02-01").unwrap();
//! assert_eq!(format_timestamp(&ts), "2020-02-01T00:00:00+00:00");
//!
//! let ts = parse_timestamp("2020-02-01T10:30:00Z").unwrap();
//! assert_eq!(format_timestamp(&ts), "2020-02-01T10:30:00+00:00");
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp, accepting RFC 3339, a naive date-time (assumed UTC),
/// or a bare date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp as RFC 3339 with a `+00:00` offset.
///
/// Sub-second precision is kept only when present.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Serde adapter writing [`format_timestamp`] and reading [`parse_timestamp`].
pub mod serde_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("'{raw}' is not a valid timestamp")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2020-02-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2020-01-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-01 12:30:00"), Some(expected));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_keeps_fractional_seconds() {
        let ts = Utc.timestamp_millis_opt(1_580_515_200_250).unwrap();
        assert_eq!(format_timestamp(&ts), "2020-02-01T00:00:00.250+00:00");
    }
}
