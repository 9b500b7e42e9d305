//! Deserializers for the extraction engine's loose date encodings.
//!
//! Upstream records carry dates either as Unix timestamps or compact
//! `YYYYMMDD` strings; our own serialized form is RFC 3339. All three
//! spellings are accepted on the way in.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

fn from_raw<'de, D: Deserializer<'de>>(raw: RawDate) -> Result<DateTime<Utc>, D::Error> {
    match raw {
        RawDate::Seconds(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}"))),
        RawDate::Fractional(secs) => Utc
            .timestamp_opt(secs as i64, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}"))),
        RawDate::Text(text) => parse_text(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date: {text:?}"))),
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y%m%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Optional date field: Unix seconds, `YYYYMMDD`, or RFC 3339.
pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDate> = Option::deserialize(deserializer)?;
    raw.map(from_raw::<D>).transpose()
}
