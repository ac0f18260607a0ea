//! Timestamp normalizer.
//!
//! Parses date-like text permissively. Offset-aware values are converted
//! to UTC and the offset dropped, so every timestamp in a canonical record
//! is a zone-free UTC clock value and directly comparable.
//! Unparseable text is null. Nothing here returns an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Output format. Fractional seconds are only printed when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Suffixes that spell out UTC without a numeric offset.
const UTC_SUFFIXES: &[&str] = &[" UTC", "UTC", "Z", "z"];

/// A parsed value, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl ParsedTimestamp {
    /// Zone-free UTC clock value.
    pub fn to_utc_naive(self) -> NaiveDateTime {
        match self {
            Self::Naive(ts) => ts,
            Self::Zoned(ts) => ts.naive_utc(),
        }
    }

    pub fn is_zoned(&self) -> bool {
        matches!(self, Self::Zoned(_))
    }
}

/// Parse one cell. Returns None for anything that is not recognizably a
/// date or date-time.
pub fn parse(text: &str) -> Option<ParsedTimestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedTimestamp::Zoned(ts));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, fmt) {
            return Some(ParsedTimestamp::Zoned(ts));
        }
    }

    // "2024-01-05 10:00:00 UTC" and friends: naive body plus a UTC marker.
    for suffix in UTC_SUFFIXES {
        if let Some(body) = text.strip_suffix(suffix) {
            if let Some(naive) = parse_naive(body.trim_end()) {
                return Some(ParsedTimestamp::Zoned(naive.and_utc().fixed_offset()));
            }
        }
    }

    parse_naive(text).map(ParsedTimestamp::Naive)
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Normalize one cell: parse, convert offset-aware values to UTC, drop
/// the offset. Null and garbage both come back as None.
pub fn normalize(text: Option<&str>) -> Option<NaiveDateTime> {
    text.and_then(parse).map(ParsedTimestamp::to_utc_naive)
}

/// Normalize a whole column. Offset-aware and offset-free cells may be
/// mixed freely; each cell is handled on its own.
pub fn normalize_column<'a, I>(cells: I) -> Vec<Option<NaiveDateTime>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    cells.into_iter().map(normalize).collect()
}

pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
