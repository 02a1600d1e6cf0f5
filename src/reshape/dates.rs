//! Timestamp parsing and display formatting.
//!
//! The backend emits naive local timestamps (`2024-06-01T13:00:00`), but files
//! and other tools may carry minutes-only or RFC 3339 variants. Everything is
//! normalized to `NaiveDateTime` (wall-clock time, offsets dropped).

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::{DEFAULT_DATE_PATTERN, DateFormatError};

const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Turns a raw observation date into its display key.
///
/// Two raw timestamps that render to the same string collapse into one pivot
/// row, so the formatter's resolution decides the row granularity.
pub trait DateFormatter {
    fn format_date(&self, raw: &str) -> Result<String, DateFormatError>;
}

impl<F> DateFormatter for F
where
    F: Fn(&str) -> Result<String, DateFormatError>,
{
    fn format_date(&self, raw: &str) -> Result<String, DateFormatError> {
        self(raw)
    }
}

/// strftime-pattern formatter.
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
}

impl PatternFormatter {
    /// Validate `pattern` up front.
    ///
    /// Besides syntax errors this rejects specifiers a naive timestamp cannot
    /// fill (`%z`, `%Z`), found by rendering a fixed date once.
    pub fn new(pattern: impl Into<String>) -> Result<Self, DateFormatError> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(DateFormatError::InvalidPattern { pattern });
        }
        let fixed = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        if let Some(ts) = fixed {
            render(ts, &pattern)?;
        }
        Ok(Self { pattern })
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_PATTERN.to_string(),
        }
    }
}

impl DateFormatter for PatternFormatter {
    fn format_date(&self, raw: &str) -> Result<String, DateFormatError> {
        let ts = parse_timestamp(raw)?;
        render(ts, &self.pattern)
    }
}

/// `format` without the panic `to_string` raises on an unrenderable item.
fn render(ts: NaiveDateTime, pattern: &str) -> Result<String, DateFormatError> {
    let mut out = String::new();
    write!(out, "{}", ts.format(pattern)).map_err(|_| DateFormatError::InvalidPattern {
        pattern: pattern.to_string(),
    })?;
    Ok(out)
}

/// Parse any of the accepted timestamp layouts.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DateFormatError> {
    let trimmed = raw.trim();

    for layout in NAIVE_LAYOUTS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.naive_local());
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(ts) = day.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }

    Err(DateFormatError::Unparsable {
        raw: raw.to_string(),
    })
}

/// Parse a timestamp into seconds since the epoch (as if UTC), for plotting.
pub fn timestamp_seconds(raw: &str) -> Result<f64, DateFormatError> {
    parse_timestamp(raw).map(|ts| ts.and_utc().timestamp() as f64)
}
