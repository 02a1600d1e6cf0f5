//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - deserialized straight from the forecast backend
//! - reshaped into chart series and pivot tables
//! - exported to CSV or re-read from disk later

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Display pattern used for table rows (`DD.MM.YYYY HH:mm` in the dashboard).
pub const DEFAULT_DATE_PATTERN: &str = "%d.%m.%Y %H:%M";

/// Timestamp layout the backend expects for `start` / `end`.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default file name for table exports.
pub const DEFAULT_EXPORT_FILE: &str = "forecast_data.csv";

/// A fully-specified fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceQuery {
    /// Forecasts (and measured production) for one plant.
    Forecast { plant_id: u32 },
    /// Metric history for one model, optionally compared against other models.
    Metric {
        model_id: u32,
        /// Metric kind (`accuracy`, `precision`, ...). Backend default when `None`.
        metric: Option<String>,
        /// Ids of models to compare against.
        compare: Vec<String>,
    },
}

impl ResourceQuery {
    /// Short human label, e.g. `forecast #3` or `metric #7 (accuracy)`.
    pub fn label(&self) -> String {
        match self {
            ResourceQuery::Forecast { plant_id } => format!("forecast #{plant_id}"),
            ResourceQuery::Metric { model_id, metric, .. } => match metric {
                Some(m) => format!("metric #{model_id} ({m})"),
                None => format!("metric #{model_id}"),
            },
        }
    }
}

/// An observation exactly as delivered on the wire.
///
/// Every field is optional: the backend does not guarantee completeness, and
/// validation decides what to keep (see `io::ingest::validate_observations`).
/// The metric endpoint names its series key `model` and its kind `metric`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "model")]
    pub source: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub measurement_unit: Option<String>,
    #[serde(default, rename = "type", alias = "metric")]
    pub kind: Option<String>,
}

/// One timestamped, source-tagged numeric data point.
///
/// `(date, source)` pairs are not unique by contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Raw backend timestamp; parsed only by the date formatter.
    pub date: String,
    pub source: String,
    pub value: f64,
    pub measurement_unit: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Observation {
    pub fn new(
        date: impl Into<String>,
        source: impl Into<String>,
        value: f64,
        measurement_unit: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            source: source.into(),
            value,
            measurement_unit: measurement_unit.into(),
            kind: String::new(),
        }
    }

    /// Table cell text: `"<value> <measurement_unit>"`.
    ///
    /// Negative zero renders as `0`.
    pub fn cell_text(&self) -> String {
        let value = if self.value == 0.0 { 0.0 } else { self.value };
        format!("{} {}", value, self.measurement_unit)
    }
}

/// A chart point; chart views consume observations without any merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Raw date, as received.
    pub x: String,
    pub y: f64,
    pub series: String,
    pub unit: String,
}

/// All points of one source, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLine {
    pub source: String,
    pub unit: String,
    /// `(unix seconds, value)` in input order.
    pub points: Vec<(f64, f64)>,
}

/// One pivoted table row: a display date plus one cell per present source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PivotRow {
    pub formatted_date: String,
    pub cells: HashMap<String, String>,
}

impl PivotRow {
    pub fn new(formatted_date: impl Into<String>) -> Self {
        Self {
            formatted_date: formatted_date.into(),
            cells: HashMap::new(),
        }
    }

    pub fn cell(&self, source: &str) -> Option<&str> {
        self.cells.get(source).map(String::as_str)
    }
}

/// Pivot output: explicit column schema + rows + what had to be dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotTable {
    /// Source columns in display order (the `date` column is implicit).
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
    pub skipped: Vec<SkippedRecord>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A date formatter failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateFormatError {
    #[error("unrecognized timestamp '{raw}'")]
    Unparsable { raw: String },
    #[error("invalid date pattern '{pattern}'")]
    InvalidPattern { pattern: String },
}

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing date")]
    MissingDate,
    #[error("missing source")]
    MissingSource,
    #[error("missing value")]
    MissingValue,
    #[error("non-finite value")]
    NonFiniteValue,
    #[error("missing measurement unit")]
    MissingUnit,
    #[error("date format error: {0}")]
    DateFormat(#[from] DateFormatError),
    /// The row could not be decoded at all (e.g. invalid UTF-8 in a CSV line).
    #[error("unreadable record: {0}")]
    Unreadable(String),
}

/// A record dropped during validation or reshaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the input sequence.
    pub index: usize,
    pub source: Option<String>,
    pub reason: SkipReason,
}

/// Inclusive fetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::new(2, "End date must be after the start date."));
        }
        Ok(Self { start, end })
    }

    /// `(start, end)` in the backend's wire format.
    pub fn wire_bounds(&self) -> (String, String) {
        (
            self.start.format(WIRE_DATE_FORMAT).to_string(),
            self.end.format(WIRE_DATE_FORMAT).to_string(),
        )
    }

    /// Number of calendar days touched by the window (at least 1).
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A metric kind offered by `/metrics/available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOption {
    pub label: String,
    pub value: String,
}

/// Which view(s) a non-interactive run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    Chart,
    Table,
    Both,
}

impl ViewMode {
    pub fn shows_chart(self) -> bool {
        matches!(self, ViewMode::Chart | ViewMode::Both)
    }

    pub fn shows_table(self) -> bool {
        matches!(self, ViewMode::Table | ViewMode::Both)
    }
}

/// Where observations come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    /// The REST backend (`SF_API_URL`).
    Api,
    /// Deterministic synthetic data with the given seed.
    Sample { seed: u64 },
    /// A JSON or CSV file on disk.
    File(PathBuf),
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub query: ResourceQuery,
    pub origin: DataOrigin,
    pub range: Option<DateRange>,
    /// Explicit table selection; `None` means "every source in the data".
    pub sources: Option<Vec<String>>,
    pub view: ViewMode,
    pub date_pattern: String,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn metric_payload_aliases_map_to_source_and_kind() {
        let json = r#"{"date":"2024-06-01T10:00:00","value":91.5,"model":"Model7","metric":"accuracy","measurement_unit":"%"}"#;
        let raw: RawObservation = serde_json::from_str(json).unwrap();
        assert_eq!(raw.source.as_deref(), Some("Model7"));
        assert_eq!(raw.kind.as_deref(), Some("accuracy"));
        assert_eq!(raw.value, Some(91.5));
    }

    #[test]
    fn raw_observation_tolerates_missing_fields() {
        let raw: RawObservation = serde_json::from_str(r#"{"date":"2024-06-01T10:00:00","source":"Model A"}"#).unwrap();
        assert_eq!(raw.value, None);
        assert_eq!(raw.measurement_unit, None);
    }

    #[test]
    fn cell_text_uses_shortest_number_rendering() {
        assert_eq!(Observation::new("d", "A", 2.0, "MW").cell_text(), "2 MW");
        assert_eq!(Observation::new("d", "A", 90.25, "%").cell_text(), "90.25 %");
    }

    #[test]
    fn cell_text_drops_sign_of_negative_zero() {
        assert_eq!(Observation::new("d", "A", -0.0, "kW").cell_text(), "0 kW");
        assert_eq!(Observation::new("d", "A", -1.5, "kW").cell_text(), "-1.5 kW");
    }

    #[test]
    fn date_range_rejects_end_before_start() {
        let err = DateRange::new(ts(2, 0), ts(1, 0)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "End date must be after the start date.");
    }

    #[test]
    fn date_range_wire_bounds_and_day_count() {
        let range = DateRange::new(ts(1, 6), ts(3, 18)).unwrap();
        assert_eq!(
            range.wire_bounds(),
            ("2024-06-01T06:00:00".to_string(), "2024-06-03T18:00:00".to_string())
        );
        assert_eq!(range.day_count(), 3);
    }

    #[test]
    fn query_labels() {
        assert_eq!(ResourceQuery::Forecast { plant_id: 3 }.label(), "forecast #3");
        let q = ResourceQuery::Metric {
            model_id: 7,
            metric: Some("recall".to_string()),
            compare: vec![],
        };
        assert_eq!(q.label(), "metric #7 (recall)");
    }
}
