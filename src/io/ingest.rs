//! Observation ingest and validation.
//!
//! This module is responsible for turning loosely-typed records (backend JSON or
//! a CSV/JSON file on disk) into validated `Observation`s.
//!
//! Design goals:
//! - **Row-level validation** (skip bad records, but report what happened)
//! - **Deterministic behavior** (input order is preserved)
//! - **Separation of concerns**: no reshaping logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Observation, RawObservation, SkipReason, SkippedRecord};
use crate::error::AppError;

/// Ingest output: usable observations + what was dropped.
#[derive(Debug, Clone, Default)]
pub struct IngestedObservations {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedRecord>,
    pub records_read: usize,
}

/// Validate raw records.
///
/// A record is skipped when `date`, `source`, `value` or `measurement_unit` is
/// missing, or when `value` is not finite. A missing `type` becomes `""`.
pub fn validate_observations(raw: Vec<RawObservation>) -> IngestedObservations {
    validate_rows(raw.into_iter().map(Ok).collect())
}

/// Like `validate_observations`, for input where some rows could not be
/// decoded at all; those arrive as `Err` and are reported as-is.
fn validate_rows(rows: Vec<Result<RawObservation, SkipReason>>) -> IngestedObservations {
    let records_read = rows.len();
    let mut observations = Vec::with_capacity(records_read);
    let mut skipped = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let (source, result) = match row {
            Ok(record) => (record.source.clone(), validate_record(record)),
            Err(reason) => (None, Err(reason)),
        };
        match result {
            Ok(obs) => observations.push(obs),
            Err(reason) => {
                tracing::warn!(index, source = source.as_deref().unwrap_or("-"), "skipping record: {reason}");
                skipped.push(SkippedRecord { index, source, reason });
            }
        }
    }

    IngestedObservations {
        observations,
        skipped,
        records_read,
    }
}

fn validate_record(record: RawObservation) -> Result<Observation, SkipReason> {
    let date = non_blank(record.date).ok_or(SkipReason::MissingDate)?;
    let source = non_blank(record.source).ok_or(SkipReason::MissingSource)?;
    let value = record.value.ok_or(SkipReason::MissingValue)?;
    if !value.is_finite() {
        return Err(SkipReason::NonFiniteValue);
    }
    let measurement_unit = non_blank(record.measurement_unit).ok_or(SkipReason::MissingUnit)?;

    Ok(Observation {
        date,
        source,
        value,
        measurement_unit,
        kind: record.kind.unwrap_or_default(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Load observations from a `.json` (array of records) or `.csv` file.
pub fn load_observations(path: &Path) -> Result<IngestedObservations, AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let rows: Vec<Result<RawObservation, SkipReason>> = match ext.as_deref() {
        Some("json") => read_json_records(path)?.into_iter().map(Ok).collect(),
        Some("csv") => read_csv_records(path)?,
        _ => {
            return Err(AppError::new(
                2,
                format!("Expected a .json or .csv file (got: {}).", path.display()),
            ));
        }
    };

    let ingested = validate_rows(rows);
    tracing::info!(
        path = %path.display(),
        read = ingested.records_read,
        kept = ingested.observations.len(),
        "loaded observations"
    );
    Ok(ingested)
}

fn read_json_records(path: &Path) -> Result<Vec<RawObservation>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid observation JSON '{}': {e}", path.display())))
}

fn read_csv_records(path: &Path) -> Result<Vec<Result<RawObservation, SkipReason>>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["date", "value"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(2, format!("Missing required column: `{required}`")));
        }
    }
    if !header_map.contains_key("source") && !header_map.contains_key("model") {
        return Err(AppError::new(2, "Missing required column: `source` (or `model`)"));
    }

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => out.push(Ok(parse_row(&record, &header_map))),
            Err(e) => {
                // +2: 1-based lines, plus the header line.
                tracing::warn!(line = idx + 2, "CSV parse error: {e}");
                out.push(Err(SkipReason::Unreadable(format!("line {}: {e}", idx + 2))));
            }
        }
    }
    Ok(out)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> RawObservation {
    let get = |name: &str| -> Option<String> {
        header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    RawObservation {
        date: get("date"),
        source: get("source").or_else(|| get("model")),
        value: get("value").and_then(|v| v.parse::<f64>().ok()),
        measurement_unit: get("measurement_unit"),
        kind: get("type").or_else(|| get("metric")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn raw(date: Option<&str>, source: Option<&str>, value: Option<f64>, unit: Option<&str>) -> RawObservation {
        RawObservation {
            date: date.map(str::to_string),
            source: source.map(str::to_string),
            value,
            measurement_unit: unit.map(str::to_string),
            kind: None,
        }
    }

    #[test]
    fn malformed_records_are_skipped_with_reasons() {
        let input = vec![
            raw(Some("2024-06-01T10:00:00"), Some("A"), Some(1.0), Some("kW")),
            raw(Some("2024-06-01T10:00:00"), Some("A"), None, Some("kW")),
            raw(Some("2024-06-01T10:00:00"), Some("B"), Some(2.0), None),
            raw(None, Some("B"), Some(2.0), Some("kW")),
            raw(Some("2024-06-01T11:00:00"), Some("  "), Some(2.0), Some("kW")),
            raw(Some("2024-06-01T11:00:00"), Some("B"), Some(f64::NAN), Some("kW")),
            raw(Some("2024-06-01T11:00:00"), Some("B"), Some(3.0), Some("kW")),
        ];

        let out = validate_observations(input);
        assert_eq!(out.records_read, 7);
        assert_eq!(out.observations.len(), 2);
        let reasons: Vec<(usize, SkipReason)> = out.skipped.iter().map(|s| (s.index, s.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (1, SkipReason::MissingValue),
                (2, SkipReason::MissingUnit),
                (3, SkipReason::MissingDate),
                (4, SkipReason::MissingSource),
                (5, SkipReason::NonFiniteValue),
            ]
        );
        assert_eq!(out.observations[1].value, 3.0);
        assert_eq!(out.observations[1].kind, "");
    }

    #[test]
    fn loads_backend_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"date":"2024-06-01T10:00:00","value":812,"source":"Model A","type":"","measurement_unit":"kW"}},
                {{"date":"2024-06-01T10:00:00","value":null,"source":"Model B","type":"","measurement_unit":"kW"}},
                {{"date":"2024-06-01T10:00:00","value":93.4,"model":"Model","metric":"accuracy","measurement_unit":"%"}}
            ]"#
        )
        .unwrap();

        let out = load_observations(file.path()).unwrap();
        assert_eq!(out.records_read, 3);
        assert_eq!(out.observations.len(), 2);
        assert_eq!(out.observations[1].source, "Model");
        assert_eq!(out.observations[1].kind, "accuracy");
        assert_eq!(out.skipped[0].reason, SkipReason::MissingValue);
    }

    #[test]
    fn loads_csv_with_bom_and_mixed_case_headers() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "\u{feff}Date,Source,Value,Measurement_Unit\n\
             2024-06-01T10:00:00,Model A,812,kW\n\
             2024-06-01T11:00:00,Model A,n/a,kW\n"
        )
        .unwrap();

        let out = load_observations(file.path()).unwrap();
        assert_eq!(out.observations.len(), 1);
        assert_eq!(out.observations[0].value, 812.0);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].reason, SkipReason::MissingValue);
    }

    #[test]
    fn undecodable_csv_row_is_reported_as_unreadable() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"date,source,value,measurement_unit\n").unwrap();
        file.write_all(b"2024-06-01T10:00:00,Model A,1,kW\n").unwrap();
        file.write_all(b"2024-06-01T11:00:00,\xff\xfe,2,kW\n").unwrap();
        file.write_all(b"2024-06-01T12:00:00,Model A,3,kW\n").unwrap();

        let out = load_observations(file.path()).unwrap();
        assert_eq!(out.records_read, 3);
        assert_eq!(out.observations.len(), 2);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].index, 1);
        assert_eq!(out.skipped[0].source, None);
        assert!(matches!(&out.skipped[0].reason, SkipReason::Unreadable(msg) if msg.starts_with("line 3")));
    }

    #[test]
    fn csv_without_source_column_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "date,value\n2024-06-01T10:00:00,1\n").unwrap();
        let err = load_observations(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_observations(Path::new("observations.txt")).unwrap_err();
        assert!(err.to_string().contains(".json or .csv"));
    }
}
