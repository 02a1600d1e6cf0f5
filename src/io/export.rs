//! Export the pivot table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Building the CSV text is pure (`to_csv`); writing it is a separate step.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PivotRow;
use crate::error::AppError;

/// Render a pivot table as CSV text.
///
/// Layout:
/// - header: `date` followed by `columns`
/// - one line per row: the display date, then one cell per column (empty when absent)
/// - every data value is a string and is quoted; header names only when needed
/// - lines joined by `\n`, no trailing newline
///
/// With zero rows the output is the header line alone.
pub fn to_csv(columns: &[String], rows: &[PivotRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header = vec!["date".to_string()];
    header.extend(columns.iter().map(|c| quote_if_needed(c)));
    lines.push(header.join(","));

    for row in rows {
        let mut values = Vec::with_capacity(columns.len() + 1);
        values.push(quote(&row.formatted_date));
        for col in columns {
            values.push(quote(row.cell(col).unwrap_or("")));
        }
        lines.push(values.join(","));
    }

    lines.join("\n")
}

/// Write the CSV for a pivot table to `path`.
pub fn write_csv(path: &Path, columns: &[String], rows: &[PivotRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    file.write_all(to_csv(columns, rows).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "exported table");
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn quote_if_needed(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote(value)
    } else {
        value.to_string()
    }
}
