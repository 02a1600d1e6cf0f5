//! Formatted terminal output: run summary and the pivot table view.
//!
//! We keep formatting code in one place so:
//! - the reshaping code stays clean and testable
//! - output changes are localized (snapshot tests live here)

use crate::domain::{DateRange, PivotTable, ResourceQuery, SkippedRecord};
use crate::io::ingest::IngestedObservations;
use crate::report::SourceStats;
use crate::reshape::SourceSelection;

/// Format the run summary (query, record counts, per-source stats, selection).
pub fn format_run_summary(
    query: &ResourceQuery,
    range: Option<&DateRange>,
    ingest: &IngestedObservations,
    stats: &[SourceStats],
    selection: &SourceSelection,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== sf - {} ===\n", query.label()));
    match range {
        Some(r) => {
            let (start, end) = r.wire_bounds();
            out.push_str(&format!("Range: {start} .. {end}\n"));
        }
        None => out.push_str("Range: backend default\n"),
    }
    out.push_str(&format!(
        "Records: read={} kept={} skipped={}\n",
        ingest.records_read,
        ingest.observations.len(),
        ingest.skipped.len(),
    ));

    if !stats.is_empty() {
        out.push_str("\nSources:\n");
        for s in stats {
            let mark = if selection.contains(&s.source) { "*" } else { " " };
            out.push_str(&format!(
                "{mark} {:<16} n={:<5} min={:<10} max={:<10} mean={:.2} {}\n",
                truncate(&s.source, 16),
                s.count,
                s.min,
                s.max,
                s.mean,
                s.unit,
            ));
        }
    }

    let selected: Vec<&str> = selection.iter().collect();
    out.push_str(&format!(
        "\nTable selection: {}\n",
        if selected.is_empty() { "(none)".to_string() } else { selected.join(", ") }
    ));

    out
}

/// Format a list of skipped records (one per line).
pub fn format_skipped(label: &str, skipped: &[SkippedRecord]) -> String {
    let mut out = String::new();
    if skipped.is_empty() {
        return out;
    }
    out.push_str(&format!("{label}: {} record(s) skipped\n", skipped.len()));
    for s in skipped {
        out.push_str(&format!(
            "  #{:<5} {:<16} {}\n",
            s.index,
            truncate(s.source.as_deref().unwrap_or("-"), 16),
            s.reason
        ));
    }
    out
}

/// Format the pivot table as aligned text columns.
pub fn format_pivot_table(table: &PivotTable) -> String {
    let mut headers = vec!["date".to_string()];
    headers.extend(table.columns.iter().cloned());

    let body: Vec<Vec<&str>> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.formatted_date.as_str()];
            cells.extend(table.columns.iter().map(|c| row.cell(c).unwrap_or("-")));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<&str> = headers.iter().map(String::as_str).collect();
    out.push_str(&join_padded(&header_cells, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule_cells: Vec<&str> = rule.iter().map(String::as_str).collect();
    out.push_str(&join_padded(&rule_cells, &widths));
    out.push('\n');

    for cells in &body {
        out.push_str(&join_padded(cells, &widths));
        out.push('\n');
    }

    if table.rows.is_empty() {
        out.push_str("(no rows)\n");
    }

    out
}

fn join_padded(cells: &[&str], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect();
    parts.join("  ").trim_end().to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, SkipReason};
    use crate::report::source_stats;
    use crate::reshape::{PatternFormatter, pivot};

    fn data() -> Vec<Observation> {
        vec![
            Observation::new("2024-06-01T10:00:00", "Model A", 812.0, "kW"),
            Observation::new("2024-06-01T10:00:00", "Production", 790.5, "kW"),
            Observation::new("2024-06-01T11:00:00", "Model A", 901.0, "kW"),
        ]
    }

    #[test]
    fn pivot_table_golden() {
        let sel = SourceSelection::from_names(["Model A", "Production"]);
        let table = pivot(&data(), &sel, &PatternFormatter::default());
        let expected = concat!(
            "date              Model A  Production\n",
            "----------------  -------  ----------\n",
            "01.06.2024 10:00  812 kW   790.5 kW\n",
            "01.06.2024 11:00  901 kW   -\n",
        );
        assert_eq!(format_pivot_table(&table), expected);
    }

    #[test]
    fn empty_table_says_so() {
        let table = pivot(&data(), &SourceSelection::empty(), &PatternFormatter::default());
        assert_eq!(format_pivot_table(&table), "date\n----\n(no rows)\n");
    }

    #[test]
    fn summary_golden() {
        let obs = data();
        let ingest = IngestedObservations {
            observations: obs.clone(),
            skipped: vec![],
            records_read: 4,
        };
        let stats = source_stats(&obs);
        let sel = SourceSelection::from_names(["Model A"]);
        let txt = format_run_summary(&ResourceQuery::Forecast { plant_id: 1 }, None, &ingest, &stats, &sel);
        let expected = concat!(
            "=== sf - forecast #1 ===\n",
            "Range: backend default\n",
            "Records: read=4 kept=3 skipped=0\n",
            "\n",
            "Sources:\n",
            "* Model A          n=2     min=812        max=901        mean=856.50 kW\n",
            "  Production       n=1     min=790.5      max=790.5      mean=790.50 kW\n",
            "\n",
            "Table selection: Model A\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn skipped_listing() {
        let skipped = vec![SkippedRecord {
            index: 3,
            source: Some("Model B".to_string()),
            reason: SkipReason::MissingUnit,
        }];
        assert_eq!(
            format_skipped("ingest", &skipped),
            "ingest: 1 record(s) skipped\n  #3     Model B          missing measurement unit\n"
        );
        assert_eq!(format_skipped("ingest", &[]), "");
    }
}
