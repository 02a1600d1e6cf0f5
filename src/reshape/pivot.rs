//! Pivot: one row per display date, one column per selected source.

use std::collections::HashMap;

use crate::domain::{Observation, PivotRow, PivotTable, SkipReason, SkippedRecord};
use crate::reshape::dates::DateFormatter;
use crate::reshape::selection::SourceSelection;

/// Pivot `observations` for the sources in `selection`.
///
/// Guarantees:
/// - rows appear in the order their display date is first encountered (not sorted)
/// - a repeated `(display date, source)` pair overwrites the earlier cell
/// - an empty selection yields zero rows
/// - observations whose date cannot be formatted are skipped and reported
pub fn pivot<F>(observations: &[Observation], selection: &SourceSelection, formatter: &F) -> PivotTable
where
    F: DateFormatter + ?Sized,
{
    let mut table = PivotTable {
        columns: selection.as_slice().to_vec(),
        ..PivotTable::default()
    };
    if selection.is_empty() {
        return table;
    }

    // display date -> row position
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, obs) in observations.iter().enumerate() {
        if !selection.contains(&obs.source) {
            continue;
        }

        let key = match formatter.format_date(&obs.date) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(index = i, source = %obs.source, "skipping observation: {err}");
                table.skipped.push(SkippedRecord {
                    index: i,
                    source: Some(obs.source.clone()),
                    reason: SkipReason::DateFormat(err),
                });
                continue;
            }
        };

        let pos = match index.get(&key) {
            Some(&pos) => pos,
            None => {
                table.rows.push(PivotRow::new(key.clone()));
                index.insert(key, table.rows.len() - 1);
                table.rows.len() - 1
            }
        };
        table.rows[pos].cells.insert(obs.source.clone(), obs.cell_text());
    }

    tracing::debug!(
        rows = table.rows.len(),
        columns = table.columns.len(),
        skipped = table.skipped.len(),
        "pivot complete"
    );
    table
}
