//! Shared "view pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch/load -> validate -> default selection -> pivot + chart series
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::{Local, NaiveDateTime};

use crate::data::{ApiClient, generate_sample};
use crate::domain::{ChartPoint, DataOrigin, PivotTable, SeriesLine, SkippedRecord, ViewConfig};
use crate::error::AppError;
use crate::io::ingest::{IngestedObservations, load_observations, validate_observations};
use crate::reshape::{
    PatternFormatter, SourceSelection, group_series, on_new_data, pivot, to_chart_series,
};

/// All computed outputs of a single fetch.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub ingest: IngestedObservations,
    /// Every source in the data, first-appearance order.
    pub available: SourceSelection,
    /// Table selection after the reset (and any `--sources` override).
    pub selection: SourceSelection,
    pub table: PivotTable,
    pub chart: Vec<ChartPoint>,
    pub lines: Vec<SeriesLine>,
    pub chart_skipped: Vec<SkippedRecord>,
}

/// Fetch (or load) the observations for `config` and reshape them.
pub fn run_view(config: &ViewConfig) -> Result<ViewOutput, AppError> {
    let ingest = load_observations_for(config, Local::now().naive_local())?;
    build_view(config, ingest)
}

/// Obtain validated observations from the configured origin.
///
/// `now` only matters for generated data.
pub fn load_observations_for(config: &ViewConfig, now: NaiveDateTime) -> Result<IngestedObservations, AppError> {
    let ingest = match &config.origin {
        DataOrigin::Api => {
            let client = ApiClient::from_env();
            validate_observations(client.fetch(&config.query, config.range.as_ref())?)
        }
        DataOrigin::Sample { seed } => {
            validate_observations(generate_sample(&config.query, config.range.as_ref(), now, *seed)?)
        }
        DataOrigin::File(path) => load_observations(path)?,
    };

    for s in &ingest.skipped {
        tracing::warn!(index = s.index, source = ?s.source, reason = %s.reason, "skipped observation");
    }
    tracing::info!(
        query = %config.query.label(),
        read = ingest.records_read,
        kept = ingest.observations.len(),
        skipped = ingest.skipped.len(),
        "observations loaded"
    );

    if ingest.observations.is_empty() {
        return Err(AppError::new(
            3,
            format!("No observations for {} (read {} record(s)).", config.query.label(), ingest.records_read),
        ));
    }
    Ok(ingest)
}

/// Reshape already-loaded observations.
///
/// The selection is reset via `on_new_data`; a `--sources` list then narrows it
/// to the named sources that exist in the data.
pub fn build_view(config: &ViewConfig, ingest: IngestedObservations) -> Result<ViewOutput, AppError> {
    let formatter = PatternFormatter::new(config.date_pattern.as_str())
        .map_err(|e| AppError::new(2, format!("Invalid --date-format: {e}")))?;

    let available = on_new_data(&ingest.observations);
    let selection = match &config.sources {
        Some(names) => {
            let wanted = SourceSelection::from_names(names.iter().map(|s| s.trim()).filter(|s| !s.is_empty()));
            for name in wanted.iter().filter(|n| !available.contains(n)) {
                tracing::warn!(source = name, "requested source not in data");
            }
            wanted.restricted_to(&available)
        }
        None => available.clone(),
    };

    let table = pivot(&ingest.observations, &selection, &formatter);
    let chart = to_chart_series(&ingest.observations);
    let (lines, chart_skipped) = group_series(&chart);

    Ok(ViewOutput {
        ingest,
        available,
        selection,
        table,
        chart,
        lines,
        chart_skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_DATE_PATTERN, DateRange, ResourceQuery, ViewMode};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn config(sources: Option<Vec<String>>) -> ViewConfig {
        ViewConfig {
            query: ResourceQuery::Forecast { plant_id: 1 },
            origin: DataOrigin::Sample { seed: 5 },
            range: Some(DateRange::new(at(1, 0), at(1, 23)).unwrap()),
            sources,
            view: ViewMode::Both,
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            plot_width: 60,
            plot_height: 12,
            export: None,
        }
    }

    #[test]
    fn sample_view_selects_every_source() {
        let cfg = config(None);
        let ingest = load_observations_for(&cfg, at(1, 12)).unwrap();
        let out = build_view(&cfg, ingest).unwrap();

        assert_eq!(out.selection.as_slice(), ["Model A", "Model B", "Production"]);
        assert_eq!(out.table.columns, out.selection.as_slice());
        assert_eq!(out.table.rows.len(), 24);
        assert_eq!(out.table.rows[0].formatted_date, "01.06.2024 00:00");
        assert_eq!(out.lines.len(), 3);
        assert_eq!(out.chart.len(), out.ingest.observations.len());
        // Production stops at noon.
        assert!(out.table.rows[13].cell("Production").is_none());
    }

    #[test]
    fn sources_override_narrows_table_but_not_chart() {
        let cfg = config(Some(vec!["Production".to_string(), "Nope".to_string()]));
        let ingest = load_observations_for(&cfg, at(1, 12)).unwrap();
        let out = build_view(&cfg, ingest).unwrap();

        assert_eq!(out.selection.as_slice(), ["Production"]);
        assert_eq!(out.table.rows.len(), 13);
        assert_eq!(out.lines.len(), 3);
    }

    #[test]
    fn no_observations_is_exit_code_3() {
        let mut cfg = config(None);
        cfg.query = ResourceQuery::Metric {
            model_id: 1,
            metric: None,
            compare: vec![],
        };
        // Metrics only cover past hours; "now" before the range leaves nothing.
        let err = load_observations_for(&cfg, at(1, 0) - chrono::Duration::hours(1)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn invalid_date_pattern_is_usage_error() {
        let mut cfg = config(None);
        cfg.date_pattern = "%Q".to_string();
        let ingest = load_observations_for(&cfg, at(1, 12)).unwrap();
        assert_eq!(build_view(&cfg, ingest).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn timezone_date_pattern_is_usage_error() {
        let mut cfg = config(None);
        cfg.date_pattern = "%d.%m.%Y %Z".to_string();
        let ingest = load_observations_for(&cfg, at(1, 12)).unwrap();
        let err = build_view(&cfg, ingest).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("Invalid --date-format"));
    }
}
