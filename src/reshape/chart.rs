//! Chart view data.
//!
//! The chart always shows every source in the fetched data; the table
//! selection never applies here.

use crate::domain::{ChartPoint, Observation, SeriesLine, SkipReason, SkippedRecord};
use crate::reshape::dates::timestamp_seconds;

/// One chart point per observation, in input order.
pub fn to_chart_series(observations: &[Observation]) -> Vec<ChartPoint> {
    observations
        .iter()
        .map(|o| ChartPoint {
            x: o.date.clone(),
            y: o.value,
            series: o.source.clone(),
            unit: o.measurement_unit.clone(),
        })
        .collect()
}

/// Group chart points into one drawable line per series.
///
/// Lines appear in first-appearance order of their series; points whose date
/// cannot be parsed are left out and reported.
pub fn group_series(points: &[ChartPoint]) -> (Vec<SeriesLine>, Vec<SkippedRecord>) {
    let mut lines: Vec<SeriesLine> = Vec::new();
    let mut skipped = Vec::new();

    for (i, p) in points.iter().enumerate() {
        let x = match timestamp_seconds(&p.x) {
            Ok(x) => x,
            Err(err) => {
                tracing::warn!(index = i, series = %p.series, "chart point dropped: {err}");
                skipped.push(SkippedRecord {
                    index: i,
                    source: Some(p.series.clone()),
                    reason: SkipReason::DateFormat(err),
                });
                continue;
            }
        };

        match lines.iter_mut().find(|l| l.source == p.series) {
            Some(line) => line.points.push((x, p.y)),
            None => lines.push(SeriesLine {
                source: p.series.clone(),
                unit: p.unit.clone(),
                points: vec![(x, p.y)],
            }),
        }
    }

    (lines, skipped)
}

/// `(min, max)` over all x and y values, or `None` for empty / degenerate input.
pub fn series_bounds(lines: &[SeriesLine]) -> Option<([f64; 2], [f64; 2])> {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for &(px, py) in lines.iter().flat_map(|l| l.points.iter()) {
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if x[0].is_finite() && x[1].is_finite() && y[0].is_finite() && y[1].is_finite() {
        Some((x, y))
    } else {
        None
    }
}
