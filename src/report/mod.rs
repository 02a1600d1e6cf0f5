//! Reporting utilities: per-source statistics and text formatting.

pub mod format;

pub use format::{format_pivot_table, format_run_summary, format_skipped};

use crate::domain::Observation;

/// Value summary for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStats {
    pub source: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Unit of the first observation; sources are single-unit in practice.
    pub unit: String,
}

/// Per-source count/min/max/mean, in order of first appearance.
pub fn source_stats(observations: &[Observation]) -> Vec<SourceStats> {
    let mut out: Vec<SourceStats> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();

    for o in observations {
        match out.iter().position(|s| s.source == o.source) {
            Some(i) => {
                let s = &mut out[i];
                s.count += 1;
                s.min = s.min.min(o.value);
                s.max = s.max.max(o.value);
                sums[i] += o.value;
            }
            None => {
                out.push(SourceStats {
                    source: o.source.clone(),
                    count: 1,
                    min: o.value,
                    max: o.value,
                    mean: 0.0,
                    unit: o.measurement_unit.clone(),
                });
                sums.push(o.value);
            }
        }
    }

    for (s, sum) in out.iter_mut().zip(sums) {
        s.mean = sum / s.count as f64;
    }
    out
}
