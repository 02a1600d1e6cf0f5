//! Synthetic observations shaped like the forecast backend's responses.
//!
//! Useful offline (`--sample`) and in tests. Output is deterministic for a
//! given seed and "now".

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::domain::{DateRange, RawObservation, ResourceQuery, WIRE_DATE_FORMAT};
use crate::error::AppError;

/// Sources the forecast endpoint reports for every plant.
pub const FORECAST_SOURCES: [&str; 3] = ["Model A", "Model B", "Production"];

/// Measured production only exists up to "now".
const MEASURED_SOURCE: &str = "Production";

/// Days covered when no range is given (today plus three).
const DEFAULT_DAYS: i64 = 4;

/// Peak output (kW) at solar noon.
const PEAK_KW: f64 = 1000.0;

const DEFAULT_METRIC: &str = "accuracy";

/// Generate observations for `query`.
pub fn generate_sample(
    query: &ResourceQuery,
    range: Option<&DateRange>,
    now: NaiveDateTime,
    seed: u64,
) -> Result<Vec<RawObservation>, AppError> {
    let (start_day, days) = match range {
        Some(r) => (r.start.date(), r.day_count()),
        None => (now.date(), DEFAULT_DAYS),
    };
    if days <= 0 {
        return Err(AppError::new(2, "Sample range must cover at least one day."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();

    match query {
        ResourceQuery::Forecast { .. } => {
            for source in FORECAST_SOURCES {
                let cutoff = (source == MEASURED_SOURCE).then_some(now);
                for ts in hourly(start_day, days, cutoff) {
                    out.push(RawObservation {
                        date: Some(ts.format(WIRE_DATE_FORMAT).to_string()),
                        source: Some(source.to_string()),
                        value: Some(production_kw(&mut rng, ts)),
                        measurement_unit: Some("kW".to_string()),
                        kind: Some(String::new()),
                    });
                }
            }
        }
        ResourceQuery::Metric { metric, compare, .. } => {
            let metric = metric.as_deref().unwrap_or(DEFAULT_METRIC);
            let mut models = vec!["Model".to_string()];
            models.extend(compare.iter().filter(|id| !id.is_empty()).map(|id| format!("Model{id}")));

            for model in models {
                for ts in hourly(start_day, days, Some(now)) {
                    out.push(RawObservation {
                        date: Some(ts.format(WIRE_DATE_FORMAT).to_string()),
                        source: Some(model.clone()),
                        value: Some(metric_value(&mut rng, ts)),
                        measurement_unit: Some("%".to_string()),
                        kind: Some(metric.to_string()),
                    });
                }
            }
        }
    }

    tracing::debug!(records = out.len(), query = %query.label(), "generated sample");
    Ok(out)
}

/// Hourly timestamps for `days` days from `start_day`; a day stops at the
/// first hour after `cutoff`.
fn hourly(start_day: NaiveDate, days: i64, cutoff: Option<NaiveDateTime>) -> Vec<NaiveDateTime> {
    let mut out = Vec::new();
    for offset in 0..days {
        let Some(day) = start_day.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        for hour in 0..24 {
            let Some(ts) = day.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            if cutoff.is_some_and(|c| ts > c) {
                break;
            }
            out.push(ts);
        }
    }
    out
}

/// Bell-shaped daytime output with noise, zero at night.
fn production_kw(rng: &mut StdRng, ts: NaiveDateTime) -> f64 {
    let hour = f64::from(ts.hour());
    if !(6.0..=18.0).contains(&hour) {
        return 0.0;
    }
    let shape = (1.0 - (hour - 12.0).powi(2) / 36.0).max(0.0);
    let noise = rng.gen_range(-100..=50) as f64;
    ((PEAK_KW * shape).round() + noise).abs()
}

/// Metric percentage: noisier in daytime, near-perfect at night.
fn metric_value(rng: &mut StdRng, ts: NaiveDateTime) -> f64 {
    let hour = ts.hour();
    let v: f64 = if (6..=18).contains(&hour) {
        90.0 + Uniform::new_inclusive(-5.0_f64, 5.0).sample(rng)
    } else {
        98.0 + Uniform::new_inclusive(-1.0_f64, 2.0).sample(rng)
    };
    (v * 100.0).round() / 100.0
}
