//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - wire and validated observations (`RawObservation`, `Observation`)
//! - reshape outputs (`PivotTable`, `PivotRow`, `ChartPoint`, `SeriesLine`)
//! - fetch/run configuration (`ResourceQuery`, `DateRange`, `ViewConfig`)

pub mod types;

pub use types::*;
