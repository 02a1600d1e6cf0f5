//! Series reshaping: the chart view, the pivot table view, and source selection.
//!
//! Everything here is pure and synchronous. Callers own the current
//! `SourceSelection` and recompute the views whenever the data or the
//! selection changes.

pub mod chart;
pub mod dates;
pub mod pivot;
pub mod selection;

pub use chart::{group_series, series_bounds, to_chart_series};
pub use dates::{DateFormatter, PatternFormatter, parse_timestamp, timestamp_seconds};
pub use pivot::pivot;
pub use selection::{SourceSelection, on_new_data, select_sources};
