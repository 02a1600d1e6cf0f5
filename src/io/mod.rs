//! Input/output helpers.
//!
//! - observation ingest + validation (`ingest`)
//! - pivot table CSV export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
