//! Observation sources: the forecast backend and an offline sample generator.

pub mod api;
pub mod sample;

pub use api::{ApiClient, ApiSettings};
pub use sample::generate_sample;
