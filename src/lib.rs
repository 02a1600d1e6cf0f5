//! `solar-forecast` library crate.
//!
//! The binary (`sf`) is a thin wrapper around this library so that:
//!
//! - reshaping logic is testable without spawning processes
//! - the same pipeline drives both the plain CLI and the TUI

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod reshape;
pub mod tui;
