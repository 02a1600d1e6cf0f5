//! Command-line parsing for the solar forecast viewer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the reshaping code.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_DATE_PATTERN, ViewMode};
use crate::reshape::parse_timestamp;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sf", version, about = "Solar forecast and model metric viewer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// strftime pattern for the table's date column.
    #[arg(long, global = true, default_value = DEFAULT_DATE_PATTERN)]
    pub date_format: String,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show forecasts and measured production for a plant.
    Forecast(ForecastArgs),
    /// Show an accuracy metric for a model, optionally against other models.
    Metric(MetricArgs),
    /// List the metric kinds the backend offers.
    MetricsAvailable,
    /// Launch the interactive TUI.
    #[command(subcommand)]
    Tui(TuiCommand),
}

/// Interactive variants of the data commands.
#[derive(Debug, Subcommand)]
pub enum TuiCommand {
    Forecast(ForecastArgs),
    Metric(MetricArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Plant id.
    pub plant_id: u32,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct MetricArgs {
    /// Model id.
    pub model_id: u32,

    /// Metric kind (see `sf metrics-available`).
    #[arg(long)]
    pub metric: Option<String>,

    /// Other model ids to compare against (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub compare: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every data command.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Range start (e.g. 2024-06-01 or 2024-06-01T06:00).
    #[arg(long, value_parser = parse_cli_timestamp, requires = "end")]
    pub start: Option<NaiveDateTime>,

    /// Range end.
    #[arg(long, value_parser = parse_cli_timestamp, requires = "start")]
    pub end: Option<NaiveDateTime>,

    /// Table columns (comma separated); defaults to every source in the data.
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// What to print.
    #[arg(long, value_enum, default_value_t = ViewMode::Both)]
    pub view: ViewMode,

    /// Write the table view to CSV.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Use generated data instead of the backend (optional seed).
    #[arg(long, value_name = "SEED", num_args = 0..=1, default_missing_value = "42", conflicts_with = "input")]
    pub sample: Option<u64>,

    /// Read observations from a .json or .csv file instead of the backend.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

fn parse_cli_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_with_range_and_sources() {
        let cli = Cli::try_parse_from([
            "sf",
            "forecast",
            "3",
            "--start",
            "2024-06-01",
            "--end",
            "2024-06-02T12:00",
            "--sources",
            "Model A,Production",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.plant_id, 3);
        assert_eq!(
            args.common.sources,
            Some(vec!["Model A".to_string(), "Production".to_string()])
        );
        assert_eq!(args.common.start.unwrap().to_string(), "2024-06-01 00:00:00");
        assert_eq!(args.common.view, ViewMode::Both);
    }

    #[test]
    fn sample_flag_without_seed_uses_default() {
        let cli = Cli::try_parse_from(["sf", "tui", "metric", "7", "--sample", "--compare", "2,5"]).unwrap();
        let Command::Tui(TuiCommand::Metric(args)) = cli.command else {
            panic!("expected tui metric");
        };
        assert_eq!(args.common.sample, Some(42));
        assert_eq!(args.compare, vec!["2".to_string(), "5".to_string()]);
    }

    #[test]
    fn start_without_end_is_rejected() {
        assert!(Cli::try_parse_from(["sf", "forecast", "1", "--start", "2024-06-01"]).is_err());
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        assert!(Cli::try_parse_from(["sf", "forecast", "1", "--start", "june", "--end", "july"]).is_err());
    }
}
