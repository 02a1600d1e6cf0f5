//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - fetches or loads observations
//! - prints the summary, chart and table views
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, CommonArgs, ForecastArgs, MetricArgs, TuiCommand};
use crate::data::ApiClient;
use crate::domain::{DataOrigin, DateRange, ResourceQuery, ViewConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sf` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    // The TUI owns the terminal; log lines on stderr would tear the screen.
    if !matches!(cli.command, Command::Tui(_)) {
        init_logging(cli.verbose, cli.quiet);
    }

    match cli.command {
        Command::Forecast(args) => handle_view(forecast_config(&args, &cli.date_format)?),
        Command::Metric(args) => handle_view(metric_config(&args, &cli.date_format)?),
        Command::MetricsAvailable => handle_metrics_available(),
        Command::Tui(TuiCommand::Forecast(args)) => crate::tui::run(forecast_config(&args, &cli.date_format)?),
        Command::Tui(TuiCommand::Metric(args)) => crate::tui::run(metric_config(&args, &cli.date_format)?),
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Ignore the error if a subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_view(config: ViewConfig) -> Result<(), AppError> {
    let out = pipeline::run_view(&config)?;

    let stats = crate::report::source_stats(&out.ingest.observations);
    println!(
        "{}",
        crate::report::format_run_summary(
            &config.query,
            config.range.as_ref(),
            &out.ingest,
            &stats,
            &out.selection,
        )
    );

    let skipped = [
        crate::report::format_skipped("Ingest", &out.ingest.skipped),
        crate::report::format_skipped("Table", &out.table.skipped),
        crate::report::format_skipped("Chart", &out.chart_skipped),
    ]
    .concat();
    if !skipped.is_empty() {
        println!("{skipped}");
    }

    if config.view.shows_chart() {
        println!(
            "{}",
            crate::plot::render_series_plot(&out.lines, config.plot_width, config.plot_height)
        );
    }
    if config.view.shows_table() {
        println!("{}", crate::report::format_pivot_table(&out.table));
    }

    if let Some(path) = &config.export {
        if out.table.is_empty() {
            return Err(AppError::new(3, "Nothing to export: the table is empty."));
        }
        crate::io::export::write_csv(path, &out.table.columns, &out.table.rows)?;
        println!("Exported {} row(s) to {}", out.table.rows.len(), path.display());
    }

    Ok(())
}

fn handle_metrics_available() -> Result<(), AppError> {
    let client = ApiClient::from_env();
    let options = client.available_metrics()?;
    if options.is_empty() {
        return Err(AppError::new(3, format!("{} reports no metrics.", client.base_url())));
    }
    for opt in options {
        println!("{:<16} {}", opt.value, opt.label);
    }
    Ok(())
}

pub fn forecast_config(args: &ForecastArgs, date_pattern: &str) -> Result<ViewConfig, AppError> {
    view_config_from_args(
        ResourceQuery::Forecast {
            plant_id: args.plant_id,
        },
        &args.common,
        date_pattern,
    )
}

pub fn metric_config(args: &MetricArgs, date_pattern: &str) -> Result<ViewConfig, AppError> {
    view_config_from_args(
        ResourceQuery::Metric {
            model_id: args.model_id,
            metric: args.metric.clone(),
            compare: args.compare.iter().map(|s| s.trim().to_string()).collect(),
        },
        &args.common,
        date_pattern,
    )
}

pub fn view_config_from_args(
    query: ResourceQuery,
    args: &CommonArgs,
    date_pattern: &str,
) -> Result<ViewConfig, AppError> {
    let range = match (args.start, args.end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (None, None) => None,
        _ => return Err(AppError::new(2, "--start and --end must be given together.")),
    };

    let origin = match (&args.input, args.sample) {
        (Some(path), _) => DataOrigin::File(path.clone()),
        (None, Some(seed)) => DataOrigin::Sample { seed },
        (None, None) => DataOrigin::Api,
    };

    Ok(ViewConfig {
        query,
        origin,
        range,
        sources: args.sources.clone(),
        view: args.view,
        date_pattern: date_pattern.to_string(),
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
    })
}
