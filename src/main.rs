//! Salescope - sales analytics dashboard for retail transaction CSVs
//!
//! A CLI tool that loads a sales dataset, narrows it with the user's
//! filters and renders one dashboard page as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unreadable dataset, or failed report write

mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod models;
mod report;
mod views;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use error::{FilterError, LoadError};
use models::{DateRange, FilterSpec, RecordSet};
use report::{Report, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use views::ViewRequest;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config file may turn on verbose logging, so it is read first
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("Salescope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(&args, &config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: generate a default .salescope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the dataset path, output format and table sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so that a report printed to stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref config_path) => Config::load(config_path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    Ok(config)
}

/// Load the dataset and render the requested page.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();
    let data_path = Path::new(&config.data.path);

    let set = match data::load_records(data_path) {
        Ok(set) => set,
        Err(e) => {
            if let LoadError::MissingColumn(_) = e {
                warn!(
                    "The dataset must provide these columns: {}",
                    data::REQUIRED_COLUMNS.join(", ")
                );
            }
            return Err(e)
                .with_context(|| format!("Failed to load dataset {}", data_path.display()));
        }
    };

    if set.is_empty() {
        warn!("Dataset {} contains no records", data_path.display());
    }

    if let Some(field) = args.list_values {
        println!("All");
        for value in analysis::distinct_values(set.records(), field.into()) {
            println!("{}", value);
        }
        return Ok(());
    }

    let request = build_request(args, config, &set).context("Invalid filter")?;
    if request.filter.is_unrestricted() {
        debug!("No filters given; pages use the whole dataset");
    }
    let def = views::find(args.view)
        .with_context(|| format!("No page registered for {:?}", args.view))?;

    info!("Rendering page: {}", def.title);
    let page = (def.build)(&set, &request).context("Invalid filter")?;
    info!("{} of {} records matched", page.matched, set.len());

    let report = Report {
        metadata: ReportMetadata {
            dataset: config.data.path.clone(),
            generated_at: Utc::now(),
            load: set.load_report(),
        },
        page,
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    debug!("Finished in {:.3}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Turn the command-line filters into a page request.
fn build_request(args: &Args, config: &Config, set: &RecordSet) -> Result<ViewRequest, FilterError> {
    let (from, to) = args.date_bounds()?;

    let filter = FilterSpec {
        city: args.city_selection(),
        category: args.category_selection(),
        payment_method: args.payment_selection(),
        date_range: resolve_date_range(from, to, set)?,
        branch: args.branch.clone(),
    };
    filter.validate()?;

    Ok(ViewRequest {
        filter,
        top_n: config.report.top_n,
        bins: config.report.histogram_bins,
        max_rows: config.report.max_rows,
    })
}

/// Close an open-ended `--from` / `--to` pair against the dataset's dates.
fn resolve_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    set: &RecordSet,
) -> Result<Option<DateRange>, FilterError> {
    let covering = DateRange::covering(set.records());

    let (start, end) = match (from, to) {
        (None, None) => return Ok(None),
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, covering.map_or(start, |c| c.end.max(start))),
        (None, Some(end)) => (covering.map_or(end, |c| c.start.min(end)), end),
    };

    DateRange::new(start, end).map(Some)
}
