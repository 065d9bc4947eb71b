//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and conversion into filter predicates.

use crate::data::parse_day_first_date;
use crate::error::FilterError;
use crate::models::{GroupField, Selection};
use crate::views::ViewKind;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Salescope - sales analytics dashboard for retail transaction CSVs
///
/// Filter a sales dataset by city, category, payment method, date range or
/// branch code and render a dashboard page as Markdown or JSON.
///
/// Examples:
///   salescope --data Wallmart.csv
///   salescope --view customers --city "San Antonio" --payment Ewallet
///   salescope --view overview --from 01/01/2019 --to 31/03/2019
///   salescope --view branches --branch walm00 --format json
///   salescope --list-values category
///   salescope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Sales dataset (CSV)
    ///
    /// Defaults to the path in .salescope.toml, or Wallmart.csv.
    #[arg(short, long, value_name = "FILE", env = "SALESCOPE_DATA")]
    pub data: Option<PathBuf>,

    /// Dashboard page to render
    #[arg(long, value_enum, default_value = "overview")]
    pub view: ViewKind,

    /// Restrict to one city ("All" for every city)
    #[arg(long, value_name = "CITY")]
    pub city: Option<String>,

    /// Restrict to one product category ("All" for every category)
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Restrict to one payment method ("All" for every method)
    #[arg(long, value_name = "METHOD")]
    pub payment: Option<String>,

    /// First day of the date range, inclusive (dd/mm/yyyy or yyyy-mm-dd)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Last day of the date range, inclusive (dd/mm/yyyy or yyyy-mm-dd)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Branch code search, case-insensitive substring (e.g. WALM0)
    #[arg(short, long, value_name = "CODE")]
    pub branch: Option<String>,

    /// Length of ranked lists
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Number of histogram bins
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Maximum records listed in tables
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salescope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the options available for a filter and exit
    #[arg(long, value_enum, value_name = "FIELD")]
    pub list_values: Option<ListField>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .salescope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Filter fields whose options can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListField {
    City,
    Category,
    Payment,
    Branch,
}

impl From<ListField> for GroupField {
    fn from(field: ListField) -> Self {
        match field {
            ListField::City => GroupField::City,
            ListField::Category => GroupField::Category,
            ListField::Payment => GroupField::PaymentMethod,
            ListField::Branch => GroupField::Branch,
        }
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, FilterError> {
    raw.map(|value| {
        parse_day_first_date(value).ok_or_else(|| FilterError::InvalidDate(value.to_string()))
    })
    .transpose()
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.bins == Some(0) {
            return Err("--bins must be at least 1".to_string());
        }

        if self.max_rows == Some(0) {
            return Err("--max-rows must be at least 1".to_string());
        }

        if let (Some(start), Some(end)) = self.date_bounds().map_err(|e| e.to_string())? {
            if start > end {
                return Err(FilterError::InvertedDateRange { start, end }.to_string());
            }
        }

        Ok(())
    }

    /// The `--from` / `--to` bounds, either of which may be open.
    pub fn date_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), FilterError> {
        Ok((
            parse_bound(self.from.as_deref())?,
            parse_bound(self.to.as_deref())?,
        ))
    }

    pub fn city_selection(&self) -> Selection {
        self.city.as_deref().map(Selection::parse).unwrap_or_default()
    }

    pub fn category_selection(&self) -> Selection {
        self.category.as_deref().map(Selection::parse).unwrap_or_default()
    }

    pub fn payment_selection(&self) -> Selection {
        self.payment.as_deref().map(Selection::parse).unwrap_or_default()
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: Some(PathBuf::from("sales.csv")),
            view: ViewKind::Overview,
            city: None,
            category: None,
            payment: None,
            from: None,
            to: None,
            branch: None,
            top: None,
            bins: None,
            max_rows: None,
            format: None,
            output: None,
            config: None,
            list_values: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "salescope",
            "--view",
            "branches",
            "--branch",
            "walm0",
            "--format",
            "json",
            "--top",
            "5",
        ])
        .unwrap();

        assert_eq!(args.view, ViewKind::Branches);
        assert_eq!(args.branch.as_deref(), Some("walm0"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.top, Some(5));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_limits() {
        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.bins = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_rows = Some(0);
        assert!(args.validate().unwrap_err().contains("--max-rows"));
    }

    #[test]
    fn test_validation_rejects_inverted_dates() {
        let mut args = make_args();
        args.from = Some("31/03/2019".to_string());
        args.to = Some("01/01/2019".to_string());
        assert!(args.validate().unwrap_err().contains("after"));
    }

    #[test]
    fn test_validation_rejects_bad_date() {
        let mut args = make_args();
        args.from = Some("someday".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_date_bounds_are_day_first() {
        let mut args = make_args();
        args.from = Some("02/03/2019".to_string());
        let (from, to) = args.date_bounds().unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2019, 3, 2));
        assert_eq!(to, None);
    }

    #[test]
    fn test_selections() {
        let mut args = make_args();
        args.city = Some("Dallas".to_string());
        args.category = Some("All".to_string());
        assert_eq!(args.city_selection(), Selection::Only("Dallas".to_string()));
        assert_eq!(args.category_selection(), Selection::All);
        assert_eq!(args.payment_selection(), Selection::All);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
