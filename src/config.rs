//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salescope.toml` files.

use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".salescope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the sales CSV.
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> String {
    "Wallmart.csv".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Length of ranked lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Number of histogram bins.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Maximum records listed in tables.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top_n: default_top_n(),
            histogram_bins: default_histogram_bins(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_top_n() -> usize {
    15
}

fn default_histogram_bins() -> usize {
    20
}

fn default_max_rows() -> usize {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.report.top_n == 0 {
            anyhow::bail!("report.top_n must be at least 1");
        }
        if self.report.histogram_bins == 0 {
            anyhow::bail!("report.histogram_bins must be at least 1");
        }
        if self.report.max_rows == 0 {
            anyhow::bail!("report.max_rows must be at least 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(top) = args.top {
            self.report.top_n = top;
        }
        if let Some(bins) = args.bins {
            self.report.histogram_bins = bins;
        }
        if let Some(max_rows) = args.max_rows {
            self.report.max_rows = max_rows;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet {
            self.general.verbose = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.path, "Wallmart.csv");
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert_eq!(config.report.top_n, 15);
        assert_eq!(config.report.histogram_bins, 20);
        assert_eq!(config.report.max_rows, 50);
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[data]
path = "exports/sales_2019.csv"

[report]
format = "json"
top_n = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.data.path, "exports/sales_2019.csv");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.report.histogram_bins, 20);
    }

    #[test]
    fn test_load_rejects_zero_bins() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nhistogram_bins = 0").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("histogram_bins"));
    }

    #[test]
    fn test_load_rejects_zero_max_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nmax_rows = 0").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_rows"));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.report.top_n = 7;

        let args = Args::try_parse_from([
            "salescope",
            "--data",
            "other.csv",
            "--bins",
            "10",
            "--format",
            "json",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.data.path, "other.csv");
        assert_eq!(config.report.histogram_bins, 10);
        assert_eq!(config.report.format, OutputFormat::Json);
        // Not given on the command line, so the file value stands
        assert_eq!(config.report.top_n, 7);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data.path, "Wallmart.csv");
    }
}
