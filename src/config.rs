//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.policy-analytics.toml` files.

use crate::analysis::{RangeToken, TrendThresholds};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".policy-analytics.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Trend classification thresholds.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Range used when `--range` is not given.
    #[serde(default = "default_range")]
    pub default_range: String,

    /// Directory the export is written to when `--output` is not given.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_range: default_range(),
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_range() -> String {
    RangeToken::default().as_str().to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Thresholds for trend and activity classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Percent change between halves needed to call a trend direction.
    #[serde(default = "default_trend_change_pct")]
    pub trend_change_pct: f64,

    /// Average daily events above which activity is "High".
    #[serde(default = "default_activity_high")]
    pub activity_high: f64,

    /// Average daily events above which activity is "Medium".
    #[serde(default = "default_activity_medium")]
    pub activity_medium: f64,

    /// Trend magnitude below which a series counts as stable.
    #[serde(default = "default_stability_pct")]
    pub stability_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_change_pct: default_trend_change_pct(),
            activity_high: default_activity_high(),
            activity_medium: default_activity_medium(),
            stability_pct: default_stability_pct(),
        }
    }
}

fn default_trend_change_pct() -> f64 {
    TrendThresholds::default().change_pct
}

fn default_activity_high() -> f64 {
    TrendThresholds::default().activity_high
}

fn default_activity_medium() -> f64 {
    TrendThresholds::default().activity_medium
}

fn default_stability_pct() -> f64 {
    TrendThresholds::default().stability_pct
}

impl AnalysisConfig {
    pub fn thresholds(&self) -> TrendThresholds {
        TrendThresholds {
            change_pct: self.trend_change_pct,
            activity_high: self.activity_high,
            activity_medium: self.activity_medium,
            stability_pct: self.stability_pct,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format used when `--format` is not given.
    #[serde(default)]
    pub format: ReportFormat,

    /// Maximum rows in the Markdown coverage table.
    #[serde(default = "default_max_coverage_rows")]
    pub max_coverage_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            max_coverage_rows: default_max_coverage_rows(),
        }
    }
}

fn default_max_coverage_rows() -> usize {
    20
}

/// Serialized form of [`OutputFormat`] in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Markdown => OutputFormat::Markdown,
        }
    }
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Markdown => ReportFormat::Markdown,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

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

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref range) = args.range {
            self.general.default_range = range.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format.into();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The effective range token; unknown values resolve to `7d`.
    pub fn range(&self) -> RangeToken {
        RangeToken::parse_or_default(&self.general.default_range)
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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.default_range, "7d");
        assert_eq!(config.range(), RangeToken::Week);
        assert_eq!(config.analysis.thresholds(), TrendThresholds::default());
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
default_range = "90d"
output_dir = "exports"
verbose = true

[analysis]
trend_change_pct = 7.5

[report]
format = "markdown"
max_coverage_rows = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.range(), RangeToken::Quarter);
        assert_eq!(config.general.output_dir, "exports");
        assert!(config.general.verbose);
        assert_eq!(config.analysis.trend_change_pct, 7.5);
        assert_eq!(config.analysis.activity_high, 10.0);
        assert_eq!(config.report.format, ReportFormat::Markdown);
        assert_eq!(config.report.max_coverage_rows, 5);
    }

    #[test]
    fn test_unknown_range_in_config_falls_back() {
        let config: Config = toml::from_str("[general]\ndefault_range = \"2w\"\n").unwrap();
        assert_eq!(config.range(), RangeToken::Week);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[general\nbroken").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.general.default_range, "7d");
    }
}
