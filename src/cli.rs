//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::source::RecordSource;
use chrono::DateTime;
use clap::Parser;
use std::path::PathBuf;

/// policy-analytics - dashboard aggregates for insurance records
///
/// Reads exported policy and claim records, computes portfolio KPIs,
/// distributions, monthly series and daily trends for a trailing window,
/// and writes the snapshot as JSON or Markdown.
///
/// Examples:
///   policy-analytics --input records.json --range 30d
///   policy-analytics --policies policies.json --claims claims.json --range 1y --format markdown
///   policy-analytics --input records.json --now 2024-06-15T12:00:00Z --output snapshot.json
///   policy-analytics --input records.json --dry-run
///   policy-analytics --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Bundle file with `policies`, `claims` and optional `summary`
    #[arg(
        short,
        long,
        value_name = "FILE",
        conflicts_with_all = ["policies", "claims"]
    )]
    pub input: Option<PathBuf>,

    /// JSON array of policy records
    #[arg(long, value_name = "FILE", requires = "claims")]
    pub policies: Option<PathBuf>,

    /// JSON array of claim records
    #[arg(long, value_name = "FILE", requires = "policies")]
    pub claims: Option<PathBuf>,

    /// Trailing window: 7d, 30d, 90d or 1y
    ///
    /// Unrecognized values fall back to 7d with a warning.
    #[arg(short, long, value_name = "RANGE", env = "POLICY_ANALYTICS_RANGE")]
    pub range: Option<String>,

    /// Reference time the window ends at
    ///
    /// Epoch seconds or RFC 3339. Defaults to the current time.
    #[arg(long, value_name = "TIME", value_parser = parse_reference_time)]
    pub now: Option<i64>,

    /// Output file path for the export
    ///
    /// Defaults to analytics-<range>-<date>.json in the configured output directory
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .policy-analytics.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exit with code 2 if the loss ratio exceeds this percentage
    #[arg(long, value_name = "PCT")]
    pub fail_on_loss_ratio: Option<f64>,

    /// Load and validate records without writing an export
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .policy-analytics.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON snapshot (default)
    #[default]
    Json,
    /// Markdown summary
    Markdown,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

/// Accept epoch seconds or an RFC 3339 timestamp.
pub fn parse_reference_time(value: &str) -> Result<i64, String> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return Ok(seconds);
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| format!("expected epoch seconds or RFC 3339 time: {}", e))
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

        if self.record_source().is_none() {
            return Err("Provide --input, or both --policies and --claims".to_string());
        }

        for path in [&self.input, &self.policies, &self.claims].into_iter().flatten() {
            if !path.is_file() {
                return Err(format!("Record file does not exist: {}", path.display()));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(threshold) = self.fail_on_loss_ratio {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err("Loss ratio threshold must be a non-negative number".to_string());
            }
        }

        Ok(())
    }

    /// Where to read records from, if enough was given.
    pub fn record_source(&self) -> Option<RecordSource> {
        match (&self.input, &self.policies, &self.claims) {
            (Some(input), _, _) => Some(RecordSource::Bundle(input.clone())),
            (None, Some(policies), Some(claims)) => Some(RecordSource::Split {
                policies: policies.clone(),
                claims: claims.clone(),
            }),
            _ => None,
        }
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
    use tempfile::NamedTempFile;

    fn make_args(input: Option<PathBuf>) -> Args {
        Args {
            input,
            policies: None,
            claims: None,
            range: None,
            now: None,
            output: None,
            format: None,
            config: None,
            fail_on_loss_ratio: None,
            dry_run: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_reference_time() {
        assert_eq!(parse_reference_time("1718452800"), Ok(1_718_452_800));
        assert_eq!(parse_reference_time("2024-06-15T12:00:00Z"), Ok(1_718_452_800));
        assert_eq!(parse_reference_time("2024-06-15T14:00:00+02:00"), Ok(1_718_452_800));
        assert!(parse_reference_time("tomorrow").is_err());
    }

    #[test]
    fn test_validation_requires_source() {
        let args = make_args(None);
        assert!(args.validate().is_err());

        let mut init = make_args(None);
        init.init_config = true;
        assert!(init.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_file() {
        let args = make_args(Some(PathBuf::from("/no/such/records.json")));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(Some(file.path().to_path_buf()));
        assert!(args.validate().is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_loss_ratio_threshold() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(Some(file.path().to_path_buf()));
        args.fail_on_loss_ratio = Some(-1.0);
        assert!(args.validate().is_err());

        args.fail_on_loss_ratio = Some(80.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_record_source_selection() {
        let mut args = make_args(None);
        args.policies = Some(PathBuf::from("p.json"));
        assert_eq!(args.record_source(), None);

        args.claims = Some(PathBuf::from("c.json"));
        assert_eq!(
            args.record_source(),
            Some(RecordSource::Split {
                policies: PathBuf::from("p.json"),
                claims: PathBuf::from("c.json"),
            })
        );
    }

    #[test]
    fn test_invalid_range_is_accepted_by_parser() {
        let args = Args::try_parse_from(["policy-analytics", "--input", "x.json", "--range", "2w"])
            .unwrap();
        assert_eq!(args.range.as_deref(), Some("2w"));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(None);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
