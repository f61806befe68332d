//! policy-analytics - dashboard aggregates for insurance records
//!
//! A CLI tool that reads exported policy and claim records and writes a
//! point-in-time analytics snapshot for a trailing window.
//!
//! Exit codes:
//!   0 - Success (loss ratio within --fail-on-loss-ratio, or no threshold set)
//!   1 - Runtime error (unreadable records, bad config, write failure, etc.)
//!   2 - Loss ratio above the --fail-on-loss-ratio threshold

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::{build_snapshot, AnalyticsSnapshot, SnapshotRequest, TimeWindow};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use source::RecordBundle;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
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

    // Config decides the default verbosity, so it is read before logging starts
    let (config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config)?;

    info!("policy-analytics v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_origin {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analytics run failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .policy-analytics.toml.
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
    println!("   Edit it to customize the default range, thresholds and report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete pipeline. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // The only clock read; everything downstream uses this instant
    let reference_time = args.now.unwrap_or_else(|| Utc::now().timestamp());
    let window = TimeWindow::for_range(config.range(), reference_time);
    let format: OutputFormat = config.report.format.into();

    // Step 1: Load the records
    let source = args
        .record_source()
        .context("Provide --input, or both --policies and --claims")?;
    println!("📥 Loading records...");
    let bundle = source.load().await?;

    if args.dry_run {
        return handle_dry_run(&bundle, &window);
    }

    // Step 2: Aggregate
    println!("\n🔬 Computing {} snapshot...", window.range_token.display_label());
    let request = SnapshotRequest::new(&bundle.policies, &bundle.claims, window)
        .with_counters(bundle.summary.as_ref())
        .with_thresholds(config.analysis.thresholds());
    let snapshot = build_snapshot(&request);

    // Step 3: Export
    println!("\n📝 Writing export...");
    let output_path = args.output.clone().unwrap_or_else(|| {
        report::export_path(Path::new(&config.general.output_dir), &window, format)
    });
    let content = report::render(&snapshot, format, config.report.max_coverage_rows)?;
    report::write_report(&content, &output_path)
        .with_context(|| format!("Failed to write export to {}", output_path.display()))?;

    print_summary(&snapshot, start_time.elapsed().as_secs_f64());
    println!("\n✅ Snapshot complete! Export saved to: {}", output_path.display());

    // Check --fail-on-loss-ratio threshold
    if let Some(threshold) = args.fail_on_loss_ratio {
        if snapshot.overview.loss_ratio > threshold {
            eprintln!(
                "\n⛔ Loss ratio {:.1}% exceeds {:.1}%. Failing (exit code 2).",
                snapshot.overview.loss_ratio, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn print_summary(snapshot: &AnalyticsSnapshot, duration: f64) {
    let overview = &snapshot.overview;
    let trends = &snapshot.trend_stats;

    println!("\n📊 Snapshot Summary:");
    println!(
        "   Policies: {} ({} active, {} in window)",
        overview.total_policies, overview.active_policies, overview.policies_in_window
    );
    println!(
        "   Claims: {} ({} approved, {} in window)",
        overview.total_claims, overview.approved_claims, overview.claims_in_window
    );
    println!(
        "   Approval rate: {:.1}% | Loss ratio: {:.1}%",
        overview.claim_approval_rate, overview.loss_ratio
    );
    println!(
        "   Trends: policies {} | claims {} | activity {}",
        trends.policy_trend.direction, trends.claims_trend.direction, trends.correlation.activity_level
    );
    println!("   Duration: {:.1}s", duration);
}

/// Handle --dry-run: report what was loaded and what the window covers, exit.
fn handle_dry_run(bundle: &RecordBundle, window: &TimeWindow) -> Result<i32> {
    println!("\n🔍 Dry run: records loaded, nothing written...\n");

    println!("   Policies: {}", bundle.policies.len());
    println!("   Claims: {}", bundle.claims.len());
    if let Some(summary) = &bundle.summary {
        println!(
            "   Summary counters: policies={:?} claims={:?}",
            summary.total_policies, summary.total_claims
        );
    }

    let start = DateTime::from_timestamp(window.start(), 0);
    let end = DateTime::from_timestamp(window.reference_time, 0);
    if let (Some(start), Some(end)) = (start, end) {
        println!(
            "   Window: {} ({} to {})",
            window.range_token,
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n✅ Dry run complete. No export was written.");
    Ok(0)
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// An explicit `--config` that fails to load is an error; so is a malformed
/// default file.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, origin) = if let Some(ref config_path) = args.config {
        (Config::load(config_path)?, Some(config_path.clone()))
    } else {
        match Config::load_default()? {
            Some(config) => (config, Some(PathBuf::from(DEFAULT_CONFIG_FILE))),
            None => (Config::default(), None),
        }
    };

    config.merge_with_args(args);
    Ok((config, origin))
}
