//! Export generation.
//!
//! The JSON export is the snapshot serialized as-is. The Markdown report
//! renders the same snapshot for humans; neither derives new figures.

use crate::analysis::claims::ClaimStats;
use crate::analysis::overview::OverviewStats;
use crate::analysis::policy::PolicyStats;
use crate::analysis::revenue::RevenueStats;
use crate::analysis::trend::TrendStats;
use crate::analysis::{AnalyticsSnapshot, MonthlyBucket, TimeWindow};
use crate::cli::OutputFormat;
use anyhow::Result;
use chrono::DateTime;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// `analytics-<range>-<YYYY-MM-DD>.<ext>`, dated by the window's reference time.
pub fn export_file_name(window: &TimeWindow, format: OutputFormat) -> String {
    let date = DateTime::from_timestamp(window.reference_time, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown-date".to_string());

    format!(
        "analytics-{}-{}.{}",
        window.range_token,
        date,
        format.extension()
    )
}

/// Default export path inside `output_dir`.
pub fn export_path(output_dir: &Path, window: &TimeWindow, format: OutputFormat) -> PathBuf {
    output_dir.join(export_file_name(window, format))
}

/// Render the snapshot in the requested format.
pub fn render(snapshot: &AnalyticsSnapshot, format: OutputFormat, max_coverage_rows: usize) -> Result<String> {
    match format {
        OutputFormat::Json => generate_json_report(snapshot),
        OutputFormat::Markdown => Ok(generate_markdown_report(snapshot, max_coverage_rows)),
    }
}

/// Generate a JSON export.
pub fn generate_json_report(snapshot: &AnalyticsSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).map_err(Into::into)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(snapshot: &AnalyticsSnapshot, max_coverage_rows: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Policy Analytics Report\n\n");

    output.push_str(&generate_window_section(&snapshot.window, &snapshot.revenue_stats));
    output.push_str(&generate_overview_section(&snapshot.overview));
    output.push_str(&generate_policy_section(&snapshot.policy_stats, max_coverage_rows));
    output.push_str(&generate_claims_section(&snapshot.claim_stats));
    output.push_str(&generate_revenue_section(&snapshot.revenue_stats));
    output.push_str(&generate_trend_section(&snapshot.trend_stats));

    // Footer
    output.push_str("---\n\n");
    output.push_str("*Report generated by policy-analytics*\n");

    output
}

fn generate_window_section(window: &TimeWindow, revenue: &RevenueStats) -> String {
    let mut section = String::new();

    section.push_str("## Window\n\n");
    section.push_str(&format!(
        "- **Range:** {} ({})\n",
        window.range_token, revenue.period_label
    ));
    if let Some(reference) = DateTime::from_timestamp(window.reference_time, 0) {
        section.push_str(&format!(
            "- **Reference Time:** {}\n",
            reference.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    section.push_str(&format!("- **Daily Buckets:** {}\n\n", window.bucket_count));

    section
}

fn generate_overview_section(overview: &OverviewStats) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Policies | {} ({} active) |\n",
        overview.total_policies, overview.active_policies
    ));
    section.push_str(&format!(
        "| Claims | {} ({} approved) |\n",
        overview.total_claims, overview.approved_claims
    ));
    section.push_str(&format!(
        "| Policies in Window | {} |\n",
        overview.policies_in_window
    ));
    section.push_str(&format!("| Claims in Window | {} |\n", overview.claims_in_window));
    section.push_str(&format!(
        "| Premiums Paid | {:.4} |\n",
        overview.total_premiums_paid
    ));
    section.push_str(&format!(
        "| Claims Amount | {:.4} |\n",
        overview.total_claims_amount
    ));
    section.push_str(&format!(
        "| Approved Amount | {:.4} |\n",
        overview.total_approved_amount
    ));
    section.push_str(&format!(
        "| Approval Rate | {:.1}% |\n",
        overview.claim_approval_rate
    ));
    section.push_str(&format!("| Loss Ratio | {:.1}% |\n\n", overview.loss_ratio));

    section
}

fn generate_policy_section(stats: &PolicyStats, max_coverage_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Policies\n\n");
    section.push_str(&distribution_table("Plan", &stats.plan_distribution));
    section.push_str(&distribution_table(
        "Payment Type",
        &stats.payment_type_distribution,
    ));

    section.push_str(&format!(
        "Coverage utilization: **{:.1}%** ({:.4} of {:.4})\n\n",
        stats.coverage_utilization_rate, stats.total_used_coverage, stats.total_coverage
    ));

    if !stats.coverage_distribution.is_empty() {
        section.push_str("| Policy | Coverage | Used | Remaining |\n");
        section.push_str("|:---|---:|---:|---:|\n");
        for entry in stats.coverage_distribution.iter().take(max_coverage_rows) {
            section.push_str(&format!(
                "| `{}` | {:.4} | {:.4} | {:.4} |\n",
                entry.policy_id, entry.coverage, entry.used, entry.remaining
            ));
        }
        let hidden = stats.coverage_distribution.len().saturating_sub(max_coverage_rows);
        if hidden > 0 {
            section.push_str(&format!("\n*{} more policies not shown*\n", hidden));
        }
        section.push_str("\n");
    }

    section
}

fn generate_claims_section(stats: &ClaimStats) -> String {
    let mut section = String::new();

    section.push_str("## Claims\n\n");
    section.push_str(&distribution_table("Status", &stats.status_distribution));
    section.push_str(&format!(
        "- **Average Claim:** {:.4}\n- **Average Processing Time:** {:.1} days\n- **Total Value:** {:.4}\n\n",
        stats.average_claim_amount, stats.average_processing_time, stats.total_claims_value
    ));
    section.push_str(&monthly_table("Claims", &stats.monthly_claims_data));

    section
}

fn generate_revenue_section(stats: &RevenueStats) -> String {
    let mut section = String::new();

    section.push_str("## Revenue\n\n");
    section.push_str(&format!(
        "- **Total Revenue:** {:.4}\n- **Average per Policy:** {:.4}\n",
        stats.total_revenue, stats.average_revenue_per_policy
    ));
    if let Some((plan, revenue)) = stats.top_performing_plan() {
        section.push_str(&format!("- **Top Plan:** {} ({:.4})\n", plan, revenue));
    }
    section.push_str("\n");

    if !stats.revenue_by_plan.is_empty() {
        section.push_str("| Plan | Revenue |\n");
        section.push_str("|:---|---:|\n");
        for (plan, revenue) in &stats.revenue_by_plan {
            section.push_str(&format!("| {} | {:.4} |\n", plan, revenue));
        }
        section.push_str("\n");
    }

    section.push_str(&monthly_table("Policies", &stats.monthly_revenue_data));

    section
}

fn generate_trend_section(stats: &TrendStats) -> String {
    let mut section = String::new();

    section.push_str("## Trends\n\n");
    section.push_str("| Series | Direction | Change |\n");
    section.push_str("|:---|:---:|---:|\n");
    section.push_str(&format!(
        "| Policies | {} | {:+.1}% |\n",
        stats.policy_trend.direction, stats.policy_trend.percent_change
    ));
    section.push_str(&format!(
        "| Claims | {} | {:+.1}% |\n\n",
        stats.claims_trend.direction, stats.claims_trend.percent_change
    ));

    let correlation = &stats.correlation;
    section.push_str(&format!(
        "- **Claims per Policy:** {:.2}\n- **Activity Level:** {}\n- **Trend Stability:** {}\n\n",
        correlation.policy_claims_ratio, correlation.activity_level, correlation.trend_stability
    ));

    let active_days = stats.daily_series.iter().filter(|d| d.total > 0).count();
    section.push_str(&format!(
        "*{} of {} days had activity*\n\n",
        active_days,
        stats.daily_series.len()
    ));

    section
}

fn distribution_table(label: &str, distribution: &IndexMap<String, u64>) -> String {
    if distribution.is_empty() {
        return format!("*No {} data in this window*\n\n", label.to_lowercase());
    }

    let mut table = String::new();
    table.push_str(&format!("| {} | Count |\n", label));
    table.push_str("|:---|:---:|\n");
    for (key, count) in distribution {
        table.push_str(&format!("| {} | {} |\n", key, count));
    }
    table.push_str("\n");
    table
}

fn monthly_table(count_label: &str, buckets: &[MonthlyBucket]) -> String {
    if buckets.is_empty() {
        return String::new();
    }

    let mut table = String::new();
    table.push_str(&format!("| Month | {} | Value |\n", count_label));
    table.push_str("|:---|:---:|---:|\n");
    for bucket in buckets {
        table.push_str(&format!(
            "| {} | {} | {:.4} |\n",
            bucket.month, bucket.count, bucket.value
        ));
    }
    table.push_str("\n");
    table
}

/// Write rendered content to `path`, creating parent directories.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
