//! Daily activity series, trend classification and correlation metrics.

use super::window::TimeWindow;
use super::{ratio, total};
use crate::models::{Claim, DateField, Dated, Policy};
use chrono::{DateTime, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tunables for trend classification.
///
/// All comparisons are strict: a change of exactly `change_pct` is stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// Percent change between halves needed to call a direction.
    pub change_pct: f64,
    /// Average daily events above which activity is high.
    pub activity_high: f64,
    pub activity_medium: f64,
    /// Magnitude below which a series counts as stable.
    pub stability_pct: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            change_pct: 5.0,
            activity_high: 10.0,
            activity_medium: 5.0,
            stability_pct: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityLevel::High => write!(f, "High"),
            ActivityLevel::Medium => write!(f, "Medium"),
            ActivityLevel::Low => write!(f, "Low"),
            ActivityLevel::None => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStability {
    #[default]
    Stable,
    Moderate,
    Volatile,
}

impl fmt::Display for TrendStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendStability::Stable => write!(f, "Stable"),
            TrendStability::Moderate => write!(f, "Moderate"),
            TrendStability::Volatile => write!(f, "Volatile"),
        }
    }
}

/// Activity on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub policies: u64,
    pub claims: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesTrend {
    pub direction: TrendDirection,
    /// Absolute percent change between the two halves.
    pub magnitude: f64,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMetrics {
    /// Claims per policy, rounded to two decimals.
    pub policy_claims_ratio: f64,
    pub activity_level: ActivityLevel,
    pub trend_stability: TrendStability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    /// Oldest day first, one entry per day including empty ones.
    pub daily_series: Vec<DailyPoint>,
    pub policy_trend: SeriesTrend,
    pub claims_trend: SeriesTrend,
    pub correlation: CorrelationMetrics,
}

pub fn aggregate_trends(
    policies: &[Policy],
    claims: &[Claim],
    window: &TimeWindow,
    thresholds: &TrendThresholds,
) -> TrendStats {
    let daily_series = build_daily_series(policies, claims, window);

    let policy_series: Vec<f64> = daily_series.iter().map(|d| d.policies as f64).collect();
    let claims_series: Vec<f64> = daily_series.iter().map(|d| d.claims as f64).collect();

    let policy_trend = calculate_trend_stats(&policy_series, thresholds);
    let claims_trend = calculate_trend_stats(&claims_series, thresholds);

    let policy_total = total(&policy_series, |v| *v);
    let claims_total = total(&claims_series, |v| *v);
    let avg_daily_total = ratio(policy_total + claims_total, window.bucket_count as f64);

    let correlation = CorrelationMetrics {
        policy_claims_ratio: round2(ratio(claims_total, policy_total)),
        activity_level: classify_activity(avg_daily_total, thresholds),
        trend_stability: classify_stability(&policy_trend, &claims_trend, thresholds),
    };

    TrendStats {
        daily_series,
        policy_trend,
        claims_trend,
        correlation,
    }
}

/// One point per calendar day, `bucket_count` days ending on the reference day.
pub fn build_daily_series(policies: &[Policy], claims: &[Claim], window: &TimeWindow) -> Vec<DailyPoint> {
    let Some(today) = day_of(window.reference_time) else {
        return Vec::new();
    };

    let policy_days = count_by_day(policies, DateField::StartDate);
    let claim_days = count_by_day(claims, DateField::SubmissionDate);

    (0..window.bucket_count as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let policies = policy_days.get(&date).copied().unwrap_or(0);
            let claims = claim_days.get(&date).copied().unwrap_or(0);
            DailyPoint {
                date,
                policies,
                claims,
                total: policies + claims,
            }
        })
        .collect()
}

/// Compare the mean of the later half of `series` against the earlier half.
pub fn calculate_trend_stats(series: &[f64], thresholds: &TrendThresholds) -> SeriesTrend {
    let n = series.len();
    if n < 2 {
        return SeriesTrend::default();
    }

    let (first, second) = series.split_at(n / 2);
    let first_avg = total(first, |v| *v) / first.len() as f64;
    let second_avg = total(second, |v| *v) / second.len() as f64;

    let percent_change = if first_avg > 0.0 {
        (second_avg - first_avg) / first_avg * 100.0
    } else {
        0.0
    };

    let direction = if percent_change > thresholds.change_pct {
        TrendDirection::Increasing
    } else if percent_change < -thresholds.change_pct {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    SeriesTrend {
        direction,
        magnitude: percent_change.abs(),
        percent_change,
    }
}

pub fn classify_activity(avg_daily_total: f64, thresholds: &TrendThresholds) -> ActivityLevel {
    if avg_daily_total > thresholds.activity_high {
        ActivityLevel::High
    } else if avg_daily_total > thresholds.activity_medium {
        ActivityLevel::Medium
    } else if avg_daily_total > 0.0 {
        ActivityLevel::Low
    } else {
        ActivityLevel::None
    }
}

pub fn classify_stability(
    policy_trend: &SeriesTrend,
    claims_trend: &SeriesTrend,
    thresholds: &TrendThresholds,
) -> TrendStability {
    let steady = [policy_trend, claims_trend]
        .iter()
        .filter(|t| t.magnitude < thresholds.stability_pct)
        .count();

    match steady {
        2 => TrendStability::Stable,
        1 => TrendStability::Moderate,
        _ => TrendStability::Volatile,
    }
}

fn count_by_day<T: Dated>(records: &[T], field: DateField) -> HashMap<NaiveDate, u64> {
    let mut days: HashMap<NaiveDate, u64> = HashMap::new();
    for day in records.iter().filter_map(|r| r.date(field)).filter_map(day_of) {
        *days.entry(day).or_insert(0) += 1;
    }
    days
}

fn day_of(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
