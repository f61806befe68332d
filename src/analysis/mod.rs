//! Analytics pipeline.
//!
//! Every aggregator here is a pure function of its inputs. Windows carry
//! their own reference time, so nothing in this module reads the clock.

pub mod claims;
pub mod overview;
pub mod policy;
pub mod revenue;
pub mod snapshot;
pub mod trend;
pub mod window;

pub use snapshot::{build_snapshot, AnalyticsSnapshot, SnapshotRequest};
pub use trend::TrendThresholds;
pub use window::{RangeToken, TimeWindow};

use crate::models::{DateField, Dated};
use chrono::DateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records grouped into one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`, UTC.
    pub month: String,
    pub count: u64,
    pub value: f64,
}

/// Sum of `value` over `items`, starting from +0.0.
pub(crate) fn total<T>(items: &[T], value: impl Fn(&T) -> f64) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + value(item))
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Zero-guarded percentage.
pub(crate) fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// Count labels in first-seen order.
pub(crate) fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> IndexMap<String, u64> {
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for label in labels {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Group records by the calendar month of `field`, ascending.
///
/// Only months with at least one record are emitted.
pub(crate) fn bucket_by_month<T: Dated>(
    records: &[T],
    field: DateField,
    value: impl Fn(&T) -> f64,
) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<String, (u64, f64)> = BTreeMap::new();

    for record in records {
        let Some(month) = record.date(field).and_then(month_key) else {
            continue;
        };
        let entry = months.entry(month).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += value(record);
    }

    months
        .into_iter()
        .map(|(month, (count, value))| MonthlyBucket { month, count, value })
        .collect()
}

fn month_key(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m").to_string())
}
