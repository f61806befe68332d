//! Time window resolution and record filtering.
//!
//! A window is a trailing span ending at an explicit reference time. The
//! reference time is always passed in so that two runs over the same
//! records produce the same output.

use crate::models::{DateField, Dated};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Selectable trailing range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeToken {
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl RangeToken {
    /// Length of the range in days, which is also its daily bucket count.
    pub fn days(&self) -> usize {
        match self {
            RangeToken::Week => 7,
            RangeToken::Month => 30,
            RangeToken::Quarter => 90,
            RangeToken::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeToken::Week => "7d",
            RangeToken::Month => "30d",
            RangeToken::Quarter => "90d",
            RangeToken::Year => "1y",
        }
    }

    /// Human label for reports.
    pub fn display_label(&self) -> &'static str {
        match self {
            RangeToken::Week => "Last 7 Days",
            RangeToken::Month => "Last 30 Days",
            RangeToken::Quarter => "Last 90 Days",
            RangeToken::Year => "Last Year",
        }
    }

    /// Parse a token, falling back to `7d` for anything unrecognized.
    pub fn parse_or_default(token: &str) -> Self {
        token.parse().unwrap_or_else(|_| {
            warn!("Unknown range token '{}', falling back to 7d", token);
            RangeToken::default()
        })
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RangeToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(RangeToken::Week),
            "30d" => Ok(RangeToken::Month),
            "90d" => Ok(RangeToken::Quarter),
            "1y" => Ok(RangeToken::Year),
            other => Err(format!("unknown range token: {}", other)),
        }
    }
}

/// A resolved trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub range_token: RangeToken,
    pub duration_seconds: i64,
    /// Number of daily buckets (7/30/90/365).
    pub bucket_count: usize,
    /// The "now" the window ends at, in epoch seconds.
    pub reference_time: i64,
}

impl TimeWindow {
    /// Resolve a range token against an explicit reference time.
    pub fn resolve(token: &str, reference_time: i64) -> Self {
        Self::for_range(RangeToken::parse_or_default(token), reference_time)
    }

    pub fn for_range(range_token: RangeToken, reference_time: i64) -> Self {
        let days = range_token.days();
        Self {
            range_token,
            duration_seconds: days as i64 * SECONDS_PER_DAY,
            bucket_count: days,
            reference_time,
        }
    }

    /// Earliest instant (inclusive) inside the window.
    pub fn start(&self) -> i64 {
        self.reference_time - self.duration_seconds
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start()
    }
}

/// Keep the records whose `field` falls inside `window`, in original order.
///
/// Records without a usable date are dropped.
pub fn filter_by_window<T: Dated + Clone>(records: &[T], window: &TimeWindow, field: DateField) -> Vec<T> {
    let kept: Vec<T> = records
        .iter()
        .filter(|r| r.date(field).is_some_and(|ts| window.contains(ts)))
        .cloned()
        .collect();

    debug!(
        "Window {} kept {}/{} records by {:?}",
        window.range_token,
        kept.len(),
        records.len(),
        field
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{claim, policy, DAY, NOW};
    use crate::models::{ClaimStatus, PlanType};

    #[test]
    fn test_resolve_known_tokens() {
        let cases = [("7d", 7), ("30d", 30), ("90d", 90), ("1y", 365)];
        for (token, days) in cases {
            let window = TimeWindow::resolve(token, NOW);
            assert_eq!(window.bucket_count, days);
            assert_eq!(window.duration_seconds, days as i64 * SECONDS_PER_DAY);
            assert_eq!(window.range_token.as_str(), token);
        }
    }

    #[test]
    fn test_unknown_token_falls_back_to_week() {
        let window = TimeWindow::resolve("2w", NOW);
        assert_eq!(window.range_token, RangeToken::Week);
        assert_eq!(window.bucket_count, 7);

        let window = TimeWindow::resolve("", NOW);
        assert_eq!(window.range_token, RangeToken::Week);
    }

    #[test]
    fn test_token_serializes_as_short_form() {
        let json = serde_json::to_string(&RangeToken::Year).unwrap();
        assert_eq!(json, "\"1y\"");
    }

    #[test]
    fn test_filter_keeps_order_and_boundary() {
        let window = TimeWindow::resolve("7d", NOW);
        let policies = vec![
            policy("a", PlanType::Basic, NOW - DAY, 1.0),
            policy("b", PlanType::Basic, NOW - 8 * DAY, 1.0),
            policy("c", PlanType::Premium, window.start(), 1.0),
            policy("d", PlanType::Platinum, NOW, 1.0),
        ];

        let kept = filter_by_window(&policies, &window, DateField::StartDate);
        let ids: Vec<_> = kept.iter().map(|p| p.policy_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_filter_drops_missing_dates() {
        let window = TimeWindow::resolve("1y", NOW);
        let mut undated = claim("x", ClaimStatus::Pending, NOW, 1.0);
        undated.submission_date = None;
        let claims = vec![undated, claim("y", ClaimStatus::Paid, NOW - DAY, 2.0)];

        let kept = filter_by_window(&claims, &window, DateField::SubmissionDate);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].claim_id, "y");
    }

    #[test]
    fn test_filter_on_field_record_lacks() {
        let window = TimeWindow::resolve("1y", NOW);
        let policies = vec![policy("a", PlanType::Basic, NOW, 1.0)];
        assert!(filter_by_window(&policies, &window, DateField::SubmissionDate).is_empty());
    }
}
