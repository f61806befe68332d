//! Claim status, volume and processing statistics.

use super::window::SECONDS_PER_DAY;
use super::{bucket_by_month, tally, total, MonthlyBucket};
use crate::models::{Claim, DateField, Dated};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
    pub status_distribution: IndexMap<String, u64>,
    pub monthly_claims_data: Vec<MonthlyBucket>,
    pub average_claim_amount: f64,
    /// Mean days from submission to processing, over processed claims only.
    pub average_processing_time: f64,
    pub total_claims_value: f64,
}

pub fn aggregate_claims(claims: &[Claim]) -> ClaimStats {
    let total_claims_value = total(claims, |c| c.claim_amount);
    let average_claim_amount = if claims.is_empty() {
        0.0
    } else {
        total_claims_value / claims.len() as f64
    };

    ClaimStats {
        status_distribution: tally(claims.iter().map(|c| c.status.label())),
        monthly_claims_data: bucket_by_month(claims, DateField::SubmissionDate, |c| c.claim_amount),
        average_claim_amount,
        average_processing_time: average_processing_days(claims),
        total_claims_value,
    }
}

/// Mean processing time in days over claims that have been processed.
///
/// Unprocessed claims are excluded from both the sum and the count.
pub fn average_processing_days(claims: &[Claim]) -> f64 {
    let durations: Vec<f64> = claims
        .iter()
        .filter_map(|c| {
            let processed = c.date(DateField::ProcessedDate)?;
            let submitted = c.date(DateField::SubmissionDate)?;
            Some((processed - submitted) as f64 / SECONDS_PER_DAY as f64)
        })
        .collect();

    if durations.is_empty() {
        0.0
    } else {
        total(&durations, |d| *d) / durations.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{approx_eq, claim, DAY, NOW};
    use crate::models::ClaimStatus;

    // 2024-01-15, 2024-01-20 and 2024-03-02 (UTC noon)
    const JAN_15: i64 = 1_705_320_000;
    const JAN_20: i64 = 1_705_752_000;
    const MAR_02: i64 = 1_709_380_800;

    #[test]
    fn test_empty_claims() {
        let stats = aggregate_claims(&[]);
        assert_eq!(stats, ClaimStats::default());
        assert!(stats.monthly_claims_data.is_empty());
    }

    #[test]
    fn test_status_distribution() {
        let claims = vec![
            claim("1", ClaimStatus::Pending, NOW, 1.0),
            claim("2", ClaimStatus::Approved, NOW, 1.0),
            claim("3", ClaimStatus::Paid, NOW, 1.0),
        ];

        let stats = aggregate_claims(&claims);
        let expected: IndexMap<String, u64> = [("Pending", 1), ("Approved", 1), ("Paid", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(stats.status_distribution, expected);
        assert_eq!(stats.status_distribution.values().sum::<u64>(), 3);
    }

    #[test]
    fn test_monthly_buckets_sorted_and_sparse() {
        let claims = vec![
            claim("1", ClaimStatus::Pending, MAR_02, 4.0),
            claim("2", ClaimStatus::Pending, JAN_15, 1.0),
            claim("3", ClaimStatus::Pending, JAN_20, 2.0),
        ];

        let stats = aggregate_claims(&claims);
        let months: Vec<_> = stats
            .monthly_claims_data
            .iter()
            .map(|b| b.month.as_str())
            .collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
        assert_eq!(stats.monthly_claims_data[0].count, 2);
        assert!(approx_eq(stats.monthly_claims_data[0].value, 3.0));
        assert!(approx_eq(stats.average_claim_amount, 7.0 / 3.0));
        assert!(approx_eq(stats.total_claims_value, 7.0));
    }

    #[test]
    fn test_processing_time_ignores_unprocessed() {
        let mut fast = claim("1", ClaimStatus::Approved, NOW - 10 * DAY, 1.0);
        fast.processed_date = Some(NOW - 8 * DAY);
        let mut slow = claim("2", ClaimStatus::Paid, NOW - 10 * DAY, 1.0);
        slow.processed_date = Some(NOW - 6 * DAY);
        let pending = claim("3", ClaimStatus::Pending, NOW - DAY, 1.0);

        let stats = aggregate_claims(&[fast, slow, pending]);
        assert!(approx_eq(stats.average_processing_time, 3.0));
    }

    #[test]
    fn test_processing_time_zero_when_nothing_processed() {
        let claims = vec![claim("1", ClaimStatus::Pending, NOW, 1.0)];
        assert_eq!(average_processing_days(&claims), 0.0);
    }
}
