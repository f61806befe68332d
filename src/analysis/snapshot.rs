//! Snapshot assembly: one pipeline run from raw records to aggregates.

use super::claims::{aggregate_claims, ClaimStats};
use super::overview::{aggregate_overview, OverviewStats};
use super::policy::{aggregate_policies, PolicyStats};
use super::revenue::{aggregate_revenue, RevenueStats};
use super::trend::{aggregate_trends, TrendStats, TrendThresholds};
use super::window::{filter_by_window, TimeWindow};
use crate::models::{Claim, DateField, Policy, SummaryCounters};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything the dashboard needs, derived from a single set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub window: TimeWindow,
    pub overview: OverviewStats,
    pub policy_stats: PolicyStats,
    pub claim_stats: ClaimStats,
    pub revenue_stats: RevenueStats,
    pub trend_stats: TrendStats,
}

/// Inputs to one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRequest<'a> {
    pub policies: &'a [Policy],
    pub claims: &'a [Claim],
    pub counters: Option<&'a SummaryCounters>,
    pub window: TimeWindow,
    pub thresholds: TrendThresholds,
}

impl<'a> SnapshotRequest<'a> {
    pub fn new(policies: &'a [Policy], claims: &'a [Claim], window: TimeWindow) -> Self {
        Self {
            policies,
            claims,
            counters: None,
            window,
            thresholds: TrendThresholds::default(),
        }
    }

    pub fn with_counters(mut self, counters: Option<&'a SummaryCounters>) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_thresholds(mut self, thresholds: TrendThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Run every aggregator and assemble the snapshot.
pub fn build_snapshot(request: &SnapshotRequest<'_>) -> AnalyticsSnapshot {
    let window = request.window;

    let policies = filter_by_window(request.policies, &window, DateField::StartDate);
    let claims = filter_by_window(request.claims, &window, DateField::SubmissionDate);

    debug!(
        "Building snapshot for {}: {} policies, {} claims in window",
        window.range_token,
        policies.len(),
        claims.len()
    );

    let snapshot = AnalyticsSnapshot {
        window,
        overview: aggregate_overview(
            request.policies,
            request.claims,
            request.counters,
            policies.len(),
            claims.len(),
        ),
        policy_stats: aggregate_policies(&policies),
        claim_stats: aggregate_claims(&claims),
        revenue_stats: aggregate_revenue(&policies, window.range_token),
        trend_stats: aggregate_trends(&policies, &claims, &window, &request.thresholds),
    };

    info!(
        "Snapshot ready: {} policies, {} claims, loss ratio {:.1}%",
        snapshot.overview.total_policies, snapshot.overview.total_claims, snapshot.overview.loss_ratio
    );

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{approx_eq, claim, policy, DAY, NOW};
    use crate::models::{ClaimStatus, PaymentType, PlanType};
    use serde_json::Value;

    fn sample_records() -> (Vec<Policy>, Vec<Claim>) {
        let mut monthly = policy("p2", PlanType::Premium, NOW - 40 * DAY, 0.25);
        monthly.payment_type = PaymentType::Monthly;
        monthly.coverage_amount = 5.0;
        monthly.claims_used = 1.0;

        let policies = vec![
            policy("p1", PlanType::Basic, NOW - 2 * DAY, 0.1),
            monthly,
            policy("p3", PlanType::Platinum, NOW - 400 * DAY, 1.0),
        ];

        let mut paid = claim("c2", ClaimStatus::Paid, NOW - 3 * DAY, 1.0);
        paid.approved_amount = 0.8;
        paid.processed_date = Some(NOW - DAY);

        let claims = vec![
            claim("c1", ClaimStatus::Pending, NOW - DAY, 0.5),
            paid,
            claim("c3", ClaimStatus::Rejected, NOW - 100 * DAY, 2.0),
        ];

        (policies, claims)
    }

    fn assert_no_nulls(value: &Value, path: &str) {
        match value {
            Value::Null => panic!("null at {path}"),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .for_each(|(i, v)| assert_no_nulls(v, &format!("{path}[{i}]"))),
            Value::Object(map) => map
                .iter()
                .for_each(|(k, v)| assert_no_nulls(v, &format!("{path}.{k}"))),
            _ => {}
        }
    }

    #[test]
    fn test_empty_input_snapshot() {
        let window = TimeWindow::resolve("30d", NOW);
        let snapshot = build_snapshot(&SnapshotRequest::new(&[], &[], window));

        assert_eq!(snapshot.overview, OverviewStats::default());
        assert!(snapshot.policy_stats.plan_distribution.is_empty());
        assert!(snapshot.policy_stats.payment_type_distribution.is_empty());
        assert!(snapshot.claim_stats.status_distribution.is_empty());
        assert!(snapshot.revenue_stats.revenue_by_plan.is_empty());
        assert_eq!(snapshot.overview.claim_approval_rate, 0.0);
        assert_eq!(snapshot.overview.loss_ratio, 0.0);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_no_nulls(&json, "snapshot");
    }

    #[test]
    fn test_window_applies_to_domain_stats_not_overview() {
        let (policies, claims) = sample_records();
        let window = TimeWindow::resolve("30d", NOW);
        let snapshot = build_snapshot(&SnapshotRequest::new(&policies, &claims, window));

        assert_eq!(snapshot.overview.total_policies, 3);
        assert_eq!(snapshot.overview.total_claims, 3);
        assert_eq!(snapshot.overview.policies_in_window, 1);
        assert_eq!(snapshot.overview.claims_in_window, 2);

        assert_eq!(snapshot.policy_stats.plan_distribution.len(), 1);
        assert_eq!(snapshot.claim_stats.status_distribution.values().sum::<u64>(), 2);
        assert!(approx_eq(snapshot.claim_stats.average_processing_time, 2.0));
        assert!(approx_eq(snapshot.revenue_stats.total_revenue, 0.1));
        assert_eq!(snapshot.trend_stats.daily_series.len(), 30);
    }

    #[test]
    fn test_year_window_revenue_scenario() {
        let policies = vec![
            policy("1", PlanType::Basic, NOW - 10 * DAY, 0.1),
            policy("2", PlanType::Premium, NOW - 300 * DAY, 0.25),
        ];
        let window = TimeWindow::resolve("1y", NOW);
        let snapshot = build_snapshot(&SnapshotRequest::new(&policies, &[], window));

        let revenue = &snapshot.revenue_stats;
        let plans: Vec<_> = revenue.revenue_by_plan.keys().map(String::as_str).collect();
        assert_eq!(plans, vec!["Basic", "Premium"]);
        assert!(approx_eq(revenue.total_revenue, 0.35));
        assert!(approx_eq(revenue.average_revenue_per_policy, 0.175));
    }

    #[test]
    fn test_identical_inputs_serialize_identically() {
        let (policies, claims) = sample_records();
        let counters = SummaryCounters {
            total_policies: Some(10),
            total_claims: None,
        };
        let window = TimeWindow::resolve("90d", NOW);
        let request = SnapshotRequest::new(&policies, &claims, window).with_counters(Some(&counters));

        let first = serde_json::to_string_pretty(&build_snapshot(&request)).unwrap();
        let second = serde_json::to_string_pretty(&build_snapshot(&request)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_thresholds_flow_through() {
        let policies: Vec<_> = (0..7)
            .map(|d| policy(&d.to_string(), PlanType::Basic, NOW - d * DAY, 1.0))
            .collect();
        let window = TimeWindow::resolve("7d", NOW);
        let strict = TrendThresholds {
            activity_medium: 0.5,
            ..TrendThresholds::default()
        };

        let snapshot =
            build_snapshot(&SnapshotRequest::new(&policies, &[], window).with_thresholds(strict));
        assert_eq!(
            snapshot.trend_stats.correlation.activity_level,
            crate::analysis::trend::ActivityLevel::Medium
        );
    }
}
