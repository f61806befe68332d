//! Premium revenue series and per-plan breakdown.

use super::window::RangeToken;
use super::{bucket_by_month, total, MonthlyBucket};
use crate::models::{DateField, Policy};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub monthly_revenue_data: Vec<MonthlyBucket>,
    /// Plan label to premiums collected, in first-seen order.
    pub revenue_by_plan: IndexMap<String, f64>,
    pub total_revenue: f64,
    pub average_revenue_per_policy: f64,
    pub period_label: String,
}

impl RevenueStats {
    /// Plan with the highest revenue. Ties go to the plan seen first.
    pub fn top_performing_plan(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (plan, revenue) in &self.revenue_by_plan {
            if best.map_or(true, |(_, top)| *revenue > top) {
                best = Some((plan.as_str(), *revenue));
            }
        }
        best
    }
}

/// `range` only feeds the display label.
pub fn aggregate_revenue(policies: &[Policy], range: RangeToken) -> RevenueStats {
    let mut revenue_by_plan: IndexMap<String, f64> = IndexMap::new();
    for policy in policies {
        *revenue_by_plan
            .entry(policy.plan_type.label().to_string())
            .or_insert(0.0) += policy.total_paid;
    }

    let total_revenue = total(policies, |p| p.total_paid);
    let average_revenue_per_policy = if policies.is_empty() {
        0.0
    } else {
        total_revenue / policies.len() as f64
    };

    RevenueStats {
        monthly_revenue_data: bucket_by_month(policies, DateField::StartDate, |p| p.total_paid),
        revenue_by_plan,
        total_revenue,
        average_revenue_per_policy,
        period_label: range.display_label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{approx_eq, policy, DAY, NOW};
    use crate::models::PlanType;

    #[test]
    fn test_revenue_by_plan() {
        let policies = vec![
            policy("1", PlanType::Basic, NOW - 30 * DAY, 0.1),
            policy("2", PlanType::Premium, NOW - 200 * DAY, 0.25),
        ];

        let stats = aggregate_revenue(&policies, RangeToken::Year);
        assert_eq!(stats.revenue_by_plan.len(), 2);
        assert!(approx_eq(stats.revenue_by_plan["Basic"], 0.1));
        assert!(approx_eq(stats.revenue_by_plan["Premium"], 0.25));
        assert!(approx_eq(stats.total_revenue, 0.35));
        assert!(approx_eq(stats.average_revenue_per_policy, 0.175));
        assert_eq!(stats.period_label, "Last Year");
    }

    #[test]
    fn test_empty_revenue() {
        let stats = aggregate_revenue(&[], RangeToken::Week);
        assert!(stats.revenue_by_plan.is_empty());
        assert!(stats.monthly_revenue_data.is_empty());
        assert_eq!(stats.average_revenue_per_policy, 0.0);
        assert_eq!(stats.top_performing_plan(), None);
    }

    #[test]
    fn test_monthly_revenue_buckets() {
        let policies = vec![
            policy("1", PlanType::Basic, NOW, 1.0),
            policy("2", PlanType::Basic, NOW - DAY, 2.0),
        ];

        let stats = aggregate_revenue(&policies, RangeToken::Month);
        assert_eq!(stats.monthly_revenue_data.len(), 1);
        assert_eq!(stats.monthly_revenue_data[0].month, "2024-06");
        assert_eq!(stats.monthly_revenue_data[0].count, 2);
        assert!(approx_eq(stats.monthly_revenue_data[0].value, 3.0));
    }

    #[test]
    fn test_top_plan_tie_goes_to_first_seen() {
        let policies = vec![
            policy("1", PlanType::Premium, NOW, 2.0),
            policy("2", PlanType::Basic, NOW, 2.0),
            policy("3", PlanType::Platinum, NOW, 1.0),
        ];

        let stats = aggregate_revenue(&policies, RangeToken::Week);
        assert_eq!(stats.top_performing_plan(), Some(("Premium", 2.0)));
    }

    #[test]
    fn test_top_plan_picks_maximum() {
        let policies = vec![
            policy("1", PlanType::Basic, NOW, 1.0),
            policy("2", PlanType::Platinum, NOW, 5.0),
        ];

        let stats = aggregate_revenue(&policies, RangeToken::Week);
        assert_eq!(stats.top_performing_plan(), Some(("Platinum", 5.0)));
    }
}
