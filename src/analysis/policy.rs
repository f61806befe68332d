//! Plan, payment and coverage statistics for policies in the window.

use super::{ratio_pct, tally, total};
use crate::models::Policy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Coverage position of a single policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageEntry {
    pub policy_id: String,
    pub coverage: f64,
    pub used: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStats {
    /// Plan label to policy count, in first-seen order.
    pub plan_distribution: IndexMap<String, u64>,
    pub payment_type_distribution: IndexMap<String, u64>,
    pub coverage_distribution: Vec<CoverageEntry>,
    pub total_coverage: f64,
    pub total_used_coverage: f64,
    /// Used coverage as a percentage of total coverage.
    pub coverage_utilization_rate: f64,
}

pub fn aggregate_policies(policies: &[Policy]) -> PolicyStats {
    let coverage_distribution = policies
        .iter()
        .map(|p| CoverageEntry {
            policy_id: p.policy_id.clone(),
            coverage: p.coverage_amount,
            used: p.claims_used,
            remaining: p.coverage_amount - p.claims_used,
        })
        .collect();

    let total_coverage = total(policies, |p| p.coverage_amount);
    let total_used_coverage = total(policies, |p| p.claims_used);

    PolicyStats {
        plan_distribution: tally(policies.iter().map(|p| p.plan_type.label())),
        payment_type_distribution: tally(policies.iter().map(|p| p.payment_type.label())),
        coverage_distribution,
        total_coverage,
        total_used_coverage,
        coverage_utilization_rate: ratio_pct(total_used_coverage, total_coverage),
    }
}
