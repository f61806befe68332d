//! Portfolio-wide KPIs.

use super::{ratio_pct, total};
use crate::models::{Claim, Policy, PolicyStatus, SummaryCounters};
use serde::{Deserialize, Serialize};

/// Headline figures over the whole record history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_policies: u64,
    pub active_policies: u64,
    pub total_claims: u64,
    pub approved_claims: u64,
    pub total_premiums_paid: f64,
    pub total_claims_amount: f64,
    pub total_approved_amount: f64,
    /// Approved claims as a percentage of all claims.
    pub claim_approval_rate: f64,
    /// Approved payouts as a percentage of premiums collected.
    pub loss_ratio: f64,
    pub policies_in_window: u64,
    pub claims_in_window: u64,
}

/// Compute the overview from the unfiltered history.
///
/// `counters`, when supplied by the record source, replace the counted
/// totals. The approval rate keeps the counted claims as its denominator.
pub fn aggregate_overview(
    policies: &[Policy],
    claims: &[Claim],
    counters: Option<&SummaryCounters>,
    policies_in_window: usize,
    claims_in_window: usize,
) -> OverviewStats {
    let active_policies = policies
        .iter()
        .filter(|p| p.status == PolicyStatus::Active)
        .count() as u64;

    let approved: Vec<&Claim> = claims.iter().filter(|c| c.status.is_approved()).collect();

    let total_premiums_paid = total(policies, |p| p.total_paid);
    let total_claims_amount = total(claims, |c| c.claim_amount);
    let total_approved_amount = total(&approved, |c| c.approved_amount);

    let counted_claims = claims.len() as u64;
    let approved_claims = approved.len() as u64;

    OverviewStats {
        total_policies: counters
            .and_then(|c| c.total_policies)
            .unwrap_or(policies.len() as u64),
        active_policies,
        total_claims: counters.and_then(|c| c.total_claims).unwrap_or(counted_claims),
        approved_claims,
        total_premiums_paid,
        total_claims_amount,
        total_approved_amount,
        claim_approval_rate: ratio_pct(approved_claims as f64, counted_claims as f64),
        loss_ratio: ratio_pct(total_approved_amount, total_premiums_paid),
        policies_in_window: policies_in_window as u64,
        claims_in_window: claims_in_window as u64,
    }
}
