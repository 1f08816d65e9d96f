//! Dashboard projections over the registry store.
//!
//! Everything here is a pure function of rows already loaded by the
//! service, so the figures can be checked without a database.

use std::collections::HashMap;

use nexgen_core::models::company::{Company, CompanyStatusCounts};
use nexgen_core::models::plan::Plan;
use nexgen_core::models::subscription::{Subscription, SubscriptionStatus, SubscriptionSummary};
use serde::Serialize;
use uuid::Uuid;

/// Subscription counts grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionCounts {
    pub active: u64,
    pub trial: u64,
    pub cancelled: u64,
}

/// Everything the owner dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub companies: CompanyStatusCounts,
    pub subscriptions: SubscriptionCounts,
    /// Monthly recurring revenue: sum of plan prices over ACTIVE
    /// subscriptions.
    pub mrr: i64,
    pub company_list: Vec<Company>,
    pub subscription_details: Vec<SubscriptionSummary>,
    pub plans: Vec<Plan>,
}

pub fn count_subscriptions(subscriptions: &[Subscription]) -> SubscriptionCounts {
    let mut counts = SubscriptionCounts::default();
    for subscription in subscriptions {
        match subscription.status {
            SubscriptionStatus::Active => counts.active += 1,
            SubscriptionStatus::Trial => counts.trial += 1,
            SubscriptionStatus::Cancelled => counts.cancelled += 1,
        }
    }
    counts
}

/// Sum of plan prices over ACTIVE subscriptions. A subscription whose plan
/// is missing from the catalog contributes nothing.
pub fn monthly_recurring_revenue(subscriptions: &[Subscription], plans: &[Plan]) -> i64 {
    let prices: HashMap<u32, i64> = plans.iter().map(|p| (p.id, p.price)).collect();
    subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .filter_map(|s| prices.get(&s.plan_id))
        .sum()
}

/// Join subscriptions with their company and plan. Rows whose company or
/// plan cannot be found are dropped.
pub fn subscription_details(
    subscriptions: &[Subscription],
    companies: &[Company],
    plans: &[Plan],
) -> Vec<SubscriptionSummary> {
    let names: HashMap<Uuid, &str> = companies
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();
    let catalog: HashMap<u32, &Plan> = plans.iter().map(|p| (p.id, p)).collect();

    subscriptions
        .iter()
        .filter_map(|s| {
            let company_name = names.get(&s.company_id)?;
            let plan = catalog.get(&s.plan_id)?;
            Some(SubscriptionSummary {
                company_id: s.company_id,
                company_name: company_name.to_string(),
                plan_id: plan.id,
                plan_name: plan.name.clone(),
                price: plan.price,
                status: s.status,
            })
        })
        .collect()
}
