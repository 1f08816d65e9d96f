//! NexGen Lifecycle: the owner-side controller for company registration,
//! approval, suspension, plan changes and the cross-store reconciliation
//! sweep, plus the dashboard projections built on top of them.

pub mod code;
pub mod config;
pub mod dashboard;
pub mod service;

pub use config::LifecycleConfig;
pub use dashboard::{DashboardSummary, SubscriptionCounts};
pub use service::{Approval, LifecycleService, ReconcileReport};
