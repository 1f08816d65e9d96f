//! Domain models for the owner console.
//!
//! Registry-side types (companies, plans, subscriptions, owners) and
//! tenant-side projections live in separate modules.

pub mod company;
pub mod owner;
pub mod plan;
pub mod session;
pub mod subscription;
pub mod tenant;
