//! Plan catalog model.

use serde::{Deserialize, Serialize};

/// Limit value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Identifier of the plan every auto-created subscription starts on.
pub const DEFAULT_PLAN_ID: u32 = 1;

/// A fixed catalog entry. The catalog is seeded once and treated as
/// immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: u32,
    pub name: String,
    /// Monthly price in whole currency units.
    pub price: i64,
    /// Maximum meters, or [`UNLIMITED`].
    pub meter_limit: i64,
    /// Maximum users, or [`UNLIMITED`].
    pub user_limit: i64,
}

impl Plan {
    pub fn is_unlimited_meters(&self) -> bool {
        self.meter_limit == UNLIMITED
    }

    pub fn is_unlimited_users(&self) -> bool {
        self.user_limit == UNLIMITED
    }
}
