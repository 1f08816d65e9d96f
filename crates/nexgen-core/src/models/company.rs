//! Company domain model.
//!
//! A company is one tenant organization going through registration.
//! The registry copy is the single source of truth for its lifecycle
//! status; the tenant store only holds a projection keyed by
//! `company_code`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a registered company.
///
/// ```text
/// PENDING --approve--> ACTIVE --suspend--> SUSPENDED
///                        ^                     |
///                        +------approve--------+
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyStatus {
    Pending,
    Active,
    Suspended,
}

impl CompanyStatus {
    /// Storage representation used by both stores.
    pub fn as_str(self) -> &'static str {
        match self {
            CompanyStatus::Pending => "PENDING",
            CompanyStatus::Active => "ACTIVE",
            CompanyStatus::Suspended => "SUSPENDED",
        }
    }

    /// Statuses from which an approval may proceed.
    pub fn can_activate(self) -> bool {
        matches!(self, CompanyStatus::Pending | CompanyStatus::Suspended)
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company registration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    /// Opaque join key into the tenant store. `None` until the first
    /// approval, then never reassigned.
    pub company_code: Option<String>,
    /// Display name.
    pub name: String,
    /// Registrant contact email; becomes the tenant admin username.
    pub email: String,
    pub status: CompanyStatus,
    pub intake: CompanyIntake,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptive fields captured at registration and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyIntake {
    pub industry: String,
    pub company_size: String,
    pub admin_name: String,
    pub admin_mobile: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub timezone: String,
    /// Plan named on the registration form. Informational only; approval
    /// always starts the company on the default plan.
    pub requested_plan: String,
    /// Stored as given, no numeric validation.
    pub expected_users: Option<String>,
    /// Stored as given, no numeric validation.
    pub expected_meters: Option<String>,
}

/// Fields required to register a new company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub email: String,
    pub intake: CompanyIntake,
}

/// Company counts grouped by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyStatusCounts {
    pub pending: u64,
    pub active: u64,
    pub suspended: u64,
}

impl CompanyStatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.active + self.suspended
    }
}
