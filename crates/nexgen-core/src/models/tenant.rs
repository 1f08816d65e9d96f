//! Tenant-store projection models.
//!
//! The tenant store is derived from the registry on approval. Its rows
//! are keyed by `company_code`, never by the registry's company id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::company::CompanyStatus;

/// Denormalized copy of a company inside the tenant store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCompany {
    pub company_code: String,
    pub name: String,
    /// Eventually-consistent copy of the registry status.
    pub status: CompanyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bootstrap admin credential for a tenant company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantAdmin {
    pub id: Uuid,
    pub company_code: String,
    /// Equal to the registrant's email.
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for provisioning a tenant mirror plus its admin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionTenant {
    pub company_code: String,
    pub name: String,
    pub admin_username: String,
    /// Raw temporary password (will be hashed with Argon2id before storage).
    /// Only used when the admin account does not exist yet.
    pub admin_password: String,
}

/// Outcome of a provisioning call.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub tenant_company: TenantCompany,
    /// `true` when the admin account was inserted by this call, i.e. the
    /// temporary password in [`ProvisionTenant`] is now live.
    pub admin_created: bool,
}
