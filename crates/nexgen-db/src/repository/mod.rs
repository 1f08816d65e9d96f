//! SurrealDB repository implementations.
//!
//! Registry store: companies, plans, subscriptions, owners.
//! Tenant store: company mirrors and their admin accounts.

mod company;
mod owner;
mod plan;
mod subscription;
mod tenant_admin;
mod tenant_company;

pub use company::SurrealCompanyRepository;
pub use owner::SurrealOwnerRepository;
pub use plan::SurrealPlanRepository;
pub use subscription::SurrealSubscriptionRepository;
pub use tenant_admin::SurrealTenantAdminRepository;
pub use tenant_company::SurrealTenantCompanyRepository;
