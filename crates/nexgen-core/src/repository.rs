//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Registry repositories operate on
//! the canonical store; tenant repositories operate on the derived
//! projection keyed by `company_code`.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::NexgenResult;
use crate::models::{
    company::{Company, CompanyStatus, CompanyStatusCounts, CreateCompany},
    owner::{CreateOwner, Owner},
    plan::Plan,
    subscription::Subscription,
    tenant::{ProvisionTenant, Provisioned, TenantAdmin, TenantCompany},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Registry store
// ---------------------------------------------------------------------------

pub trait CompanyRepository: Send + Sync {
    /// Insert a new company with status `PENDING` and no company code.
    fn create(&self, input: CreateCompany) -> impl Future<Output = NexgenResult<Company>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = NexgenResult<Company>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = NexgenResult<PaginatedResult<Company>>> + Send;
    fn list_by_status(
        &self,
        status: CompanyStatus,
    ) -> impl Future<Output = NexgenResult<Vec<Company>>> + Send;
    fn count_by_status(&self) -> impl Future<Output = NexgenResult<CompanyStatusCounts>> + Send;
    /// Whether any company already carries `code`.
    fn code_exists(&self, code: &str) -> impl Future<Output = NexgenResult<bool>> + Send;

    /// Move a `PENDING` or `SUSPENDED` company to `ACTIVE` with the given
    /// code and, if the company has no subscription yet, create one on
    /// `default_plan_id` starting at `start_date`. Runs as one transaction.
    ///
    /// Fails with `InvalidTransition` if the company was not in an
    /// activatable state when the update ran.
    fn activate(
        &self,
        id: Uuid,
        company_code: &str,
        default_plan_id: u32,
        start_date: NaiveDate,
    ) -> impl Future<Output = NexgenResult<Company>> + Send;

    /// Move an `ACTIVE` (or already `SUSPENDED`) company to `SUSPENDED`.
    fn suspend(&self, id: Uuid) -> impl Future<Output = NexgenResult<Company>> + Send;
}

pub trait PlanRepository: Send + Sync {
    fn get_by_id(&self, id: u32) -> impl Future<Output = NexgenResult<Plan>> + Send;
    /// The full catalog ordered by id.
    fn list(&self) -> impl Future<Output = NexgenResult<Vec<Plan>>> + Send;
}

pub trait SubscriptionRepository: Send + Sync {
    fn get_by_company(
        &self,
        company_id: Uuid,
    ) -> impl Future<Output = NexgenResult<Subscription>> + Send;
    fn list(&self) -> impl Future<Output = NexgenResult<Vec<Subscription>>> + Send;
    /// Overwrite the plan of the company's subscription. Fails with
    /// `NotFound` when the company has no subscription.
    fn change_plan(
        &self,
        company_id: Uuid,
        plan_id: u32,
    ) -> impl Future<Output = NexgenResult<Subscription>> + Send;
}

pub trait OwnerRepository: Send + Sync {
    fn create(&self, input: CreateOwner) -> impl Future<Output = NexgenResult<Owner>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = NexgenResult<Owner>> + Send;
    fn list(&self) -> impl Future<Output = NexgenResult<Vec<Owner>>> + Send;
    fn count(&self) -> impl Future<Output = NexgenResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant store
// ---------------------------------------------------------------------------

pub trait TenantCompanyRepository: Send + Sync {
    /// Insert-if-absent the mirror (an existing mirror is set back to
    /// `ACTIVE`) and insert-if-absent its admin account, in one transaction.
    fn provision(
        &self,
        input: ProvisionTenant,
    ) -> impl Future<Output = NexgenResult<Provisioned>> + Send;
    fn get_by_code(
        &self,
        company_code: &str,
    ) -> impl Future<Output = NexgenResult<TenantCompany>> + Send;
    fn set_status(
        &self,
        company_code: &str,
        status: CompanyStatus,
    ) -> impl Future<Output = NexgenResult<TenantCompany>> + Send;
}

pub trait TenantAdminRepository: Send + Sync {
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = NexgenResult<TenantAdmin>> + Send;
    fn get_by_company_code(
        &self,
        company_code: &str,
    ) -> impl Future<Output = NexgenResult<TenantAdmin>> + Send;
}
