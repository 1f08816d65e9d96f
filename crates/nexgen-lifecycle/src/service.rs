//! Lifecycle controller.
//!
//! The registry store owns a company's status. Every transition commits
//! there first and is then pushed to the tenant store; the two commits are
//! independent local transactions, and [`LifecycleService::reconcile`]
//! repairs any projection left behind by a failed second step.

use chrono::Utc;
use nexgen_auth::password::generate_temporary_password;
use nexgen_auth::require_owner;
use nexgen_core::error::{NexgenError, NexgenResult};
use nexgen_core::invitation::{Invitation, InvitationSender};
use nexgen_core::models::company::{Company, CompanyStatus, CreateCompany};
use nexgen_core::models::plan::Plan;
use nexgen_core::models::session::Principal;
use nexgen_core::models::subscription::Subscription;
use nexgen_core::models::tenant::{ProvisionTenant, TenantCompany};
use nexgen_core::repository::{
    CompanyRepository, PaginatedResult, Pagination, PlanRepository, SubscriptionRepository,
    TenantAdminRepository, TenantCompanyRepository,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::code::generate_company_code;
use crate::config::LifecycleConfig;
use crate::dashboard::{self, DashboardSummary};

/// Page size used when a projection needs every company.
const SCAN_PAGE: u64 = 200;

/// Result of a successful approval.
#[derive(Clone)]
pub struct Approval {
    pub company: Company,
    pub tenant_company: TenantCompany,
    /// The admin's temporary password when this approval created the
    /// admin account; `None` when the account already existed.
    pub temporary_password: Option<String>,
}

impl std::fmt::Debug for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Approval")
            .field("company", &self.company)
            .field("tenant_company", &self.tenant_company)
            .field(
                "temporary_password",
                &self.temporary_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// ACTIVE and SUSPENDED companies examined.
    pub checked: u64,
    /// ACTIVE companies whose mirror or admin had to be provisioned again.
    pub reprovisioned: u64,
    /// SUSPENDED companies whose mirror was still ACTIVE.
    pub resynced: u64,
    /// Companies whose repair failed; they are retried on the next sweep.
    pub failed: u64,
}

/// Company lifecycle controller.
///
/// Generic over the registry and tenant repositories and the invitation
/// transport, so the controller has no dependency on the database crate.
pub struct LifecycleService<C, P, S, TC, TA, I>
where
    C: CompanyRepository,
    P: PlanRepository,
    S: SubscriptionRepository,
    TC: TenantCompanyRepository,
    TA: TenantAdminRepository,
    I: InvitationSender,
{
    companies: C,
    plans: P,
    subscriptions: S,
    tenant_companies: TC,
    tenant_admins: TA,
    invitations: I,
    config: LifecycleConfig,
}

impl<C, P, S, TC, TA, I> LifecycleService<C, P, S, TC, TA, I>
where
    C: CompanyRepository,
    P: PlanRepository,
    S: SubscriptionRepository,
    TC: TenantCompanyRepository,
    TA: TenantAdminRepository,
    I: InvitationSender,
{
    pub fn new(
        companies: C,
        plans: P,
        subscriptions: S,
        tenant_companies: TC,
        tenant_admins: TA,
        invitations: I,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            companies,
            plans,
            subscriptions,
            tenant_companies,
            tenant_admins,
            invitations,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Record a new registration as PENDING. Open to unauthenticated
    /// callers.
    pub async fn register(&self, input: CreateCompany) -> NexgenResult<Company> {
        validate_registration(&input)?;
        let company = self.companies.create(input).await?;
        info!(company_id = %company.id, "Company registered");
        Ok(company)
    }

    /// Move a PENDING or SUSPENDED company to ACTIVE and provision its
    /// tenant projection.
    pub async fn approve(&self, principal: &Principal, company_id: Uuid) -> NexgenResult<Approval> {
        require_owner(principal)?;

        let company = self.companies.get_by_id(company_id).await?;
        if !company.status.can_activate() {
            return Err(NexgenError::InvalidTransition {
                from: company.status.to_string(),
                to: CompanyStatus::Active.to_string(),
            });
        }

        // A code, once assigned, is reused for every later re-approval.
        let code = match company.company_code.clone() {
            Some(code) => code,
            None => self.allocate_code().await?,
        };
        self.ensure_admin_username_free(&company, &code).await?;

        let company = self
            .companies
            .activate(
                company_id,
                &code,
                self.config.default_plan_id,
                Utc::now().date_naive(),
            )
            .await?;
        info!(company_id = %company.id, company_code = %code, "Company activated");

        let (tenant_company, temporary_password) = match self.provision(&company, &code).await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                error!(
                    company_id = %company.id,
                    company_code = %code,
                    error = %e,
                    "Tenant provisioning failed after registry commit"
                );
                return Err(e);
            }
        };

        Ok(Approval {
            company,
            tenant_company,
            temporary_password,
        })
    }

    /// Move an ACTIVE company to SUSPENDED in both stores. Suspending an
    /// already SUSPENDED company pushes the status to the mirror again.
    pub async fn suspend(&self, principal: &Principal, company_id: Uuid) -> NexgenResult<Company> {
        require_owner(principal)?;

        let company = self.companies.get_by_id(company_id).await?;
        let Some(code) = company.company_code else {
            return Err(NexgenError::NotProvisioned {
                company_id: company_id.to_string(),
            });
        };

        let company = self.companies.suspend(company_id).await?;
        if let Err(e) = self
            .tenant_companies
            .set_status(&code, CompanyStatus::Suspended)
            .await
        {
            error!(
                company_id = %company_id,
                company_code = %code,
                error = %e,
                "Tenant suspension failed after registry commit"
            );
            return Err(e);
        }

        info!(company_id = %company_id, company_code = %code, "Company suspended");
        Ok(company)
    }

    /// Move a company's subscription to another catalog plan.
    pub async fn change_plan(
        &self,
        principal: &Principal,
        company_id: Uuid,
        plan_id: u32,
    ) -> NexgenResult<Subscription> {
        require_owner(principal)?;

        let plan = self.plans.get_by_id(plan_id).await?;
        let subscription = self.subscriptions.change_plan(company_id, plan.id).await?;
        info!(
            company_id = %company_id,
            plan_id = plan.id,
            plan = %plan.name,
            "Subscription plan changed"
        );
        Ok(subscription)
    }

    /// Bring the tenant store back in line with the registry.
    ///
    /// ACTIVE companies get a missing or non-ACTIVE mirror (or a missing
    /// admin) provisioned again. SUSPENDED companies whose mirror is still
    /// ACTIVE are suspended there. A failed repair is logged and counted,
    /// and the sweep moves on.
    pub async fn reconcile(&self, principal: &Principal) -> NexgenResult<ReconcileReport> {
        require_owner(principal)?;
        let mut report = ReconcileReport::default();

        for company in self.companies.list_by_status(CompanyStatus::Active).await? {
            report.checked += 1;
            let Some(code) = company.company_code.clone() else {
                warn!(company_id = %company.id, "Active company has no company code");
                continue;
            };
            if self.projection_is_active(&code).await? {
                continue;
            }

            warn!(
                company_id = %company.id,
                company_code = %code,
                "Re-provisioning tenant projection"
            );
            match self.provision(&company, &code).await {
                Ok(_) => report.reprovisioned += 1,
                Err(e) => {
                    error!(company_code = %code, error = %e, "Re-provisioning failed");
                    report.failed += 1;
                }
            }
        }

        for company in self.companies.list_by_status(CompanyStatus::Suspended).await? {
            report.checked += 1;
            let Some(code) = company.company_code else {
                continue;
            };
            let mirror = match self.tenant_companies.get_by_code(&code).await {
                Ok(mirror) => mirror,
                Err(NexgenError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            if mirror.status != CompanyStatus::Active {
                continue;
            }

            warn!(company_code = %code, "Re-suspending tenant projection");
            match self
                .tenant_companies
                .set_status(&code, CompanyStatus::Suspended)
                .await
            {
                Ok(_) => report.resynced += 1,
                Err(e) => {
                    error!(company_code = %code, error = %e, "Re-suspension failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            reprovisioned = report.reprovisioned,
            resynced = report.resynced,
            failed = report.failed,
            "Reconciliation sweep finished"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    pub async fn dashboard(&self, principal: &Principal) -> NexgenResult<DashboardSummary> {
        require_owner(principal)?;

        let counts = self.companies.count_by_status().await?;
        let companies = self.all_companies().await?;
        let subscriptions = self.subscriptions.list().await?;
        let plans = self.plans.list().await?;

        Ok(DashboardSummary {
            companies: counts,
            subscriptions: dashboard::count_subscriptions(&subscriptions),
            mrr: dashboard::monthly_recurring_revenue(&subscriptions, &plans),
            subscription_details: dashboard::subscription_details(
                &subscriptions,
                &companies,
                &plans,
            ),
            company_list: companies,
            plans,
        })
    }

    pub async fn list_companies(
        &self,
        principal: &Principal,
        pagination: Pagination,
    ) -> NexgenResult<PaginatedResult<Company>> {
        require_owner(principal)?;
        self.companies.list(pagination).await
    }

    pub async fn list_subscriptions(
        &self,
        principal: &Principal,
    ) -> NexgenResult<Vec<Subscription>> {
        require_owner(principal)?;
        self.subscriptions.list().await
    }

    /// The plan catalog. Public, the registration form offers it.
    pub async fn list_plans(&self) -> NexgenResult<Vec<Plan>> {
        self.plans.list().await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Pick a code unused in either store.
    async fn allocate_code(&self) -> NexgenResult<String> {
        let mut last = String::new();
        for _ in 0..self.config.code_attempts {
            let candidate = generate_company_code();
            if !self.code_in_use(&candidate).await? {
                return Ok(candidate);
            }
            warn!(company_code = %candidate, "Company code collision, retrying");
            last = candidate;
        }
        Err(NexgenError::AlreadyProvisioned { company_code: last })
    }

    /// Refuse to activate a company whose admin username is already held
    /// by another tenant; the tenant store would reject the admin forever.
    async fn ensure_admin_username_free(&self, company: &Company, code: &str) -> NexgenResult<()> {
        match self.tenant_admins.get_by_username(&company.email).await {
            Ok(admin) if admin.company_code != code => {
                warn!(
                    company_id = %company.id,
                    company_code = %code,
                    held_by = %admin.company_code,
                    "Admin username already belongs to another tenant"
                );
                Err(NexgenError::AlreadyExists {
                    entity: "tenant_admin".into(),
                })
            }
            Ok(_) | Err(NexgenError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn code_in_use(&self, code: &str) -> NexgenResult<bool> {
        if self.companies.code_exists(code).await? {
            return Ok(true);
        }
        match self.tenant_companies.get_by_code(code).await {
            Ok(_) => Ok(true),
            Err(NexgenError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the mirror exists, is ACTIVE, and has its admin account.
    async fn projection_is_active(&self, code: &str) -> NexgenResult<bool> {
        match self.tenant_companies.get_by_code(code).await {
            Ok(mirror) if mirror.status == CompanyStatus::Active => {}
            Ok(_) | Err(NexgenError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }
        match self.tenant_admins.get_by_company_code(code).await {
            Ok(_) => Ok(true),
            Err(NexgenError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Provision the tenant mirror and admin, then invite the admin if
    /// the account is new. Returns the temporary password when it is live.
    async fn provision(
        &self,
        company: &Company,
        code: &str,
    ) -> NexgenResult<(TenantCompany, Option<String>)> {
        let temporary_password = generate_temporary_password(self.config.temporary_password_bytes);

        let provisioned = self
            .tenant_companies
            .provision(ProvisionTenant {
                company_code: code.to_string(),
                name: company.name.clone(),
                admin_username: company.email.clone(),
                admin_password: temporary_password.clone(),
            })
            .await?;

        if !provisioned.admin_created {
            return Ok((provisioned.tenant_company, None));
        }

        let invitation = Invitation {
            recipient: company.email.clone(),
            username: company.email.clone(),
            temporary_password: temporary_password.clone(),
        };
        if let Err(e) = self.invitations.send(invitation).await {
            warn!(company_code = %code, error = %e, "Tenant admin invitation delivery failed");
        }

        Ok((provisioned.tenant_company, Some(temporary_password)))
    }

    async fn all_companies(&self) -> NexgenResult<Vec<Company>> {
        let mut companies = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .companies
                .list(Pagination {
                    offset,
                    limit: SCAN_PAGE,
                })
                .await?;
            let fetched = page.items.len() as u64;
            companies.extend(page.items);
            offset += fetched;
            if fetched < SCAN_PAGE || offset >= page.total {
                return Ok(companies);
            }
        }
    }
}

fn validate_registration(input: &CreateCompany) -> NexgenResult<()> {
    let intake = &input.intake;
    let required = [
        ("name", &input.name),
        ("email", &input.email),
        ("industry", &intake.industry),
        ("company_size", &intake.company_size),
        ("admin_name", &intake.admin_name),
        ("admin_mobile", &intake.admin_mobile),
        ("country", &intake.country),
        ("state", &intake.state),
        ("city", &intake.city),
        ("timezone", &intake.timezone),
        ("requested_plan", &intake.requested_plan),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(NexgenError::validation(format!("{field} is required")));
        }
    }
    if !input.email.contains('@') {
        return Err(NexgenError::validation("email is invalid"));
    }
    Ok(())
}
