//! End-to-end lifecycle tests over two in-memory SurrealDB stores.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use nexgen_auth::config::AuthConfig;
use nexgen_auth::service::AuthService;
use nexgen_core::error::{NexgenError, NexgenResult};
use nexgen_core::invitation::{Invitation, InvitationSender};
use nexgen_core::models::company::{CompanyIntake, CompanyStatus, CreateCompany};
use nexgen_core::models::plan::DEFAULT_PLAN_ID;
use nexgen_core::models::session::{Principal, Role};
use nexgen_core::models::subscription::SubscriptionStatus;
use nexgen_core::models::tenant::ProvisionTenant;
use nexgen_core::repository::{
    SubscriptionRepository, TenantAdminRepository, TenantCompanyRepository,
};
use nexgen_db::repository::{
    SurrealCompanyRepository, SurrealOwnerRepository, SurrealPlanRepository,
    SurrealSubscriptionRepository, SurrealTenantAdminRepository, SurrealTenantCompanyRepository,
};
use nexgen_lifecycle::code::is_company_code;
use nexgen_lifecycle::{LifecycleConfig, LifecycleService};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

const PEPPER: &str = "test-pepper";

#[derive(Clone, Default)]
struct RecordingSender {
    sent: Arc<Mutex<Vec<Invitation>>>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<Invitation> {
        self.sent.lock().unwrap().clone()
    }
}

impl InvitationSender for RecordingSender {
    async fn send(&self, invitation: Invitation) -> NexgenResult<()> {
        self.sent.lock().unwrap().push(invitation);
        Ok(())
    }
}

type Lifecycle = LifecycleService<
    SurrealCompanyRepository<Db>,
    SurrealPlanRepository<Db>,
    SurrealSubscriptionRepository<Db>,
    SurrealTenantCompanyRepository<Db>,
    SurrealTenantAdminRepository<Db>,
    RecordingSender,
>;

type Auth = AuthService<
    SurrealOwnerRepository<Db>,
    SurrealTenantAdminRepository<Db>,
    SurrealTenantCompanyRepository<Db>,
    RecordingSender,
>;

struct Harness {
    lifecycle: Lifecycle,
    auth: Auth,
    sender: RecordingSender,
    tenant: Surreal<Db>,
    registry: Surreal<Db>,
}

async fn setup() -> Harness {
    let registry = Surreal::new::<Mem>(()).await.unwrap();
    registry.use_ns("test").use_db("registry").await.unwrap();
    nexgen_db::run_registry_migrations(&registry).await.unwrap();

    let tenant = Surreal::new::<Mem>(()).await.unwrap();
    tenant.use_ns("test").use_db("tenant").await.unwrap();
    nexgen_db::run_tenant_migrations(&tenant).await.unwrap();

    let sender = RecordingSender::default();
    let lifecycle = LifecycleService::new(
        SurrealCompanyRepository::new(registry.clone()),
        SurrealPlanRepository::new(registry.clone()),
        SurrealSubscriptionRepository::new(registry.clone()),
        SurrealTenantCompanyRepository::with_pepper(tenant.clone(), PEPPER.into()),
        SurrealTenantAdminRepository::new(tenant.clone()),
        sender.clone(),
        LifecycleConfig::default(),
    );
    let auth = AuthService::new(
        SurrealOwnerRepository::with_pepper(registry.clone(), PEPPER.into()),
        SurrealTenantAdminRepository::new(tenant.clone()),
        SurrealTenantCompanyRepository::with_pepper(tenant.clone(), PEPPER.into()),
        sender.clone(),
        AuthConfig {
            session_secret: "0123456789abcdef0123456789abcdef".into(),
            pepper: Some(PEPPER.into()),
            ..AuthConfig::default()
        },
    );

    Harness {
        lifecycle,
        auth,
        sender,
        tenant,
        registry,
    }
}

fn owner() -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        role: Role::Owner,
        username: "owner".into(),
        company_name: None,
        company_code: None,
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn registration(name: &str, email: &str) -> CreateCompany {
    CreateCompany {
        name: name.into(),
        email: email.into(),
        intake: CompanyIntake {
            industry: "Utilities".into(),
            company_size: "11-50".into(),
            admin_name: "Ada Admin".into(),
            admin_mobile: "+1 555 0100".into(),
            country: "US".into(),
            state: "CA".into(),
            city: "Oakland".into(),
            timezone: "America/Los_Angeles".into(),
            requested_plan: "Professional".into(),
            expected_users: Some("25".into()),
            expected_meters: None,
        },
    }
}

#[tokio::test]
async fn acme_end_to_end() {
    let h = setup().await;
    let owner = owner();

    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    assert_eq!(acme.status, CompanyStatus::Pending);
    assert!(acme.company_code.is_none());

    let approval = h.lifecycle.approve(&owner, acme.id).await.unwrap();
    let code = approval.company.company_code.clone().unwrap();
    assert!(is_company_code(&code), "unexpected code {code}");
    assert_eq!(approval.company.status, CompanyStatus::Active);
    assert_eq!(approval.tenant_company.company_code, code);
    assert_eq!(approval.tenant_company.status, CompanyStatus::Active);

    // Default Free subscription, ACTIVE, starting today.
    let subs = h.lifecycle.list_subscriptions(&owner).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].company_id, acme.id);
    assert_eq!(subs[0].plan_id, DEFAULT_PLAN_ID);
    assert_eq!(subs[0].status, SubscriptionStatus::Active);
    assert_eq!(subs[0].start_date, Utc::now().date_naive());

    // The invitation carries the same temporary password the approval returned.
    let password = approval.temporary_password.clone().unwrap();
    let sent = h.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "a@acme.io");
    assert_eq!(sent[0].temporary_password, password);

    let session = h.auth.tenant_login("a@acme.io", &password).await.unwrap();
    assert_eq!(session.principal.role, Role::Admin);
    assert_eq!(session.principal.company_name.as_deref(), Some("Acme"));

    let suspended = h.lifecycle.suspend(&owner, acme.id).await.unwrap();
    assert_eq!(suspended.status, CompanyStatus::Suspended);
    assert_eq!(suspended.company_code.as_deref(), Some(code.as_str()));

    let err = h
        .auth
        .tenant_login("a@acme.io", &password)
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::CompanySuspended { .. }));
}

#[tokio::test]
async fn code_and_subscription_survive_suspend_and_reapprove() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    let first = h.lifecycle.approve(&owner, acme.id).await.unwrap();
    let code = first.company.company_code.clone().unwrap();
    let password = first.temporary_password.clone().unwrap();

    for _ in 0..3 {
        h.lifecycle.suspend(&owner, acme.id).await.unwrap();
        let again = h.lifecycle.approve(&owner, acme.id).await.unwrap();
        assert_eq!(again.company.company_code.as_deref(), Some(code.as_str()));
        assert_eq!(again.tenant_company.status, CompanyStatus::Active);
        // The existing admin is kept, so no new password is issued.
        assert!(again.temporary_password.is_none());
    }

    assert_eq!(h.lifecycle.list_subscriptions(&owner).await.unwrap().len(), 1);
    assert_eq!(h.sender.sent().len(), 1);

    // The original credential still works after re-approval.
    h.auth.tenant_login("a@acme.io", &password).await.unwrap();
}

#[tokio::test]
async fn reapproving_active_company_is_rejected() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let approval = h.lifecycle.approve(&owner, acme.id).await.unwrap();

    let err = h.lifecycle.approve(&owner, acme.id).await.unwrap_err();
    assert!(matches!(err, NexgenError::InvalidTransition { .. }));

    let dashboard = h.lifecycle.dashboard(&owner).await.unwrap();
    assert_eq!(
        dashboard.company_list[0].company_code,
        approval.company.company_code
    );
}

#[tokio::test]
async fn suspend_before_approval_is_not_provisioned() {
    let h = setup().await;
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    let err = h.lifecycle.suspend(&owner(), acme.id).await.unwrap_err();
    assert!(matches!(err, NexgenError::NotProvisioned { .. }));
}

#[tokio::test]
async fn unknown_company_is_not_found() {
    let h = setup().await;
    let err = h
        .lifecycle
        .approve(&owner(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::NotFound { .. }));
}

#[tokio::test]
async fn registration_requires_fields() {
    let h = setup().await;
    let mut input = registration("Acme", "a@acme.io");
    input.intake.timezone = String::new();

    let err = h.lifecycle.register(input).await.unwrap_err();
    assert!(matches!(err, NexgenError::Validation { .. }));
}

#[tokio::test]
async fn change_plan_moves_mrr_and_touches_one_company() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let globex = h
        .lifecycle
        .register(registration("Globex", "g@globex.io"))
        .await
        .unwrap();
    h.lifecycle.approve(&owner, acme.id).await.unwrap();
    h.lifecycle.approve(&owner, globex.id).await.unwrap();

    let before = h.lifecycle.dashboard(&owner).await.unwrap();
    assert_eq!(before.mrr, 0);

    let changed = h.lifecycle.change_plan(&owner, acme.id, 2).await.unwrap();
    assert_eq!(changed.plan_id, 2);

    let after = h.lifecycle.dashboard(&owner).await.unwrap();
    assert_eq!(after.mrr - before.mrr, 7999);

    let subscriptions = SurrealSubscriptionRepository::new(h.registry.clone());
    let untouched = subscriptions.get_by_company(globex.id).await.unwrap();
    assert_eq!(untouched.plan_id, DEFAULT_PLAN_ID);

    let row = after
        .subscription_details
        .iter()
        .find(|s| s.company_id == acme.id)
        .unwrap();
    assert_eq!(row.plan_name, "Professional");
    assert_eq!(row.price, 7999);
}

#[tokio::test]
async fn change_plan_errors() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    // No subscription before the first approval.
    let err = h.lifecycle.change_plan(&owner, acme.id, 2).await.unwrap_err();
    assert!(matches!(err, NexgenError::NotFound { ref entity, .. } if entity == "subscription"));

    h.lifecycle.approve(&owner, acme.id).await.unwrap();
    let err = h.lifecycle.change_plan(&owner, acme.id, 9).await.unwrap_err();
    assert!(matches!(err, NexgenError::NotFound { ref entity, .. } if entity == "plan"));
}

#[tokio::test]
async fn dashboard_counts_by_status() {
    let h = setup().await;
    let owner = owner();
    let a = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let b = h
        .lifecycle
        .register(registration("Globex", "g@globex.io"))
        .await
        .unwrap();
    h.lifecycle
        .register(registration("Initech", "i@initech.io"))
        .await
        .unwrap();

    h.lifecycle.approve(&owner, a.id).await.unwrap();
    h.lifecycle.approve(&owner, b.id).await.unwrap();
    h.lifecycle.suspend(&owner, b.id).await.unwrap();

    let dashboard = h.lifecycle.dashboard(&owner).await.unwrap();
    assert_eq!(dashboard.companies.total(), 3);
    assert_eq!(dashboard.companies.active, 1);
    assert_eq!(dashboard.companies.pending, 1);
    assert_eq!(dashboard.companies.suspended, 1);
    assert_eq!(dashboard.subscriptions.active, 2);
    assert_eq!(dashboard.company_list.len(), 3);
    assert_eq!(dashboard.plans.len(), 3);
}

#[tokio::test]
async fn reconcile_restores_deleted_projection() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let code = h
        .lifecycle
        .approve(&owner, acme.id)
        .await
        .unwrap()
        .company
        .company_code
        .unwrap();

    h.tenant
        .query("DELETE tenant_company; DELETE tenant_admin;")
        .await
        .unwrap()
        .check()
        .unwrap();

    let report = h.lifecycle.reconcile(&owner).await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.reprovisioned, 1);
    assert_eq!(report.failed, 0);

    let mirrors = SurrealTenantCompanyRepository::new(h.tenant.clone());
    let mirror = mirrors.get_by_code(&code).await.unwrap();
    assert_eq!(mirror.status, CompanyStatus::Active);
    let admins = SurrealTenantAdminRepository::new(h.tenant.clone());
    assert_eq!(
        admins.get_by_company_code(&code).await.unwrap().username,
        "a@acme.io"
    );

    // A fresh admin means a fresh invitation.
    assert_eq!(h.sender.sent().len(), 2);

    // A second sweep finds nothing to do.
    let report = h.lifecycle.reconcile(&owner).await.unwrap();
    assert_eq!(report.reprovisioned, 0);
}

#[tokio::test]
async fn concurrent_approvals_activate_once() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        h.lifecycle.approve(&owner, acme.id),
        h.lifecycle.approve(&owner, acme.id)
    );
    let (winner, loser) = match (first, second) {
        (Ok(approval), Err(e)) | (Err(e), Ok(approval)) => (approval, e),
        (Ok(_), Ok(_)) => panic!("both approvals succeeded"),
        (Err(a), Err(b)) => panic!("both approvals failed: {a:?} / {b:?}"),
    };
    assert!(
        matches!(
            loser,
            NexgenError::InvalidTransition { .. } | NexgenError::AlreadyExists { .. }
        ),
        "unexpected error: {loser:?}"
    );

    let code = winner.company.company_code.clone().unwrap();
    let stored = h
        .lifecycle
        .list_companies(&owner, Default::default())
        .await
        .unwrap();
    assert_eq!(stored.items[0].company_code.as_deref(), Some(code.as_str()));
    assert_eq!(stored.items[0].status, CompanyStatus::Active);

    let subs = h.lifecycle.list_subscriptions(&owner).await.unwrap();
    assert_eq!(subs.len(), 1);

    let admins = SurrealTenantAdminRepository::new(h.tenant.clone());
    let admin = admins.get_by_username("a@acme.io").await.unwrap();
    assert_eq!(admin.company_code, code);
    assert_eq!(h.sender.sent().len(), 1);

    let report = h.lifecycle.reconcile(&owner).await.unwrap();
    assert_eq!(report.reprovisioned, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn duplicate_registrant_email_is_rejected() {
    let h = setup().await;
    let owner = owner();
    h.lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    let err = h
        .lifecycle
        .register(registration("Acme Holdings", "a@acme.io"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, NexgenError::AlreadyExists { ref entity } if entity == "company"),
        "unexpected error: {err:?}"
    );

    let listed = h
        .lifecycle
        .list_companies(&owner, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn approve_refuses_admin_username_held_by_another_tenant() {
    let h = setup().await;
    let owner = owner();

    // A tenant that the registry knows nothing about already uses the email.
    let mirrors = SurrealTenantCompanyRepository::with_pepper(h.tenant.clone(), PEPPER.into());
    mirrors
        .provision(ProvisionTenant {
            company_code: "NG-00000001".into(),
            name: "Legacy".into(),
            admin_username: "a@acme.io".into(),
            admin_password: "legacy-password".into(),
        })
        .await
        .unwrap();

    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let err = h.lifecycle.approve(&owner, acme.id).await.unwrap_err();
    assert!(
        matches!(err, NexgenError::AlreadyExists { ref entity } if entity == "tenant_admin"),
        "unexpected error: {err:?}"
    );

    // The registry was never touched, so there is nothing to repair.
    let listed = h
        .lifecycle
        .list_companies(&owner, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.items[0].status, CompanyStatus::Pending);
    assert!(listed.items[0].company_code.is_none());
    assert!(h.lifecycle.list_subscriptions(&owner).await.unwrap().is_empty());
    assert!(h.sender.sent().is_empty());

    let report = h.lifecycle.reconcile(&owner).await.unwrap();
    assert_eq!(report.checked, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn reconcile_resuspends_active_mirror() {
    let h = setup().await;
    let owner = owner();
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();
    let code = h
        .lifecycle
        .approve(&owner, acme.id)
        .await
        .unwrap()
        .company
        .company_code
        .unwrap();
    h.lifecycle.suspend(&owner, acme.id).await.unwrap();

    // Simulate a lost tenant update.
    let mirrors = SurrealTenantCompanyRepository::new(h.tenant.clone());
    mirrors.set_status(&code, CompanyStatus::Active).await.unwrap();

    let report = h.lifecycle.reconcile(&owner).await.unwrap();
    assert_eq!(report.resynced, 1);
    assert_eq!(
        mirrors.get_by_code(&code).await.unwrap().status,
        CompanyStatus::Suspended
    );
}

#[tokio::test]
async fn owner_operations_reject_other_principals() {
    let h = setup().await;
    let acme = h
        .lifecycle
        .register(registration("Acme", "a@acme.io"))
        .await
        .unwrap();

    let admin = Principal {
        role: Role::Admin,
        ..owner()
    };
    let err = h.lifecycle.approve(&admin, acme.id).await.unwrap_err();
    assert!(matches!(err, NexgenError::AuthorizationDenied { .. }));
    let err = h.lifecycle.dashboard(&admin).await.unwrap_err();
    assert!(matches!(err, NexgenError::AuthorizationDenied { .. }));

    let expired = Principal {
        expires_at: Utc::now() - Duration::seconds(1),
        ..owner()
    };
    let err = h.lifecycle.reconcile(&expired).await.unwrap_err();
    assert!(matches!(err, NexgenError::AuthenticationFailed { .. }));

    // Nothing moved.
    let plans = h.lifecycle.list_plans().await.unwrap();
    assert_eq!(plans.len(), 3);
    let listed = h
        .lifecycle
        .list_companies(&owner(), Default::default())
        .await
        .unwrap();
    assert_eq!(listed.items[0].status, CompanyStatus::Pending);
}
