//! Integration tests for the authentication service.

use std::sync::{Arc, Mutex};

use nexgen_auth::config::AuthConfig;
use nexgen_auth::service::AuthService;
use nexgen_core::error::{NexgenError, NexgenResult};
use nexgen_core::invitation::{Invitation, InvitationSender};
use nexgen_core::models::company::CompanyStatus;
use nexgen_core::models::session::Role;
use nexgen_core::models::tenant::ProvisionTenant;
use nexgen_core::repository::{OwnerRepository, TenantCompanyRepository};
use nexgen_db::repository::{
    SurrealOwnerRepository, SurrealTenantAdminRepository, SurrealTenantCompanyRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

const PEPPER: &str = "test-pepper";
const CODE: &str = "NG-0A1B2C3D";
const ADMIN_EMAIL: &str = "a@acme.io";
const ADMIN_PASSWORD: &str = "temporary-secret";

fn test_config() -> AuthConfig {
    AuthConfig {
        session_secret: "0123456789abcdef0123456789abcdef".into(),
        session_lifetime_secs: 600,
        session_issuer: "nexgen-test".into(),
        pepper: Some(PEPPER.into()),
        ..AuthConfig::default()
    }
}

/// Collects every invitation instead of delivering it.
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

/// Always fails, like an unreachable mail relay.
#[derive(Clone, Default)]
struct FailingSender;

impl InvitationSender for FailingSender {
    async fn send(&self, _invitation: Invitation) -> NexgenResult<()> {
        Err(NexgenError::Internal("relay unreachable".into()))
    }
}

type Service<I> = AuthService<
    SurrealOwnerRepository<Db>,
    SurrealTenantAdminRepository<Db>,
    SurrealTenantCompanyRepository<Db>,
    I,
>;

struct Harness<I: InvitationSender> {
    service: Service<I>,
    mirrors: SurrealTenantCompanyRepository<Db>,
    owners: SurrealOwnerRepository<Db>,
}

/// Two independent in-memory stores, one tenant already provisioned.
async fn setup<I: InvitationSender>(sender: I) -> Harness<I> {
    let registry = Surreal::new::<Mem>(()).await.unwrap();
    registry.use_ns("test").use_db("registry").await.unwrap();
    nexgen_db::run_registry_migrations(&registry).await.unwrap();

    let tenant = Surreal::new::<Mem>(()).await.unwrap();
    tenant.use_ns("test").use_db("tenant").await.unwrap();
    nexgen_db::run_tenant_migrations(&tenant).await.unwrap();

    let mirrors = SurrealTenantCompanyRepository::with_pepper(tenant.clone(), PEPPER.into());
    mirrors
        .provision(ProvisionTenant {
            company_code: CODE.into(),
            name: "Acme".into(),
            admin_username: ADMIN_EMAIL.into(),
            admin_password: ADMIN_PASSWORD.into(),
        })
        .await
        .unwrap();

    let owners = SurrealOwnerRepository::with_pepper(registry.clone(), PEPPER.into());
    let service = AuthService::new(
        SurrealOwnerRepository::with_pepper(registry, PEPPER.into()),
        SurrealTenantAdminRepository::new(tenant.clone()),
        SurrealTenantCompanyRepository::with_pepper(tenant, PEPPER.into()),
        sender,
        test_config(),
    );

    Harness {
        service,
        mirrors,
        owners,
    }
}

#[tokio::test]
async fn bootstrap_creates_owner_once_and_sends_invitation() {
    let sender = RecordingSender::default();
    let h = setup(sender.clone()).await;

    let owner = h
        .service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap()
        .expect("first bootstrap creates an owner");
    assert_eq!(owner.username, "owner");
    assert!(owner.password_hash.starts_with("$argon2id$"));

    let again = h
        .service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap();
    assert!(again.is_none());
    assert_eq!(h.owners.count().await.unwrap(), 1);

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "owner@nexgen.io");
    assert_eq!(sent[0].username, "owner");
    assert!(sent[0].temporary_password.len() >= 12);
}

#[tokio::test]
async fn owner_login_with_invited_password() {
    let sender = RecordingSender::default();
    let h = setup(sender.clone()).await;
    h.service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap();
    let password = sender.sent()[0].temporary_password.clone();

    let session = h.service.owner_login("owner", &password).await.unwrap();
    assert_eq!(session.principal.role, Role::Owner);
    assert_eq!(session.principal.username, "owner");
    assert!(session.principal.company_code.is_none());

    let principal = h.service.authenticate(&session.token).unwrap();
    assert_eq!(principal, session.principal);
}

#[tokio::test]
async fn owner_login_rejects_wrong_password_and_unknown_user() {
    let h = setup(RecordingSender::default()).await;
    h.service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap();

    let err = h
        .service
        .owner_login("owner", "not-the-password")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::AuthenticationFailed { .. }));

    let err = h
        .service
        .owner_login("nobody", "whatever-password")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn tenant_login_carries_company_into_principal() {
    let h = setup(RecordingSender::default()).await;

    let session = h
        .service
        .tenant_login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    assert_eq!(session.principal.role, Role::Admin);
    assert_eq!(session.principal.company_name.as_deref(), Some("Acme"));
    assert_eq!(session.principal.company_code.as_deref(), Some(CODE));
}

#[tokio::test]
async fn tenant_login_rejects_wrong_password() {
    let h = setup(RecordingSender::default()).await;

    let err = h
        .service
        .tenant_login(ADMIN_EMAIL, "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn suspended_tenant_is_locked_out_before_password_check() {
    let h = setup(RecordingSender::default()).await;
    h.mirrors
        .set_status(CODE, CompanyStatus::Suspended)
        .await
        .unwrap();

    let err = h
        .service
        .tenant_login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NexgenError::CompanySuspended { ref company_code } if company_code == CODE
    ));

    // Even a wrong password reports the suspension.
    let err = h
        .service
        .tenant_login(ADMIN_EMAIL, "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::CompanySuspended { .. }));

    h.mirrors.set_status(CODE, CompanyStatus::Active).await.unwrap();
    h.service
        .tenant_login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let h = setup(RecordingSender::default()).await;
    let session = h
        .service
        .tenant_login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();

    let mut tampered = session.token.clone();
    tampered.push('x');
    let err = h.service.authenticate(&tampered).unwrap_err();
    assert!(matches!(err, NexgenError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn add_owner_requires_owner_principal() {
    let h = setup(RecordingSender::default()).await;
    let admin = h
        .service
        .tenant_login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap()
        .principal;

    let err = h
        .service
        .add_owner(&admin, "second", "second@nexgen.io")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::AuthorizationDenied { .. }));
    assert_eq!(h.owners.count().await.unwrap(), 0);

    let err = h.service.list_owners(&admin).await.unwrap_err();
    assert!(matches!(err, NexgenError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn add_owner_keeps_account_when_invitation_fails() {
    let h = setup(FailingSender).await;
    let owner = h
        .service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.username, "owner");

    // Nobody received the password, so issue a principal directly.
    let principal = nexgen_core::models::session::Principal {
        user_id: owner.id,
        role: Role::Owner,
        username: owner.username.clone(),
        company_name: None,
        company_code: None,
        expires_at: nexgen_auth::token::session_expiry(&test_config()).unwrap(),
    };

    let second = h
        .service
        .add_owner(&principal, "second", "second@nexgen.io")
        .await
        .unwrap();
    assert_eq!(second.username, "second");

    let owners = h.service.list_owners(&principal).await.unwrap();
    assert_eq!(owners.len(), 2);
}

#[tokio::test]
async fn add_owner_rejects_duplicate_username() {
    let sender = RecordingSender::default();
    let h = setup(sender.clone()).await;
    let owner = h
        .service
        .bootstrap_owner("owner", "owner@nexgen.io")
        .await
        .unwrap()
        .unwrap();
    let password = sender.sent()[0].temporary_password.clone();
    let principal = h
        .service
        .owner_login(&owner.username, &password)
        .await
        .unwrap()
        .principal;

    let err = h
        .service
        .add_owner(&principal, "owner", "other@nexgen.io")
        .await
        .unwrap_err();
    assert!(matches!(err, NexgenError::AlreadyExists { .. }));
    assert_eq!(sender.sent().len(), 1);
}
