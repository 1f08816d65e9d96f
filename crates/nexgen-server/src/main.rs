//! NexGen Server: owner console entry point.
//!
//! Connects both stores, applies migrations, makes sure an owner exists,
//! repairs any tenant drift left by an earlier run and then keeps
//! reconciling on a fixed interval until interrupted.

mod config;

use std::time::Duration;

use nexgen_auth::{AuthService, TracingInvitationSender, system_principal};
use nexgen_core::error::NexgenError;
use nexgen_db::repository::{
    SurrealCompanyRepository, SurrealOwnerRepository, SurrealPlanRepository,
    SurrealSubscriptionRepository, SurrealTenantAdminRepository, SurrealTenantCompanyRepository,
};
use nexgen_db::{DbError, DbManager, Store};
use nexgen_lifecycle::LifecycleService;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::config::{AppConfig, ConfigError};

#[derive(Debug, Error)]
enum StartupError {
    #[error("log filter: {0}")]
    LogFilter(#[from] ParseError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("migration: {0}")]
    Migration(#[from] DbError),

    #[error(transparent)]
    App(#[from] NexgenError),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nexgen=info".parse()?))
        .json()
        .init();

    info!("Starting NexGen server...");

    let config = AppConfig::from_env()?;

    let registry = DbManager::connect(Store::Registry, &config.registry_db).await?;
    let tenant = DbManager::connect(Store::Tenant, &config.tenant_db).await?;
    registry.migrate().await?;
    tenant.migrate().await?;

    let registry_db = registry.client().clone();
    let tenant_db = tenant.client().clone();

    let (owners, tenant_companies) = match config.auth.pepper.clone() {
        Some(pepper) => (
            SurrealOwnerRepository::with_pepper(registry_db.clone(), pepper.clone()),
            SurrealTenantCompanyRepository::with_pepper(tenant_db.clone(), pepper),
        ),
        None => (
            SurrealOwnerRepository::new(registry_db.clone()),
            SurrealTenantCompanyRepository::new(tenant_db.clone()),
        ),
    };

    let auth = AuthService::new(
        owners,
        SurrealTenantAdminRepository::new(tenant_db.clone()),
        tenant_companies.clone(),
        TracingInvitationSender,
        config.auth.clone(),
    );
    auth.bootstrap_owner(
        &config.bootstrap_owner_username,
        &config.bootstrap_owner_email,
    )
    .await?;

    let lifecycle = LifecycleService::new(
        SurrealCompanyRepository::new(registry_db.clone()),
        SurrealPlanRepository::new(registry_db.clone()),
        SurrealSubscriptionRepository::new(registry_db),
        tenant_companies,
        SurrealTenantAdminRepository::new(tenant_db),
        TracingInvitationSender,
        config.lifecycle.clone(),
    );

    let principal = system_principal(&config.auth)?;
    lifecycle.reconcile(&principal).await?;

    let dashboard = lifecycle.dashboard(&principal).await?;
    info!(
        companies = dashboard.companies.total(),
        active = dashboard.companies.active,
        pending = dashboard.companies.pending,
        suspended = dashboard.companies.suspended,
        mrr = dashboard.mrr,
        "NexGen server ready"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.reconcile_interval_secs));
    // The first tick fires immediately; the startup sweep already ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sweep = match system_principal(&config.auth) {
                    Ok(principal) => lifecycle.reconcile(&principal).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = sweep {
                    error!(error = %e, "Reconciliation sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("NexGen server stopped.");
    Ok(())
}
