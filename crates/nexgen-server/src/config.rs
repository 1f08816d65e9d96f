//! Process configuration read from `NEXGEN_*` environment variables.

use nexgen_auth::AuthConfig;
use nexgen_auth::config::MIN_SESSION_SECRET_LEN;
use nexgen_db::{DbConfig, Store};
use nexgen_lifecycle::LifecycleConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub registry_db: DbConfig,
    pub tenant_db: DbConfig,
    pub auth: AuthConfig,
    pub lifecycle: LifecycleConfig,
    pub bootstrap_owner_username: String,
    pub bootstrap_owner_email: String,
    /// Seconds between background reconciliation sweeps.
    pub reconcile_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset keys fall back
    /// to defaults, except the session secret which must be supplied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let registry_db = db_config(&lookup, Store::Registry, DbKeys::REGISTRY);
        let tenant_db = db_config(&lookup, Store::Tenant, DbKeys::TENANT);
        if registry_db.same_database(&tenant_db) {
            return Err(ConfigError::Invalid {
                key: "NEXGEN_TENANT_DB_DATABASE",
                reason: "tenant store must not share the registry database".into(),
            });
        }

        let session_secret =
            lookup("NEXGEN_SESSION_SECRET").ok_or(ConfigError::Missing("NEXGEN_SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "NEXGEN_SESSION_SECRET",
                reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
            });
        }

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            session_secret,
            session_lifetime_secs: parse_or(
                &lookup,
                "NEXGEN_SESSION_LIFETIME_SECS",
                defaults.session_lifetime_secs,
            )?,
            pepper: lookup("NEXGEN_PASSWORD_PEPPER").filter(|p| !p.is_empty()),
            ..defaults
        };

        let reconcile_interval_secs = parse_or(&lookup, "NEXGEN_RECONCILE_INTERVAL_SECS", 300)?;
        if reconcile_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "NEXGEN_RECONCILE_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let lifecycle = LifecycleConfig {
            temporary_password_bytes: auth.temporary_password_bytes,
            ..LifecycleConfig::default()
        };

        Ok(Self {
            registry_db,
            tenant_db,
            auth,
            lifecycle,
            bootstrap_owner_username: lookup("NEXGEN_OWNER_USERNAME")
                .unwrap_or_else(|| "owner".into()),
            bootstrap_owner_email: lookup("NEXGEN_OWNER_EMAIL")
                .unwrap_or_else(|| "owner@localhost".into()),
            reconcile_interval_secs,
        })
    }
}

struct DbKeys {
    url: &'static str,
    namespace: &'static str,
    database: &'static str,
    username: &'static str,
    password: &'static str,
}

impl DbKeys {
    const REGISTRY: DbKeys = DbKeys {
        url: "NEXGEN_REGISTRY_DB_URL",
        namespace: "NEXGEN_REGISTRY_DB_NAMESPACE",
        database: "NEXGEN_REGISTRY_DB_DATABASE",
        username: "NEXGEN_REGISTRY_DB_USERNAME",
        password: "NEXGEN_REGISTRY_DB_PASSWORD",
    };

    const TENANT: DbKeys = DbKeys {
        url: "NEXGEN_TENANT_DB_URL",
        namespace: "NEXGEN_TENANT_DB_NAMESPACE",
        database: "NEXGEN_TENANT_DB_DATABASE",
        username: "NEXGEN_TENANT_DB_USERNAME",
        password: "NEXGEN_TENANT_DB_PASSWORD",
    };
}

fn db_config<F>(lookup: &F, store: Store, keys: DbKeys) -> DbConfig
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = DbConfig::for_store(store);
    DbConfig {
        url: lookup(keys.url).unwrap_or(defaults.url),
        namespace: lookup(keys.namespace).unwrap_or(defaults.namespace),
        database: lookup(keys.database).unwrap_or(defaults.database),
        username: lookup(keys.username).unwrap_or(defaults.username),
        password: lookup(keys.password).unwrap_or(defaults.password),
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("{e}"),
        }),
    }
}
