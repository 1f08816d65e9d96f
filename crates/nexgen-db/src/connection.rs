//! Connections to the registry and tenant stores.
//!
//! The owner console runs against two SurrealDB databases. The registry
//! holds companies, subscriptions, plans and owners; the tenant store holds
//! the per-company mirrors and admin accounts. Each store has its own
//! [`DbManager`], its own credentials and its own migration history, and
//! the two must never resolve to the same database.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::{run_registry_migrations, run_tenant_migrations};

/// One of the two databases the console writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Registry,
    Tenant,
}

impl Store {
    pub fn as_str(self) -> &'static str {
        match self {
            Store::Registry => "registry",
            Store::Tenant => "tenant",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one store lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port`.
    pub url: String,
    pub namespace: String,
    /// Database name; defaults to the store name.
    pub database: String,
    /// Root credentials. The tenant store may sit on a different server
    /// with a different root user.
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Local defaults for `store`: `nexgen/registry` or `nexgen/tenant` on
    /// the same server.
    pub fn for_store(store: Store) -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "nexgen".into(),
            database: store.as_str().into(),
            username: "root".into(),
            password: "root".into(),
        }
    }

    /// True when both configs resolve to the same namespace and database
    /// on the same endpoint.
    pub fn same_database(&self, other: &DbConfig) -> bool {
        self.url == other.url
            && self.namespace == other.namespace
            && self.database == other.database
    }
}

/// An authenticated client bound to one store.
#[derive(Clone)]
pub struct DbManager {
    store: Store,
    db: Surreal<Client>,
}

impl DbManager {
    /// Open `store`, sign in as root and select its namespace and database.
    pub async fn connect(store: Store, config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            store = %store,
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(store = %store, "Store connected");
        Ok(Self { store, db })
    }

    /// Apply this store's pending migrations. The registry also reseeds
    /// the plan catalog.
    pub async fn migrate(&self) -> Result<(), DbError> {
        match self.store {
            Store::Registry => run_registry_migrations(&self.db).await,
            Store::Tenant => run_tenant_migrations(&self.db).await,
        }
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
