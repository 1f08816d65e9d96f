//! Schema definitions and migration runners for SurrealDB.
//!
//! The registry and tenant stores are separate databases with separate
//! migration histories. All table definitions use SCHEMAFULL mode.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static REGISTRY_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "registry_initial_schema",
        sql: REGISTRY_SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "registry_company_uniques",
        sql: REGISTRY_SCHEMA_V2,
    },
];

static TENANT_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "tenant_initial_schema",
    sql: TENANT_SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Registry schema v1
// -----------------------------------------------------------------------

const REGISTRY_SCHEMA_V1: &str = "\
-- =======================================================================
-- Companies
-- =======================================================================
DEFINE TABLE company SCHEMAFULL;
DEFINE FIELD company_code ON TABLE company TYPE option<string>;
DEFINE FIELD name ON TABLE company TYPE string;
DEFINE FIELD email ON TABLE company TYPE string;
DEFINE FIELD status ON TABLE company TYPE string \
    ASSERT $value IN ['PENDING', 'ACTIVE', 'SUSPENDED'];
DEFINE FIELD industry ON TABLE company TYPE string;
DEFINE FIELD company_size ON TABLE company TYPE string;
DEFINE FIELD admin_name ON TABLE company TYPE string;
DEFINE FIELD admin_mobile ON TABLE company TYPE string;
DEFINE FIELD country ON TABLE company TYPE string;
DEFINE FIELD state ON TABLE company TYPE string;
DEFINE FIELD city ON TABLE company TYPE string;
DEFINE FIELD timezone ON TABLE company TYPE string;
DEFINE FIELD requested_plan ON TABLE company TYPE string;
DEFINE FIELD expected_users ON TABLE company TYPE option<string>;
DEFINE FIELD expected_meters ON TABLE company TYPE option<string>;
DEFINE FIELD created_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_company_status ON TABLE company COLUMNS status;
DEFINE INDEX idx_company_code ON TABLE company COLUMNS company_code;

-- =======================================================================
-- Plan catalog (seeded, immutable)
-- =======================================================================
DEFINE TABLE plan SCHEMAFULL;
DEFINE FIELD name ON TABLE plan TYPE string;
DEFINE FIELD price ON TABLE plan TYPE int;
DEFINE FIELD meter_limit ON TABLE plan TYPE int;
DEFINE FIELD user_limit ON TABLE plan TYPE int;

-- =======================================================================
-- Subscriptions (at most one per company)
-- =======================================================================
DEFINE TABLE subscription SCHEMAFULL;
DEFINE FIELD company_id ON TABLE subscription TYPE string;
DEFINE FIELD plan_id ON TABLE subscription TYPE int;
DEFINE FIELD status ON TABLE subscription TYPE string \
    ASSERT $value IN ['ACTIVE', 'TRIAL', 'CANCELLED'];
DEFINE FIELD start_date ON TABLE subscription TYPE string;
DEFINE FIELD created_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subscription_company ON TABLE subscription \
    COLUMNS company_id UNIQUE;

-- =======================================================================
-- Owners (console operators)
-- =======================================================================
DEFINE TABLE owner SCHEMAFULL;
DEFINE FIELD username ON TABLE owner TYPE string;
DEFINE FIELD email ON TABLE owner TYPE string;
DEFINE FIELD password_hash ON TABLE owner TYPE string;
DEFINE FIELD created_at ON TABLE owner TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_owner_username ON TABLE owner \
    COLUMNS username UNIQUE;
";

// -----------------------------------------------------------------------
// Registry schema v2
// -----------------------------------------------------------------------

// The registrant email becomes the tenant admin username, which is unique
// in the tenant store, so it must be unique here too. Codes are claimed in
// `company_code` (record id = code) so a code can never be handed out
// twice; existing assignments are backfilled.
const REGISTRY_SCHEMA_V2: &str = "\
DEFINE INDEX idx_company_email ON TABLE company COLUMNS email UNIQUE;

DEFINE TABLE company_code SCHEMAFULL;
DEFINE FIELD company_id ON TABLE company_code TYPE string;
DEFINE FIELD claimed_at ON TABLE company_code TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_company_code_company ON TABLE company_code \
    COLUMNS company_id UNIQUE;

FOR $row IN (SELECT meta::id(id) AS record_id, company_code FROM company \
    WHERE company_code != NONE) {
    UPSERT type::record('company_code', $row.company_code) \
        SET company_id = $row.record_id;
};
";

/// Catalog rows. `INSERT IGNORE` keeps re-seeding a no-op.
const PLAN_SEED: &str = "\
INSERT IGNORE INTO plan [
    { id: 1, name: 'Free', price: 0, meter_limit: 3, user_limit: 2 },
    { id: 2, name: 'Professional', price: 7999, meter_limit: 50, user_limit: 25 },
    { id: 3, name: 'Enterprise', price: 24999, meter_limit: -1, user_limit: -1 }
];
";

// -----------------------------------------------------------------------
// Tenant schema v1
// -----------------------------------------------------------------------

const TENANT_SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenant company mirror (record id = company_code)
-- =======================================================================
DEFINE TABLE tenant_company SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant_company TYPE string;
DEFINE FIELD status ON TABLE tenant_company TYPE string \
    ASSERT $value IN ['PENDING', 'ACTIVE', 'SUSPENDED'];
DEFINE FIELD created_at ON TABLE tenant_company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant_company TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Tenant admin accounts (one per mirror)
-- =======================================================================
DEFINE TABLE tenant_admin SCHEMAFULL;
DEFINE FIELD company_code ON TABLE tenant_admin TYPE string;
DEFINE FIELD username ON TABLE tenant_admin TYPE string;
DEFINE FIELD password_hash ON TABLE tenant_admin TYPE string;
DEFINE FIELD role ON TABLE tenant_admin TYPE string \
    ASSERT $value = 'ADMIN';
DEFINE FIELD created_at ON TABLE tenant_admin TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_admin_company ON TABLE tenant_admin \
    COLUMNS company_code UNIQUE;
DEFINE INDEX idx_tenant_admin_username ON TABLE tenant_admin \
    COLUMNS username UNIQUE;
";

// -----------------------------------------------------------------------
// Runner
// -----------------------------------------------------------------------

/// Apply every migration whose version exceeds the recorded maximum.
async fn apply_migrations<C: Connection>(
    db: &Surreal<C>,
    migrations: &[Migration],
) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in migrations {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(
            version = migration.version,
            "Migration applied successfully"
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run pending registry migrations, then seed the plan catalog.
///
/// The seed runs on every call and never overwrites existing plans.
pub async fn run_registry_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    apply_migrations(db, REGISTRY_MIGRATIONS).await?;

    db.query(PLAN_SEED)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("plan catalog seed failed: {e}")))?;

    Ok(())
}

/// Run pending tenant-store migrations.
pub async fn run_tenant_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    apply_migrations(db, TENANT_MIGRATIONS).await
}

/// Returns the raw registry DDL for version 1.
pub fn registry_schema_v1() -> &'static str {
    REGISTRY_SCHEMA_V1
}

/// Returns the raw registry DDL for version 2.
pub fn registry_schema_v2() -> &'static str {
    REGISTRY_SCHEMA_V2
}

/// Returns the raw tenant DDL for version 1.
pub fn tenant_schema_v1() -> &'static str {
    TENANT_SCHEMA_V1
}
