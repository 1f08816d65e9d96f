//! SurrealDB implementation of [`TenantCompanyRepository`].
//!
//! Mirror rows use the company code as their record id
//! (`tenant_company:⟨NG-XXXXXXXX⟩`), so lookups never need an index.

use chrono::{DateTime, Utc};
use nexgen_core::error::NexgenResult;
use nexgen_core::models::company::CompanyStatus;
use nexgen_core::models::tenant::{ProvisionTenant, Provisioned, TenantCompany};
use nexgen_core::repository::TenantCompanyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::company::parse_status;
use crate::error::DbError;
use crate::password::hash_password;

#[derive(Debug, SurrealValue)]
struct TenantCompanyRow {
    name: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantCompanyRow {
    fn into_tenant_company(self, company_code: String) -> Result<TenantCompany, DbError> {
        Ok(TenantCompany {
            company_code,
            name: self.name,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the tenant mirror repository.
///
/// Operates on the tenant store. `provision` also writes the admin
/// account, so the repository carries the password pepper.
#[derive(Clone)]
pub struct SurrealTenantCompanyRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealTenantCompanyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn find(&self, company_code: &str) -> Result<Option<TenantCompany>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant_company', $code)")
            .bind(("code", company_code.to_string()))
            .await?;

        let rows: Vec<TenantCompanyRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.into_tenant_company(company_code.to_string()))
            .transpose()
    }

    async fn has_admin(&self, company_code: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM tenant_admin \
                 WHERE company_code = $code GROUP ALL",
            )
            .bind(("code", company_code.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> TenantCompanyRepository for SurrealTenantCompanyRepository<C> {
    async fn provision(&self, input: ProvisionTenant) -> NexgenResult<Provisioned> {
        let mirror_exists = self.find(&input.company_code).await?.is_some();
        let admin_exists = self.has_admin(&input.company_code).await?;

        let mut statements = vec!["BEGIN TRANSACTION;"];
        if mirror_exists {
            statements.push(
                "UPDATE type::record('tenant_company', $code) SET \
                 status = 'ACTIVE', updated_at = time::now();",
            );
        } else {
            statements.push(
                "CREATE type::record('tenant_company', $code) SET \
                 name = $name, status = 'ACTIVE';",
            );
        }
        if !admin_exists {
            statements.push(
                "CREATE type::record('tenant_admin', $admin_id) SET \
                 company_code = $code, username = $username, \
                 password_hash = $password_hash, role = 'ADMIN';",
            );
        }
        statements.push("COMMIT TRANSACTION;");

        // Only hash when the credential is actually written.
        let password_hash = if admin_exists {
            String::new()
        } else {
            hash_password(&input.admin_password, self.pepper.as_deref())?
        };

        debug!(
            company_code = %input.company_code,
            mirror_exists,
            admin_exists,
            "Provisioning tenant company"
        );

        let response = self
            .db
            .query(statements.join("\n"))
            .bind(("code", input.company_code.clone()))
            .bind(("name", input.name))
            .bind(("admin_id", Uuid::new_v4().to_string()))
            .bind(("username", input.admin_username))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;
        DbError::check_all("tenant_admin", response)?;

        let tenant_company = self.get_by_code(&input.company_code).await?;

        Ok(Provisioned {
            tenant_company,
            admin_created: !admin_exists,
        })
    }

    async fn get_by_code(&self, company_code: &str) -> NexgenResult<TenantCompany> {
        let found = self.find(company_code).await?;
        Ok(found.ok_or_else(|| DbError::NotFound {
            entity: "tenant_company".into(),
            id: company_code.to_string(),
        })?)
    }

    async fn set_status(
        &self,
        company_code: &str,
        status: CompanyStatus,
    ) -> NexgenResult<TenantCompany> {
        let result = self
            .db
            .query(
                "UPDATE type::record('tenant_company', $code) SET \
                 status = $status, updated_at = time::now() \
                 WHERE status != NONE",
            )
            .bind(("code", company_code.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("tenant_company", e))?;

        let rows: Vec<TenantCompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_company".into(),
            id: company_code.to_string(),
        })?;

        Ok(row.into_tenant_company(company_code.to_string())?)
    }
}
