//! SurrealDB implementation of [`TenantAdminRepository`].

use chrono::{DateTime, Utc};
use nexgen_core::error::NexgenResult;
use nexgen_core::models::tenant::TenantAdmin;
use nexgen_core::repository::TenantAdminRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantAdminRowWithId {
    record_id: String,
    company_code: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TenantAdminRowWithId {
    fn try_into_admin(self) -> Result<TenantAdmin, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::decode("tenant_admin", format!("invalid UUID: {e}")))?;
        Ok(TenantAdmin {
            id,
            company_code: self.company_code,
            username: self.username,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the tenant admin repository.
///
/// Admin accounts are only ever written by
/// [`SurrealTenantCompanyRepository::provision`](super::SurrealTenantCompanyRepository).
#[derive(Clone)]
pub struct SurrealTenantAdminRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantAdminRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &'static str, value: &str) -> NexgenResult<TenantAdmin> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM tenant_admin \
             WHERE {field} = $value"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantAdminRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant_admin".into(),
            id: format!("{field}={value}"),
        })?;

        Ok(row.try_into_admin()?)
    }
}

impl<C: Connection> TenantAdminRepository for SurrealTenantAdminRepository<C> {
    async fn get_by_username(&self, username: &str) -> NexgenResult<TenantAdmin> {
        self.find_one("username", username).await
    }

    async fn get_by_company_code(&self, company_code: &str) -> NexgenResult<TenantAdmin> {
        self.find_one("company_code", company_code).await
    }
}
