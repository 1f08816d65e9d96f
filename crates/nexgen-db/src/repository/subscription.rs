//! SurrealDB implementation of [`SubscriptionRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use nexgen_core::error::NexgenResult;
use nexgen_core::models::subscription::{Subscription, SubscriptionStatus};
use nexgen_core::repository::SubscriptionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SubscriptionRow {
    company_id: String,
    plan_id: u32,
    status: String,
    start_date: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SubscriptionRowWithId {
    record_id: String,
    company_id: String,
    plan_id: u32,
    status: String,
    start_date: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DbError> {
    match s {
        "ACTIVE" => Ok(SubscriptionStatus::Active),
        "TRIAL" => Ok(SubscriptionStatus::Trial),
        "CANCELLED" => Ok(SubscriptionStatus::Cancelled),
        other => Err(DbError::decode(
            "subscription",
            format!("unknown subscription status: {other}"),
        )),
    }
}

impl SubscriptionRow {
    fn into_subscription(self, id: Uuid) -> Result<Subscription, DbError> {
        let company_id = Uuid::parse_str(&self.company_id)
            .map_err(|e| DbError::decode("subscription", format!("invalid company UUID: {e}")))?;
        let start_date = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|e| DbError::decode("subscription", format!("invalid start date: {e}")))?;
        Ok(Subscription {
            id,
            company_id,
            plan_id: self.plan_id,
            status: parse_status(&self.status)?,
            start_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SubscriptionRowWithId {
    fn try_into_subscription(self) -> Result<Subscription, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::decode("subscription", format!("invalid UUID: {e}")))?;
        SubscriptionRow {
            company_id: self.company_id,
            plan_id: self.plan_id,
            status: self.status,
            start_date: self.start_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_subscription(id)
    }
}

/// SurrealDB implementation of the Subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn get_by_company(&self, company_id: Uuid) -> NexgenResult<Subscription> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE company_id = $company_id",
            )
            .bind(("company_id", company_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: format!("company={company_id}"),
        })?;

        Ok(row.try_into_subscription()?)
    }

    async fn list(&self) -> NexgenResult<Vec<Subscription>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_subscription())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn change_plan(&self, company_id: Uuid, plan_id: u32) -> NexgenResult<Subscription> {
        let existing = self.get_by_company(company_id).await?;
        let id_str = existing.id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('subscription', $id) SET \
                 plan_id = $plan_id, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("plan_id", plan_id))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("subscription", e))?;

        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: id_str,
        })?;

        Ok(row.into_subscription(existing.id)?)
    }
}
