//! SurrealDB implementation of [`PlanRepository`].
//!
//! Plans are keyed by their small integer id (`plan:1`, `plan:2`, ...),
//! seeded by the registry migration runner.

use nexgen_core::error::NexgenResult;
use nexgen_core::models::plan::Plan;
use nexgen_core::repository::PlanRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PlanRow {
    name: String,
    price: i64,
    meter_limit: i64,
    user_limit: i64,
}

#[derive(Debug, SurrealValue)]
struct PlanRowWithId {
    plan_id: u32,
    name: String,
    price: i64,
    meter_limit: i64,
    user_limit: i64,
}

impl PlanRow {
    fn into_plan(self, id: u32) -> Plan {
        Plan {
            id,
            name: self.name,
            price: self.price,
            meter_limit: self.meter_limit,
            user_limit: self.user_limit,
        }
    }
}

/// SurrealDB implementation of the Plan repository.
#[derive(Clone)]
pub struct SurrealPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlanRepository for SurrealPlanRepository<C> {
    async fn get_by_id(&self, id: u32) -> NexgenResult<Plan> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('plan', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_plan(id))
    }

    async fn list(&self) -> NexgenResult<Vec<Plan>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS plan_id, name, price, \
                 meter_limit, user_limit \
                 FROM plan",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut plans: Vec<Plan> = rows
            .into_iter()
            .map(|row| {
                PlanRow {
                    name: row.name,
                    price: row.price,
                    meter_limit: row.meter_limit,
                    user_limit: row.user_limit,
                }
                .into_plan(row.plan_id)
            })
            .collect();
        plans.sort_by_key(|p| p.id);

        Ok(plans)
    }
}
