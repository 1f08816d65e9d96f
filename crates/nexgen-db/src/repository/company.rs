//! SurrealDB implementation of [`CompanyRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use nexgen_core::error::{NexgenError, NexgenResult};
use nexgen_core::models::company::{
    Company, CompanyIntake, CompanyStatus, CompanyStatusCounts, CreateCompany,
};
use nexgen_core::repository::{CompanyRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CompanyRow {
    company_code: Option<String>,
    name: String,
    email: String,
    status: String,
    industry: String,
    company_size: String,
    admin_name: String,
    admin_mobile: String,
    country: String,
    state: String,
    city: String,
    timezone: String,
    requested_plan: String,
    expected_users: Option<String>,
    expected_meters: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CompanyRowWithId {
    record_id: String,
    company_code: Option<String>,
    name: String,
    email: String,
    status: String,
    industry: String,
    company_size: String,
    admin_name: String,
    admin_mobile: String,
    country: String,
    state: String,
    city: String,
    timezone: String,
    requested_plan: String,
    expected_users: Option<String>,
    expected_meters: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for `GROUP BY status` counts.
#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    total: u64,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

pub(crate) fn parse_status(s: &str) -> Result<CompanyStatus, DbError> {
    match s {
        "PENDING" => Ok(CompanyStatus::Pending),
        "ACTIVE" => Ok(CompanyStatus::Active),
        "SUSPENDED" => Ok(CompanyStatus::Suspended),
        other => Err(DbError::decode(
            "company",
            format!("unknown company status: {other}"),
        )),
    }
}

impl CompanyRow {
    fn into_company(self, id: Uuid) -> Result<Company, DbError> {
        Ok(Company {
            id,
            company_code: self.company_code,
            name: self.name,
            email: self.email,
            status: parse_status(&self.status)?,
            intake: CompanyIntake {
                industry: self.industry,
                company_size: self.company_size,
                admin_name: self.admin_name,
                admin_mobile: self.admin_mobile,
                country: self.country,
                state: self.state,
                city: self.city,
                timezone: self.timezone,
                requested_plan: self.requested_plan,
                expected_users: self.expected_users,
                expected_meters: self.expected_meters,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CompanyRowWithId {
    fn try_into_company(self) -> Result<Company, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::decode("company", format!("invalid UUID: {e}")))?;
        CompanyRow {
            company_code: self.company_code,
            name: self.name,
            email: self.email,
            status: self.status,
            industry: self.industry,
            company_size: self.company_size,
            admin_name: self.admin_name,
            admin_mobile: self.admin_mobile,
            country: self.country,
            state: self.state,
            city: self.city,
            timezone: self.timezone,
            requested_plan: self.requested_plan,
            expected_users: self.expected_users,
            expected_meters: self.expected_meters,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_company(id)
    }
}

fn invalid_activation(before: &Company) -> NexgenError {
    NexgenError::InvalidTransition {
        from: before.status.to_string(),
        to: CompanyStatus::Active.to_string(),
    }
}

/// SurrealDB implementation of the Company repository.
///
/// Operates on the registry store; `activate` also writes the
/// `subscription` table inside the same transaction.
#[derive(Clone)]
pub struct SurrealCompanyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCompanyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn has_subscription(&self, company_id: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM subscription \
                 WHERE company_id = $company_id GROUP ALL",
            )
            .bind(("company_id", company_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}

impl<C: Connection> CompanyRepository for SurrealCompanyRepository<C> {
    async fn create(&self, input: CreateCompany) -> NexgenResult<Company> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let intake = input.intake;

        let result = self
            .db
            .query(
                "CREATE type::record('company', $id) SET \
                 company_code = NONE, \
                 name = $name, email = $email, \
                 status = 'PENDING', \
                 industry = $industry, company_size = $company_size, \
                 admin_name = $admin_name, admin_mobile = $admin_mobile, \
                 country = $country, state = $state, city = $city, \
                 timezone = $timezone, requested_plan = $requested_plan, \
                 expected_users = $expected_users, \
                 expected_meters = $expected_meters",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("industry", intake.industry))
            .bind(("company_size", intake.company_size))
            .bind(("admin_name", intake.admin_name))
            .bind(("admin_mobile", intake.admin_mobile))
            .bind(("country", intake.country))
            .bind(("state", intake.state))
            .bind(("city", intake.city))
            .bind(("timezone", intake.timezone))
            .bind(("requested_plan", intake.requested_plan))
            .bind(("expected_users", intake.expected_users))
            .bind(("expected_meters", intake.expected_meters))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("company", e))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> NexgenResult<Company> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('company', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id)?)
    }

    async fn list(&self, pagination: Pagination) -> NexgenResult<PaginatedResult<Company>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM company GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM company \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_company())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_status(&self, status: CompanyStatus) -> NexgenResult<Vec<Company>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM company WHERE status = $status \
                 ORDER BY created_at ASC",
            )
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_company())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count_by_status(&self) -> NexgenResult<CompanyStatusCounts> {
        let mut result = self
            .db
            .query("SELECT status, count() AS total FROM company GROUP BY status")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;

        let mut counts = CompanyStatusCounts::default();
        for row in rows {
            match parse_status(&row.status)? {
                CompanyStatus::Pending => counts.pending = row.total,
                CompanyStatus::Active => counts.active = row.total,
                CompanyStatus::Suspended => counts.suspended = row.total,
            }
        }
        Ok(counts)
    }

    async fn code_exists(&self, code: &str) -> NexgenResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM company \
                 WHERE company_code = $code GROUP ALL;\
                 SELECT count() AS total FROM type::record('company_code', $code) \
                 GROUP ALL;",
            )
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;
        let assigned: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let claimed: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        Ok(assigned.iter().chain(&claimed).any(|r| r.total > 0))
    }

    async fn activate(
        &self,
        id: Uuid,
        company_code: &str,
        default_plan_id: u32,
        start_date: NaiveDate,
    ) -> NexgenResult<Company> {
        let id_str = id.to_string();
        let before = self.get_by_id(id).await?;
        if before.status == CompanyStatus::Active {
            return Err(invalid_activation(&before));
        }
        let needs_subscription = !self.has_subscription(&id_str).await?;
        let claims_code = before.company_code.as_deref() != Some(company_code);

        // The status guard lives in the UPDATE itself so a concurrent
        // approval cannot overwrite a code that was already assigned.
        let mut statements = vec![
            "BEGIN TRANSACTION;",
            "UPDATE type::record('company', $id) SET \
             status = 'ACTIVE', company_code = $code, \
             updated_at = time::now() \
             WHERE status IN ['PENDING', 'SUSPENDED'];",
        ];
        if claims_code {
            statements.push(
                "CREATE type::record('company_code', $code) SET \
                 company_id = $id;",
            );
        }
        if needs_subscription {
            statements.push(
                "CREATE type::record('subscription', $subscription_id) SET \
                 company_id = $id, plan_id = $plan_id, \
                 status = 'ACTIVE', start_date = $start_date;",
            );
        }
        statements.push("COMMIT TRANSACTION;");

        let committed = match self
            .db
            .query(statements.join("\n"))
            .bind(("id", id_str))
            .bind(("code", company_code.to_string()))
            .bind(("subscription_id", Uuid::new_v4().to_string()))
            .bind(("plan_id", default_plan_id))
            .bind(("start_date", start_date.format("%Y-%m-%d").to_string()))
            .await
        {
            Ok(response) => DbError::check_all("company_code", response).map(drop),
            Err(e) => Err(DbError::from(e)),
        };

        if let Err(err) = committed {
            // A second subscription or claim for this company means another
            // approval committed first.
            let current = self.get_by_id(id).await?;
            let lost_race = current.status == CompanyStatus::Active;
            let duplicate_subscription = matches!(
                &err,
                DbError::Conflict { detail, .. } if detail.contains("subscription")
            );
            if lost_race || duplicate_subscription {
                return Err(invalid_activation(&before));
            }
            return Err(err.into());
        }

        let after = self.get_by_id(id).await?;
        if after.status != CompanyStatus::Active
            || after.company_code.as_deref() != Some(company_code)
        {
            return Err(invalid_activation(&before));
        }

        Ok(after)
    }

    async fn suspend(&self, id: Uuid) -> NexgenResult<Company> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('company', $id) SET \
                 status = 'SUSPENDED', updated_at = time::now() \
                 WHERE status IN ['ACTIVE', 'SUSPENDED']",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("company", e))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_company(id)?),
            None => {
                let current = self.get_by_id(id).await?;
                Err(NexgenError::InvalidTransition {
                    from: current.status.to_string(),
                    to: CompanyStatus::Suspended.to_string(),
                })
            }
        }
    }
}
