//! Database-specific error types and conversions.

use nexgen_core::error::NexgenError;
use surrealdb::IndexedResults;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated on {entity}: {detail}")]
    Conflict { entity: String, detail: String },

    #[error("Corrupt row in {entity}: {detail}")]
    Decode { entity: String, detail: String },

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify an error raised by `IndexedResults::check()`.
    ///
    /// SurrealDB reports unique index violations as "... already
    /// contains ..." and duplicate record ids as "... already exists";
    /// both become [`DbError::Conflict`].
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        if is_conflict(&detail) {
            DbError::Conflict {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }

    /// Check a multi-statement response, typically a transaction.
    ///
    /// When one statement inside `BEGIN ... COMMIT` fails, every other
    /// statement reports "not executed due to a failed transaction". The
    /// statement that actually failed can sit anywhere in the batch, so
    /// all errors are inspected: a unique violation wins, then the first
    /// error that is not the rollback notice.
    pub(crate) fn check_all(
        entity: &str,
        mut response: IndexedResults,
    ) -> Result<IndexedResults, DbError> {
        let mut errors: Vec<(usize, String)> = response
            .take_errors()
            .into_iter()
            .map(|(index, err)| (index, err.to_string()))
            .collect();
        if errors.is_empty() {
            return Ok(response);
        }
        errors.sort_by_key(|(index, _)| *index);

        if let Some((_, detail)) = errors.iter().find(|(_, d)| is_conflict(d)) {
            return Err(DbError::Conflict {
                entity: entity.into(),
                detail: detail.clone(),
            });
        }

        let cause = errors
            .iter()
            .position(|(_, d)| !is_rollback_notice(d))
            .unwrap_or(0);
        Err(DbError::Query(errors.swap_remove(cause).1))
    }

    pub(crate) fn decode(entity: &str, detail: impl std::fmt::Display) -> Self {
        DbError::Decode {
            entity: entity.into(),
            detail: detail.to_string(),
        }
    }
}

fn is_conflict(detail: &str) -> bool {
    detail.contains("already contains") || detail.contains("already exists")
}

fn is_rollback_notice(detail: &str) -> bool {
    detail.contains("failed transaction")
}

impl From<DbError> for NexgenError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => NexgenError::NotFound { entity, id },
            DbError::Conflict { entity, .. } => NexgenError::AlreadyExists { entity },
            DbError::Hash(msg) => NexgenError::Crypto(msg),
            other => NexgenError::Database(other.to_string()),
        }
    }
}
