//! Error types for the NexGen owner console.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NexgenError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Company {company_code} is suspended")]
    CompanySuspended { company_code: String },

    /// No unused company code could be allocated.
    #[error("Company code already provisioned: {company_code}")]
    AlreadyProvisioned { company_code: String },

    /// The company has never been approved, so it has no tenant projection.
    #[error("Company {company_id} has not been provisioned yet")]
    NotProvisioned { company_id: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NexgenError {
    /// Shorthand for a [`NexgenError::NotFound`] on the given entity.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`NexgenError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type NexgenResult<T> = Result<T, NexgenError>;
