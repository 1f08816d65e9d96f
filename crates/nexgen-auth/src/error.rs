//! Authentication error types.

use nexgen_core::error::NexgenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("company {company_code} is suspended")]
    CompanySuspended { company_code: String },

    #[error("session has expired")]
    SessionExpired,

    #[error("invalid session token: {0}")]
    TokenInvalid(String),

    #[error("owner role required")]
    OwnerRequired,

    #[error("password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for NexgenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::SessionExpired
            | AuthError::TokenInvalid(_) => NexgenError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::CompanySuspended { company_code } => {
                NexgenError::CompanySuspended { company_code }
            }
            AuthError::OwnerRequired => NexgenError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::WeakPassword { .. } => NexgenError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => NexgenError::Crypto(msg),
        }
    }
}
