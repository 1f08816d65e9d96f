//! Role checks on an explicit [`Principal`].

use chrono::Utc;
use nexgen_core::error::NexgenResult;
use nexgen_core::models::session::{Principal, Role};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::session_expiry;

/// Username carried by the process-internal owner principal.
pub const SYSTEM_USERNAME: &str = "system";

/// Allow only unexpired owner principals.
pub fn require_owner(principal: &Principal) -> NexgenResult<()> {
    if principal.is_expired(Utc::now()) {
        return Err(AuthError::SessionExpired.into());
    }
    if principal.role != Role::Owner {
        return Err(AuthError::OwnerRequired.into());
    }
    Ok(())
}

/// Owner principal for work the process starts on its own, such as the
/// startup reconciliation sweep. Never issued as a token.
pub fn system_principal(config: &AuthConfig) -> NexgenResult<Principal> {
    Ok(Principal {
        user_id: Uuid::nil(),
        role: Role::Owner,
        username: SYSTEM_USERNAME.into(),
        company_name: None,
        company_code: None,
        expires_at: session_expiry(config)?,
    })
}
