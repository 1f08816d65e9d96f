//! Credential invitation contract.
//!
//! Delivery (email or otherwise) is an external collaborator. Callers
//! treat it as fire-and-forget: a failed delivery is logged and never
//! rolls back the account that was created.

use serde::{Deserialize, Serialize};

use crate::error::NexgenResult;

/// A freshly issued credential to hand to its holder.
#[derive(Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub recipient: String,
    pub username: String,
    pub temporary_password: String,
}

// Manual impl so temporary passwords never reach the logs.
impl std::fmt::Debug for Invitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invitation")
            .field("recipient", &self.recipient)
            .field("username", &self.username)
            .field("temporary_password", &"<redacted>")
            .finish()
    }
}

pub trait InvitationSender: Send + Sync {
    fn send(&self, invitation: Invitation) -> impl Future<Output = NexgenResult<()>> + Send;
}
