//! Log-only [`InvitationSender`].
//!
//! Stands in for a real delivery transport: records that an invitation
//! was issued without ever writing the temporary password to the logs.

use nexgen_core::error::NexgenResult;
use nexgen_core::invitation::{Invitation, InvitationSender};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct TracingInvitationSender;

impl InvitationSender for TracingInvitationSender {
    async fn send(&self, invitation: Invitation) -> NexgenResult<()> {
        info!(
            recipient = %invitation.recipient,
            username = %invitation.username,
            "Invitation issued (no delivery transport configured)"
        );
        Ok(())
    }
}
