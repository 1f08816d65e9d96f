//! NexGen Auth: password verification, temporary credentials, signed
//! session tokens, owner/tenant login and owner invitations.

pub mod authorize;
pub mod config;
pub mod error;
pub mod invitation;
pub mod password;
pub mod service;
pub mod token;

pub use authorize::{require_owner, system_principal};
pub use config::AuthConfig;
pub use error::AuthError;
pub use invitation::TracingInvitationSender;
pub use service::{AuthService, SessionOutput};
pub use token::SessionClaims;
