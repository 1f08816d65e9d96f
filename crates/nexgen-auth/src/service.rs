//! Authentication service: owner and tenant login, session validation,
//! and owner invitations.

use nexgen_core::error::{NexgenError, NexgenResult};
use nexgen_core::invitation::{Invitation, InvitationSender};
use nexgen_core::models::company::CompanyStatus;
use nexgen_core::models::owner::{CreateOwner, Owner};
use nexgen_core::models::session::{Principal, Role};
use nexgen_core::repository::{OwnerRepository, TenantAdminRepository, TenantCompanyRepository};
use tracing::{info, warn};

use crate::authorize::require_owner;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful login result.
#[derive(Debug)]
pub struct SessionOutput {
    /// Signed session token to hand back to the client.
    pub token: String,
    /// The principal the token encodes.
    pub principal: Principal,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<O, A, T, I>
where
    O: OwnerRepository,
    A: TenantAdminRepository,
    T: TenantCompanyRepository,
    I: InvitationSender,
{
    owner_repo: O,
    admin_repo: A,
    tenant_repo: T,
    invitations: I,
    config: AuthConfig,
}

impl<O, A, T, I> AuthService<O, A, T, I>
where
    O: OwnerRepository,
    A: TenantAdminRepository,
    T: TenantCompanyRepository,
    I: InvitationSender,
{
    pub fn new(
        owner_repo: O,
        admin_repo: A,
        tenant_repo: T,
        invitations: I,
        config: AuthConfig,
    ) -> Self {
        Self {
            owner_repo,
            admin_repo,
            tenant_repo,
            invitations,
            config,
        }
    }

    /// Authenticate a console owner.
    pub async fn owner_login(
        &self,
        username: &str,
        password: &str,
    ) -> NexgenResult<SessionOutput> {
        let owner = match self.owner_repo.get_by_username(username).await {
            Ok(owner) => owner,
            Err(NexgenError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        self.check_password(password, &owner.password_hash)?;

        let principal = Principal {
            user_id: owner.id,
            role: Role::Owner,
            username: owner.username,
            company_name: None,
            company_code: None,
            expires_at: token::session_expiry(&self.config)?,
        };
        self.open_session(principal)
    }

    /// Authenticate a tenant admin.
    ///
    /// A suspended company locks its admin out before the password is
    /// even checked, so a correct password never gets past suspension.
    pub async fn tenant_login(
        &self,
        username: &str,
        password: &str,
    ) -> NexgenResult<SessionOutput> {
        // 1. Look up the admin account.
        let admin = match self.admin_repo.get_by_username(username).await {
            Ok(admin) => admin,
            Err(NexgenError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        // 2. Join the tenant company mirror.
        let company = match self.tenant_repo.get_by_code(&admin.company_code).await {
            Ok(company) => company,
            Err(NexgenError::NotFound { .. }) => {
                warn!(
                    company_code = %admin.company_code,
                    "Tenant admin has no company mirror"
                );
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        // 3. Suspension lockout.
        if company.status != CompanyStatus::Active {
            return Err(AuthError::CompanySuspended {
                company_code: company.company_code,
            }
            .into());
        }

        // 4. Verify password.
        self.check_password(password, &admin.password_hash)?;

        let principal = Principal {
            user_id: admin.id,
            role: Role::Admin,
            username: admin.username,
            company_name: Some(company.name),
            company_code: Some(company.company_code),
            expires_at: token::session_expiry(&self.config)?,
        };
        self.open_session(principal)
    }

    /// Resolve a session token back into its principal.
    pub fn authenticate(&self, session_token: &str) -> NexgenResult<Principal> {
        Ok(token::validate_session_token(session_token, &self.config)?)
    }

    /// Create another owner account and send its invitation.
    ///
    /// The invitation is fire-and-forget: a delivery failure is logged
    /// and the new account is kept.
    pub async fn add_owner(
        &self,
        principal: &Principal,
        username: &str,
        email: &str,
    ) -> NexgenResult<Owner> {
        require_owner(principal)?;
        self.create_invited_owner(username, email).await
    }

    /// Create the first owner when none exists yet. Returns `None` when
    /// owners are already present.
    pub async fn bootstrap_owner(
        &self,
        username: &str,
        email: &str,
    ) -> NexgenResult<Option<Owner>> {
        if self.owner_repo.count().await? > 0 {
            return Ok(None);
        }
        let owner = self.create_invited_owner(username, email).await?;
        info!(owner_id = %owner.id, "Bootstrapped first owner account");
        Ok(Some(owner))
    }

    pub async fn list_owners(&self, principal: &Principal) -> NexgenResult<Vec<Owner>> {
        require_owner(principal)?;
        self.owner_repo.list().await
    }

    async fn create_invited_owner(&self, username: &str, email: &str) -> NexgenResult<Owner> {
        if username.trim().is_empty() {
            return Err(NexgenError::validation("owner username is required"));
        }
        if !email.contains('@') {
            return Err(NexgenError::validation("owner email is invalid"));
        }

        let temporary_password =
            password::generate_temporary_password(self.config.temporary_password_bytes);
        password::check_password_policy(&temporary_password, self.config.min_password_length)?;

        let owner = self
            .owner_repo
            .create(CreateOwner {
                username: username.to_string(),
                email: email.to_string(),
                password: temporary_password.clone(),
            })
            .await?;

        let invitation = Invitation {
            recipient: owner.email.clone(),
            username: owner.username.clone(),
            temporary_password,
        };
        if let Err(e) = self.invitations.send(invitation).await {
            warn!(owner_id = %owner.id, error = %e, "Owner invitation delivery failed");
        }

        Ok(owner)
    }

    fn check_password(&self, password: &str, hash: &str) -> NexgenResult<()> {
        let valid = password::verify_password(password, hash, self.config.pepper.as_deref())
            .map_err(|e| NexgenError::Crypto(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(())
    }

    fn open_session(&self, principal: Principal) -> NexgenResult<SessionOutput> {
        let token = token::issue_session_token(&principal, &self.config)?;
        Ok(SessionOutput { token, principal })
    }
}
