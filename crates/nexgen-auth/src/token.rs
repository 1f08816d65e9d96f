//! Signed session tokens (HS256 JWT).
//!
//! A session token is the serialized form of a [`Principal`]. The
//! signing secret comes from configuration; expiry is carried in the
//! `exp` claim and enforced on every validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use nexgen_core::models::session::{Principal, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AuthConfig, MIN_SESSION_SECRET_LEN};
use crate::error::AuthError;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: owner or tenant admin ID (UUID string).
    pub sub: String,
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_code: Option<String>,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

fn secret(config: &AuthConfig) -> Result<&[u8], AuthError> {
    let secret = config.session_secret.as_bytes();
    if secret.len() < MIN_SESSION_SECRET_LEN {
        return Err(AuthError::Crypto(format!(
            "session secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
        )));
    }
    Ok(secret)
}

/// Expiry for a session starting now, truncated to whole seconds so it
/// survives the round trip through the `exp` claim.
pub fn session_expiry(config: &AuthConfig) -> Result<DateTime<Utc>, AuthError> {
    let exp = Utc::now().timestamp() + config.session_lifetime_secs as i64;
    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::Crypto("session expiry out of range".into()))
}

/// Issue a signed session token for `principal`.
pub fn issue_session_token(
    principal: &Principal,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let claims = SessionClaims {
        sub: principal.user_id.to_string(),
        role: principal.role,
        username: principal.username.clone(),
        company_name: principal.company_name.clone(),
        company_code: principal.company_code.clone(),
        iss: config.session_issuer.clone(),
        iat: Utc::now().timestamp(),
        exp: principal.expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(secret(config)?);
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verify a session token's signature, issuer and expiry, and rebuild
/// the [`Principal`] it carries.
pub fn validate_session_token(token: &str, config: &AuthConfig) -> Result<Principal, AuthError> {
    let key = DecodingKey::from_secret(secret(config)?);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.session_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
    validation.leeway = 0;

    let claims = jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::SessionExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AuthError::TokenInvalid("bad expiry".into()))?;

    Ok(Principal {
        user_id,
        role: claims.role,
        username: claims.username,
        company_name: claims.company_name,
        company_code: claims.company_code,
        expires_at,
    })
}
