//! Authentication configuration.

/// Minimum accepted length of the session signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens (HS256). Supplied by
    /// configuration; must be at least [`MIN_SESSION_SECRET_LEN`] bytes.
    pub session_secret: String,
    /// Session lifetime in seconds (default: 28_800 = 8 hours).
    pub session_lifetime_secs: u64,
    /// Session token issuer (`iss` claim).
    pub session_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Random bytes behind each generated temporary password.
    pub temporary_password_bytes: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            session_lifetime_secs: 28_800,
            session_issuer: "nexgen".into(),
            pepper: None,
            min_password_length: 12,
            temporary_password_bytes: 18,
        }
    }
}
