//! Authentication configuration.

/// Configuration for the authentication layer.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Master key for deriving per-secret encryption keys. Supplied
    /// by the environment, never stored alongside the data it
    /// protects.
    pub master_key: String,
    /// Expected `iss` claim on every token.
    pub jwt_issuer: String,
    /// Expected `aud` claim on every token.
    pub jwt_audience: String,
    /// Access token lifetime in seconds (default: 1 hour).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_token_lifetime_secs: u64,
    /// Optional server-side pepper prepended to passwords before
    /// hashing.
    pub pepper: Option<String>,
    /// Consecutive failed logins that trigger a lockout (default: 5).
    pub max_failed_attempts: u32,
    /// Lockout window in seconds once the threshold is reached
    /// (default: 15 minutes).
    pub lockout_duration_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            master_key: String::new(),
            jwt_issuer: "tessera".into(),
            jwt_audience: "tessera-portal".into(),
            access_token_lifetime_secs: 3600,
            refresh_token_lifetime_secs: 604_800,
            pepper: None,
            max_failed_attempts: 5,
            lockout_duration_secs: 900,
        }
    }
}
