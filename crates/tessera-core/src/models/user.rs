//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A portal user. Belongs to exactly one tenant; email addresses are
/// unique across the whole system so that a login request can locate
/// the tenant from the email alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tenant_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Argon2id PHC hash. Raw passwords never reach the repository.
    pub password_hash: String,
    pub role_id: i64,
    pub is_active: bool,
    /// Consecutive failed login attempts since the last success.
    pub access_failed_count: u32,
    /// While this lies in the future, the account is locked out.
    pub lockout_end: Option<DateTime<Utc>>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub last_successful_login: Option<DateTime<Utc>>,
    pub last_password_change_date: Option<DateTime<Utc>>,
    /// Opaque value rotated on every successful login; changing it
    /// invalidates anything derived from the previous session.
    pub security_stamp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name for token claims: "First Last", whichever parts
    /// exist, falling back to the email.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Fields required to create a new user.
///
/// `password_hash` must already be hashed by the caller — the
/// repository layer is hashing-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub role_id: i64,
}

/// Fields that can be updated on an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub role_id: Option<i64>,
    /// `Some(Some(v))` sets the lockout end, `Some(None)` clears it.
    pub lockout_end: Option<Option<DateTime<Utc>>>,
}
