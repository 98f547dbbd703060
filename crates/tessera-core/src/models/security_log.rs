//! Security audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only record of a security-relevant event: login
/// attempts, token refreshes, revocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityLog {
    pub id: i64,
    /// Event type, e.g. `login`, `token_refresh`, `token_revoke`.
    pub event_type: String,
    /// Email the event concerns; kept even for unknown accounts so
    /// that probing shows up in the trail.
    pub email: String,
    pub success: bool,
    pub details: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to append a security log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecurityLog {
    pub event_type: String,
    pub email: String,
    pub success: bool,
    pub details: String,
    pub ip_address: Option<String>,
}
