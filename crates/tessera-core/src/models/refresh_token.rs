//! Refresh token domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored refresh token.
///
/// Only the SHA-256 hash of the raw token is persisted; the raw value
/// is returned to the client once and never stored. Revoked rows are
/// kept so that a replayed token can be told apart from a forged one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    /// Hex-encoded SHA-256 of the raw token.
    pub token_hash: String,
    pub expiry_date: DateTime<Utc>,
    pub created_by_ip: Option<String>,
    /// Set exactly once; a revoked token is never un-revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Hash of the token that replaced this one on rotation.
    pub replaced_by_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Usable means not revoked and not past its expiry.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expiry_date > now
    }
}

/// Fields required to store a new refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefreshToken {
    pub user_id: i64,
    pub token_hash: String,
    pub expiry_date: DateTime<Utc>,
    pub created_by_ip: Option<String>,
}
