//! Stored secret domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An encrypted secret scoped to a tenant, optionally to a single
/// user within it.
///
/// The `encrypted_value` field holds ciphertext; decryption happens
/// in the auth crate's secret service, never in the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: i64,
    pub tenant_id: i64,
    /// `None` for tenant-wide secrets.
    pub user_id: Option<i64>,
    /// Logical name, e.g. `JWT_SECRET`.
    pub key: String,
    pub encrypted_value: String,
    /// Legacy rows may carry plaintext; new writes always encrypt.
    pub is_encrypted: bool,
    pub description: String,
    /// Expired secrets are treated as absent by lookups.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Soft-delete flag; deactivated rows are kept for audit.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input for a secret, keyed on `(tenant_id, key, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSecret {
    pub tenant_id: i64,
    pub user_id: Option<i64>,
    pub key: String,
    pub encrypted_value: String,
    pub is_encrypted: bool,
    pub description: String,
    pub expiration_date: Option<DateTime<Utc>>,
}
