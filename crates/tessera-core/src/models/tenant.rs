//! Tenant domain model.
//!
//! Tenants provide full data isolation. Every user, secret, and
//! signing key in the system is scoped to exactly one tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant is an isolated customer organization.
///
/// Each tenant owns its users and, critically, its own JWT signing
/// secret — a token minted for one tenant can never validate against
/// another tenant's key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    /// Human-readable name, embedded in token claims.
    pub name: String,
    /// Inactive tenants cannot log in, and their users' tokens are
    /// rejected by the auth layer.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
}
