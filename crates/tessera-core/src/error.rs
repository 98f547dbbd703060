//! Error types shared across all Tessera crates.

use thiserror::Error;

/// Top-level error type for the Tessera workspace.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience result alias used across the workspace.
pub type CoreResult<T> = Result<T, CoreError>;
