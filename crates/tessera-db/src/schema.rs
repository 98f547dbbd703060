//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Record IDs are application-generated 63-bit integers. Optional
//! fields use `option<...>` types; timestamps default to
//! `time::now()`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD is_active ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Roles (global scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string DEFAULT '';
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;

-- =======================================================================
-- Users (tenant scope; email unique across the whole system)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE int;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD first_name ON TABLE user TYPE option<string>;
DEFINE FIELD last_name ON TABLE user TYPE option<string>;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role_id ON TABLE user TYPE int;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD access_failed_count ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD lockout_end ON TABLE user TYPE option<datetime>;
DEFINE FIELD last_login_date ON TABLE user TYPE option<datetime>;
DEFINE FIELD last_successful_login ON TABLE user \
    TYPE option<datetime>;
DEFINE FIELD last_password_change_date ON TABLE user \
    TYPE option<datetime>;
DEFINE FIELD security_stamp ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_tenant ON TABLE user COLUMNS tenant_id;

-- =======================================================================
-- Secrets (tenant scope, optionally user scope; ciphertext only)
-- =======================================================================
DEFINE TABLE secret SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE secret TYPE int;
DEFINE FIELD user_id ON TABLE secret TYPE option<int>;
DEFINE FIELD key ON TABLE secret TYPE string;
DEFINE FIELD encrypted_value ON TABLE secret TYPE string;
DEFINE FIELD is_encrypted ON TABLE secret TYPE bool DEFAULT true;
DEFINE FIELD description ON TABLE secret TYPE string DEFAULT '';
DEFINE FIELD expiration_date ON TABLE secret TYPE option<datetime>;
DEFINE FIELD is_active ON TABLE secret TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE secret TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE secret TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_secret_scope ON TABLE secret \
    COLUMNS tenant_id, key, user_id UNIQUE;

-- =======================================================================
-- Refresh tokens (revoked rows are kept for replay detection)
-- =======================================================================
DEFINE TABLE refresh_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE refresh_token TYPE int;
DEFINE FIELD token_hash ON TABLE refresh_token TYPE string;
DEFINE FIELD expiry_date ON TABLE refresh_token TYPE datetime;
DEFINE FIELD created_by_ip ON TABLE refresh_token \
    TYPE option<string>;
DEFINE FIELD revoked_at ON TABLE refresh_token TYPE option<datetime>;
DEFINE FIELD replaced_by_token ON TABLE refresh_token \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE refresh_token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_refresh_user_hash ON TABLE refresh_token \
    COLUMNS user_id, token_hash UNIQUE;

-- =======================================================================
-- Security log (append-only)
-- =======================================================================
DEFINE TABLE security_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD event_type ON TABLE security_log TYPE string;
DEFINE FIELD email ON TABLE security_log TYPE string;
DEFINE FIELD success ON TABLE security_log TYPE bool;
DEFINE FIELD details ON TABLE security_log TYPE string DEFAULT '';
DEFINE FIELD ip_address ON TABLE security_log TYPE option<string>;
DEFINE FIELD created_at ON TABLE security_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_security_log_email ON TABLE security_log \
    COLUMNS email;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
