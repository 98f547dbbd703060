//! SurrealDB implementation of [`SecretRepository`].
//!
//! Rows hold ciphertext only. Lookups filter out deactivated and
//! expired rows at the query; deletes are soft so old key material
//! stays visible to audits.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::secret::{SaveSecret, Secret};
use tessera_core::repository::SecretRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

#[derive(Debug, SurrealValue)]
struct SecretRow {
    tenant_id: i64,
    user_id: Option<i64>,
    key: String,
    encrypted_value: String,
    is_encrypted: bool,
    description: String,
    expiration_date: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SecretRowWithId {
    record_id: i64,
    tenant_id: i64,
    user_id: Option<i64>,
    key: String,
    encrypted_value: String,
    is_encrypted: bool,
    description: String,
    expiration_date: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SecretRow {
    fn into_secret(self, id: i64) -> Secret {
        Secret {
            id,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            key: self.key,
            encrypted_value: self.encrypted_value,
            is_encrypted: self.is_encrypted,
            description: self.description,
            expiration_date: self.expiration_date,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl SecretRowWithId {
    fn into_secret(self) -> Secret {
        Secret {
            id: self.record_id,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            key: self.key,
            encrypted_value: self.encrypted_value,
            is_encrypted: self.is_encrypted,
            description: self.description,
            expiration_date: self.expiration_date,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row struct carrying only the record ID, for upsert lookups.
#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: i64,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Secret repository.
#[derive(Clone)]
pub struct SurrealSecretRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSecretRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SecretRepository for SurrealSecretRepository<C> {
    async fn get(
        &self,
        key: &str,
        tenant_id: i64,
        user_id: Option<i64>,
    ) -> CoreResult<Option<Secret>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM secret \
                 WHERE tenant_id = $tenant_id AND key = $key \
                 AND user_id = $user_id \
                 AND is_active = true \
                 AND (expiration_date = NONE \
                      OR expiration_date > time::now())",
            )
            .bind(("tenant_id", tenant_id))
            .bind(("key", key.to_string()))
            .bind(("user_id", user_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SecretRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(SecretRowWithId::into_secret))
    }

    async fn save(&self, input: SaveSecret) -> CoreResult<Secret> {
        // Upsert keyed on (tenant_id, key, user_id). A deactivated
        // row is reactivated rather than duplicated, keeping the
        // unique index happy.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM secret \
                 WHERE tenant_id = $tenant_id AND key = $key \
                 AND user_id = $user_id",
            )
            .bind(("tenant_id", input.tenant_id))
            .bind(("key", input.key.clone()))
            .bind(("user_id", input.user_id))
            .await
            .map_err(DbError::from)?;

        let existing: Vec<IdRow> = result.take(0).map_err(DbError::from)?;

        if let Some(row) = existing.first() {
            let id = row.record_id;
            let result = self
                .db
                .query(
                    "UPDATE type::record('secret', $id) SET \
                     encrypted_value = $encrypted_value, \
                     is_encrypted = $is_encrypted, \
                     description = $description, \
                     expiration_date = $expiration_date, \
                     is_active = true, \
                     updated_at = time::now()",
                )
                .bind(("id", id))
                .bind(("encrypted_value", input.encrypted_value))
                .bind(("is_encrypted", input.is_encrypted))
                .bind(("description", input.description))
                .bind(("expiration_date", input.expiration_date))
                .await
                .map_err(DbError::from)?;

            let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

            let rows: Vec<SecretRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "secret".into(),
                id: id.to_string(),
            })?;

            return Ok(row.into_secret(id));
        }

        let id = new_record_id();
        let result = self
            .db
            .query(
                "CREATE type::record('secret', $id) SET \
                 tenant_id = $tenant_id, \
                 user_id = $user_id, \
                 key = $key, \
                 encrypted_value = $encrypted_value, \
                 is_encrypted = $is_encrypted, \
                 description = $description, \
                 expiration_date = $expiration_date, \
                 is_active = true",
            )
            .bind(("id", id))
            .bind(("tenant_id", input.tenant_id))
            .bind(("user_id", input.user_id))
            .bind(("key", input.key))
            .bind(("encrypted_value", input.encrypted_value))
            .bind(("is_encrypted", input.is_encrypted))
            .bind(("description", input.description))
            .bind(("expiration_date", input.expiration_date))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SecretRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "secret".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_secret(id))
    }

    async fn deactivate(&self, key: &str, tenant_id: i64) -> CoreResult<()> {
        self.db
            .query(
                "UPDATE secret SET \
                 is_active = false, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND key = $key \
                 AND user_id = NONE",
            )
            .bind(("tenant_id", tenant_id))
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn exists(&self, key: &str, tenant_id: i64) -> CoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM secret \
                 WHERE tenant_id = $tenant_id AND key = $key \
                 AND user_id = NONE \
                 AND is_active = true \
                 AND (expiration_date = NONE \
                      OR expiration_date > time::now()) \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id))
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }
}
