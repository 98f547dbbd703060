//! SurrealDB implementation of [`RefreshTokenRepository`].
//!
//! Tokens are never hard-deleted: a revoked row is the evidence that
//! distinguishes a replayed token from a forged one.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use tessera_core::repository::RefreshTokenRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

#[derive(Debug, SurrealValue)]
struct RefreshTokenRow {
    user_id: i64,
    token_hash: String,
    expiry_date: DateTime<Utc>,
    created_by_ip: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by_token: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RefreshTokenRowWithId {
    record_id: i64,
    user_id: i64,
    token_hash: String,
    expiry_date: DateTime<Utc>,
    created_by_ip: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_token(self, id: i64) -> RefreshToken {
        RefreshToken {
            id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            expiry_date: self.expiry_date,
            created_by_ip: self.created_by_ip,
            revoked_at: self.revoked_at,
            replaced_by_token: self.replaced_by_token,
            created_at: self.created_at,
        }
    }
}

impl RefreshTokenRowWithId {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: self.record_id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            expiry_date: self.expiry_date,
            created_by_ip: self.created_by_ip,
            revoked_at: self.revoked_at,
            replaced_by_token: self.replaced_by_token,
            created_at: self.created_at,
        }
    }
}

/// SurrealDB implementation of the RefreshToken repository.
#[derive(Clone)]
pub struct SurrealRefreshTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRefreshTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RefreshTokenRepository for SurrealRefreshTokenRepository<C> {
    async fn create(&self, input: CreateRefreshToken) -> CoreResult<RefreshToken> {
        let id = new_record_id();

        let result = self
            .db
            .query(
                "CREATE type::record('refresh_token', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 expiry_date = $expiry_date, \
                 created_by_ip = $created_by_ip, \
                 revoked_at = NONE, \
                 replaced_by_token = NONE",
            )
            .bind(("id", id))
            .bind(("user_id", input.user_id))
            .bind(("token_hash", input.token_hash))
            .bind(("expiry_date", input.expiry_date))
            .bind(("created_by_ip", input.created_by_ip))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "refresh_token".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_token(id))
    }

    async fn get_by_user_and_hash(
        &self,
        user_id: i64,
        token_hash: &str,
    ) -> CoreResult<Option<RefreshToken>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM refresh_token \
                 WHERE user_id = $user_id AND token_hash = $token_hash",
            )
            .bind(("user_id", user_id))
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(RefreshTokenRowWithId::into_token))
    }

    async fn revoke_replacing(
        &self,
        user_id: i64,
        token_hash: &str,
        replaced_by: &str,
    ) -> CoreResult<bool> {
        // The `revoked_at = NONE` guard makes the revoke conditional:
        // of two concurrent rotations, exactly one matches a row.
        let result = self
            .db
            .query(
                "UPDATE refresh_token SET \
                 revoked_at = time::now(), \
                 replaced_by_token = $replaced_by \
                 WHERE user_id = $user_id \
                 AND token_hash = $token_hash \
                 AND revoked_at = NONE",
            )
            .bind(("user_id", user_id))
            .bind(("token_hash", token_hash.to_string()))
            .bind(("replaced_by", replaced_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn revoke_all_active_for_user(&self, user_id: i64) -> CoreResult<u64> {
        let result = self
            .db
            .query(
                "UPDATE refresh_token SET revoked_at = time::now() \
                 WHERE user_id = $user_id AND revoked_at = NONE",
            )
            .bind(("user_id", user_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RefreshTokenRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
