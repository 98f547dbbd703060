//! SurrealDB implementation of [`UserRepository`].
//!
//! Login bookkeeping (failed-attempt counter, lockout window,
//! security stamp rotation) runs as single multi-statement queries so
//! concurrent login attempts cannot lose updates.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::user::{CreateUser, UpdateUser, User};
use tessera_core::repository::UserRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

/// DB-side row struct for queries where the record ID is already
/// known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: i64,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    role_id: i64,
    is_active: bool,
    access_failed_count: u32,
    lockout_end: Option<DateTime<Utc>>,
    last_login_date: Option<DateTime<Utc>>,
    last_successful_login: Option<DateTime<Utc>>,
    last_password_change_date: Option<DateTime<Utc>>,
    security_stamp: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: i64,
    tenant_id: i64,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    role_id: i64,
    is_active: bool,
    access_failed_count: u32,
    lockout_end: Option<DateTime<Utc>>,
    last_login_date: Option<DateTime<Utc>>,
    last_successful_login: Option<DateTime<Utc>>,
    last_password_change_date: Option<DateTime<Utc>>,
    security_stamp: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: i64) -> User {
        User {
            id,
            tenant_id: self.tenant_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            role_id: self.role_id,
            is_active: self.is_active,
            access_failed_count: self.access_failed_count,
            lockout_end: self.lockout_end,
            last_login_date: self.last_login_date,
            last_successful_login: self.last_successful_login,
            last_password_change_date: self.last_password_change_date,
            security_stamp: self.security_stamp,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl UserRowWithId {
    fn into_user(self) -> User {
        User {
            id: self.record_id,
            tenant_id: self.tenant_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            role_id: self.role_id,
            is_active: self.is_active,
            access_failed_count: self.access_failed_count,
            lockout_end: self.lockout_end,
            last_login_date: self.last_login_date,
            last_successful_login: self.last_successful_login,
            last_password_change_date: self.last_password_change_date,
            security_stamp: self.security_stamp,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the User repository.
///
/// Hashing-agnostic: `CreateUser.password_hash` arrives pre-hashed
/// from the auth layer.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> CoreResult<User> {
        let id = new_record_id();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, \
                 email = $email, \
                 first_name = $first_name, last_name = $last_name, \
                 password_hash = $password_hash, \
                 role_id = $role_id, \
                 is_active = true, \
                 access_failed_count = 0, \
                 lockout_end = NONE, \
                 last_login_date = NONE, \
                 last_successful_login = NONE, \
                 last_password_change_date = NONE, \
                 security_stamp = NONE",
            )
            .bind(("id", id))
            .bind(("tenant_id", input.tenant_id))
            .bind(("email", input.email))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("password_hash", input.password_hash))
            .bind(("role_id", input.role_id))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_id(&self, tenant_id: i64, id: i64) -> CoreResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('user', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id))
            .bind(("tenant_id", tenant_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.into_user())
    }

    async fn email_exists(&self, email: &str) -> CoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE email = $email GROUP ALL",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update(&self, tenant_id: i64, id: i64, input: UpdateUser) -> CoreResult<User> {
        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.role_id.is_some() {
            sets.push("role_id = $role_id");
        }
        if input.lockout_end.is_some() {
            sets.push("lockout_end = $lockout_end");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id))
            .bind(("tenant_id", tenant_id));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(role_id) = input.role_id {
            builder = builder.bind(("role_id", role_id));
        }
        if let Some(lockout_end) = input.lockout_end {
            // lockout_end is Option<Option<..>>: Some(Some(v)) = set,
            // Some(None) = clear.
            builder = builder.bind(("lockout_end", lockout_end));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn record_failed_login(
        &self,
        tenant_id: i64,
        id: i64,
        max_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> CoreResult<User> {
        // One multi-statement query: increment, conditionally arm the
        // lockout, read back. SurrealDB runs the statements
        // sequentially on the record, so concurrent failures cannot
        // lose increments or skip the threshold.
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 access_failed_count += 1, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id; \
                 UPDATE type::record('user', $id) SET \
                 lockout_end = $lock_until \
                 WHERE tenant_id = $tenant_id \
                 AND access_failed_count >= $max_attempts; \
                 SELECT * FROM type::record('user', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id))
            .bind(("tenant_id", tenant_id))
            .bind(("lock_until", lock_until))
            .bind(("max_attempts", max_attempts as i64))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn record_successful_login(
        &self,
        tenant_id: i64,
        id: i64,
        security_stamp: &str,
    ) -> CoreResult<User> {
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 access_failed_count = 0, \
                 lockout_end = NONE, \
                 last_login_date = time::now(), \
                 last_successful_login = time::now(), \
                 security_stamp = $security_stamp, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id))
            .bind(("tenant_id", tenant_id))
            .bind(("security_stamp", security_stamp.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }
}
