//! SurrealDB implementation of [`SecurityLogRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::security_log::{CreateSecurityLog, SecurityLog};
use tessera_core::repository::SecurityLogRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

#[derive(Debug, SurrealValue)]
struct SecurityLogRow {
    event_type: String,
    email: String,
    success: bool,
    details: String,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SecurityLogRowWithId {
    record_id: i64,
    event_type: String,
    email: String,
    success: bool,
    details: String,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

impl SecurityLogRowWithId {
    fn into_log(self) -> SecurityLog {
        SecurityLog {
            id: self.record_id,
            event_type: self.event_type,
            email: self.email,
            success: self.success,
            details: self.details,
            ip_address: self.ip_address,
            created_at: self.created_at,
        }
    }
}

/// SurrealDB implementation of the SecurityLog repository.
/// Append-only by schema permission; there are no update or delete
/// methods.
#[derive(Clone)]
pub struct SurrealSecurityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSecurityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SecurityLogRepository for SurrealSecurityLogRepository<C> {
    async fn append(&self, input: CreateSecurityLog) -> CoreResult<SecurityLog> {
        let id = new_record_id();

        let result = self
            .db
            .query(
                "CREATE type::record('security_log', $id) SET \
                 event_type = $event_type, \
                 email = $email, \
                 success = $success, \
                 details = $details, \
                 ip_address = $ip_address",
            )
            .bind(("id", id))
            .bind(("event_type", input.event_type))
            .bind(("email", input.email))
            .bind(("success", input.success))
            .bind(("details", input.details))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SecurityLogRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "security_log".into(),
            id: id.to_string(),
        })?;

        Ok(SecurityLog {
            id,
            event_type: row.event_type,
            email: row.email,
            success: row.success,
            details: row.details,
            ip_address: row.ip_address,
            created_at: row.created_at,
        })
    }

    async fn list_by_email(&self, email: &str) -> CoreResult<Vec<SecurityLog>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM security_log \
                 WHERE email = $email ORDER BY created_at ASC",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SecurityLogRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(SecurityLogRowWithId::into_log).collect())
    }
}
