//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::tenant::{CreateTenant, Tenant};
use tessera_core::repository::TenantRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: i64) -> Tenant {
        Tenant {
            id,
            name: self.name,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> CoreResult<Tenant> {
        let id = new_record_id();

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, is_active = true",
            )
            .bind(("id", id))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }

    async fn get_by_id(&self, id: i64) -> CoreResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> CoreResult<Tenant> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 is_active = $is_active, updated_at = time::now()",
            )
            .bind(("id", id))
            .bind(("is_active", is_active))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        // Hard delete; only the provisioning rollback path uses this.
        self.db
            .query("DELETE type::record('tenant', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
