//! SurrealDB implementation of [`RoleRepository`].

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::CoreResult;
use tessera_core::models::role::{CreateRole, Role};
use tessera_core::repository::RoleRepository;

use crate::error::DbError;
use crate::repository::new_record_id;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    description: String,
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: i64,
    name: String,
    description: String,
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> CoreResult<Role> {
        let id = new_record_id();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id.to_string(),
        })?;

        Ok(Role {
            id,
            name: row.name,
            description: row.description,
        })
    }

    async fn get_by_id(&self, id: i64) -> CoreResult<Role> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id.to_string(),
        })?;

        Ok(Role {
            id,
            name: row.name,
            description: row.description,
        })
    }

    async fn get_by_name(&self, name: &str) -> CoreResult<Role> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: format!("name={name}"),
        })?;

        Ok(Role {
            id: row.record_id,
            name: row.name,
            description: row.description,
        })
    }
}
