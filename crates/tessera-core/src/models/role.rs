//! Role domain model.

use serde::{Deserialize, Serialize};

/// A named role assigned to users. The role name travels in the
/// access token's `role` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Fields required to create a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: String,
}
