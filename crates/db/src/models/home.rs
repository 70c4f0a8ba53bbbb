//! Home model.

use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `homes` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Home {
    pub id: DbId,
    pub name: String,
    pub address: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a home.
#[derive(Debug, Deserialize)]
pub struct CreateHome {
    pub name: String,
    pub address: Option<String>,
}
