//! Wish model.

use hearth_core::tree::TreeItem;
use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `wishes` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Wish {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_system: bool,
    pub is_fulfilled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Wish> for TreeItem {
    fn from(w: Wish) -> Self {
        TreeItem {
            id: w.id,
            parent_id: w.parent_id,
            name: w.title,
            description: w.description,
            color: w.color,
            icon: w.icon,
            is_system: w.is_system,
            people: w.person_id.into_iter().collect(),
        }
    }
}

/// DTO for creating a wish owned by the caller.
#[derive(Debug, Deserialize)]
pub struct CreateWish {
    pub parent_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// DTO for updating a wish. `parent_id: null` moves it to the root.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWish {
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub parent_id: Option<Option<DbId>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_fulfilled: Option<bool>,
}
