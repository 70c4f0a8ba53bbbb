//! Category model.
//!
//! Categories form a tree through `parent_id`. System categories are shared
//! with every person and translated; user categories belong to their owner.

use hearth_core::tree::TreeItem;
use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub is_system: bool,
    pub owner_person_id: Option<DbId>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Category> for TreeItem {
    fn from(c: Category) -> Self {
        TreeItem {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            description: c.description,
            color: Some(c.color),
            icon: c.icon,
            is_system: c.is_system,
            people: c.owner_person_id.into_iter().collect(),
        }
    }
}

/// DTO for creating a user category.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i32>,
}

/// DTO for updating a category. `parent_id: null` moves it to the root.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategory {
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub parent_id: Option<Option<DbId>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i32>,
}
