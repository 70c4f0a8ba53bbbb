//! Task model.

use hearth_core::tree::TreeItem;
use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub home_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_system: bool,
    pub is_done: bool,
    pub due_at: Option<Timestamp>,
    pub reminded_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A task row with the ids of everyone linked to it (creator and assignees).
#[derive(Debug, Clone, FromRow)]
pub struct TaskTreeRow {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_system: bool,
    pub people: Vec<DbId>,
}

impl From<TaskTreeRow> for TreeItem {
    fn from(t: TaskTreeRow) -> Self {
        TreeItem {
            id: t.id,
            parent_id: t.parent_id,
            name: t.title,
            description: t.description,
            color: t.color,
            icon: t.icon,
            is_system: t.is_system,
            people: t.people,
        }
    }
}

/// An open task whose reminder is due.
#[derive(Debug, Clone, FromRow)]
pub struct DueTask {
    pub id: DbId,
    pub title: String,
    pub due_at: Timestamp,
    /// Creator and assignees.
    pub people: Vec<DbId>,
}

/// DTO for creating a task.
#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub parent_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub home_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub due_at: Option<Timestamp>,
}

/// DTO for updating a task. `parent_id` and `due_at` accept `null` to clear.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub parent_id: Option<Option<DbId>>,
    pub category_id: Option<DbId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_done: Option<bool>,
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub due_at: Option<Option<Timestamp>>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub home_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub is_done: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
