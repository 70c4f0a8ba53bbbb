//! Task people association model.

use hearth_core::association::CurrentAssociation;
use hearth_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `task_people` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TaskPerson {
    pub id: DbId,
    pub task_id: DbId,
    pub person_id: DbId,
    pub home_id: DbId,
    pub role_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&TaskPerson> for CurrentAssociation {
    fn from(row: &TaskPerson) -> Self {
        CurrentAssociation {
            id: row.id,
            person_id: row.person_id,
            home_id: row.home_id,
            role_id: row.role_id,
        }
    }
}
