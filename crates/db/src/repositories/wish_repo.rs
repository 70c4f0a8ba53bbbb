//! Repository for the `wishes` table.

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::wish::{CreateWish, UpdateWish, Wish};

/// Column list for wishes queries.
const COLUMNS: &str = "id, parent_id, person_id, title, description, color, icon, \
    is_system, is_fulfilled, created_at, updated_at";

/// Provides CRUD operations for wishes.
pub struct WishRepo;

impl WishRepo {
    /// System wishes plus those of `person_id`, oldest first.
    pub async fn list_visible(pool: &PgPool, person_id: DbId) -> Result<Vec<Wish>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wishes \
             WHERE is_system OR person_id = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Wish>(&query)
            .bind(person_id)
            .fetch_all(pool)
            .await
    }

    /// Find a wish by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Wish>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wishes WHERE id = $1");
        sqlx::query_as::<_, Wish>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a wish for `person_id`.
    pub async fn create(
        pool: &PgPool,
        person_id: DbId,
        input: &CreateWish,
    ) -> Result<Wish, sqlx::Error> {
        let query = format!(
            "INSERT INTO wishes (parent_id, person_id, title, description, color, icon) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Wish>(&query)
            .bind(input.parent_id)
            .bind(person_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .fetch_one(pool)
            .await
    }

    /// Update a wish by ID, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWish,
    ) -> Result<Option<Wish>, sqlx::Error> {
        let query = format!(
            "UPDATE wishes SET \
                parent_id = CASE WHEN $2 THEN $3::BIGINT ELSE parent_id END, \
                title = COALESCE($4, title), \
                description = COALESCE($5, description), \
                color = COALESCE($6, color), \
                icon = COALESCE($7, icon), \
                is_fulfilled = COALESCE($8, is_fulfilled) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Wish>(&query)
            .bind(id)
            .bind(input.parent_id.is_some())
            .bind(input.parent_id.flatten())
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .bind(input.is_fulfilled)
            .fetch_optional(pool)
            .await
    }

    /// Delete a wish (and its subtree) by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wishes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
