//! Repository for the `categories` table.

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, CreateCategory, UpdateCategory};

/// Column list for categories queries.
const COLUMNS: &str = "id, parent_id, name, description, color, icon, is_system, \
    owner_person_id, sort_order, created_at, updated_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// System categories plus those owned by `person_id`, in display order.
    pub async fn list_visible(
        pool: &PgPool,
        person_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories \
             WHERE is_system OR owner_person_id = $1 \
             ORDER BY sort_order ASC, name ASC, id ASC"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(person_id)
            .fetch_all(pool)
            .await
    }

    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a user category owned by `owner_person_id`.
    pub async fn create(
        pool: &PgPool,
        owner_person_id: DbId,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories \
                (parent_id, name, description, color, icon, sort_order, owner_person_id) \
             VALUES ($1, $2, $3, COALESCE($4, '#888888'), $5, COALESCE($6, 0), $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(input.parent_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .bind(input.sort_order)
            .bind(owner_person_id)
            .fetch_one(pool)
            .await
    }

    /// Update a category by ID, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET \
                parent_id = CASE WHEN $2 THEN $3::BIGINT ELSE parent_id END, \
                name = COALESCE($4, name), \
                description = COALESCE($5, description), \
                color = COALESCE($6, color), \
                icon = COALESCE($7, icon), \
                sort_order = COALESCE($8, sort_order) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(input.parent_id.is_some())
            .bind(input.parent_id.flatten())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category (and its subtree) by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
