//! Repository for the `homes` table.

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::home::{CreateHome, Home};

/// Column list for homes queries.
const COLUMNS: &str = "id, name, address, created_by, created_at, updated_at";

/// Provides CRUD operations and existence checks for homes.
pub struct HomeRepo;

impl HomeRepo {
    /// List all homes, ordered by name ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<Home>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM homes ORDER BY name ASC, id ASC");
        sqlx::query_as::<_, Home>(&query).fetch_all(pool).await
    }

    /// Find a home by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Home>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM homes WHERE id = $1");
        sqlx::query_as::<_, Home>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a home, recording who created it.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateHome,
    ) -> Result<Home, sqlx::Error> {
        let query = format!(
            "INSERT INTO homes (name, address, created_by) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Home>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Return the subset of `ids` with no matching home, ascending.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT t.id FROM UNNEST($1::BIGINT[]) AS t(id) \
             WHERE NOT EXISTS (SELECT 1 FROM homes h WHERE h.id = t.id) \
             ORDER BY t.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
