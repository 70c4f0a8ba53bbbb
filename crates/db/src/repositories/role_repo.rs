//! Repository for the `roles` lookup table.

use std::collections::HashMap;

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::Role;

/// Read access to the seeded roles.
pub struct RoleRepo;

impl RoleRepo {
    /// List all roles, ordered by ID.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Find a role by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Display names for the given role ids. Unknown ids are absent.
    pub async fn names_by_id(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, String>, sqlx::Error> {
        let rows: Vec<(DbId, String)> =
            sqlx::query_as("SELECT id, name FROM roles WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    /// Return the subset of `ids` with no matching role, ascending.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT t.id FROM UNNEST($1::BIGINT[]) AS t(id) \
             WHERE NOT EXISTS (SELECT 1 FROM roles r WHERE r.id = t.id) \
             ORDER BY t.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
