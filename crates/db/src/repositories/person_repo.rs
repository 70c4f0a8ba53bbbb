//! Repository for the `persons` table.

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::person::{CreatePerson, Person};

/// Column list for persons queries.
const COLUMNS: &str = "id, name, email, created_at, updated_at";

/// Provides CRUD operations and existence checks for persons.
pub struct PersonRepo;

impl PersonRepo {
    /// List all persons, ordered by name ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM persons ORDER BY name ASC, id ASC");
        sqlx::query_as::<_, Person>(&query).fetch_all(pool).await
    }

    /// Find a person by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM persons WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new person, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreatePerson) -> Result<Person, sqlx::Error> {
        let query = format!(
            "INSERT INTO persons (name, email) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Return the subset of `ids` with no matching person, ascending.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT t.id FROM UNNEST($1::BIGINT[]) AS t(id) \
             WHERE NOT EXISTS (SELECT 1 FROM persons p WHERE p.id = t.id) \
             ORDER BY t.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
