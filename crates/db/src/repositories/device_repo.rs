//! Repository for the `person_devices` table (push destinations).

use std::collections::HashMap;

use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::{PersonDevice, RegisterDevice};

/// Column list for person_devices queries.
const COLUMNS: &str = "id, person_id, push_token, platform, created_at, updated_at";

/// Provides registration and lookup of push destinations.
pub struct DeviceRepo;

impl DeviceRepo {
    /// List the devices of one person, newest first.
    pub async fn list_for_person(
        pool: &PgPool,
        person_id: DbId,
    ) -> Result<Vec<PersonDevice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM person_devices WHERE person_id = $1 ORDER BY id DESC"
        );
        sqlx::query_as::<_, PersonDevice>(&query)
            .bind(person_id)
            .fetch_all(pool)
            .await
    }

    /// Register a push token for a person.
    ///
    /// A token already registered to someone else moves to `person_id`
    /// (the device changed hands or the user logged in again).
    pub async fn register(
        pool: &PgPool,
        person_id: DbId,
        input: &RegisterDevice,
    ) -> Result<PersonDevice, sqlx::Error> {
        let query = format!(
            "INSERT INTO person_devices (person_id, push_token, platform) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_person_devices_push_token DO UPDATE SET \
                person_id = EXCLUDED.person_id, \
                platform = COALESCE(EXCLUDED.platform, person_devices.platform) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PersonDevice>(&query)
            .bind(person_id)
            .bind(&input.push_token)
            .bind(&input.platform)
            .fetch_one(pool)
            .await
    }

    /// Delete a device owned by `person_id`. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, person_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM person_devices WHERE id = $1 AND person_id = $2")
            .bind(id)
            .bind(person_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete devices by token, e.g. after the gateway reports them unregistered.
    pub async fn delete_tokens(pool: &PgPool, tokens: &[String]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM person_devices WHERE push_token = ANY($1)")
            .bind(tokens)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Push tokens grouped by person for the given persons.
    ///
    /// Persons without devices are absent from the map.
    pub async fn tokens_by_person(
        pool: &PgPool,
        person_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<String>>, sqlx::Error> {
        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT person_id, push_token FROM person_devices \
             WHERE person_id = ANY($1) ORDER BY person_id, id",
        )
        .bind(person_ids)
        .fetch_all(pool)
        .await?;

        let mut map: HashMap<DbId, Vec<String>> = HashMap::new();
        for (person_id, token) in rows {
            map.entry(person_id).or_default().push(token);
        }
        Ok(map)
    }
}
