//! Repository for the `tasks` table.

use hearth_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::task::{CreateTask, DueTask, Task, TaskListParams, TaskTreeRow, UpdateTask};

/// Column list for tasks queries, qualified with the `t` alias.
const COLUMNS: &str = "t.id, t.parent_id, t.category_id, t.home_id, t.title, t.description, \
    t.color, t.icon, t.is_system, t.is_done, t.due_at, t.reminded_at, t.created_by, \
    t.created_at, t.updated_at";

/// Creator plus assignees of task `t`, as `BIGINT[]`.
const PEOPLE: &str = "ARRAY_REMOVE(\
    ARRAY(SELECT tp.person_id FROM task_people tp WHERE tp.task_id = t.id ORDER BY tp.id) \
    || t.created_by, NULL)";

/// Predicate: task `t` is visible to person `$1`.
const VISIBLE_TO_PERSON: &str = "(t.is_system OR t.created_by = $1 OR EXISTS (\
    SELECT 1 FROM task_people tp WHERE tp.task_id = t.id AND tp.person_id = $1))";

/// Default page size for task listings.
const DEFAULT_LIMIT: i64 = 100;

/// Maximum page size for task listings.
const MAX_LIMIT: i64 = 500;

/// Provides CRUD, tree, and reminder queries for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// List tasks visible to `person_id`, soonest due first.
    pub async fn list_visible(
        pool: &PgPool,
        person_id: DbId,
        params: &TaskListParams,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE {VISIBLE_TO_PERSON} \
               AND ($2::BIGINT IS NULL OR t.home_id = $2) \
               AND ($3::BIGINT IS NULL OR t.category_id = $3) \
               AND ($4::BOOLEAN IS NULL OR t.is_done = $4) \
             ORDER BY t.due_at ASC NULLS LAST, t.id ASC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(person_id)
            .bind(params.home_id)
            .bind(params.category_id)
            .bind(params.is_done)
            .bind(params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
            .bind(params.offset.unwrap_or(0).max(0))
            .fetch_all(pool)
            .await
    }

    /// Find a task by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t WHERE t.id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `person_id` created task `id` or is linked to it.
    pub async fn is_member(pool: &PgPool, id: DbId, person_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tasks t WHERE t.id = $2 AND (t.created_by = $1 \
             OR EXISTS (SELECT 1 FROM task_people tp WHERE tp.task_id = t.id AND tp.person_id = $1)))",
        )
        .bind(person_id)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Create a task, returning the created row.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks AS t \
                (parent_id, category_id, home_id, title, description, color, icon, due_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.parent_id)
            .bind(input.category_id)
            .bind(input.home_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .bind(input.due_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Update a task by ID, returning the updated row.
    ///
    /// Changing `due_at` clears `reminded_at` so the new deadline is reminded.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks AS t SET \
                parent_id = CASE WHEN $2 THEN $3::BIGINT ELSE t.parent_id END, \
                category_id = COALESCE($4, t.category_id), \
                title = COALESCE($5, t.title), \
                description = COALESCE($6, t.description), \
                color = COALESCE($7, t.color), \
                icon = COALESCE($8, t.icon), \
                is_done = COALESCE($9, t.is_done), \
                due_at = CASE WHEN $10 THEN $11::TIMESTAMPTZ ELSE t.due_at END, \
                reminded_at = CASE WHEN $10 THEN NULL ELSE t.reminded_at END \
             WHERE t.id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(input.parent_id.is_some())
            .bind(input.parent_id.flatten())
            .bind(input.category_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.color)
            .bind(&input.icon)
            .bind(input.is_done)
            .bind(input.due_at.is_some())
            .bind(input.due_at.flatten())
            .fetch_optional(pool)
            .await
    }

    /// Delete a task (and its subtree) by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows for the task tree of `person_id`.
    ///
    /// With a `home_id` every task of that home is loaded (plus system
    /// tasks) so the materializer can evaluate visibility per node.
    /// Without one, only tasks visible to the person are loaded.
    pub async fn list_tree_rows(
        pool: &PgPool,
        person_id: DbId,
        home_id: Option<DbId>,
    ) -> Result<Vec<TaskTreeRow>, sqlx::Error> {
        let filter = match home_id {
            Some(_) => "(t.is_system OR t.home_id = $2)",
            None => VISIBLE_TO_PERSON,
        };
        let query = format!(
            "SELECT t.id, t.parent_id, t.title, t.description, t.color, t.icon, t.is_system, \
                {PEOPLE} AS people \
             FROM tasks t \
             WHERE {filter} \
             ORDER BY t.id ASC"
        );
        sqlx::query_as::<_, TaskTreeRow>(&query)
            .bind(person_id)
            .bind(home_id)
            .fetch_all(pool)
            .await
    }

    /// Open tasks due at or before `due_before` that have not been reminded.
    pub async fn list_due_for_reminder(
        pool: &PgPool,
        due_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<DueTask>, sqlx::Error> {
        let query = format!(
            "SELECT t.id, t.title, t.due_at, {PEOPLE} AS people \
             FROM tasks t \
             WHERE NOT t.is_done AND t.reminded_at IS NULL \
               AND t.due_at IS NOT NULL AND t.due_at <= $1 \
             ORDER BY t.due_at ASC, t.id ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, DueTask>(&query)
            .bind(due_before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Stamp `reminded_at` on the given tasks.
    pub async fn mark_reminded(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET reminded_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
