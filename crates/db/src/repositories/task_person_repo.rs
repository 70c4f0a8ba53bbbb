//! Repository for the `task_people` association table.

use hearth_core::association::AssociationPlan;
use hearth_core::types::DbId;
use sqlx::PgPool;

use crate::models::task_person::TaskPerson;

/// Column list for task_people queries.
const COLUMNS: &str = "id, task_id, person_id, home_id, role_id, created_at, updated_at";

/// Provides reads and the transactional plan apply for task people.
pub struct TaskPersonRepo;

impl TaskPersonRepo {
    /// List the associations of a task in insertion order.
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Vec<TaskPerson>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_people WHERE task_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, TaskPerson>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a sync plan in one transaction and return the resulting rows.
    ///
    /// Writes run as deletes, then role updates, then inserts. Any failure
    /// rolls back every write of the plan.
    pub async fn apply_plan(
        pool: &PgPool,
        plan: &AssociationPlan,
    ) -> Result<Vec<TaskPerson>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::apply_plan_inner(&mut tx, plan).await?;

        let query = format!("SELECT {COLUMNS} FROM task_people WHERE task_id = $1 ORDER BY id ASC");
        let rows = sqlx::query_as::<_, TaskPerson>(&query)
            .bind(plan.subject_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            task_id = plan.subject_id,
            writes = plan.write_count(),
            "Task people plan committed"
        );
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Execute the plan's writes within an existing transaction.
    async fn apply_plan_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        plan: &AssociationPlan,
    ) -> Result<(), sqlx::Error> {
        if !plan.to_delete.is_empty() {
            let ids: Vec<DbId> = plan.to_delete.iter().map(|r| r.id).collect();
            sqlx::query("DELETE FROM task_people WHERE task_id = $1 AND id = ANY($2)")
                .bind(plan.subject_id)
                .bind(&ids)
                .execute(&mut **tx)
                .await?;
        }

        for update in &plan.to_update {
            sqlx::query("UPDATE task_people SET role_id = $3 WHERE id = $1 AND task_id = $2")
                .bind(update.id)
                .bind(plan.subject_id)
                .bind(update.role_id)
                .execute(&mut **tx)
                .await?;
        }

        for add in &plan.to_add {
            sqlx::query(
                "INSERT INTO task_people (task_id, person_id, home_id, role_id) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(add.subject_id)
            .bind(add.person_id)
            .bind(add.home_id)
            .bind(add.role_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
