//! Task people synchronization.
//!
//! [`AssociationSynchronizer`] reconciles the people linked to a task with a
//! client-supplied desired set:
//!
//! 1. validate the shape of the desired set,
//! 2. check the task and every referenced person, role, and home exist,
//! 3. diff against the persisted rows ([`plan_sync`]),
//! 4. apply the plan in one transaction (deletes, updates, inserts),
//! 5. after commit, publish a `task.people_synced` event carrying the push
//!    batch for everyone whose link changed.
//!
//! Nothing is published when the transaction fails. A failure while
//! building notifications is logged and does not affect the committed sync.

use std::collections::BTreeSet;
use std::sync::Arc;

use hearth_core::association::{
    plan_sync, referenced_ids, validate_desired, AssociationChange, AssociationPlan,
    CurrentAssociation, DesiredAssociation, MissingReferences,
};
use hearth_core::error::CoreError;
use hearth_core::notification::{association_batch, PushMessage, EVENT_TASK_PEOPLE_SYNCED};
use hearth_core::types::DbId;
use hearth_db::models::task::Task;
use hearth_db::models::task_person::TaskPerson;
use hearth_db::repositories::{
    DeviceRepo, HomeRepo, PersonRepo, RoleRepo, TaskPersonRepo, TaskRepo,
};
use hearth_db::DbPool;
use hearth_events::{EventBus, PlatformEvent};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Outcome of a sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub task_id: DbId,
    /// Associations after the sync, in insertion order.
    pub people: Vec<TaskPerson>,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Push messages handed to the event bus.
    pub notifications: usize,
}

pub struct AssociationSynchronizer {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl AssociationSynchronizer {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone(), Arc::clone(&state.event_bus))
    }

    /// Converge the people of `task_id` to `desired`.
    ///
    /// `actor_id` is recorded on the published event.
    pub async fn sync_task_people(
        &self,
        task_id: DbId,
        desired: &[DesiredAssociation],
        actor_id: DbId,
    ) -> AppResult<SyncReport> {
        validate_desired(desired)?;

        let task = TaskRepo::find_by_id(&self.pool, task_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Task",
                id: task_id,
            })?;

        self.check_references(desired).await?;

        let current_rows = TaskPersonRepo::list_for_task(&self.pool, task_id).await?;
        let current: Vec<CurrentAssociation> =
            current_rows.iter().map(CurrentAssociation::from).collect();
        let plan = plan_sync(task_id, desired, &current);

        if plan.is_empty() {
            tracing::debug!(task_id, "Task people already in sync");
            return Ok(SyncReport {
                task_id,
                people: current_rows,
                added: 0,
                updated: 0,
                removed: 0,
                notifications: 0,
            });
        }

        let people = TaskPersonRepo::apply_plan(&self.pool, &plan).await.map_err(|e| {
            tracing::error!(
                task_id,
                error = %e,
                writes = plan.write_count(),
                "Task people sync rolled back"
            );
            AppError::Database(e)
        })?;

        tracing::info!(
            task_id,
            actor_id,
            added = plan.to_add.len(),
            updated = plan.to_update.len(),
            removed = plan.to_delete.len(),
            "Task people synced"
        );

        let notifications = self.notify(&task, &plan, actor_id).await;

        Ok(SyncReport {
            task_id,
            people,
            added: plan.to_add.len(),
            updated: plan.to_update.len(),
            removed: plan.to_delete.len(),
            notifications,
        })
    }

    /// Fail with every unknown person, role, and home id at once.
    async fn check_references(&self, desired: &[DesiredAssociation]) -> AppResult<()> {
        if desired.is_empty() {
            return Ok(());
        }
        let ids = referenced_ids(desired);
        let missing = MissingReferences {
            person_ids: PersonRepo::missing_ids(&self.pool, &ids.person_ids).await?,
            role_ids: RoleRepo::missing_ids(&self.pool, &ids.role_ids).await?,
            home_ids: HomeRepo::missing_ids(&self.pool, &ids.home_ids).await?,
        };
        if !missing.is_empty() {
            tracing::debug!(%missing, "Task people sync references unknown ids");
        }
        missing.into_result()?;
        Ok(())
    }

    /// Publish the post-commit event. Returns the number of push messages.
    async fn notify(&self, task: &Task, plan: &AssociationPlan, actor_id: DbId) -> usize {
        let changes = plan.changes();
        let messages = match self.build_batch(task, &changes).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(
                    task_id = task.id,
                    error = %e,
                    "Failed to build sync notifications"
                );
                Vec::new()
            }
        };

        let payload = serde_json::json!({
            "task_id": task.id,
            "changes": changes,
        });
        self.bus.publish(
            PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED)
                .with_source("task", task.id)
                .with_actor(actor_id)
                .with_payload(payload)
                .with_notifications(&messages),
        );
        messages.len()
    }

    async fn build_batch(
        &self,
        task: &Task,
        changes: &[AssociationChange],
    ) -> Result<Vec<PushMessage>, sqlx::Error> {
        let person_ids: Vec<DbId> = changes
            .iter()
            .map(|c| c.person_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let role_ids: Vec<DbId> = changes
            .iter()
            .map(|c| c.role_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let destinations = DeviceRepo::tokens_by_person(&self.pool, &person_ids).await?;
        if destinations.is_empty() {
            return Ok(Vec::new());
        }
        let role_names = RoleRepo::names_by_id(&self.pool, &role_ids).await?;

        Ok(association_batch(
            task.id,
            &task.title,
            changes,
            &destinations,
            &role_names,
        ))
    }
}
