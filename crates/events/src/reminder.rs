//! Due-task reminder scheduler.
//!
//! [`ReminderScheduler`] runs as a background task. Each tick it loads open
//! tasks due within the reminder window that have not been reminded yet,
//! stamps `reminded_at`, then publishes one `task.reminder` event per task
//! carrying the push batch for everyone linked to it. Nothing is published
//! unless the stamp succeeded, so each deadline is reminded at most once.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hearth_core::notification::{address, reminder_content, PushMessage, EVENT_TASK_REMINDER};
use hearth_core::types::DbId;
use hearth_db::repositories::{DeviceRepo, TaskRepo};
use hearth_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, PlatformEvent};

/// Scheduler tuning.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// How often the scheduler polls.
    pub interval: Duration,
    /// How far ahead of `due_at` a task is reminded.
    pub window: chrono::Duration,
    /// Maximum tasks processed per tick.
    pub batch_size: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            window: chrono::Duration::minutes(30),
            batch_size: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// ReminderScheduler
// ---------------------------------------------------------------------------

pub struct ReminderScheduler {
    pool: DbPool,
    bus: Arc<EventBus>,
    config: ReminderConfig,
}

impl ReminderScheduler {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, config: ReminderConfig) -> Self {
        Self { pool, bus, config }
    }

    /// Run the scheduler loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_due().await {
                        tracing::error!(error = %e, "Failed to process task reminders");
                    }
                }
            }
        }
    }

    /// Publish reminders for every due task. Returns the number of tasks reminded.
    pub async fn process_due(&self) -> Result<usize, sqlx::Error> {
        let due_before = Utc::now() + self.config.window;
        let due = TaskRepo::list_due_for_reminder(&self.pool, due_before, self.config.batch_size)
            .await?;
        if due.is_empty() {
            return Ok(0);
        }

        let people: Vec<DbId> = due
            .iter()
            .flat_map(|t| t.people.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let destinations = DeviceRepo::tokens_by_person(&self.pool, &people).await?;

        let mut events = Vec::new();
        for task in &due {
            let content = reminder_content(task.id, &task.title, task.due_at);
            let recipients: BTreeSet<DbId> = task.people.iter().copied().collect();
            let messages: Vec<PushMessage> = recipients
                .iter()
                .filter_map(|person_id| destinations.get(person_id))
                .flat_map(|tokens| address(&content, tokens))
                .collect();

            if messages.is_empty() {
                tracing::debug!(task_id = task.id, "Due task has no reachable devices");
                continue;
            }

            events.push(
                PlatformEvent::new(EVENT_TASK_REMINDER)
                    .with_source("task", task.id)
                    .with_payload(serde_json::json!({ "due_at": task.due_at }))
                    .with_notifications(&messages),
            );
        }

        // Nothing is published unless the stamp succeeds.
        let ids: Vec<DbId> = due.iter().map(|t| t.id).collect();
        TaskRepo::mark_reminded(&self.pool, &ids).await?;

        let published = events.len();
        for event in events {
            self.bus.publish(event);
        }
        tracing::info!(count = ids.len(), published, "Task reminders published");

        Ok(ids.len())
    }
}
