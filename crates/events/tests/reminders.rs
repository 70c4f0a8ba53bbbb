//! Integration tests for the reminder scheduler.

use std::sync::Arc;

use chrono::{Duration, Utc};
use hearth_core::notification::EVENT_TASK_REMINDER;
use hearth_db::models::device::RegisterDevice;
use hearth_db::models::person::CreatePerson;
use hearth_db::models::task::CreateTask;
use hearth_db::repositories::{DeviceRepo, PersonRepo, TaskRepo};
use hearth_events::{EventBus, ReminderConfig, ReminderScheduler};
use sqlx::PgPool;

async fn person_with_device(pool: &PgPool, name: &str, token: &str) -> i64 {
    let person = PersonRepo::create(
        pool,
        &CreatePerson {
            name: name.to_string(),
            email: None,
        },
    )
    .await
    .unwrap();
    DeviceRepo::register(
        pool,
        person.id,
        &RegisterDevice {
            push_token: token.to_string(),
            platform: None,
        },
    )
    .await
    .unwrap();
    person.id
}

fn due_task(title: &str, minutes: i64) -> CreateTask {
    CreateTask {
        parent_id: None,
        category_id: None,
        home_id: None,
        title: title.to_string(),
        description: None,
        color: None,
        icon: None,
        due_at: Some(Utc::now() + Duration::minutes(minutes)),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_due_tasks_are_reminded_once(pool: PgPool) {
    let ana = person_with_device(&pool, "Ana", "tok-ana").await;
    let soon = TaskRepo::create(&pool, ana, &due_task("Bins", 5)).await.unwrap();
    TaskRepo::create(&pool, ana, &due_task("Taxes", 600)).await.unwrap();

    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let scheduler = ReminderScheduler::new(pool.clone(), bus.clone(), ReminderConfig::default());

    assert_eq!(scheduler.process_due().await.unwrap(), 1);

    let event = rx.try_recv().expect("a reminder event");
    assert_eq!(event.event_type, EVENT_TASK_REMINDER);
    assert_eq!(event.source_entity_id, Some(soon.id));
    let batch = event.notifications().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].to, "tok-ana");
    assert!(rx.try_recv().is_err());

    // Second pass finds nothing.
    assert_eq!(scheduler.process_due().await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tasks_without_devices_are_still_stamped(pool: PgPool) {
    let ana = PersonRepo::create(
        &pool,
        &CreatePerson {
            name: "Ana".to_string(),
            email: None,
        },
    )
    .await
    .unwrap();
    TaskRepo::create(&pool, ana.id, &due_task("Bins", 5)).await.unwrap();

    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let scheduler = ReminderScheduler::new(pool.clone(), bus, ReminderConfig::default());

    assert_eq!(scheduler.process_due().await.unwrap(), 1);
    assert!(rx.try_recv().is_err());
    assert_eq!(scheduler.process_due().await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_stamp_publishes_nothing(pool: PgPool) {
    let ana = person_with_device(&pool, "Ana", "tok-ana").await;
    TaskRepo::create(&pool, ana, &due_task("Bins", 5)).await.unwrap();

    sqlx::query(
        "CREATE FUNCTION refuse_task_update() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'tasks are read-only'; END $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER refuse_task_update BEFORE UPDATE ON tasks \
         FOR EACH ROW EXECUTE FUNCTION refuse_task_update()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let scheduler = ReminderScheduler::new(pool.clone(), bus.clone(), ReminderConfig::default());

    assert!(scheduler.process_due().await.is_err());
    assert!(rx.try_recv().is_err(), "nothing published without a stamp");

    sqlx::query("DROP TRIGGER refuse_task_update ON tasks")
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(scheduler.process_due().await.unwrap(), 1);
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
    assert_eq!(scheduler.process_due().await.unwrap(), 0);
}
