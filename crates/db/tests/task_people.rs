//! Integration tests for task people synchronization storage.
//!
//! Exercises the transactional plan apply against a real database:
//! - Happy-path convergence and idempotence
//! - Role updates keep the row identity
//! - A failing write rolls back every earlier write of the same plan
//! - Reference existence checks for persons, roles, and homes

use assert_matches::assert_matches;
use hearth_core::association::{plan_sync, CurrentAssociation, DesiredAssociation};
use hearth_db::models::home::CreateHome;
use hearth_db::models::person::CreatePerson;
use hearth_db::models::task::CreateTask;
use hearth_db::models::task_person::TaskPerson;
use hearth_db::repositories::{HomeRepo, PersonRepo, RoleRepo, TaskPersonRepo, TaskRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    task_id: i64,
    persons: Vec<i64>,
    home_id: i64,
    owner: i64,
    member: i64,
    helper: i64,
}

async fn fixture(pool: &PgPool, person_count: usize) -> Fixture {
    let mut persons = Vec::new();
    for i in 0..person_count {
        let person = PersonRepo::create(
            pool,
            &CreatePerson {
                name: format!("Person {i}"),
                email: None,
            },
        )
        .await
        .unwrap();
        persons.push(person.id);
    }

    let home = HomeRepo::create(
        pool,
        persons[0],
        &CreateHome {
            name: "Flat".to_string(),
            address: None,
        },
    )
    .await
    .unwrap();

    let task = TaskRepo::create(
        pool,
        persons[0],
        &CreateTask {
            parent_id: None,
            category_id: None,
            home_id: Some(home.id),
            title: "Dishes".to_string(),
            description: None,
            color: None,
            icon: None,
            due_at: None,
        },
    )
    .await
    .unwrap();

    Fixture {
        task_id: task.id,
        home_id: home.id,
        owner: role_id(pool, "owner").await,
        member: role_id(pool, "member").await,
        helper: role_id(pool, "helper").await,
        persons,
    }
}

async fn role_id(pool: &PgPool, name: &str) -> i64 {
    RoleRepo::find_by_name(pool, name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("role {name} should be seeded"))
        .id
}

fn desired(person_id: i64, role_id: i64, home_id: i64) -> DesiredAssociation {
    DesiredAssociation {
        person_id,
        role_id,
        home_id,
    }
}

async fn sync(pool: &PgPool, task_id: i64, wanted: &[DesiredAssociation]) -> Vec<TaskPerson> {
    let current = TaskPersonRepo::list_for_task(pool, task_id).await.unwrap();
    let current: Vec<CurrentAssociation> = current.iter().map(CurrentAssociation::from).collect();
    let plan = plan_sync(task_id, wanted, &current);
    TaskPersonRepo::apply_plan(pool, &plan).await.unwrap()
}

fn triples(rows: &[TaskPerson]) -> Vec<(i64, i64, i64)> {
    let mut t: Vec<_> = rows
        .iter()
        .map(|r| (r.person_id, r.home_id, r.role_id))
        .collect();
    t.sort_unstable();
    t
}

// ---------------------------------------------------------------------------
// Test: Convergence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_apply_plan_converges_and_is_idempotent(pool: PgPool) {
    let f = fixture(&pool, 3).await;
    let [a, b, c] = [f.persons[0], f.persons[1], f.persons[2]];

    let rows = sync(
        &pool,
        f.task_id,
        &[desired(a, f.owner, f.home_id), desired(b, f.member, f.home_id)],
    )
    .await;
    assert_eq!(
        triples(&rows),
        vec![(a, f.home_id, f.owner), (b, f.home_id, f.member)]
    );

    let wanted = [desired(b, f.helper, f.home_id), desired(c, f.member, f.home_id)];
    let rows = sync(&pool, f.task_id, &wanted).await;
    assert_eq!(
        triples(&rows),
        vec![(b, f.home_id, f.helper), (c, f.home_id, f.member)]
    );

    // A second identical sync plans nothing.
    let current = TaskPersonRepo::list_for_task(&pool, f.task_id).await.unwrap();
    let current: Vec<CurrentAssociation> = current.iter().map(CurrentAssociation::from).collect();
    assert!(plan_sync(f.task_id, &wanted, &current).is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_change_keeps_row_id(pool: PgPool) {
    let f = fixture(&pool, 1).await;
    let a = f.persons[0];

    let before = sync(&pool, f.task_id, &[desired(a, f.owner, f.home_id)]).await;
    let after = sync(&pool, f.task_id, &[desired(a, f.helper, f.home_id)]).await;

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_eq!(before[0].id, after[0].id);
    assert_eq!(after[0].role_id, f.helper);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_desired_set_clears_task(pool: PgPool) {
    let f = fixture(&pool, 2).await;
    sync(
        &pool,
        f.task_id,
        &[
            desired(f.persons[0], f.owner, f.home_id),
            desired(f.persons[1], f.member, f.home_id),
        ],
    )
    .await;

    let rows = sync(&pool, f.task_id, &[]).await;
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// Test: Atomicity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_write_rolls_back_whole_plan(pool: PgPool) {
    let f = fixture(&pool, 4).await;
    let [a, b, c, d] = [f.persons[0], f.persons[1], f.persons[2], f.persons[3]];

    let original = sync(
        &pool,
        f.task_id,
        &[desired(a, f.owner, f.home_id), desired(b, f.member, f.home_id)],
    )
    .await;

    // One delete (a), one update (b), then two adds; the first add points
    // at a role that does not exist and violates the foreign key.
    let current: Vec<CurrentAssociation> = original.iter().map(CurrentAssociation::from).collect();
    let plan = plan_sync(
        f.task_id,
        &[
            desired(b, f.helper, f.home_id),
            desired(c, 999_999, f.home_id),
            desired(d, f.member, f.home_id),
        ],
        &current,
    );
    assert_eq!(plan.to_delete.len(), 1);
    assert_eq!(plan.to_update.len(), 1);
    assert_eq!(plan.to_add.len(), 2);

    let result = TaskPersonRepo::apply_plan(&pool, &plan).await;
    assert_matches!(result, Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503"));

    let after = TaskPersonRepo::list_for_task(&pool, f.task_id).await.unwrap();
    assert_eq!(triples(&after), triples(&original));
    assert_eq!(
        after.iter().map(|r| r.id).collect::<Vec<_>>(),
        original.iter().map(|r| r.id).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// Test: Reference checks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_ids_report_unknown_references(pool: PgPool) {
    let f = fixture(&pool, 1).await;
    let a = f.persons[0];

    assert_eq!(
        PersonRepo::missing_ids(&pool, &[a, 12_345]).await.unwrap(),
        vec![12_345]
    );
    assert_eq!(
        RoleRepo::missing_ids(&pool, &[f.owner, 777]).await.unwrap(),
        vec![777]
    );
    assert!(HomeRepo::missing_ids(&pool, &[f.home_id]).await.unwrap().is_empty());
    assert!(PersonRepo::missing_ids(&pool, &[]).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_task_cascades_associations(pool: PgPool) {
    let f = fixture(&pool, 1).await;
    sync(&pool, f.task_id, &[desired(f.persons[0], f.owner, f.home_id)]).await;

    assert!(TaskRepo::delete(&pool, f.task_id).await.unwrap());
    let rows = TaskPersonRepo::list_for_task(&pool, f.task_id).await.unwrap();
    assert!(rows.is_empty());
}
