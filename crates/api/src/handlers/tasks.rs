//! Handlers for tasks, the task tree, and task people.
//!
//! Tasks are visible to their creator, to everyone linked through
//! `task_people`, and (system tasks) to everyone. Only the creator and
//! linked people may change a task; system tasks are read-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::association::DesiredAssociation;
use hearth_core::error::CoreError;
use hearth_core::tree::TreeItem;
use hearth_core::types::DbId;
use hearth_db::models::task::{CreateTask, Task, TaskListParams, UpdateTask};
use hearth_db::repositories::{TaskPersonRepo, TaskRepo, TreeTable};
use serde::Deserialize;

use super::{ensure_acyclic, render_tree, validate_node_fields, TreeQuery};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::locale::RequestLocale;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::sync::AssociationSynchronizer;

/// Request body for `PUT /tasks/{id}/people`.
#[derive(Debug, Deserialize)]
pub struct SyncTaskPeopleRequest {
    pub people: Vec<DesiredAssociation>,
}

// ---------------------------------------------------------------------------
// Access helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Task", id })
}

/// Load a task the viewer can see. Invisible tasks are reported as missing.
async fn visible_task(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Task> {
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if task.is_system || TaskRepo::is_member(&state.pool, id, person_id).await? {
        Ok(task)
    } else {
        Err(not_found(id))
    }
}

/// Load a task the viewer may modify.
async fn editable_task(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Task> {
    let task = visible_task(state, id, person_id).await?;
    if task.is_system {
        return Err(CoreError::Forbidden("System tasks cannot be modified".into()).into());
    }
    Ok(task)
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks
pub async fn list_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> AppResult<impl IntoResponse> {
    let tasks = TaskRepo::list_visible(&state.pool, auth.person_id, &params).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = visible_task(&state, id, auth.person_id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<impl IntoResponse> {
    validate_node_fields(
        "title",
        Some(&input.title),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(parent_id) = input.parent_id {
        visible_task(&state, parent_id, auth.person_id).await?;
    }

    let task = TaskRepo::create(&state.pool, auth.person_id, &input).await?;
    tracing::info!(task_id = task.id, person_id = auth.person_id, "Task created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// PUT /api/v1/tasks/{id}
///
/// `parent_id: null` detaches the task; a new parent is rejected with 409
/// if it lies inside the task's own subtree.
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<impl IntoResponse> {
    editable_task(&state, id, auth.person_id).await?;
    validate_node_fields(
        "title",
        input.title.as_deref(),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(Some(parent_id)) = input.parent_id {
        visible_task(&state, parent_id, auth.person_id).await?;
        ensure_acyclic(&state.pool, TreeTable::Tasks, id, parent_id).await?;
    }

    let task = TaskRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(task_id = id, person_id = auth.person_id, "Task updated");

    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
///
/// Deletes the task with its subtree and associations.
pub async fn delete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    editable_task(&state, id, auth.person_id).await?;
    if !TaskRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(task_id = id, person_id = auth.person_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks/tree
pub async fn task_tree(
    auth: AuthUser,
    locale: RequestLocale,
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = TaskRepo::list_tree_rows(&state.pool, auth.person_id, query.home_id).await?;
    let items: Vec<TreeItem> = rows.into_iter().map(TreeItem::from).collect();
    let tree = render_tree(&state, &locale, items, auth.person_id, query.root_id);
    Ok(Json(DataResponse { data: tree }))
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks/{id}/people
pub async fn list_task_people(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    visible_task(&state, id, auth.person_id).await?;
    let people = TaskPersonRepo::list_for_task(&state.pool, id).await?;
    Ok(Json(DataResponse { data: people }))
}

/// PUT /api/v1/tasks/{id}/people
///
/// Replace the task's people with the given set. Rows whose
/// `(person_id, home_id)` is kept have their role updated in place.
pub async fn sync_task_people(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SyncTaskPeopleRequest>,
) -> AppResult<impl IntoResponse> {
    editable_task(&state, id, auth.person_id).await?;

    let report = AssociationSynchronizer::from_state(&state)
        .sync_task_people(id, &input.people, auth.person_id)
        .await?;

    Ok(Json(DataResponse { data: report }))
}
