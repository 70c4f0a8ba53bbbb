//! Route definitions for tasks, mounted at `/tasks`.

use axum::routing::get;
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// ```text
/// GET    /                -> list_tasks
/// POST   /                -> create_task
/// GET    /tree            -> task_tree
/// GET    /{id}            -> get_task
/// PUT    /{id}            -> update_task
/// DELETE /{id}            -> delete_task
/// GET    /{id}/people     -> list_task_people
/// PUT    /{id}/people     -> sync_task_people
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tree", get(tasks::task_tree))
        .route(
            "/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/{id}/people",
            get(tasks::list_task_people).put(tasks::sync_task_people),
        )
}
