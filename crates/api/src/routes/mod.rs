pub mod categories;
pub mod devices;
pub mod health;
pub mod household;
pub mod tasks;
pub mod wishes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tasks                          list, create
/// /tasks/tree                     materialized task tree (?home_id, root_id)
/// /tasks/{id}                     get, update, delete
/// /tasks/{id}/people              list, sync (PUT)
///
/// /categories                     list, create
/// /categories/tree                materialized category tree (?root_id)
/// /categories/{id}                update, delete
///
/// /wishes                         list, create
/// /wishes/tree                    materialized wish tree (?root_id)
/// /wishes/{id}                    update, delete
///
/// /devices                        list, register
/// /devices/{id}                   delete
///
/// /persons                        list, create
/// /homes                          list, create
/// /roles                          list
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tasks", tasks::router())
        .nest("/categories", categories::router())
        .nest("/wishes", wishes::router())
        .nest("/devices", devices::router())
        .merge(household::router())
}
