//! Route definitions for persons, homes, and roles.

use axum::routing::get;
use axum::Router;

use crate::handlers::household;
use crate::state::AppState;

/// ```text
/// GET  /persons   -> list_persons
/// POST /persons   -> create_person
/// GET  /homes     -> list_homes
/// POST /homes     -> create_home
/// GET  /roles     -> list_roles
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/persons",
            get(household::list_persons).post(household::create_person),
        )
        .route("/homes", get(household::list_homes).post(household::create_home))
        .route("/roles", get(household::list_roles))
}
