//! Route definitions for wishes, mounted at `/wishes`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::wishes;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(wishes::list_wishes).post(wishes::create_wish))
        .route("/tree", get(wishes::wish_tree))
        .route("/{id}", put(wishes::update_wish).delete(wishes::delete_wish))
}
