//! Route definitions for categories, mounted at `/categories`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// ```text
/// GET    /          -> list_categories
/// POST   /          -> create_category
/// GET    /tree      -> category_tree
/// PUT    /{id}      -> update_category
/// DELETE /{id}      -> delete_category
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/tree", get(categories::category_tree))
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
}
