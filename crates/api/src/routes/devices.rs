//! Route definitions for the caller's devices, mounted at `/devices`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(devices::list_devices).post(devices::register_device))
        .route("/{id}", delete(devices::delete_device))
}
