//! Handlers for the caller's push destinations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::types::DbId;
use hearth_core::validation::validate_push_token;
use hearth_db::models::device::RegisterDevice;
use hearth_db::repositories::DeviceRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/devices
pub async fn list_devices(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let devices = DeviceRepo::list_for_person(&state.pool, auth.person_id).await?;
    Ok(Json(DataResponse { data: devices }))
}

/// POST /api/v1/devices
///
/// Registering a token that belongs to another person moves it to the caller.
pub async fn register_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterDevice>,
) -> AppResult<impl IntoResponse> {
    validate_push_token(&input.push_token)?;

    let device = DeviceRepo::register(&state.pool, auth.person_id, &input).await?;
    tracing::info!(device_id = device.id, person_id = auth.person_id, "Device registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: device })))
}

/// DELETE /api/v1/devices/{id}
pub async fn delete_device(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !DeviceRepo::delete(&state.pool, id, auth.person_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}
