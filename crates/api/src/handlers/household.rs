//! Handlers for persons, homes, and roles.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::validation::validate_name;
use hearth_db::models::home::CreateHome;
use hearth_db::models::person::CreatePerson;
use hearth_db::repositories::{HomeRepo, PersonRepo, RoleRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/persons
pub async fn list_persons(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let persons = PersonRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: persons }))
}

/// POST /api/v1/persons
pub async fn create_person(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePerson>,
) -> AppResult<impl IntoResponse> {
    validate_name("name", &input.name)?;

    let person = PersonRepo::create(&state.pool, &input).await?;
    tracing::info!(new_person_id = person.id, person_id = auth.person_id, "Person created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: person })))
}

/// GET /api/v1/homes
pub async fn list_homes(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let homes = HomeRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: homes }))
}

/// POST /api/v1/homes
pub async fn create_home(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateHome>,
) -> AppResult<impl IntoResponse> {
    validate_name("name", &input.name)?;

    let home = HomeRepo::create(&state.pool, auth.person_id, &input).await?;
    tracing::info!(home_id = home.id, person_id = auth.person_id, "Home created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: home })))
}

/// GET /api/v1/roles
pub async fn list_roles(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}
