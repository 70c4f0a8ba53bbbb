//! Handlers for wishes and the wish tree.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::tree::TreeItem;
use hearth_core::types::DbId;
use hearth_db::models::wish::{CreateWish, UpdateWish, Wish};
use hearth_db::repositories::{TreeTable, WishRepo};

use super::{ensure_acyclic, render_tree, validate_node_fields, TreeQuery};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::locale::RequestLocale;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Wish", id })
}

/// Load a wish the viewer can see: a system wish or one of their own.
async fn visible_wish(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Wish> {
    let wish = WishRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if wish.is_system || wish.person_id == Some(person_id) {
        Ok(wish)
    } else {
        Err(not_found(id))
    }
}

async fn owned_wish(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Wish> {
    let wish = visible_wish(state, id, person_id).await?;
    if wish.is_system {
        return Err(CoreError::Forbidden("System wishes cannot be modified".into()).into());
    }
    Ok(wish)
}

/// GET /api/v1/wishes
pub async fn list_wishes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let wishes = WishRepo::list_visible(&state.pool, auth.person_id).await?;
    Ok(Json(DataResponse { data: wishes }))
}

/// GET /api/v1/wishes/tree
pub async fn wish_tree(
    auth: AuthUser,
    locale: RequestLocale,
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> AppResult<impl IntoResponse> {
    let wishes = WishRepo::list_visible(&state.pool, auth.person_id).await?;
    let items: Vec<TreeItem> = wishes.into_iter().map(TreeItem::from).collect();
    let tree = render_tree(&state, &locale, items, auth.person_id, query.root_id);
    Ok(Json(DataResponse { data: tree }))
}

/// POST /api/v1/wishes
pub async fn create_wish(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWish>,
) -> AppResult<impl IntoResponse> {
    validate_node_fields(
        "title",
        Some(&input.title),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(parent_id) = input.parent_id {
        visible_wish(&state, parent_id, auth.person_id).await?;
    }

    let wish = WishRepo::create(&state.pool, auth.person_id, &input).await?;
    tracing::info!(wish_id = wish.id, person_id = auth.person_id, "Wish created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: wish })))
}

/// PUT /api/v1/wishes/{id}
pub async fn update_wish(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWish>,
) -> AppResult<impl IntoResponse> {
    owned_wish(&state, id, auth.person_id).await?;
    validate_node_fields(
        "title",
        input.title.as_deref(),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(Some(parent_id)) = input.parent_id {
        visible_wish(&state, parent_id, auth.person_id).await?;
        ensure_acyclic(&state.pool, TreeTable::Wishes, id, parent_id).await?;
    }

    let wish = WishRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse { data: wish }))
}

/// DELETE /api/v1/wishes/{id}
pub async fn delete_wish(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    owned_wish(&state, id, auth.person_id).await?;
    if !WishRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(wish_id = id, person_id = auth.person_id, "Wish deleted");

    Ok(StatusCode::NO_CONTENT)
}
