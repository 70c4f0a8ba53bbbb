//! Handlers for categories and the category tree.
//!
//! System categories are shared and read-only; user categories belong to
//! the person who created them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hearth_core::error::CoreError;
use hearth_core::tree::TreeItem;
use hearth_core::types::DbId;
use hearth_db::models::category::{Category, CreateCategory, UpdateCategory};
use hearth_db::repositories::{CategoryRepo, TreeTable};

use super::{ensure_acyclic, render_tree, validate_node_fields, TreeQuery};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::locale::RequestLocale;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    })
}

/// Load a category the viewer can see: a system category or one of their own.
async fn visible_category(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Category> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if category.is_system || category.owner_person_id == Some(person_id) {
        Ok(category)
    } else {
        Err(not_found(id))
    }
}

/// Load a category the viewer owns.
async fn owned_category(state: &AppState, id: DbId, person_id: DbId) -> AppResult<Category> {
    let category = visible_category(state, id, person_id).await?;
    if category.is_system {
        return Err(CoreError::Forbidden("System categories cannot be modified".into()).into());
    }
    Ok(category)
}

/// GET /api/v1/categories
pub async fn list_categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list_visible(&state.pool, auth.person_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/categories/tree
pub async fn category_tree(
    auth: AuthUser,
    locale: RequestLocale,
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list_visible(&state.pool, auth.person_id).await?;
    let items: Vec<TreeItem> = categories.into_iter().map(TreeItem::from).collect();
    let tree = render_tree(&state, &locale, items, auth.person_id, query.root_id);
    Ok(Json(DataResponse { data: tree }))
}

/// POST /api/v1/categories
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    validate_node_fields(
        "name",
        Some(&input.name),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(parent_id) = input.parent_id {
        visible_category(&state, parent_id, auth.person_id).await?;
    }

    let category = CategoryRepo::create(&state.pool, auth.person_id, &input).await?;
    tracing::info!(category_id = category.id, person_id = auth.person_id, "Category created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    owned_category(&state, id, auth.person_id).await?;
    validate_node_fields(
        "name",
        input.name.as_deref(),
        input.description.as_deref(),
        input.color.as_deref(),
    )?;
    if let Some(Some(parent_id)) = input.parent_id {
        visible_category(&state, parent_id, auth.person_id).await?;
        ensure_acyclic(&state.pool, TreeTable::Categories, id, parent_id).await?;
    }

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(category_id = id, person_id = auth.person_id, "Category updated");

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    owned_category(&state, id, auth.person_id).await?;
    if !CategoryRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(category_id = id, person_id = auth.person_id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
