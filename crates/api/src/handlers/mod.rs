//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `hearth_db` and map errors via
//! [`AppError`](crate::error::AppError). Helpers shared by the tree-shaped
//! resources live here.

pub mod categories;
pub mod devices;
pub mod household;
pub mod tasks;
pub mod wishes;

use hearth_core::error::CoreError;
use hearth_core::tree::{would_create_cycle, MaterializedNode, TreeArena, TreeItem};
use hearth_core::types::DbId;
use hearth_core::validation::{validate_color, validate_description, validate_name};
use hearth_db::repositories::{TreeRepo, TreeTable};
use hearth_db::DbPool;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::locale::RequestLocale;
use crate::state::AppState;

/// Query parameters for the `/tree` endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TreeQuery {
    /// Materialize only the subtree under this node.
    pub root_id: Option<DbId>,
    /// Tasks only: load every task of this home.
    pub home_id: Option<DbId>,
}

/// Index `items` and render the viewer's tree in the request's language.
pub(crate) fn render_tree(
    state: &AppState,
    locale: &RequestLocale,
    items: Vec<TreeItem>,
    viewer_id: DbId,
    root_id: Option<DbId>,
) -> Vec<MaterializedNode> {
    let arena = TreeArena::build(items);
    let catalog = state.translations.negotiate(locale.as_deref());
    match root_id {
        Some(root) => arena.materialize_from(&[root], viewer_id, catalog),
        None => arena.materialize(viewer_id, catalog),
    }
}

/// Reject a re-parent of `node_id` under `new_parent_id` that would close a cycle.
pub(crate) async fn ensure_acyclic(
    pool: &DbPool,
    table: TreeTable,
    node_id: DbId,
    new_parent_id: DbId,
) -> AppResult<()> {
    let chain = TreeRepo::ancestor_chain(pool, table, new_parent_id).await?;
    if would_create_cycle(node_id, new_parent_id, |id| chain.get(&id).copied().flatten()) {
        return Err(CoreError::Conflict(format!(
            "Moving {} {node_id} under {new_parent_id} would create a cycle",
            table.table_name()
        ))
        .into());
    }
    Ok(())
}

/// Validate the user-editable fields shared by categories, tasks, and wishes.
pub(crate) fn validate_node_fields(
    name_field: &str,
    name: Option<&str>,
    description: Option<&str>,
    color: Option<&str>,
) -> AppResult<()> {
    if let Some(name) = name {
        validate_name(name_field, name)?;
    }
    if let Some(description) = description {
        validate_description(description)?;
    }
    if let Some(color) = color {
        validate_color(color)?;
    }
    Ok(())
}
