//! Ancestor lookups shared by the self-referential tables.

use std::collections::HashMap;

use hearth_core::types::DbId;
use sqlx::PgPool;

/// A table whose rows form a tree through `parent_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeTable {
    Categories,
    Tasks,
    Wishes,
}

impl TreeTable {
    pub fn table_name(self) -> &'static str {
        match self {
            TreeTable::Categories => "categories",
            TreeTable::Tasks => "tasks",
            TreeTable::Wishes => "wishes",
        }
    }
}

/// Parent-chain queries over a [`TreeTable`].
pub struct TreeRepo;

impl TreeRepo {
    /// `id → parent_id` for `start_id` and each of its ancestors.
    ///
    /// The walk stops at a root, at a missing row, or when it would revisit
    /// a row, so already-cyclic data terminates. An unknown `start_id`
    /// yields an empty map.
    pub async fn ancestor_chain(
        pool: &PgPool,
        table: TreeTable,
        start_id: DbId,
    ) -> Result<HashMap<DbId, Option<DbId>>, sqlx::Error> {
        let name = table.table_name();
        let query = format!(
            "WITH RECURSIVE chain (id, parent_id, path) AS ( \
                SELECT id, parent_id, ARRAY[id] FROM {name} WHERE id = $1 \
                UNION ALL \
                SELECT t.id, t.parent_id, chain.path || t.id \
                FROM {name} t JOIN chain ON t.id = chain.parent_id \
                WHERE NOT t.id = ANY(chain.path) \
             ) \
             SELECT id, parent_id FROM chain"
        );
        let rows: Vec<(DbId, Option<DbId>)> = sqlx::query_as(&query)
            .bind(start_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}
