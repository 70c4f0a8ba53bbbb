//! Self-referential tree materialization for categories, tasks, and wishes.
//!
//! Rows are loaded flat and indexed into a [`TreeArena`]; child links are
//! index lists derived from `parent_id`, kept in input order. The arena is
//! then rendered into nested [`MaterializedNode`]s for a given viewer:
//!
//! - a node is visible when it is a system node or the viewer is one of its
//!   people;
//! - visibility is evaluated per node, so the visible descendants of a
//!   hidden node take its place in the parent's child list;
//! - system nodes have their name and description translated, falling back
//!   to the stored text on a catalog miss.

use std::collections::HashMap;

use serde::Serialize;

use crate::localization::Localizer;
use crate::types::DbId;

/// A tree row, independent of which table it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// Shared system entity: visible to everyone and translated.
    pub is_system: bool,
    /// Persons the node belongs to (owner, assignees, ...).
    pub people: Vec<DbId>,
}

/// A visible node with its visible subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializedNode {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_system: bool,
    pub children: Vec<MaterializedNode>,
}

/// Whether `viewer_id` may see `item`.
pub fn is_visible(item: &TreeItem, viewer_id: DbId) -> bool {
    item.is_system || item.people.contains(&viewer_id)
}

/// Flat, index-linked storage of one tree table.
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: Vec<TreeItem>,
    index: HashMap<DbId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl TreeArena {
    /// Index `items`. Later rows reusing an id are dropped.
    ///
    /// A row whose parent is null or absent from `items` becomes a root.
    pub fn build(items: Vec<TreeItem>) -> Self {
        let mut nodes = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for item in items {
            if index.contains_key(&item.id) {
                tracing::warn!(id = item.id, "Duplicate tree node id, keeping first");
                continue;
            }
            index.insert(item.id, nodes.len());
            nodes.push(item);
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            match node.parent_id.and_then(|p| index.get(&p)) {
                Some(&parent_idx) => children[parent_idx].push(idx),
                None => roots.push(idx),
            }
        }

        let arena = Self {
            nodes,
            index,
            children,
            roots,
        };

        let reachable = arena.reachable_count();
        if reachable < arena.nodes.len() {
            tracing::warn!(
                unreachable = arena.nodes.len() - reachable,
                "Tree contains nodes on a parent cycle; they are not materialized"
            );
        }

        arena
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: DbId) -> Option<&TreeItem> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Parent id of `id`, if the node exists and has one.
    pub fn parent_of(&self, id: DbId) -> Option<DbId> {
        self.get(id).and_then(|n| n.parent_id)
    }

    /// Root ids in input order.
    pub fn root_ids(&self) -> Vec<DbId> {
        self.roots.iter().map(|&idx| self.nodes[idx].id).collect()
    }

    /// Materialize the whole forest for `viewer_id`.
    pub fn materialize(&self, viewer_id: DbId, localizer: &dyn Localizer) -> Vec<MaterializedNode> {
        let mut out = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        for &idx in &self.roots {
            self.collect(idx, viewer_id, localizer, &mut visited, &mut out);
        }
        out
    }

    /// Materialize the subtrees rooted at `root_ids`, in the given order.
    ///
    /// Unknown ids are skipped. Each root is evaluated on its own
    /// visibility, exactly like an interior node.
    pub fn materialize_from(
        &self,
        root_ids: &[DbId],
        viewer_id: DbId,
        localizer: &dyn Localizer,
    ) -> Vec<MaterializedNode> {
        let mut out = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        for id in root_ids {
            if let Some(&idx) = self.index.get(id) {
                self.collect(idx, viewer_id, localizer, &mut visited, &mut out);
            }
        }
        out
    }

    fn collect(
        &self,
        idx: usize,
        viewer_id: DbId,
        localizer: &dyn Localizer,
        visited: &mut [bool],
        out: &mut Vec<MaterializedNode>,
    ) {
        let item = &self.nodes[idx];
        // Only reachable when a caller starts from a node on a parent cycle.
        if std::mem::replace(&mut visited[idx], true) {
            tracing::warn!(id = item.id, "Tree node revisited, skipping");
            return;
        }

        let mut children = Vec::new();
        for &child in &self.children[idx] {
            self.collect(child, viewer_id, localizer, visited, &mut children);
        }

        if !is_visible(item, viewer_id) {
            out.extend(children);
            return;
        }

        let (name, description) = translate(item, localizer);
        out.push(MaterializedNode {
            id: item.id,
            parent_id: item.parent_id,
            name,
            description,
            color: item.color.clone(),
            icon: item.icon.clone(),
            is_system: item.is_system,
            children,
        });
    }

    fn reachable_count(&self) -> usize {
        let mut seen = 0;
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(idx) = stack.pop() {
            seen += 1;
            stack.extend(self.children[idx].iter().copied());
        }
        seen
    }
}

/// Translated name and description for system nodes, raw text otherwise.
fn translate(item: &TreeItem, localizer: &dyn Localizer) -> (String, Option<String>) {
    if !item.is_system {
        return (item.name.clone(), item.description.clone());
    }
    let name = localizer
        .lookup(&item.name)
        .map_or_else(|| item.name.clone(), str::to_owned);
    let description = item.description.as_ref().map(|raw| {
        localizer
            .lookup(raw)
            .map_or_else(|| raw.clone(), str::to_owned)
    });
    (name, description)
}

/// Whether re-parenting `node_id` under `new_parent_id` would close a cycle.
///
/// Walks the ancestor chain of the candidate parent through `parent_of`.
/// A chain that revisits a node (an already-cyclic store) also counts.
pub fn would_create_cycle<F>(node_id: DbId, new_parent_id: DbId, mut parent_of: F) -> bool
where
    F: FnMut(DbId) -> Option<DbId>,
{
    let mut visited = std::collections::HashSet::new();
    let mut cursor = Some(new_parent_id);
    while let Some(current) = cursor {
        if current == node_id || !visited.insert(current) {
            return true;
        }
        cursor = parent_of(current);
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::Catalog;

    fn node(id: DbId, parent_id: Option<DbId>) -> TreeItem {
        TreeItem {
            id,
            parent_id,
            name: format!("node-{id}"),
            description: None,
            color: Some("#336699".to_string()),
            icon: None,
            is_system: true,
            people: vec![],
        }
    }

    fn private(id: DbId, parent_id: Option<DbId>, people: Vec<DbId>) -> TreeItem {
        TreeItem {
            is_system: false,
            people,
            ..node(id, parent_id)
        }
    }

    fn ids(nodes: &[MaterializedNode]) -> Vec<DbId> {
        nodes.iter().map(|n| n.id).collect()
    }

    fn flatten(nodes: &[MaterializedNode], out: &mut Vec<DbId>) {
        for n in nodes {
            out.push(n.id);
            flatten(&n.children, out);
        }
    }

    #[test]
    fn materializes_nested_structure() {
        let arena = TreeArena::build(vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(1)),
            node(4, Some(2)),
        ]);
        let tree = arena.materialize(99, &Catalog::default());

        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(ids(&tree[0].children), vec![2, 3]);
        assert_eq!(ids(&tree[0].children[0].children), vec![4]);
        assert!(tree[0].children[1].children.is_empty());

        let mut all = Vec::new();
        flatten(&tree, &mut all);
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[test]
    fn preserves_input_child_order() {
        let arena = TreeArena::build(vec![
            node(1, None),
            node(5, Some(1)),
            node(2, Some(1)),
            node(9, Some(1)),
        ]);
        let tree = arena.materialize(1, &Catalog::default());
        assert_eq!(ids(&tree[0].children), vec![5, 2, 9]);
    }

    #[test]
    fn child_listed_before_parent_still_attaches() {
        let arena = TreeArena::build(vec![node(2, Some(1)), node(1, None)]);
        assert_eq!(arena.root_ids(), vec![1]);
        let tree = arena.materialize(1, &Catalog::default());
        assert_eq!(ids(&tree[0].children), vec![2]);
    }

    #[test]
    fn private_node_hidden_from_other_viewers() {
        let arena = TreeArena::build(vec![
            node(1, None),
            private(2, Some(1), vec![7]),
            node(3, Some(1)),
        ]);

        let owner = arena.materialize(7, &Catalog::default());
        assert_eq!(ids(&owner[0].children), vec![2, 3]);

        let stranger = arena.materialize(8, &Catalog::default());
        assert_eq!(ids(&stranger[0].children), vec![3]);
    }

    #[test]
    fn visible_child_of_hidden_parent_is_hoisted() {
        let arena = TreeArena::build(vec![
            node(1, None),
            private(2, Some(1), vec![7]),
            node(4, Some(2)),
            node(3, Some(1)),
        ]);
        let tree = arena.materialize(8, &Catalog::default());

        assert_eq!(ids(&tree[0].children), vec![4, 3]);
        assert_eq!(tree[0].children[0].parent_id, Some(2));
    }

    #[test]
    fn explicit_roots_evaluate_children_on_their_own_rule() {
        // Parent 2 was filtered upstream; its children are materialized directly.
        let arena = TreeArena::build(vec![
            private(2, None, vec![7]),
            node(4, Some(2)),
            private(5, Some(2), vec![7]),
        ]);
        let tree = arena.materialize_from(&[4, 5], 8, &Catalog::default());
        assert_eq!(ids(&tree), vec![4]);
    }

    #[test]
    fn system_names_are_translated() {
        let catalog = Catalog::from_pairs([
            ("Groceries", "Lebensmittel"),
            ("Weekly shop", "Wocheneinkauf"),
        ]);
        let mut item = node(1, None);
        item.name = "Groceries".to_string();
        item.description = Some("Weekly shop".to_string());

        let tree = TreeArena::build(vec![item]).materialize(1, &catalog);
        assert_eq!(tree[0].name, "Lebensmittel");
        assert_eq!(tree[0].description.as_deref(), Some("Wocheneinkauf"));
    }

    #[test]
    fn translation_miss_falls_back_to_raw_name() {
        let catalog = Catalog::from_pairs([("Groceries", "Lebensmittel")]);
        let mut item = node(1, None);
        item.name = "Garden".to_string();
        item.description = Some("Mow the lawn".to_string());

        let tree = TreeArena::build(vec![item]).materialize(1, &catalog);
        assert_eq!(tree[0].name, "Garden");
        assert_eq!(tree[0].description.as_deref(), Some("Mow the lawn"));
    }

    #[test]
    fn user_nodes_are_never_translated() {
        let catalog = Catalog::from_pairs([("Groceries", "Lebensmittel")]);
        let mut item = private(1, None, vec![7]);
        item.name = "Groceries".to_string();

        let tree = TreeArena::build(vec![item]).materialize(7, &catalog);
        assert_eq!(tree[0].name, "Groceries");
    }

    #[test]
    fn cyclic_rows_are_not_materialized() {
        let arena = TreeArena::build(vec![node(1, None), node(2, Some(3)), node(3, Some(2))]);
        let tree = arena.materialize(1, &Catalog::default());
        assert_eq!(ids(&tree), vec![1]);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn explicit_root_on_a_cycle_terminates() {
        let arena = TreeArena::build(vec![node(2, Some(3)), node(3, Some(2))]);
        let tree = arena.materialize_from(&[2], 1, &Catalog::default());
        assert_eq!(ids(&tree), vec![2]);

        let mut flat = Vec::new();
        flatten(&tree, &mut flat);
        assert_eq!(flat, vec![2, 3]);

        let tree = arena.materialize_from(&[2, 3], 1, &Catalog::default());
        let mut flat = Vec::new();
        flatten(&tree, &mut flat);
        assert_eq!(flat, vec![2, 3], "each node appears once");
    }

    #[test]
    fn detects_reparenting_cycles() {
        // 1 -> 2 -> 3
        let arena = TreeArena::build(vec![node(1, None), node(2, Some(1)), node(3, Some(2))]);
        let parent_of = |id| arena.parent_of(id);

        assert!(would_create_cycle(1, 3, parent_of));
        assert!(would_create_cycle(2, 2, parent_of));
        assert!(!would_create_cycle(3, 1, parent_of));
        assert!(!would_create_cycle(1, 99, parent_of));
    }

    #[test]
    fn cycle_check_stops_on_existing_cycles() {
        let arena = TreeArena::build(vec![node(2, Some(3)), node(3, Some(2))]);
        assert!(would_create_cycle(10, 2, |id| arena.parent_of(id)));
    }
}
