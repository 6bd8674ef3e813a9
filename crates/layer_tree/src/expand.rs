use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::path::ancestor_path;
use crate::tree::{LayerTree, NodeId};

/// Expanded/collapsed flags for the tree view, keyed by node id.
///
/// Lives as long as the view: entries are never pruned, only set or flipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandState {
    expanded: HashMap<NodeId, bool>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node can be expanded if it has more than one child, or its only child is a node.
    pub fn is_expandable(tree: &LayerTree, id: &NodeId) -> bool {
        let Some(node) = tree.get(id.as_str()) else {
            return false;
        };
        match node.children.as_slice() {
            [] => false,
            [only] => only.is_node(),
            _ => true,
        }
    }

    pub fn is_expanded(&self, tree: &LayerTree, id: &NodeId) -> bool {
        if id == tree.root_id() {
            return true;
        }
        Self::is_expandable(tree, id) && self.flag(id)
    }

    /// The stored flag, regardless of whether the node is currently expandable.
    pub fn flag(&self, id: &NodeId) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) {
        self.expanded.insert(id.clone(), expanded);
    }

    /// Flips the flag of an expandable node and returns the new visible state.
    pub fn toggle(&mut self, tree: &LayerTree, id: &NodeId) -> bool {
        if id == tree.root_id() || !Self::is_expandable(tree, id) {
            return self.is_expanded(tree, id);
        }
        let expanded = !self.flag(id);
        self.set_expanded(id, expanded);
        expanded
    }

    /// Expands every strict ancestor of `selected` so that it becomes visible.
    pub fn expand_ancestors(
        &mut self,
        tree: &LayerTree,
        selected: &NodeId,
    ) -> Result<(), TreeError> {
        let mut path = ancestor_path(tree, selected)?;
        path.pop();
        for ancestor in path {
            self.expanded.insert(ancestor, true);
        }
        Ok(())
    }
}

/// Runs [`ExpandState::expand_ancestors`] once per change of the externally selected node.
#[derive(Debug, Clone, Default)]
pub struct SelectionSync {
    last: Option<NodeId>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the selection changed and ancestors were expanded.
    pub fn sync(
        &mut self,
        tree: &LayerTree,
        expand: &mut ExpandState,
        selected: Option<&NodeId>,
    ) -> bool {
        if self.last.as_ref() == selected {
            return false;
        }
        self.last = selected.cloned();
        let Some(selected) = selected else {
            return false;
        };

        match expand.expand_ancestors(tree, selected) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    message = "layer_tree.selection_sync",
                    selected = %selected,
                    error = %err
                );
                false
            }
        }
    }
}
