use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::tree::{LayerTree, NodeId};

/// One step of an ancestor path: the node and its index among its parent's children.
///
/// The root entry has no parent; its `position` is always `0` and carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub node: NodeId,
    pub position: usize,
}

/// Ancestor chain of `id`, root first and ending at `id`.
pub fn ancestor_path(tree: &LayerTree, id: &NodeId) -> Result<Vec<NodeId>, TreeError> {
    Ok(ancestor_path_with_positions(tree, id)?
        .into_iter()
        .map(|entry| entry.node)
        .collect())
}

/// Ancestor chain of `id` annotated with each entry's position in its parent, root first.
///
/// Walks parent links upwards, so the cost is bounded by depth and not by recursion.
pub fn ancestor_path_with_positions(
    tree: &LayerTree,
    id: &NodeId,
) -> Result<Vec<PathEntry>, TreeError> {
    let mut path = Vec::new();
    let mut node = tree.node(id)?;
    loop {
        let Some(parent_id) = node.parent.as_ref() else {
            path.push(PathEntry {
                node: node.id.clone(),
                position: 0,
            });
            break;
        };
        if path.len() >= tree.len() {
            return Err(TreeError::Cycle(id.clone()));
        }
        let parent = tree
            .node(parent_id)
            .map_err(|_| TreeError::UnknownParent(parent_id.clone()))?;
        let position = parent
            .position_of(&node.id)
            .ok_or_else(|| TreeError::NotFound(node.id.clone()))?;
        path.push(PathEntry {
            node: node.id.clone(),
            position,
        });
        node = parent;
    }

    if path.last().map(|entry| &entry.node) != Some(tree.root_id()) {
        return Err(TreeError::NotFound(id.clone()));
    }
    path.reverse();
    Ok(path)
}

/// Number of edges between the root and `id`; the root has depth `0`.
pub fn depth(tree: &LayerTree, id: &NodeId) -> Result<usize, TreeError> {
    ancestor_path_with_positions(tree, id).map(|path| path.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LayerTree {
        let mut tree = LayerTree::new("root", "body", "Body");
        let root = tree.root_id().clone();
        tree.push_node(&root, "a", "box", "a").unwrap();
        let b = tree.push_node(&root, "b", "box", "b").unwrap();
        tree.push_leaf(&b, "text").unwrap();
        let c = tree.push_node(&b, "c", "box", "c").unwrap();
        tree.push_node(&c, "d", "box", "d").unwrap();
        tree
    }

    #[test]
    fn path_is_root_first() {
        let tree = sample();
        let path = ancestor_path(&tree, &"d".into()).unwrap();
        let expected: Vec<NodeId> = ["root", "b", "c", "d"].into_iter().map(NodeId::from).collect();
        assert_eq!(path, expected);
        assert_eq!(depth(&tree, &"d".into()).unwrap(), 3);
        assert_eq!(depth(&tree, tree.root_id()).unwrap(), 0);
    }

    #[test]
    fn positions_count_leaves() {
        let tree = sample();
        let path = ancestor_path_with_positions(&tree, &"c".into()).unwrap();
        let positions: Vec<_> = path.iter().map(|entry| entry.position).collect();
        assert_eq!(positions, vec![0, 1, 1]);
    }

    #[test]
    fn missing_node_is_not_found() {
        let tree = sample();
        assert_eq!(
            ancestor_path(&tree, &"nope".into()),
            Err(TreeError::NotFound("nope".into()))
        );
    }

    #[test]
    fn deep_chains_do_not_overflow() {
        let mut tree = LayerTree::new("root", "body", "Body");
        let mut parent = tree.root_id().clone();
        for ix in 0..5_000 {
            parent = tree
                .push_node(&parent, format!("n{ix}"), "box", "n")
                .unwrap();
        }
        assert_eq!(depth(&tree, &parent).unwrap(), 5_000);
    }
}
