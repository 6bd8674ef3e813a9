use crate::capability::{CapabilityRegistry, can_accept_child};
use crate::geometry::Rect;
use crate::path::ancestor_path;
use crate::target::DropCandidate;
use crate::tree::{LayerTree, NodeId};

/// A legal drop container chosen for a collision candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SwappedTarget {
    pub node: NodeId,
    /// The candidate's rect, kept only when the candidate itself was accepted. Otherwise the
    /// collision layer has to look the element up again.
    pub rect: Option<Rect>,
}

/// Replaces a naive collision candidate with the nearest ancestor that may receive the
/// dragged node: not the dragged node, not inside it, and accepting children.
pub struct AncestorResolver<'a> {
    tree: &'a LayerTree,
    registry: &'a dyn CapabilityRegistry,
}

impl<'a> AncestorResolver<'a> {
    pub fn new(tree: &'a LayerTree, registry: &'a dyn CapabilityRegistry) -> Self {
        Self { tree, registry }
    }

    pub fn swap_drop_target(
        &self,
        candidate: Option<&DropCandidate>,
        dragged: Option<&NodeId>,
    ) -> SwappedTarget {
        let (Some(candidate), Some(dragged)) = (candidate, dragged) else {
            return self.root();
        };

        if candidate.node == *self.tree.root_id() {
            return SwappedTarget {
                node: candidate.node.clone(),
                rect: Some(candidate.rect),
            };
        }

        let mut path = match ancestor_path(self.tree, &candidate.node) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(
                    message = "layer_tree.swap_drop_target",
                    candidate = %candidate.node,
                    error = %err
                );
                return self.root();
            }
        };
        path.reverse();

        if candidate.area.is_edge() && !path.is_empty() {
            path.remove(0);
        }

        if let Some(dragged_ix) = path.iter().position(|id| id == dragged) {
            path.drain(..=dragged_ix);
        }

        let Some(found) = path
            .into_iter()
            .find(|id| can_accept_child(self.registry, self.tree, id))
        else {
            tracing::trace!(
                message = "layer_tree.swap_drop_target.fallback",
                candidate = %candidate.node
            );
            return self.root();
        };

        let rect = (found == candidate.node).then_some(candidate.rect);
        SwappedTarget { node: found, rect }
    }

    fn root(&self) -> SwappedTarget {
        SwappedTarget {
            node: self.tree.root_id().clone(),
            rect: None,
        }
    }
}
