use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{LayerTree, NodeId};

fn default_true() -> bool {
    true
}

/// What a node type allows during drag and drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapability {
    #[serde(default = "default_true")]
    pub can_accept_child: bool,
    /// Inline-only nodes (text formatting and the like) cannot be dragged.
    #[serde(default)]
    pub is_inline_only: bool,
}

impl NodeCapability {
    pub const CONTAINER: Self = Self {
        can_accept_child: true,
        is_inline_only: false,
    };
    pub const BLOCK: Self = Self {
        can_accept_child: false,
        is_inline_only: false,
    };
    pub const INLINE: Self = Self {
        can_accept_child: false,
        is_inline_only: true,
    };
}

impl Default for NodeCapability {
    fn default() -> Self {
        Self::CONTAINER
    }
}

/// Capability lookup keyed by a node's kind tag.
pub trait CapabilityRegistry {
    fn capability(&self, kind: &str) -> NodeCapability;
}

/// Capability of the node `id`, or `None` if it is not in the tree.
pub fn capability_of(
    registry: &dyn CapabilityRegistry,
    tree: &LayerTree,
    id: &NodeId,
) -> Option<NodeCapability> {
    tree.get(id.as_str())
        .map(|node| registry.capability(&node.kind))
}

/// Whether `id` may become a drop parent. The root accepts children regardless of its kind.
pub fn can_accept_child(registry: &dyn CapabilityRegistry, tree: &LayerTree, id: &NodeId) -> bool {
    if id == tree.root_id() {
        return true;
    }
    capability_of(registry, tree, id).is_some_and(|capability| capability.can_accept_child)
}

/// Map-backed registry with a fallback for unknown kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindRegistry {
    #[serde(default)]
    kinds: HashMap<String, NodeCapability>,
    #[serde(default)]
    fallback: NodeCapability,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback(mut self, capability: NodeCapability) -> Self {
        self.fallback = capability;
        self
    }

    pub fn kind(mut self, kind: impl Into<String>, capability: NodeCapability) -> Self {
        self.kinds.insert(kind.into(), capability);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl CapabilityRegistry for KindRegistry {
    fn capability(&self, kind: &str) -> NodeCapability {
        self.kinds.get(kind).copied().unwrap_or(self.fallback)
    }
}
