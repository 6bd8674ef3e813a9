use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::{borrow::Borrow, collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::target::InsertionIndex;

/// Stable identifier of a node in a [`LayerTree`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id.into())
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque terminal content (text). Never a drop target or drag source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    Leaf(Leaf),
}

impl Child {
    #[inline]
    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            Child::Node(id) => Some(id),
            Child::Leaf(_) => None,
        }
    }

    #[inline]
    pub fn is_node(&self) -> bool {
        matches!(self, Child::Node(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerNode {
    pub id: NodeId,
    /// Type tag looked up in the capability registry.
    pub kind: String,
    pub label: String,
    pub parent: Option<NodeId>,
    pub children: Vec<Child>,
}

impl LayerNode {
    fn new(id: NodeId, kind: String, label: String, parent: Option<NodeId>) -> Self {
        Self {
            id,
            kind,
            label,
            parent,
            children: Vec::new(),
        }
    }

    pub fn position_of(&self, child: &NodeId) -> Option<usize> {
        self.children
            .iter()
            .position(|entry| entry.as_node() == Some(child))
    }

    pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &NodeId> {
        self.children.iter().filter_map(Child::as_node)
    }
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Rooted arena of layer nodes addressed by stable ids.
///
/// [`LayerTree::revision`] plays the role of the tree's data reference for observers such as
/// focus retention. Revisions come from one process-wide counter: every new tree and every
/// mutation takes a fresh value, so a rebuilt tree never shares a revision with the one it
/// replaces.
#[derive(Debug, Clone)]
pub struct LayerTree {
    root: NodeId,
    nodes: HashMap<NodeId, LayerNode>,
    revision: u64,
}

impl LayerTree {
    pub fn new(root: impl Into<NodeId>, kind: impl Into<String>, label: impl Into<String>) -> Self {
        let root = root.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            LayerNode::new(root.clone(), kind.into(), label.into(), None),
        );
        Self {
            root,
            nodes,
            revision: next_revision(),
        }
    }

    #[inline]
    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&LayerNode> {
        self.nodes.get(id)
    }

    pub fn node(&self, id: &NodeId) -> Result<&LayerNode, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    pub fn children(&self, id: &NodeId) -> Result<&[Child], TreeError> {
        self.node(id).map(|node| node.children.as_slice())
    }

    /// Appends a new element node under `parent`.
    pub fn push_node(
        &mut self,
        parent: &NodeId,
        id: impl Into<NodeId>,
        kind: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| TreeError::UnknownParent(parent.clone()))?;
        parent_node.children.push(Child::Node(id.clone()));
        self.nodes.insert(
            id.clone(),
            LayerNode::new(id.clone(), kind.into(), label.into(), Some(parent.clone())),
        );
        self.revision = next_revision();
        Ok(id)
    }

    /// Appends a text leaf under `parent`.
    pub fn push_leaf(&mut self, parent: &NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| TreeError::UnknownParent(parent.clone()))?;
        parent_node.children.push(Child::Leaf(Leaf { text: text.into() }));
        self.revision = next_revision();
        Ok(())
    }

    /// Returns `true` if `id` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        let mut cursor = self.nodes.get(id).and_then(|node| node.parent.as_ref());
        let mut steps = 0;
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            cursor = self.nodes.get(parent).and_then(|node| node.parent.as_ref());
        }
        false
    }

    /// Moves `id` under `new_parent` at `index`, counted against the children as they are
    /// before the move. Moving a node into itself or its own subtree is rejected.
    pub fn move_node(
        &mut self,
        id: &NodeId,
        new_parent: &NodeId,
        index: InsertionIndex,
    ) -> Result<(), TreeError> {
        if *id == self.root {
            return Err(TreeError::RootImmovable);
        }
        let old_parent = self
            .node(id)?
            .parent
            .clone()
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        if !self.nodes.contains_key(new_parent) {
            return Err(TreeError::UnknownParent(new_parent.clone()));
        }
        if new_parent == id || self.is_descendant_of(new_parent, id) {
            return Err(TreeError::Cycle(id.clone()));
        }

        let mut dest_index = index.resolve(self.children(new_parent)?.len());
        let old_index = {
            let parent = self
                .nodes
                .get_mut(&old_parent)
                .ok_or_else(|| TreeError::UnknownParent(old_parent.clone()))?;
            let old_index = parent
                .position_of(id)
                .ok_or_else(|| TreeError::NotFound(id.clone()))?;
            parent.children.remove(old_index);
            old_index
        };
        if old_parent == *new_parent && dest_index > old_index {
            dest_index -= 1;
        }

        let parent = self
            .nodes
            .get_mut(new_parent)
            .ok_or_else(|| TreeError::UnknownParent(new_parent.clone()))?;
        let dest_index = dest_index.min(parent.children.len());
        parent.children.insert(dest_index, Child::Node(id.clone()));
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(new_parent.clone());
        }
        self.revision = next_revision();
        Ok(())
    }

    /// Removes `id` and its whole subtree, returning the removed ids in pre-order.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        if *id == self.root {
            return Err(TreeError::RootImmovable);
        }
        let parent_id = self
            .node(id)?
            .parent
            .clone()
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|child| child.as_node() != Some(id));
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.child_nodes().rev().cloned());
                removed.push(next);
            }
        }
        self.revision = next_revision();
        Ok(removed)
    }
}
