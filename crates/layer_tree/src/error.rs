use thiserror::Error;

use crate::tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node `{0}` is not part of the tree")]
    NotFound(NodeId),
    #[error("parent chain of `{0}` does not terminate at the root")]
    Cycle(NodeId),
    #[error("parent `{0}` does not exist")]
    UnknownParent(NodeId),
    #[error("the root node cannot be moved or removed")]
    RootImmovable,
    #[error("node id `{0}` appears more than once")]
    DuplicateId(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("the root node cannot be dragged")]
    Root,
    #[error("node `{0}` is inline-only and cannot be dragged")]
    InlineOnly(NodeId),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid layer document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
