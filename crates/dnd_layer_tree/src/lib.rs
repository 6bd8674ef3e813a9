mod entries;
mod tree;

pub use entries::LayerTreeEntry;
pub use tree::{LayerTreeEvent, LayerTreeRowState, LayerTreeState, LayerTreeView, layer_tree_view};
