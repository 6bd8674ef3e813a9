use std::collections::HashMap;

use gpui::SharedString;
use gpui_manos_layer_tree::{
    CapabilityRegistry, DropArea, ExpandState, InsertionIndex, LayerTree, Line, NodeId,
    RawDropTarget, Rect, SwappedTarget, ancestor_path, can_accept_child, visible_order,
};

/// A flat representation of a visible tree node with its depth.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTreeEntry {
    id: NodeId,
    label: SharedString,
    kind: SharedString,
    depth: usize,
    expandable: bool,
    expanded: bool,
    accepts_children: bool,
    draggable: bool,
}

impl LayerTreeEntry {
    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &SharedString {
        &self.label
    }

    #[inline]
    pub fn kind(&self) -> &SharedString {
        &self.kind
    }

    /// Edges from the root; the root row has depth `0`.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[inline]
    pub fn can_accept_children(&self) -> bool {
        self.accepts_children
    }

    #[inline]
    pub fn is_draggable(&self) -> bool {
        self.draggable
    }
}

pub(crate) fn build_entries(
    tree: &LayerTree,
    registry: &dyn CapabilityRegistry,
    expand: &ExpandState,
) -> Vec<LayerTreeEntry> {
    let order = visible_order(tree, expand);
    let mut depths: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
    let mut entries = Vec::with_capacity(order.len());

    for id in order {
        let Some(node) = tree.get(id.as_str()) else {
            continue;
        };
        let depth = node
            .parent
            .as_ref()
            .and_then(|parent| depths.get(parent))
            .map_or(0, |depth| depth + 1);
        depths.insert(id.clone(), depth);

        let capability = registry.capability(&node.kind);
        entries.push(LayerTreeEntry {
            label: node.label.clone().into(),
            kind: node.kind.clone().into(),
            depth,
            expandable: ExpandState::is_expandable(tree, &id),
            expanded: expand.is_expanded(tree, &id),
            accepts_children: can_accept_child(registry, tree, &id),
            draggable: id != *tree.root_id() && !capability.is_inline_only,
            id,
        });
    }
    entries
}

/// Index right after the last visible descendant of `start_ix`.
pub(crate) fn subtree_end_ix(entries: &[LayerTreeEntry], start_ix: usize) -> usize {
    let start_depth = entries[start_ix].depth();
    let mut ix = start_ix + 1;
    while ix < entries.len() && entries[ix].depth() > start_depth {
        ix += 1;
    }
    ix
}

/// Top and bottom quarters of a row are edges, the rest drops into the row.
pub(crate) fn drop_area(y_in_row: f32, row_height: f32) -> DropArea {
    let edge = row_height / 4.;
    if y_in_row < edge {
        DropArea::Top
    } else if y_in_row >= row_height - edge {
        DropArea::Bottom
    } else {
        DropArea::Middle
    }
}

/// Row layout of the list, in the list's own coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RowMetrics {
    pub row_height: f32,
    pub scroll_y: f32,
    pub width: f32,
}

impl RowMetrics {
    pub fn row_top(&self, ix: usize) -> f32 {
        self.scroll_y + self.row_height * ix as f32
    }

    pub fn row_rect(&self, ix: usize) -> Rect {
        Rect::new(self.row_top(ix), 0., self.width, self.row_height)
    }

    /// Unindented line at the top edge of row `ix`.
    pub fn line(&self, ix: usize) -> Line {
        Line::new(0., self.row_top(ix), self.width)
    }
}

/// Turns the swapped container into an insertion point inside it.
///
/// When the container is the hovered row itself the drop goes into it: an outline for an
/// empty container, otherwise a line under the row. When it is an ancestor, the drop goes
/// next to the ancestor's child on the way to the hovered row.
pub(crate) fn raw_drop_target(
    tree: &LayerTree,
    entries: &[LayerTreeEntry],
    hovered_ix: usize,
    area: DropArea,
    swapped: &SwappedTarget,
    metrics: &RowMetrics,
) -> Option<RawDropTarget> {
    let hovered = entries.get(hovered_ix)?;

    if swapped.node == hovered.id {
        let rect = swapped.rect.unwrap_or_else(|| metrics.row_rect(hovered_ix));
        let has_child_nodes = tree.children(&hovered.id).ok()?.iter().any(|c| c.is_node());
        let (insertion, area) = if !has_child_nodes {
            (InsertionIndex::End, DropArea::InsideEmpty)
        } else if hovered.expanded {
            (InsertionIndex::At(0), area)
        } else {
            (InsertionIndex::End, area)
        };
        return Some(RawDropTarget {
            node: hovered.id.clone(),
            insertion,
            area,
            rect,
            line: metrics.line(hovered_ix + 1),
        });
    }

    let path = ancestor_path(tree, &hovered.id).ok()?;
    let container_ix = path.iter().position(|id| *id == swapped.node)?;
    let child = path.get(container_ix + 1)?;
    let position = tree.node(&swapped.node).ok()?.position_of(child)?;
    let child_ix = entries.iter().position(|entry| entry.id == *child)?;

    let (insertion, line_ix) = if area == DropArea::Top && child_ix == hovered_ix {
        (InsertionIndex::At(position), child_ix)
    } else {
        (
            InsertionIndex::At(position + 1),
            subtree_end_ix(entries, child_ix),
        )
    };
    let rect = entries
        .iter()
        .position(|entry| entry.id == swapped.node)
        .map_or_else(|| metrics.row_rect(child_ix), |ix| metrics.row_rect(ix));

    Some(RawDropTarget {
        node: swapped.node.clone(),
        insertion,
        area,
        rect,
        line: metrics.line(line_ix),
    })
}

/// Drop below the last row: append to the root.
pub(crate) fn raw_drop_target_after_last(
    tree: &LayerTree,
    entries: &[LayerTreeEntry],
    metrics: &RowMetrics,
) -> RawDropTarget {
    RawDropTarget {
        node: tree.root_id().clone(),
        insertion: InsertionIndex::End,
        area: DropArea::Bottom,
        rect: metrics.row_rect(0),
        line: metrics.line(entries.len()),
    }
}
