use std::cmp::Ordering;

use crate::capability::{CapabilityRegistry, can_accept_child};
use crate::config::TreeConfig;
use crate::expand::ExpandState;
use crate::geometry::{Line, Placement};
use crate::path::{PathEntry, ancestor_path_with_positions};
use crate::session::DragSession;
use crate::target::{DropArea, InsertionIndex, RawDropTarget, ResolvedDropTarget};
use crate::tree::{LayerTree, NodeId};

/// Reinterprets a raw drop target at the depth the user asks for with horizontal movement.
///
/// Depths count edges from the root: the root's children sit at depth 1. A drop into node `n`
/// places the dragged node one level below `n`, so the line for a raw target is drawn at
/// `depth(n) + 1`, which is the length of `n`'s ancestor path.
///
/// Negative shifts move the drop out to an ancestor, but only from the bottom edge of a
/// container. Positive shifts move the drop into the expanded, accepting sibling right
/// above the insertion point, repeatedly. Whenever the shift cannot be honoured the raw
/// target is returned with its line indented to the current depth.
pub struct DepthShiftEngine<'a> {
    tree: &'a LayerTree,
    registry: &'a dyn CapabilityRegistry,
    expand: &'a ExpandState,
    config: &'a TreeConfig,
}

impl<'a> DepthShiftEngine<'a> {
    pub fn new(
        tree: &'a LayerTree,
        registry: &'a dyn CapabilityRegistry,
        expand: &'a ExpandState,
        config: &'a TreeConfig,
    ) -> Self {
        Self {
            tree,
            registry,
            expand,
            config,
        }
    }

    #[inline]
    pub fn tree(&self) -> &'a LayerTree {
        self.tree
    }

    pub fn resolve(
        &self,
        drag: Option<&DragSession>,
        raw: Option<&RawDropTarget>,
        shift: i32,
    ) -> Option<ResolvedDropTarget> {
        let (drag, raw) = (drag?, raw?);

        if raw.area == DropArea::InsideEmpty {
            return Some(ResolvedDropTarget {
                parent: raw.node.clone(),
                insertion: InsertionIndex::End,
                placement: Placement::Rect(raw.rect),
            });
        }

        let mut path = match ancestor_path_with_positions(self.tree, &raw.node) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(
                    message = "layer_tree.resolve",
                    target = %raw.node,
                    error = %err
                );
                return None;
            }
        };
        path.reverse();

        let current_depth = path.len();
        let desired_depth = drag.origin_depth as i64 + i64::from(shift);
        let child_count = self
            .tree
            .children(&raw.node)
            .map_or(0, |children| children.len());
        let without_shift = ResolvedDropTarget {
            parent: raw.node.clone(),
            insertion: raw.insertion.clamped(child_count),
            placement: Placement::Line(self.line_at(raw, current_depth)),
        };

        let shifted = match desired_depth.cmp(&(current_depth as i64)) {
            Ordering::Equal => None,
            Ordering::Less => {
                let steps = (current_depth as i64 - desired_depth) as usize;
                self.shift_shallower(drag, raw, &path, steps)
            }
            Ordering::Greater => {
                let steps = (desired_depth - current_depth as i64) as usize;
                self.shift_deeper(drag, raw, current_depth, steps)
            }
        };

        if let Some(resolved) = shifted.as_ref() {
            tracing::trace!(
                message = "layer_tree.resolve.shifted",
                dragged = %drag.dragged,
                shift,
                parent = %resolved.parent
            );
        }
        Some(shifted.unwrap_or(without_shift))
    }

    fn line_at(&self, raw: &RawDropTarget, depth: usize) -> Line {
        raw.line.at_depth(depth, self.config.indent, self.config.pad)
    }

    /// Reparent to an ancestor of the raw target. Only legal when the insertion point is at
    /// the very bottom of the target's children, once the dragged node is discounted. Ancestors
    /// that do not accept children are skipped toward the raw target.
    fn shift_shallower(
        &self,
        drag: &DragSession,
        raw: &RawDropTarget,
        path: &[PathEntry],
        steps: usize,
    ) -> Option<ResolvedDropTarget> {
        let children = self.tree.children(&raw.node).ok()?;
        let mut index = raw.insertion.resolve(children.len());
        if children.get(index).and_then(|child| child.as_node()) == Some(&drag.dragged) {
            index += 1;
        }
        if index != children.len() {
            return None;
        }

        let farthest = steps.min(path.len().saturating_sub(1));
        let difference = (1..=farthest)
            .rev()
            .find(|&difference| {
                can_accept_child(self.registry, self.tree, &path[difference].node)
            })?;

        Some(ResolvedDropTarget {
            parent: path[difference].node.clone(),
            insertion: InsertionIndex::At(path[difference - 1].position + 1),
            placement: Placement::Line(self.line_at(raw, path.len() - difference)),
        })
    }

    /// Descend into the sibling right above the insertion point, as long as it is expanded
    /// and accepts children, at most `steps` times.
    fn shift_deeper(
        &self,
        drag: &DragSession,
        raw: &RawDropTarget,
        current_depth: usize,
        steps: usize,
    ) -> Option<ResolvedDropTarget> {
        let mut container = raw.node.clone();
        let mut index = raw
            .insertion
            .resolve(self.tree.children(&container).ok()?.len());
        let mut new_parent = None;
        let mut shifted = 0;

        while shifted < steps {
            let Some(candidate) = self.child_above(&container, index, &drag.dragged) else {
                break;
            };
            if !self.expand.is_expanded(self.tree, &candidate)
                || !can_accept_child(self.registry, self.tree, &candidate)
            {
                break;
            }
            index = self.tree.children(&candidate).map_or(0, |children| children.len());
            container = candidate.clone();
            new_parent = Some(candidate);
            shifted += 1;
        }

        Some(ResolvedDropTarget {
            parent: new_parent?,
            insertion: InsertionIndex::End,
            placement: Placement::Line(self.line_at(raw, current_depth + shifted)),
        })
    }

    /// The node immediately before `index` in `parent`, skipping the dragged node since it
    /// leaves its slot once dropped.
    fn child_above(&self, parent: &NodeId, index: usize, dragged: &NodeId) -> Option<NodeId> {
        let children = self.tree.children(parent).ok()?;
        let index = index.min(children.len());
        let mut above = children.get(index.checked_sub(1)?)?;
        if above.as_node() == Some(dragged) {
            above = children.get(index.checked_sub(2)?)?;
        }
        above.as_node().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{KindRegistry, NodeCapability};
    use crate::geometry::Rect;

    fn fixture() -> (LayerTree, KindRegistry, ExpandState) {
        let mut tree = LayerTree::new("root", "body", "Body");
        let root = tree.root_id().clone();
        let a = tree.push_node(&root, "a", "box", "a").unwrap();
        tree.push_node(&a, "a1", "box", "a1").unwrap();
        let a2 = tree.push_node(&a, "a2", "box", "a2").unwrap();
        tree.push_node(&a2, "a21", "box", "a21").unwrap();
        tree.push_node(&a2, "a22", "box", "a22").unwrap();
        tree.push_node(&root, "b", "box", "b").unwrap();
        let mut expand = ExpandState::new();
        expand.set_expanded(&"a".into(), true);
        expand.set_expanded(&"a2".into(), true);
        let registry = KindRegistry::new().fallback(NodeCapability::CONTAINER);
        (tree, registry, expand)
    }

    fn raw(node: &str, insertion: InsertionIndex) -> RawDropTarget {
        RawDropTarget {
            node: node.into(),
            insertion,
            area: DropArea::Middle,
            rect: Rect::new(0., 0., 200., 24.),
            line: Line::new(0., 48., 200.),
        }
    }

    fn session(dragged: &str, origin_depth: usize) -> DragSession {
        DragSession {
            dragged: dragged.into(),
            origin_depth,
        }
    }

    #[test]
    fn missing_inputs_resolve_to_none() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        assert_eq!(engine.resolve(None, Some(&raw("a", InsertionIndex::End)), 0), None);
        assert_eq!(engine.resolve(Some(&session("b", 1)), None, 0), None);
    }

    #[test]
    fn inside_empty_ignores_shift() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let mut target = raw("a1", InsertionIndex::At(0));
        target.area = DropArea::InsideEmpty;
        let resolved = engine.resolve(Some(&session("b", 1)), Some(&target), 5).unwrap();
        assert_eq!(resolved.parent, "a1".into());
        assert_eq!(resolved.insertion, InsertionIndex::End);
        assert_eq!(resolved.placement, Placement::Rect(target.rect));
    }

    #[test]
    fn deeper_shift_descends_repeatedly() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("root", InsertionIndex::At(1));
        let resolved = engine
            .resolve(Some(&session("b", 1)), Some(&target), 2)
            .unwrap();
        assert_eq!(resolved.parent, "a2".into());
        assert_eq!(resolved.insertion, InsertionIndex::End);
        assert_eq!(resolved.placement.as_line().unwrap().x, 3. * 16.);
    }

    #[test]
    fn deeper_shift_stops_at_collapsed_sibling() {
        let (tree, registry, mut expand) = fixture();
        expand.set_expanded(&"a2".into(), false);
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("root", InsertionIndex::At(1));
        let resolved = engine
            .resolve(Some(&session("b", 1)), Some(&target), 5)
            .unwrap();
        assert_eq!(resolved.parent, "a".into());
        assert_eq!(resolved.placement.as_line().unwrap().x, 2. * 16.);
    }

    #[test]
    fn deeper_shift_skips_dragged_sibling() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        // Insertion right below `a2` while dragging `a2`: the sibling above becomes `a1`,
        // which is childless and therefore not expanded.
        let target = raw("a", InsertionIndex::At(2));
        let resolved = engine
            .resolve(Some(&session("a2", 2)), Some(&target), 1)
            .unwrap();
        assert_eq!(resolved.parent, "a".into());
        assert_eq!(resolved.insertion, InsertionIndex::At(2));
    }

    #[test]
    fn shallower_shift_is_clamped_at_root() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("a2", InsertionIndex::End);
        let resolved = engine
            .resolve(Some(&session("b", 1)), Some(&target), -10)
            .unwrap();
        assert_eq!(resolved.parent, "root".into());
        assert_eq!(resolved.insertion, InsertionIndex::At(1));
        assert_eq!(resolved.placement.as_line().unwrap().x, 16.);
    }

    #[test]
    fn shallower_shift_stops_at_requested_depth() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("a2", InsertionIndex::End);
        let resolved = engine
            .resolve(Some(&session("b", 1)), Some(&target), 1)
            .unwrap();
        assert_eq!(resolved.parent, "a".into());
        assert_eq!(resolved.insertion, InsertionIndex::At(2));
        assert_eq!(resolved.placement.as_line().unwrap().x, 2. * 16.);
    }

    #[test]
    fn shallower_shift_skips_ancestors_that_refuse_children() {
        // root[y, card[slot[x]]] where a card is a closed block holding an open slot.
        let mut tree = LayerTree::new("root", "body", "Body");
        let root = tree.root_id().clone();
        tree.push_node(&root, "y", "box", "y").unwrap();
        let card = tree.push_node(&root, "card", "card", "card").unwrap();
        let slot = tree.push_node(&card, "slot", "box", "slot").unwrap();
        tree.push_node(&slot, "x", "box", "x").unwrap();
        let registry = KindRegistry::new()
            .fallback(NodeCapability::CONTAINER)
            .kind("card", NodeCapability::BLOCK);
        let expand = ExpandState::new();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("slot", InsertionIndex::End);

        // One level up is the card: stay in the slot.
        let resolved = engine
            .resolve(Some(&session("y", 1)), Some(&target), 1)
            .unwrap();
        assert_eq!(resolved.parent, "slot".into());
        assert_eq!(resolved.insertion, InsertionIndex::End);

        // Two levels up passes the card and lands next to it in the root.
        let resolved = engine
            .resolve(Some(&session("y", 1)), Some(&target), 0)
            .unwrap();
        assert_eq!(resolved.parent, "root".into());
        assert_eq!(resolved.insertion, InsertionIndex::At(2));
    }

    #[test]
    fn unshifted_insertion_is_clamped_to_the_children() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("a2", InsertionIndex::At(9));
        let resolved = engine
            .resolve(Some(&session("b", 3)), Some(&target), 0)
            .unwrap();
        assert_eq!(resolved.parent, "a2".into());
        assert_eq!(resolved.insertion, InsertionIndex::At(2));
    }

    #[test]
    fn root_target_cannot_shift_shallower() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("root", InsertionIndex::End);
        let resolved = engine
            .resolve(Some(&session("a21", 3)), Some(&target), -3)
            .unwrap();
        assert_eq!(resolved.parent, "root".into());
        assert_eq!(resolved.insertion, InsertionIndex::End);
    }

    #[test]
    fn line_geometry_uses_config() {
        let (tree, registry, expand) = fixture();
        let config = TreeConfig {
            indent: 10.,
            pad: 3.,
            ..TreeConfig::default()
        };
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let target = raw("a", InsertionIndex::At(0));
        let resolved = engine
            .resolve(Some(&session("b", 2)), Some(&target), 0)
            .unwrap();
        assert_eq!(
            resolved.placement,
            Placement::Line(Line::new(23., 48., 177.))
        );
    }
}
