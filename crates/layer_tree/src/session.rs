use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::capability::{CapabilityRegistry, capability_of};
use crate::config::TreeConfig;
use crate::error::{DragError, TreeError};
use crate::expand::ExpandState;
use crate::hold::HoldTracker;
use crate::path::depth;
use crate::resolver::{AncestorResolver, SwappedTarget};
use crate::shift::DepthShiftEngine;
use crate::target::{DropCandidate, InsertionIndex, RawDropTarget, ResolvedDropTarget};
use crate::tree::{LayerTree, NodeId};

/// The node being dragged and its depth when the drag started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub dragged: NodeId,
    /// Edges between the root and the dragged node, fixed for the whole session.
    pub origin_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTargetRef {
    pub node_id: NodeId,
    pub position: InsertionIndex,
}

/// Emitted once per committed drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEndEvent {
    pub node_id: NodeId,
    pub drop_target: DropTargetRef,
}

/// Number of shift steps for a horizontal pointer travel of `delta_x`.
///
/// Truncates toward zero, so a step only counts once the full threshold has been crossed.
pub fn shift_for_delta(delta_x: f32, threshold: f32) -> i32 {
    if !delta_x.is_finite() || !threshold.is_finite() || threshold <= 0. {
        return 0;
    }
    (delta_x / threshold).trunc() as i32
}

/// Session-scoped drag state: dragged node, latest raw target, shift and the hold tracker.
///
/// One session at a time; starting a new one discards whatever was left of the previous.
#[derive(Debug, Clone)]
pub struct DragController {
    session: Option<DragSession>,
    raw_target: Option<RawDropTarget>,
    shift: i32,
    hold: HoldTracker<NodeId>,
}

impl DragController {
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            session: None,
            raw_target: None,
            shift: 0,
            hold: HoldTracker::new(config.hold_to_expand()),
        }
    }

    #[inline]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[inline]
    pub fn raw_target(&self) -> Option<&RawDropTarget> {
        self.raw_target.as_ref()
    }

    #[inline]
    pub fn shift(&self) -> i32 {
        self.shift
    }

    pub fn on_start(
        &mut self,
        tree: &LayerTree,
        registry: &dyn CapabilityRegistry,
        id: &NodeId,
    ) -> Result<&DragSession, DragError> {
        self.clear();

        if id == tree.root_id() {
            return Err(DragError::Root);
        }
        let capability =
            capability_of(registry, tree, id).ok_or_else(|| TreeError::NotFound(id.clone()))?;
        if capability.is_inline_only {
            return Err(DragError::InlineOnly(id.clone()));
        }
        let origin_depth = depth(tree, id)?;

        tracing::debug!(message = "layer_tree.drag.start", dragged = %id, origin_depth);
        Ok(self.session.insert(DragSession {
            dragged: id.clone(),
            origin_depth,
        }))
    }

    /// Swaps the collision layer's candidate for a legal container, and feeds the
    /// unresolved candidate to the hold-to-expand tracker.
    pub fn swap_drop_target(
        &mut self,
        tree: &LayerTree,
        registry: &dyn CapabilityRegistry,
        candidate: Option<&DropCandidate>,
        now: Instant,
    ) -> SwappedTarget {
        if self.session.is_some() {
            self.hold
                .set_data(candidate.map(|candidate| candidate.node.clone()), now);
        }
        AncestorResolver::new(tree, registry).swap_drop_target(
            candidate,
            self.session.as_ref().map(|session| &session.dragged),
        )
    }

    pub fn on_drop_target_change(&mut self, raw: Option<RawDropTarget>) {
        if self.session.is_none() {
            return;
        }
        self.raw_target = raw;
    }

    pub fn on_shift_change(&mut self, shift: i32) {
        if self.session.is_none() {
            return;
        }
        self.shift = shift;
    }

    /// When the hold tracker should be polled next.
    pub fn hold_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and(self.hold.deadline())
    }

    /// Expands the held node if it has been hovered long enough and is collapsed.
    pub fn poll_hold(
        &mut self,
        tree: &LayerTree,
        expand: &mut ExpandState,
        now: Instant,
    ) -> Option<NodeId> {
        self.session.as_ref()?;
        let held = self.hold.poll(now)?;
        if !ExpandState::is_expandable(tree, &held) || expand.is_expanded(tree, &held) {
            return None;
        }
        expand.set_expanded(&held, true);
        tracing::debug!(message = "layer_tree.drag.hold_expand", node = %held);
        Some(held)
    }

    pub fn resolved(&self, engine: &DepthShiftEngine<'_>) -> Option<ResolvedDropTarget> {
        engine.resolve(self.session.as_ref(), self.raw_target.as_ref(), self.shift)
    }

    /// Ends the session. Committed drags yield the final decision; either way all session
    /// state is cleared and the hold tracker released.
    pub fn on_end(
        &mut self,
        engine: &DepthShiftEngine<'_>,
        is_canceled: bool,
    ) -> Option<DragEndEvent> {
        let resolved = (!is_canceled).then(|| self.resolved(engine)).flatten();
        let session = self.session.take();
        self.clear();

        let (session, resolved) = (session?, resolved?);
        tracing::debug!(
            message = "layer_tree.drag.end",
            dragged = %session.dragged,
            parent = %resolved.parent
        );
        Some(DragEndEvent {
            node_id: session.dragged,
            drop_target: DropTargetRef {
                node_id: resolved.parent,
                position: resolved.insertion,
            },
        })
    }

    fn clear(&mut self) {
        self.session = None;
        self.raw_target = None;
        self.shift = 0;
        self.hold.reset();
    }
}
