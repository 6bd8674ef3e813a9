use crate::expand::ExpandState;
use crate::tree::{LayerTree, NodeId};

/// Nodes as they appear on screen: pre-order from the root, descending only into expanded
/// nodes. The root itself is listed first.
pub fn visible_order(tree: &LayerTree, expand: &ExpandState) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![tree.root_id().clone()];
    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get(id.as_str())
            && expand.is_expanded(tree, &id)
        {
            stack.extend(node.child_nodes().rev().cloned());
        }
        order.push(id);
    }
    order
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Backspace,
    Delete,
}

impl NavKey {
    /// Maps a keystroke name as reported by the windowing layer.
    pub fn from_key_name(key: &str) -> Option<Self> {
        Some(match key {
            "up" => Self::ArrowUp,
            "down" => Self::ArrowDown,
            "left" => Self::ArrowLeft,
            "right" => Self::ArrowRight,
            "space" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Select(NodeId),
    Delete(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub command: Option<NavCommand>,
    pub expansion_changed: bool,
    /// The host should stop the key from scrolling or reaching other handlers.
    pub prevent_default: bool,
}

impl KeyOutcome {
    fn command(command: NavCommand) -> Self {
        Self {
            command: Some(command),
            prevent_default: true,
            ..Default::default()
        }
    }

    fn expansion(changed: bool) -> Self {
        Self {
            expansion_changed: changed,
            prevent_default: changed,
            ..Default::default()
        }
    }
}

pub fn handle_key(
    tree: &LayerTree,
    expand: &mut ExpandState,
    selected: Option<&NodeId>,
    key: NavKey,
    focus_within: bool,
) -> KeyOutcome {
    if !focus_within {
        return KeyOutcome::default();
    }
    let Some(selected) = selected.filter(|id| tree.contains(id)) else {
        return KeyOutcome::default();
    };

    match key {
        NavKey::ArrowRight => {
            let collapsed = ExpandState::is_expandable(tree, selected)
                && !expand.is_expanded(tree, selected);
            if collapsed {
                expand.set_expanded(selected, true);
            }
            KeyOutcome::expansion(collapsed)
        }
        NavKey::ArrowLeft => {
            let expanded = selected != tree.root_id() && expand.is_expanded(tree, selected);
            if expanded {
                expand.set_expanded(selected, false);
            }
            KeyOutcome::expansion(expanded)
        }
        NavKey::Space => {
            let before = expand.is_expanded(tree, selected);
            KeyOutcome {
                prevent_default: true,
                ..KeyOutcome::expansion(expand.toggle(tree, selected) != before)
            }
        }
        NavKey::ArrowUp | NavKey::ArrowDown => {
            let order = visible_order(tree, expand);
            let next = order.iter().position(|id| id == selected).and_then(|ix| {
                if key == NavKey::ArrowUp {
                    ix.checked_sub(1)
                } else {
                    Some(ix + 1)
                }
            });
            match next.and_then(|ix| order.get(ix)) {
                Some(id) => KeyOutcome::command(NavCommand::Select(id.clone())),
                None => KeyOutcome {
                    prevent_default: true,
                    ..Default::default()
                },
            }
        }
        NavKey::Backspace | NavKey::Delete => {
            KeyOutcome::command(NavCommand::Delete(selected.clone()))
        }
    }
}

/// A pointer click on a row. The first click only selects it; clicking the already selected
/// row toggles it. Returns whether the expansion changed.
pub fn handle_click(
    tree: &LayerTree,
    expand: &mut ExpandState,
    selected: Option<&NodeId>,
    clicked: &NodeId,
) -> bool {
    if selected != Some(clicked) || !tree.contains(clicked) {
        return false;
    }
    let before = expand.is_expanded(tree, clicked);
    expand.toggle(tree, clicked) != before
}

/// Remembers whether focus was inside the tree at the last seen revision, so that focus can be
/// put back on the selected row after the tree is rebuilt underneath it.
#[derive(Debug, Clone, Default)]
pub struct FocusRetention {
    revision: Option<u64>,
    focus_within: bool,
}

impl FocusRetention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, revision: u64, focus_within: bool) {
        self.revision = Some(revision);
        self.focus_within = focus_within;
    }

    /// Returns the node to refocus when the tree changed while it had focus and has since lost it.
    pub fn on_tree_changed(
        &mut self,
        tree: &LayerTree,
        focus_within_now: bool,
        selected: Option<&NodeId>,
    ) -> Option<NodeId> {
        let changed = self.revision.is_some_and(|revision| revision != tree.revision());
        let had_focus = self.focus_within;
        self.observe(tree.revision(), focus_within_now);

        if !changed || !had_focus || focus_within_now {
            return None;
        }
        let selected = selected.filter(|id| tree.contains(id))?;
        self.focus_within = true;
        Some(selected.clone())
    }
}
