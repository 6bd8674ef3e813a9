use std::{ops::Range, rc::Rc};

use gpui::{
    App, AppContext as _, Context, ElementId, Entity, EntityId, EventEmitter, FocusHandle,
    InteractiveElement as _, IntoElement, ListSizingBehavior, ParentElement as _, Pixels, Point,
    Render, RenderOnce, ScrollStrategy, SharedString, StatefulInteractiveElement as _,
    StyleRefinement, Styled, Task, UniformListScrollHandle, Window, div,
    prelude::FluentBuilder as _, px, uniform_list,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use gpui_manos_layer_tree::{
    DepthShiftEngine, DragController, DragEndEvent, DropCandidate, ExpandState, FocusRetention,
    KindRegistry, LayerTree, NavCommand, NavKey, NodeId, Placement, ResolvedDropTarget,
    SelectionSync, TreeConfig, TreeError, handle_click, handle_key, shift_for_delta,
};
use web_time::Instant;

use crate::entries::{
    LayerTreeEntry, RowMetrics, build_entries, drop_area, raw_drop_target,
    raw_drop_target_after_last, subtree_end_ix,
};

const CONTEXT: &str = "LayerTree";

type RenderItem =
    Rc<dyn Fn(usize, &LayerTreeEntry, LayerTreeRowState, &mut Window, &mut App) -> ListItem>;

/// Create a [`LayerTreeView`].
pub fn layer_tree_view<R>(state: &Entity<LayerTreeState>, render_item: R) -> LayerTreeView
where
    R: Fn(usize, &LayerTreeEntry, LayerTreeRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    LayerTreeView::new(state, render_item)
}

#[derive(Clone)]
struct LayerDrag {
    tree_id: EntityId,
    node_id: NodeId,
    label: SharedString,
}

struct DragGhost {
    label: SharedString,
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .px(px(8.))
            .py(px(4.))
            .rounded(px(6.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.drag_border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LayerTreeRowState {
    pub selected: bool,
    pub dragging: bool,
    /// The row is an empty container that will receive the drop.
    pub drop_inside: bool,
}

/// Decisions the host applies to its own document store.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerTreeEvent {
    Moved(DragEndEvent),
    Delete(NodeId),
    Selected(NodeId),
}

/// State for the layer tree: the tree itself, expansion, selection and the drag session.
pub struct LayerTreeState {
    focus_handle: FocusHandle,
    tree: LayerTree,
    registry: KindRegistry,
    config: TreeConfig,
    expand: ExpandState,
    entries: Vec<LayerTreeEntry>,
    selected: Option<NodeId>,
    selection_sync: SelectionSync,
    focus: FocusRetention,
    drag: DragController,
    drag_start_x: Option<Pixels>,
    resolved: Option<ResolvedDropTarget>,
    hold_deadline: Option<Instant>,
    hold_task: Option<Task<()>>,
    row_height: Pixels,
    scrollbar_state: ScrollbarState,
    scroll_handle: UniformListScrollHandle,
    render_item: RenderItem,
}

impl EventEmitter<LayerTreeEvent> for LayerTreeState {}

impl LayerTreeState {
    pub fn new(tree: LayerTree, cx: &mut App) -> Self {
        let config = TreeConfig::default();
        let registry = KindRegistry::new();
        let expand = ExpandState::new();
        let entries = build_entries(&tree, &registry, &expand);
        Self {
            focus_handle: cx.focus_handle(),
            drag: DragController::new(&config),
            tree,
            registry,
            config,
            expand,
            entries,
            selected: None,
            selection_sync: SelectionSync::new(),
            focus: FocusRetention::new(),
            drag_start_x: None,
            resolved: None,
            hold_deadline: None,
            hold_task: None,
            row_height: px(28.),
            scrollbar_state: ScrollbarState::default(),
            scroll_handle: UniformListScrollHandle::default(),
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("layer-tree-empty")),
        }
    }

    pub fn config(mut self, config: TreeConfig) -> Self {
        self.config = config.with_defaults();
        self.drag = DragController::new(&self.config);
        self
    }

    /// Set the indentation width used both by depth shifting and by the drop line.
    ///
    /// This should match the indentation used by your row renderer.
    pub fn indent_width(mut self, indent_width: Pixels) -> Self {
        self.config.indent = indent_width.into();
        self.config = self.config.with_defaults();
        self
    }

    /// Set the left offset for the drop indicator line.
    pub fn indent_offset(mut self, indent_offset: Pixels) -> Self {
        self.config.pad = indent_offset.into();
        self
    }

    /// Fallback row height, used until the list has measured a row.
    pub fn row_height(mut self, row_height: Pixels) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self.rebuild_entries();
        self
    }

    pub fn expanded(mut self, id: impl Into<NodeId>) -> Self {
        self.expand.set_expanded(&id.into(), true);
        self.rebuild_entries();
        self
    }

    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    pub fn entries(&self) -> &[LayerTreeEntry] {
        &self.entries
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// The live drop decision while a drag is over the tree.
    pub fn drop_target(&self) -> Option<&ResolvedDropTarget> {
        self.resolved.as_ref()
    }

    pub fn set_tree(&mut self, tree: LayerTree, cx: &mut Context<Self>) {
        self.finish_drag(true, cx);
        self.tree = tree;
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !self.tree.contains(id))
        {
            self.selected = None;
        }
        self.rebuild_entries();
        cx.notify();
    }

    /// Select a node from outside the tree, expanding its ancestors so the row is visible.
    pub fn set_selected(&mut self, id: Option<NodeId>, cx: &mut Context<Self>) {
        self.selected = id.filter(|id| self.tree.contains(id));
        if self
            .selection_sync
            .sync(&self.tree, &mut self.expand, self.selected.as_ref())
        {
            self.rebuild_entries();
        }
        self.scroll_to_selected();
        cx.notify();
    }

    /// Applies a committed move, expanding the new parent and keeping the node selected.
    pub fn apply_move(
        &mut self,
        event: &DragEndEvent,
        cx: &mut Context<Self>,
    ) -> Result<(), TreeError> {
        let parent = &event.drop_target.node_id;
        self.tree
            .move_node(&event.node_id, parent, event.drop_target.position)?;
        if ExpandState::is_expandable(&self.tree, parent) {
            self.expand.set_expanded(parent, true);
        }
        self.selected = Some(event.node_id.clone());
        self.rebuild_entries();
        self.scroll_to_selected();
        cx.notify();
        Ok(())
    }

    /// Removes a node and its subtree. A removed selection moves to the next visible row.
    pub fn remove_node(
        &mut self,
        id: &NodeId,
        cx: &mut Context<Self>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let neighbour = self.entry_ix(id).and_then(|ix| {
            let end = subtree_end_ix(&self.entries, ix);
            self.entries
                .get(end)
                .or_else(|| self.entries.get(ix.checked_sub(1)?))
                .map(|entry| entry.id().clone())
        });

        let removed = self.tree.remove_node(id)?;
        if self
            .selected
            .as_ref()
            .is_some_and(|selected| removed.contains(selected))
        {
            self.selected = neighbour;
        }
        self.rebuild_entries();
        cx.notify();
        Ok(removed)
    }

    fn rebuild_entries(&mut self) {
        self.entries = build_entries(&self.tree, &self.registry, &self.expand);
    }

    fn entry_ix(&self, id: &NodeId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    fn scroll_to_selected(&self) {
        if let Some(ix) = self.selected.as_ref().and_then(|id| self.entry_ix(id)) {
            self.scroll_handle.scroll_to_item(ix, ScrollStrategy::Center);
        }
    }

    fn metrics(&self, width: Pixels) -> RowMetrics {
        let scroll = self.scroll_handle.0.borrow();
        let row_height = scroll
            .last_item_size
            .map(|size| size.item.height)
            .unwrap_or(self.row_height);
        RowMetrics {
            row_height: row_height.into(),
            scroll_y: scroll.base_handle.offset().y.into(),
            width: width.into(),
        }
    }

    fn on_entry_click(
        &mut self,
        ix: usize,
        _event: &gpui::ClickEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(id) = self.entries.get(ix).map(|entry| entry.id().clone()) else {
            return;
        };
        window.focus(&self.focus_handle);
        if handle_click(&self.tree, &mut self.expand, self.selected.as_ref(), &id) {
            self.rebuild_entries();
        }
        self.selected = Some(id.clone());
        cx.emit(LayerTreeEvent::Selected(id));
        cx.notify();
    }

    fn on_key_down(
        &mut self,
        event: &gpui::KeyDownEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        if cx.has_active_drag() {
            return false;
        }
        let Some(key) = NavKey::from_key_name(event.keystroke.key.as_str()) else {
            return false;
        };

        let focus_within = self.focus_handle.contains_focused(window, cx);
        let outcome = handle_key(
            &self.tree,
            &mut self.expand,
            self.selected.as_ref(),
            key,
            focus_within,
        );
        if outcome.expansion_changed {
            self.rebuild_entries();
        }
        match outcome.command {
            Some(NavCommand::Select(id)) => {
                self.selected = Some(id.clone());
                self.scroll_to_selected();
                cx.emit(LayerTreeEvent::Selected(id));
            }
            Some(NavCommand::Delete(id)) => cx.emit(LayerTreeEvent::Delete(id)),
            None => {}
        }
        cx.notify();
        outcome.prevent_default
    }

    fn on_drag_start(
        &mut self,
        drag: &LayerDrag,
        _cursor_offset: Point<Pixels>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.cancel_hold();
        self.resolved = None;
        match self.drag.on_start(&self.tree, &self.registry, &drag.node_id) {
            Ok(_) => {
                self.drag_start_x = Some(window.mouse_position().x);
                self.selected = Some(drag.node_id.clone());
            }
            Err(err) => {
                tracing::warn!(
                    message = "dnd_layer_tree.drag_start",
                    node = %drag.node_id,
                    error = %err
                );
                self.drag_start_x = None;
            }
        }
        cx.notify();
    }

    fn on_drag_move(
        &mut self,
        event: &gpui::DragMoveEvent<LayerDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || !self.drag.is_dragging() {
            return;
        }
        if event.drag(cx).tree_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        let list_bounds = event.bounds;
        let now = Instant::now();
        if !list_bounds.contains(&mouse_position) {
            self.drag
                .swap_drop_target(&self.tree, &self.registry, None, now);
            self.drag.on_drop_target_change(None);
            self.schedule_hold(cx);
            self.refresh_drop_target(cx);
            return;
        }

        let metrics = self.metrics(list_bounds.size.width);
        let y_in_list: f32 = (mouse_position.y - list_bounds.origin.y).into();
        if y_in_list < metrics.row_top(self.entries.len()) {
            // Over a row; the row's own handler takes it from here.
            return;
        }

        let raw = raw_drop_target_after_last(&self.tree, &self.entries, &metrics);
        let candidate = DropCandidate {
            node: raw.node.clone(),
            area: raw.area,
            rect: raw.rect,
        };
        self.drag
            .swap_drop_target(&self.tree, &self.registry, Some(&candidate), now);
        self.drag.on_drop_target_change(Some(raw));
        self.update_shift(mouse_position.x);
        self.schedule_hold(cx);
        self.refresh_drop_target(cx);
    }

    fn on_row_drag_move(
        &mut self,
        row_ix: usize,
        event: &gpui::DragMoveEvent<LayerDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || !self.drag.is_dragging() {
            return;
        }
        if event.drag(cx).tree_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        if !event.bounds.contains(&mouse_position) {
            return;
        }
        let Some(node) = self.entries.get(row_ix).map(|entry| entry.id().clone()) else {
            return;
        };

        let metrics = self.metrics(event.bounds.size.width);
        let y_in_row: f32 = (mouse_position.y - event.bounds.origin.y).into();
        let candidate = DropCandidate {
            node,
            area: drop_area(y_in_row, event.bounds.size.height.into()),
            rect: metrics.row_rect(row_ix),
        };
        let swapped = self.drag.swap_drop_target(
            &self.tree,
            &self.registry,
            Some(&candidate),
            Instant::now(),
        );
        let raw = raw_drop_target(
            &self.tree,
            &self.entries,
            row_ix,
            candidate.area,
            &swapped,
            &metrics,
        );
        self.drag.on_drop_target_change(raw);
        self.update_shift(mouse_position.x);
        self.schedule_hold(cx);
        self.refresh_drop_target(cx);
    }

    fn update_shift(&mut self, mouse_x: Pixels) {
        let Some(start_x) = self.drag_start_x else {
            return;
        };
        let delta_x: f32 = (mouse_x - start_x).into();
        self.drag
            .on_shift_change(shift_for_delta(delta_x, self.config.shift_threshold));
    }

    fn refresh_drop_target(&mut self, cx: &mut Context<Self>) {
        let engine = DepthShiftEngine::new(&self.tree, &self.registry, &self.expand, &self.config);
        let resolved = self.drag.resolved(&engine);
        if self.resolved != resolved {
            self.resolved = resolved;
            cx.notify();
        }
    }

    /// Keeps one timer per armed hover; a new candidate replaces (and so cancels) the old one.
    fn schedule_hold(&mut self, cx: &mut Context<Self>) {
        let deadline = self.drag.hold_deadline();
        if deadline == self.hold_deadline {
            return;
        }
        self.hold_deadline = deadline;
        self.hold_task = deadline.map(|deadline| {
            let delay = deadline.saturating_duration_since(Instant::now());
            cx.spawn(async move |this, cx| {
                cx.background_executor().timer(delay).await;
                this.update(cx, |this, cx| this.on_hold_elapsed(cx)).ok();
            })
        });
    }

    fn on_hold_elapsed(&mut self, cx: &mut Context<Self>) {
        self.hold_deadline = None;
        let Some(expanded) = self
            .drag
            .poll_hold(&self.tree, &mut self.expand, Instant::now())
        else {
            return;
        };
        tracing::debug!(message = "dnd_layer_tree.hold_expand", node = %expanded);
        self.rebuild_entries();
        self.refresh_drop_target(cx);
        cx.notify();
    }

    fn cancel_hold(&mut self) {
        self.hold_deadline = None;
        self.hold_task = None;
    }

    /// Ends the drag session, emitting the move when it was committed over a valid target.
    fn finish_drag(&mut self, is_canceled: bool, cx: &mut Context<Self>) {
        let engine = DepthShiftEngine::new(&self.tree, &self.registry, &self.expand, &self.config);
        let event = self.drag.on_end(&engine, is_canceled);
        self.resolved = None;
        self.drag_start_x = None;
        self.cancel_hold();

        if let Some(event) = event {
            cx.emit(LayerTreeEvent::Moved(event));
        }
    }

    fn on_drop(&mut self, drag: &LayerDrag, _window: &mut Window, cx: &mut Context<Self>) {
        let is_canceled = drag.tree_id != cx.entity_id();
        self.finish_drag(is_canceled, cx);
        cx.notify();
    }
}

impl Render for LayerTreeState {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !cx.has_active_drag() && self.drag.is_dragging() {
            self.finish_drag(true, cx);
        }

        let focus_within = self.focus_handle.contains_focused(window, cx);
        if let Some(id) = self
            .focus
            .on_tree_changed(&self.tree, focus_within, self.selected.as_ref())
        {
            tracing::debug!(message = "dnd_layer_tree.refocus", node = %id);
            window.focus(&self.focus_handle);
        }

        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();
        let dragged = self.drag.session().map(|session| session.dragged.clone());
        let drop_inside = self
            .resolved
            .as_ref()
            .filter(|resolved| matches!(resolved.placement, Placement::Rect(_)))
            .map(|resolved| resolved.parent.clone());

        let indicator = self.resolved.as_ref().map(|resolved| {
            let color = cx.theme().drag_border;
            match resolved.placement {
                Placement::Line(line) => div()
                    .absolute()
                    .left(px(line.x))
                    .right_0()
                    .top(px(line.y))
                    .h(px(2.))
                    .bg(color),
                Placement::Rect(rect) => div()
                    .absolute()
                    .left(px(rect.left))
                    .top(px(rect.top))
                    .w(px(rect.width))
                    .h(px(rect.height))
                    .rounded(px(4.))
                    .border_1()
                    .border_color(color),
            }
        });

        div()
            .id("layer-tree-state")
            .size_full()
            .relative()
            .child(
                uniform_list("layers", self.entries.len(), {
                    cx.processor(move |state, visible_range: Range<usize>, window, cx| {
                        let drop_target_bg = cx.theme().drop_target;
                        let mut items = Vec::with_capacity(visible_range.len());
                        for ix in visible_range {
                            let entry = &state.entries[ix];
                            let row_state = LayerTreeRowState {
                                selected: state.selected.as_ref() == Some(entry.id()),
                                dragging: dragged.as_ref() == Some(entry.id()),
                                drop_inside: drop_inside.as_ref() == Some(entry.id()),
                            };

                            let item = (render_item)(ix, entry, row_state, window, cx);
                            let drag_value = LayerDrag {
                                tree_id: cx.entity_id(),
                                node_id: entry.id().clone(),
                                label: entry.label().clone(),
                            };

                            let row = div()
                                .id(ix)
                                .when(row_state.drop_inside, |this| this.bg(drop_target_bg))
                                .child(item.selected(row_state.selected))
                                .on_drag_move::<LayerDrag>(cx.listener(
                                    move |this, ev, window, cx| {
                                        this.on_row_drag_move(ix, ev, window, cx);
                                    },
                                ))
                                .on_drop::<LayerDrag>(cx.listener(Self::on_drop))
                                .on_click(cx.listener(move |this, click_event, window, cx| {
                                    this.on_entry_click(ix, click_event, window, cx);
                                }))
                                .when(entry.is_draggable(), |this| {
                                    let state_entity = state_entity.clone();
                                    this.on_drag(
                                        drag_value,
                                        move |drag, cursor_offset, window, cx| {
                                            state_entity.update(cx, |state, cx| {
                                                state.on_drag_start(
                                                    drag,
                                                    cursor_offset,
                                                    window,
                                                    cx,
                                                );
                                            });
                                            let label = drag.label.clone();
                                            cx.new(|_| DragGhost { label })
                                        },
                                    )
                                });

                            items.push(row);
                        }
                        items
                    })
                })
                .on_drag_move::<LayerDrag>(cx.listener(Self::on_drag_move))
                .on_drop::<LayerDrag>(cx.listener(Self::on_drop))
                .flex_grow()
                .size_full()
                .track_scroll(self.scroll_handle.clone())
                .with_sizing_behavior(ListSizingBehavior::Auto)
                .into_any_element(),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
            .when_some(indicator, |this, indicator| this.child(indicator))
    }
}

/// A layer tree element with drag and drop reparenting and keyboard navigation.
#[derive(IntoElement)]
pub struct LayerTreeView {
    id: ElementId,
    state: Entity<LayerTreeState>,
    style: StyleRefinement,
    render_item: RenderItem,
}

impl LayerTreeView {
    pub fn new<R>(state: &Entity<LayerTreeState>, render_item: R) -> Self
    where
        R: Fn(usize, &LayerTreeEntry, LayerTreeRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("layer-tree-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(render_item),
        }
    }
}

impl Styled for LayerTreeView {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for LayerTreeView {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        let state_entity = self.state.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .on_key_down(move |event, window, cx| {
                let handled =
                    state_entity.update(cx, |state, cx| state.on_key_down(event, window, cx));
                if handled {
                    window.prevent_default();
                    cx.stop_propagation();
                }
            })
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}
