use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{h_flex, v_flex};
use gpui_dnd_layer_tree::{
    LayerTreeEntry, LayerTreeEvent, LayerTreeRowState, LayerTreeState, layer_tree_view,
};
use gpui_manos_layer_tree::{KindRegistry, LayerDocument, LayerTree, NodeId, TreeConfig};

const INDENT: f32 = 16.;
const PAD: f32 = 10.;

const DEMO_KINDS: &str = r#"{
    "kinds": {
        "heading": { "can_accept_child": false },
        "paragraph": { "can_accept_child": false },
        "image": { "can_accept_child": false },
        "bold": { "can_accept_child": false, "is_inline_only": true },
        "link": { "can_accept_child": false, "is_inline_only": true }
    }
}"#;

const DEMO_DOCUMENT: &str = r#"{
    "schema": "manos-layers",
    "version": 1,
    "root": {
        "id": "body", "kind": "body", "label": "Body",
        "children": [
            { "node": "element", "id": "header", "kind": "section", "label": "Header",
              "children": [
                { "node": "element", "id": "logo", "kind": "image", "label": "Logo" },
                { "node": "element", "id": "nav", "kind": "box", "label": "Navigation",
                  "children": [
                    { "node": "element", "id": "nav-home", "kind": "link", "label": "Home",
                      "children": [{ "node": "text", "text": "Home" }] },
                    { "node": "element", "id": "nav-docs", "kind": "link", "label": "Docs",
                      "children": [{ "node": "text", "text": "Docs" }] }
                  ] }
              ] },
            { "node": "element", "id": "hero", "kind": "section", "label": "Hero",
              "children": [
                { "node": "element", "id": "hero-title", "kind": "heading", "label": "Title",
                  "children": [
                    { "node": "text", "text": "Build " },
                    { "node": "element", "id": "hero-bold", "kind": "bold", "label": "Bold",
                      "children": [{ "node": "text", "text": "faster" }] }
                  ] },
                { "node": "element", "id": "hero-media", "kind": "box", "label": "Media",
                  "children": [
                    { "node": "element", "id": "hero-image", "kind": "image", "label": "Image" }
                  ] }
              ] },
            { "node": "element", "id": "content", "kind": "section", "label": "Content",
              "children": [
                { "node": "element", "id": "intro", "kind": "paragraph", "label": "Intro",
                  "children": [{ "node": "text", "text": "Lorem ipsum" }] },
                { "node": "element", "id": "columns", "kind": "box", "label": "Columns" }
              ] },
            { "node": "element", "id": "footer", "kind": "section", "label": "Footer" }
        ]
    }
}"#;

/// The demo page and the capabilities of its element kinds.
pub fn demo_layers() -> anyhow::Result<(LayerTree, KindRegistry)> {
    let registry = KindRegistry::from_json_str(DEMO_KINDS)?;
    let layers = LayerDocument::from_json_str(DEMO_DOCUMENT)?.to_tree()?;
    Ok((layers, registry))
}

pub struct LayersExample {
    tree: Entity<LayerTreeState>,
    selected: Option<NodeId>,
    last_event: Option<String>,
    _subscriptions: Vec<Subscription>,
}

impl LayersExample {
    pub fn view(
        layers: LayerTree,
        registry: KindRegistry,
        _window: &mut Window,
        cx: &mut App,
    ) -> Entity<Self> {
        let config = TreeConfig {
            indent: INDENT,
            pad: PAD,
            ..TreeConfig::default()
        };
        let tree = cx.new(|cx| {
            LayerTreeState::new(layers, cx)
                .config(config)
                .registry(registry)
                .expanded("header")
                .expanded("hero")
        });

        cx.new(|cx| {
            let subscription =
                cx.subscribe(&tree, |this: &mut Self, tree, event: &LayerTreeEvent, cx| {
                    this.on_tree_event(tree, event, cx);
                });
            Self {
                tree,
                selected: None,
                last_event: None,
                _subscriptions: vec![subscription],
            }
        })
    }

    fn on_tree_event(
        &mut self,
        tree: Entity<LayerTreeState>,
        event: &LayerTreeEvent,
        cx: &mut Context<Self>,
    ) {
        match event {
            LayerTreeEvent::Moved(moved) => {
                if let Err(err) = tree.update(cx, |tree, cx| tree.apply_move(moved, cx)) {
                    tracing::warn!(
                        message = "story.apply_move",
                        node = %moved.node_id,
                        error = %err
                    );
                }
                self.selected = Some(moved.node_id.clone());
                self.last_event = serde_json::to_string(moved).ok();
            }
            LayerTreeEvent::Delete(id) => {
                match tree.update(cx, |tree, cx| tree.remove_node(id, cx)) {
                    Ok(removed) => {
                        self.last_event =
                            Some(format!("removed {} node(s) under {id}", removed.len()));
                    }
                    Err(err) => {
                        tracing::warn!(message = "story.remove_node", node = %id, error = %err);
                    }
                }
                self.selected = tree.read(cx).selected().cloned();
            }
            LayerTreeEvent::Selected(id) => self.selected = Some(id.clone()),
        }
        cx.notify();
    }

    fn reveal(&mut self, id: &str, cx: &mut Context<Self>) {
        let id = NodeId::from(id);
        self.selected = Some(id.clone());
        self.tree
            .update(cx, |tree, cx| tree.set_selected(Some(id), cx));
        cx.notify();
    }
}

impl Render for LayersExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let document = self
            .tree
            .read(cx)
            .tree()
            .to_document()
            .map_err(|err| err.to_string())
            .and_then(|doc| doc.to_json_pretty().map_err(|err| err.to_string()))
            .unwrap_or_else(|err| format!("<{err}>"));
        let selected = self
            .selected
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<none>".to_string());

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(div().text_xl().font_weight(FontWeight::BOLD).child("Layers"))
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Drag a layer onto another row to move it. Drag left or right to move the drop out of, or into, the container next to the line. Hold over a collapsed layer to open it. Arrow keys move and fold, Space toggles, Delete removes."),
                    )
                    .child(
                        h_flex()
                            .gap_x_2()
                            .items_center()
                            .child(
                                div()
                                    .text_sm()
                                    .text_color(theme.muted_foreground)
                                    .child(format!("Selected: {selected}")),
                            )
                            .child(
                                Button::new("reveal-image")
                                    .label("Reveal hero image")
                                    .ghost()
                                    .on_click(cx.listener(|this, _, _window, cx| {
                                        this.reveal("hero-image", cx);
                                    })),
                            ),
                    )
                    .when_some(self.last_event.clone(), |this, last_event| {
                        this.child(
                            div()
                                .text_sm()
                                .text_color(theme.muted_foreground)
                                .child(format!("Last change: {last_event}")),
                        )
                    }),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        div()
                            .w(px(360.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .child(layer_tree_view(
                                &self.tree,
                                move |ix, entry, row_state, _window, cx| {
                                    render_layer_row(ix, entry, row_state, cx)
                                },
                            )),
                    )
                    .child(
                        div()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .p(px(12.))
                            .child(render_document(document)),
                    ),
            )
    }
}

fn render_layer_row(
    ix: usize,
    entry: &LayerTreeEntry,
    row_state: LayerTreeRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let chevron = match (entry.is_expandable(), entry.is_expanded()) {
        (false, _) => " ",
        (true, true) => "▾",
        (true, false) => "▸",
    };
    let label_color = if entry.is_draggable() || entry.depth() == 0 {
        theme.foreground
    } else {
        theme.muted_foreground
    };

    ListItem::new(ix)
        .pl(px(PAD) + px(INDENT) * entry.depth())
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .child(div().w(px(10.)).text_color(theme.muted_foreground).child(chevron))
                .child(div().text_color(label_color).child(entry.label().clone()))
                .child(
                    div()
                        .text_xs()
                        .text_color(theme.muted_foreground)
                        .child(entry.kind().clone()),
                ),
        )
}

fn render_document(text: String) -> impl IntoElement {
    let lines = text
        .lines()
        .map(|line| div().text_xs().child(line.to_string()));
    v_flex().gap_y_0p5().children(lines)
}
