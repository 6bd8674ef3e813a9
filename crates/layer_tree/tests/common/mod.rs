#![allow(dead_code)]

use gpui_manos_layer_tree::{
    DragSession, DropArea, ElementNode, ExpandState, InsertionIndex, KindRegistry, LayerDocument,
    LayerTree, Line, NodeCapability, NodeId, RawDropTarget, Rect, depth,
};

pub const ROW_HEIGHT: f32 = 24.;
pub const WIDTH: f32 = 240.;

/// `root[box1, box2, box3[box31, box32[box321]], box4, heading[bold], box5[box51[box511], box52]]`
pub fn fixture_document() -> LayerDocument {
    LayerDocument::new(
        ElementNode::new("root", "body")
            .child(ElementNode::new("box1", "box"))
            .child(ElementNode::new("box2", "box"))
            .child(
                ElementNode::new("box3", "box")
                    .child(ElementNode::new("box31", "box"))
                    .child(ElementNode::new("box32", "box").child(ElementNode::new("box321", "box"))),
            )
            .child(ElementNode::new("box4", "box"))
            .child(
                ElementNode::new("heading", "heading")
                    .child(ElementNode::new("bold", "bold").text("Title")),
            )
            .child(
                ElementNode::new("box5", "box")
                    .child(ElementNode::new("box51", "box").child(ElementNode::new("box511", "box")))
                    .child(ElementNode::new("box52", "box")),
            ),
    )
}

pub fn fixture() -> LayerTree {
    fixture_document().to_tree().unwrap()
}

pub fn registry() -> KindRegistry {
    KindRegistry::new()
        .kind("heading", NodeCapability::BLOCK)
        .kind("bold", NodeCapability::INLINE)
}

/// `root[y, card[slot[x, inner[deep]]], z]`: an open slot inside a closed card.
pub fn nested_fixture() -> LayerTree {
    LayerDocument::new(
        ElementNode::new("root", "body")
            .child(ElementNode::new("y", "box"))
            .child(
                ElementNode::new("card", "card").child(
                    ElementNode::new("slot", "box")
                        .child(ElementNode::new("x", "box"))
                        .child(
                            ElementNode::new("inner", "box")
                                .child(ElementNode::new("deep", "box")),
                        ),
                ),
            )
            .child(ElementNode::new("z", "box")),
    )
    .to_tree()
    .unwrap()
}

pub fn nested_registry() -> KindRegistry {
    KindRegistry::new().kind("card", NodeCapability::BLOCK)
}

pub fn expanded(ids: &[&str]) -> ExpandState {
    let mut expand = ExpandState::new();
    for id in ids {
        expand.set_expanded(&NodeId::from(*id), true);
    }
    expand
}

pub fn session(tree: &LayerTree, dragged: &str) -> DragSession {
    let dragged = NodeId::from(dragged);
    DragSession {
        origin_depth: depth(tree, &dragged).unwrap(),
        dragged,
    }
}

/// Raw target inside `node`, with a line at the top edge of row `row`.
pub fn raw_target(node: &str, insertion: InsertionIndex, row: usize) -> RawDropTarget {
    let y = row as f32 * ROW_HEIGHT;
    RawDropTarget {
        node: node.into(),
        insertion,
        area: DropArea::Bottom,
        rect: Rect::new(y, 0., WIDTH, ROW_HEIGHT),
        line: Line::new(0., y, WIDTH),
    }
}

pub fn dump(tree: &LayerTree) -> String {
    let mut out = String::new();
    let mut stack = vec![(tree.root_id().clone(), 0usize)];
    while let Some((id, level)) = stack.pop() {
        let node = tree.node(&id).unwrap();
        out.push_str(&"  ".repeat(level));
        out.push_str(id.as_str());
        out.push('\n');
        stack.extend(node.child_nodes().rev().map(|child| (child.clone(), level + 1)));
    }
    out
}
