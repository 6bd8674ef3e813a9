mod common;

use common::{
    expanded, fixture, nested_fixture, nested_registry, raw_target, registry, session,
};
use gpui_manos_layer_tree::{
    AncestorResolver, DepthShiftEngine, DragSession, DropArea, DropCandidate, InsertionIndex,
    LayerTree, NodeId, Rect, TreeConfig, can_accept_child, depth,
};
use proptest::prelude::*;

const DRAGGABLE: &[&str] = &[
    "box1", "box2", "box3", "box31", "box32", "box321", "box4", "heading", "box5", "box51",
    "box511", "box52",
];

const NODES: &[&str] = &[
    "root", "box1", "box2", "box3", "box31", "box32", "box321", "box4", "heading", "bold", "box5",
    "box51", "box511", "box52",
];

const EXPANDABLE: &[&str] = &["box3", "box32", "heading", "box5", "box51"];

const NESTED_NODES: &[&str] = &["root", "y", "card", "slot", "x", "inner", "deep", "z"];

const NESTED_DRAGGABLE: &[&str] = &["y", "card", "slot", "x", "inner", "deep", "z"];

const NESTED_EXPANDABLE: &[&str] = &["card", "slot", "inner"];

fn area() -> impl Strategy<Value = DropArea> {
    prop_oneof![
        Just(DropArea::Top),
        Just(DropArea::Bottom),
        Just(DropArea::Middle),
    ]
}

fn insertion() -> impl Strategy<Value = InsertionIndex> {
    prop_oneof![
        (0usize..8).prop_map(InsertionIndex::At),
        Just(InsertionIndex::End),
    ]
}

fn expanded_subset() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(EXPANDABLE, 0..=EXPANDABLE.len())
}

/// A session whose origin depth is the depth a drop into `target` lands at, so that a zero
/// shift asks for no depth change.
fn session_landing_in(tree: &LayerTree, dragged: &str, target: &str) -> DragSession {
    let mut drag = session(tree, dragged);
    drag.origin_depth = depth(tree, &NodeId::from(target)).unwrap() + 1;
    drag
}

/// The ids in the subtree of `id`, `id` included.
fn subtree(tree: &LayerTree, id: &NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id.clone()];
    while let Some(next) = stack.pop() {
        stack.extend(tree.node(&next).unwrap().child_nodes().cloned());
        out.push(next);
    }
    out
}

proptest! {
    #[test]
    fn resolved_parent_is_never_inside_the_dragged_subtree(
        dragged in proptest::sample::select(DRAGGABLE),
        hovered in proptest::sample::select(NODES),
        area in area(),
        insertion in insertion(),
        shift in -4i32..=4,
        open in expanded_subset()
    ) {
        let tree = fixture();
        let registry = registry();
        let expand = expanded(&open);
        let config = TreeConfig::default();
        let dragged_id = NodeId::from(dragged);

        let candidate = DropCandidate {
            node: hovered.into(),
            area,
            rect: Rect::default(),
        };
        let swapped = AncestorResolver::new(&tree, &registry)
            .swap_drop_target(Some(&candidate), Some(&dragged_id));
        let forbidden = subtree(&tree, &dragged_id);
        prop_assert!(!forbidden.contains(&swapped.node));

        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let drag = session(&tree, dragged);
        let raw = raw_target(swapped.node.as_str(), insertion, 3);
        let resolved = engine.resolve(Some(&drag), Some(&raw), shift).unwrap();
        prop_assert!(!forbidden.contains(&resolved.parent));
    }

    #[test]
    fn zero_shift_returns_the_raw_target(
        dragged in proptest::sample::select(DRAGGABLE),
        target in proptest::sample::select(NODES),
        insertion in insertion(),
        open in expanded_subset()
    ) {
        let tree = fixture();
        let registry = registry();
        let expand = expanded(&open);
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);

        let drag = session_landing_in(&tree, dragged, target);
        let raw = raw_target(target, insertion, 2);
        let resolved = engine.resolve(Some(&drag), Some(&raw), 0).unwrap();

        let child_count = tree.children(&raw.node).unwrap().len();
        prop_assert_eq!(resolved.parent, raw.node.clone());
        prop_assert_eq!(resolved.insertion, raw.insertion.clamped(child_count));
    }

    #[test]
    fn resolve_is_pure(
        dragged in proptest::sample::select(DRAGGABLE),
        target in proptest::sample::select(NODES),
        insertion in insertion(),
        shift in -4i32..=4,
        open in expanded_subset()
    ) {
        let tree = fixture();
        let registry = registry();
        let expand = expanded(&open);
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);

        let drag = session(&tree, dragged);
        let raw = raw_target(target, insertion, 6);
        let first = engine.resolve(Some(&drag), Some(&raw), shift);
        let second = engine.resolve(Some(&drag), Some(&raw), shift);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn shifted_drops_move_toward_the_desired_depth(
        dragged in proptest::sample::select(DRAGGABLE),
        target in proptest::sample::select(NODES),
        insertion in insertion(),
        shift in -4i32..=4,
        open in expanded_subset()
    ) {
        let tree = fixture();
        let registry = registry();
        let expand = expanded(&open);
        let config = TreeConfig::default();
        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);

        let drag = session(&tree, dragged);
        let raw = raw_target(target, insertion, 6);
        let resolved = engine.resolve(Some(&drag), Some(&raw), shift).unwrap();

        let current = depth(&tree, &raw.node).unwrap() as i64 + 1;
        let desired = drag.origin_depth as i64 + i64::from(shift);
        let placed = depth(&tree, &resolved.parent).unwrap() as i64 + 1;
        let line = resolved.placement.as_line().unwrap();
        prop_assert_eq!(line.x, placed as f32 * config.indent);

        if resolved.parent != raw.node {
            prop_assert!(placed != current);
            if desired < current {
                prop_assert!(desired <= placed && placed < current);
            } else {
                prop_assert!(current < placed && placed <= desired);
            }
        }
    }

    #[test]
    fn resolved_parent_accepts_children(
        dragged in proptest::sample::select(NESTED_DRAGGABLE),
        hovered in proptest::sample::select(NESTED_NODES),
        area in area(),
        insertion in insertion(),
        shift in -4i32..=4,
        origin_depth in 1usize..=4,
        open in proptest::sample::subsequence(NESTED_EXPANDABLE, 0..=NESTED_EXPANDABLE.len())
    ) {
        let tree = nested_fixture();
        let registry = nested_registry();
        let expand = expanded(&open);
        let config = TreeConfig::default();
        let dragged_id = NodeId::from(dragged);

        let candidate = DropCandidate {
            node: hovered.into(),
            area,
            rect: Rect::default(),
        };
        let swapped = AncestorResolver::new(&tree, &registry)
            .swap_drop_target(Some(&candidate), Some(&dragged_id));

        let engine = DepthShiftEngine::new(&tree, &registry, &expand, &config);
        let drag = DragSession {
            dragged: dragged_id,
            origin_depth,
        };
        let raw = raw_target(swapped.node.as_str(), insertion, 4);
        let resolved = engine.resolve(Some(&drag), Some(&raw), shift).unwrap();
        prop_assert!(can_accept_child(&registry, &tree, &resolved.parent));
    }
}
