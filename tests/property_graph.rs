//! Randomised checks of binding invariants.

mod common;

use common::*;
use eframe::egui::{pos2, vec2};
use proptest::prelude::*;

use linkdraw::error::EditorError;
use linkdraw::model::{Binding, EdgeStyle, Endpoint, Link, LinkId, NodeId};
use linkdraw::palette::ANCHOR_POINT;
use linkdraw::{Editor, HandlerKind};

#[derive(Clone, Debug)]
enum Op {
    AddNode { x: i8, y: i8 },
    Connect { a: u8, b: u8 },
    DeleteNode { idx: u8 },
    DeleteLink { idx: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<i8>(), any::<i8>()).prop_map(|(x, y)| Op::AddNode { x, y }),
        (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::Connect { a, b }),
        any::<u8>().prop_map(|idx| Op::DeleteNode { idx }),
        any::<u8>().prop_map(|idx| Op::DeleteLink { idx }),
    ]
}

fn nodes(ed: &Editor) -> Vec<NodeId> {
    ed.session.graph.list_nodes().map(|(id, _)| id).collect()
}

fn links(ed: &Editor) -> Vec<LinkId> {
    ed.session.graph.list_links().map(|(id, _)| id).collect()
}

fn anchor(node: NodeId) -> Option<Binding> {
    Some(Binding {
        node,
        point: ANCHOR_POINT.to_string(),
    })
}

fn apply_op(ed: &mut Editor, op: Op) -> Result<(), TestCaseError> {
    match op {
        Op::AddNode { x, y } => {
            place(ed, TERMINAL_T, f32::from(x) * 10.0, f32::from(y) * 10.0);
        }
        Op::Connect { a, b } => {
            let ids = nodes(ed);
            if ids.len() < 2 {
                return Ok(());
            }
            let (a, b) = (a as usize % ids.len(), b as usize % ids.len());
            if a == b {
                return Ok(());
            }
            let mut link = Link::new(0, EdgeStyle::Straight);
            link.start = anchor(ids[a]);
            link.end = anchor(ids[b]);
            ed.session.place_link(link).unwrap();
        }
        Op::DeleteNode { idx } => {
            let ids = nodes(ed);
            if ids.is_empty() {
                return Ok(());
            }
            let id = ids[idx as usize % ids.len()];
            let bound = ed.session.graph.links_bound_to(id).len();
            let (node_count, link_count) =
                (ed.session.graph.node_count(), ed.session.graph.link_count());
            match ed.session.delete_node(id) {
                Ok(_) => {
                    prop_assert_eq!(bound, 0);
                    prop_assert_eq!(ed.session.graph.node_count(), node_count - 1);
                }
                Err(EditorError::NodeConnected { links }) => {
                    prop_assert_eq!(links, bound);
                    prop_assert_eq!(ed.session.graph.node_count(), node_count);
                    prop_assert_eq!(ed.session.graph.link_count(), link_count);
                }
                Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
            }
        }
        Op::DeleteLink { idx } => {
            let ids = links(ed);
            if ids.is_empty() {
                return Ok(());
            }
            ed.session.delete_link(ids[idx as usize % ids.len()]);
        }
    }
    Ok(())
}

fn check_bindings(ed: &Editor) -> Result<(), TestCaseError> {
    let graph = &ed.session.graph;
    for (_, link) in graph.list_links() {
        for end in [Endpoint::Start, Endpoint::End] {
            if let Some(b) = link.binding(end) {
                prop_assert!(graph.node(b.node).is_some(), "binding to a deleted node");
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn connected_nodes_survive_delete(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut ed = editor();
        for op in ops {
            apply_op(&mut ed, op)?;
            check_bindings(&ed)?;
        }

        // Once every link is gone, every node can go too.
        for id in links(&ed) {
            ed.session.delete_link(id);
        }
        for id in nodes(&ed) {
            prop_assert!(ed.session.delete_node(id).is_ok());
        }
        prop_assert_eq!(ed.session.graph.node_count(), 0);
        prop_assert_eq!(ed.session.scene.constraint_count(), 0);
    }

    #[test]
    fn dragged_node_carries_its_endpoint_exactly(
        steps in prop::collection::vec((-40i8..=40, -40i8..=40), 1..25)
    ) {
        let mut ed = editor();
        place(&mut ed, PROCESS_T, 0.0, 0.0);
        let b = place(&mut ed, PROCESS_T, 200.0, 0.0);
        draw_link(&mut ed, STRAIGHT, pos2(40.0, 0.0), pos2(160.0, 0.0));
        let link = only_link(&ed);
        let start = endpoint_position(&ed, link, Endpoint::Start);

        let mut cursor = pos2(200.0, 10.0);
        press(&mut ed, cursor.x, cursor.y);
        prop_assert_eq!(ed.current(), Some(HandlerKind::Move));
        let mut total = vec2(0.0, 0.0);
        for (dx, dy) in steps {
            let step = vec2(f32::from(dx), f32::from(dy));
            cursor += step;
            total += step;
            move_to(&mut ed, cursor.x, cursor.y);
            prop_assert_eq!(
                endpoint_position(&ed, link, Endpoint::End),
                pos2(160.0, 0.0) + total
            );
        }
        release(&mut ed, cursor.x, cursor.y);

        prop_assert_eq!(ed.session.graph.node(b).unwrap().position, pos2(200.0, 0.0) + total);
        prop_assert_eq!(endpoint_position(&ed, link, Endpoint::Start), start);
    }
}
