//! Saving and loading diagrams through the editor commands.

mod common;

use common::*;
use eframe::egui::pos2;

use linkdraw::model::{EdgeStyle, Endpoint, Entity};
use linkdraw::persist::SavedDiagram;
use linkdraw::session::{EditorEvent, StatusLevel};
use linkdraw::{Editor, Token};

/// Three nodes, a rectilinear link, an arc with a waypoint and a link
/// whose end was left free.
fn sample_diagram() -> Editor {
    let mut ed = editor_with(|s| s.allow_unconnected_links = true);
    place(&mut ed, TERMINAL_T, 0.0, 0.0);
    let b = place(&mut ed, PROCESS_T, 200.0, 0.0);
    place(&mut ed, TANK_T, 200.0, 200.0);

    draw_link(&mut ed, RECTILINEAR, pos2(0.0, 0.0), pos2(160.0, 0.0));

    ed.dispatch(Token::IconSelected(ARC));
    press(&mut ed, 200.0, 25.0);
    move_to(&mut ed, 250.0, 100.0);
    press(&mut ed, 300.0, 100.0);
    press(&mut ed, 200.0, 170.0);

    ed.dispatch(Token::IconSelected(STRAIGHT));
    press(&mut ed, 200.0, 230.0);
    move_to(&mut ed, 300.0, 300.0);
    press(&mut ed, 300.0, 300.0);
    move_to(&mut ed, 350.0, 300.0);
    ed.dispatch(Token::FinishLink);

    ed.session.select(Some(Entity::Node(b)));
    ed.dispatch(Token::OpenProperties);
    ed.dispatch(Token::TextChanged {
        field: linkdraw::handler::Field::Label,
        value: "Mixer".into(),
    });
    ed.dispatch(Token::Apply);
    ed.session.select(None);

    assert_eq!(ed.session.graph.node_count(), 3);
    assert_eq!(ed.session.graph.link_count(), 3);
    ed
}

fn save_and_reload(ed: &mut Editor, path: &std::path::Path) {
    ed.dispatch(Token::SetFilePath(path.display().to_string()));
    ed.dispatch(Token::Save);
    assert_eq!(
        ed.drain_events(),
        vec![EditorEvent::DiagramSaved(path.to_path_buf())]
    );
    ed.dispatch(Token::New);
    assert_eq!(ed.session.graph.node_count(), 0);
    ed.dispatch(Token::Load);
    assert_eq!(
        ed.drain_events(),
        vec![EditorEvent::DiagramLoaded(path.to_path_buf())]
    );
}

#[test]
fn round_trip_keeps_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plant.json");
    let mut ed = sample_diagram();
    let before = SavedDiagram::capture(&ed.session.graph, &ed.session.scene);

    save_and_reload(&mut ed, &path);
    let after = SavedDiagram::capture(&ed.session.graph, &ed.session.scene);

    assert_eq!(after.nodes.len(), before.nodes.len());
    assert_eq!(after.links.len(), before.links.len());
    for (a, b) in after.nodes.iter().zip(&before.nodes) {
        assert_eq!(a.template, b.template);
        assert_eq!(a.position, b.position);
        assert_eq!(a.label, b.label);
    }
    for (a, b) in after.links.iter().zip(&before.links) {
        assert_eq!(a.style, b.style);
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
        assert_eq!(a.points.len(), b.points.len());
    }

    let styles: Vec<_> = after.links.iter().map(|l| l.style).collect();
    assert!(styles.contains(&EdgeStyle::Arc));
    assert!(styles.iter().any(|s| matches!(s, EdgeStyle::Rectilinear(_))));
    assert!(after.links.iter().any(|l| l.end.is_none()));
    assert_eq!(after.nodes[1].label, "Mixer");
}

#[test]
fn reloaded_links_still_follow_their_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plant.json");
    let mut ed = sample_diagram();
    save_and_reload(&mut ed, &path);

    let (tank, _) = ed.session.graph.list_nodes().nth(2).unwrap();
    let (arc, _) = ed.session.graph.list_links().nth(1).unwrap();
    let (free, _) = ed.session.graph.list_links().nth(2).unwrap();
    let free_end = endpoint_position(&ed, free, Endpoint::End);

    let session = &mut ed.session;
    linkdraw::constraint::move_node(&mut session.scene, &mut session.graph, tank, vec(10.0, 0.0));

    assert_near(endpoint_position(&ed, arc, Endpoint::End), pos2(210.0, 170.0));
    assert_near(endpoint_position(&ed, free, Endpoint::Start), pos2(210.0, 230.0));
    assert_near(endpoint_position(&ed, free, Endpoint::End), free_end);
}

#[test]
fn bound_endpoints_come_from_the_node_not_the_file() {
    let mut ed = editor();
    let saved = SavedDiagram::from_json(
        r#"{
            "version": 1,
            "nodes": [
                { "template": 1, "position": { "x": 0.0, "y": 0.0 } },
                { "template": 1, "position": { "x": 200.0, "y": 0.0 } }
            ],
            "links": [
                {
                    "template": 0,
                    "style": "Straight",
                    "points": [ { "x": -999.0, "y": -999.0 }, { "x": 999.0, "y": 999.0 } ],
                    "start": { "node": 0, "point": "CP_E" },
                    "end": { "node": 1, "point": "CP_W" }
                }
            ]
        }"#,
    )
    .unwrap();
    ed.session.restore(saved).unwrap();

    let link = only_link(&ed);
    assert_near(endpoint_position(&ed, link, Endpoint::Start), pos2(40.0, 0.0));
    assert_near(endpoint_position(&ed, link, Endpoint::End), pos2(160.0, 0.0));
}

#[test]
fn unknown_connection_point_leaves_the_end_free() {
    let mut ed = editor();
    let saved = SavedDiagram::from_json(
        r#"{
            "nodes": [ { "template": 1, "position": { "x": 0.0, "y": 0.0 } } ],
            "links": [
                {
                    "template": 0,
                    "style": "Straight",
                    "points": [ { "x": 5.0, "y": 5.0 }, { "x": 80.0, "y": 5.0 } ],
                    "start": { "node": 0, "point": "CP_Nowhere" }
                }
            ]
        }"#,
    )
    .unwrap();
    ed.session.restore(saved).unwrap();

    let link = only_link(&ed);
    assert!(ed.session.graph.link(link).unwrap().start.is_none());
    assert_near(endpoint_position(&ed, link, Endpoint::Start), pos2(5.0, 5.0));
    assert_eq!(
        ed.session.status.as_ref().map(|s| s.level),
        Some(StatusLevel::Error)
    );
}

#[test]
fn failed_load_keeps_the_current_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let mut ed = editor();
    connected_pair(&mut ed);

    ed.dispatch(Token::SetFilePath(
        dir.path().join("missing.json").display().to_string(),
    ));
    ed.dispatch(Token::Load);
    assert_eq!(ed.session.graph.node_count(), 2);
    assert_eq!(ed.session.graph.link_count(), 1);
    assert!(ed.drain_events().is_empty());
    assert_eq!(
        ed.session.status.as_ref().map(|s| s.level),
        Some(StatusLevel::Error)
    );

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    ed.dispatch(Token::SetFilePath(garbage.display().to_string()));
    ed.dispatch(Token::Load);
    assert_eq!(ed.session.graph.node_count(), 2);
}
