//! Shared setup for the editor integration tests.
//!
//! The default view maps device positions one-to-one onto world positions,
//! so coordinates below can be read as either.

#![allow(dead_code)]

use eframe::egui::{self, Pos2, pos2};

use linkdraw::constraint;
use linkdraw::model::{Endpoint, Entity, LinkId, NodeId};
use linkdraw::{Editor, EditorSession, EditorSettings, Palette, Token};

// Icon indices of the built-in palette.
pub const SELECT: usize = 0;
pub const TERMINAL: usize = 1;
pub const PROCESS: usize = 2;
pub const TANK: usize = 3;
pub const STRAIGHT: usize = 4;
pub const RECTILINEAR: usize = 5;
pub const ARC: usize = 6;

// Node template indices.
pub const TERMINAL_T: usize = 0;
pub const PROCESS_T: usize = 1;
pub const TANK_T: usize = 2;

pub fn editor() -> Editor {
    editor_with(|_| {})
}

pub fn editor_with(configure: impl FnOnce(&mut EditorSettings)) -> Editor {
    let mut settings = EditorSettings::default();
    configure(&mut settings);
    Editor::new(EditorSession::new(Palette::default(), settings))
}

pub fn place(editor: &mut Editor, template: usize, x: f32, y: f32) -> NodeId {
    editor
        .session
        .create_node_at(template, pos2(x, y))
        .unwrap()
}

pub fn press(editor: &mut Editor, x: f32, y: f32) {
    editor.dispatch(Token::MousePressed(pos2(x, y)));
}

pub fn move_to(editor: &mut Editor, x: f32, y: f32) {
    editor.dispatch(Token::MouseMoved(pos2(x, y)));
}

pub fn release(editor: &mut Editor, x: f32, y: f32) {
    editor.dispatch(Token::MouseReleased(pos2(x, y)));
}

/// Press, move halfway, press: the usual two-click link gesture.
pub fn draw_link(editor: &mut Editor, icon: usize, from: Pos2, to: Pos2) {
    editor.dispatch(Token::IconSelected(icon));
    press(editor, from.x, from.y);
    let mid = from + (to - from) * 0.5;
    move_to(editor, mid.x, mid.y);
    press(editor, to.x, to.y);
}

/// Two reference nodes 100 units apart, joined by a straight link.
pub fn connected_pair(editor: &mut Editor) -> (NodeId, NodeId, LinkId) {
    let a = place(editor, TERMINAL_T, 0.0, 0.0);
    let b = place(editor, TERMINAL_T, 100.0, 0.0);
    draw_link(editor, STRAIGHT, pos2(0.0, 0.0), pos2(100.0, 0.0));
    let link = only_link(editor);
    (a, b, link)
}

pub fn only_link(editor: &Editor) -> LinkId {
    let links: Vec<LinkId> = editor.session.graph.list_links().map(|(id, _)| id).collect();
    assert_eq!(links.len(), 1, "expected exactly one link");
    links[0]
}

/// Drawn position of a link endpoint.
pub fn endpoint_position(editor: &Editor, link: LinkId, end: Endpoint) -> Pos2 {
    let session = &editor.session;
    let link = session.graph.link(link).unwrap();
    let r = constraint::endpoint_ref(&session.scene, link, end).unwrap();
    session.scene.world_point(r).unwrap()
}

pub fn selected(editor: &Editor) -> Option<Entity> {
    editor.session.selected()
}

pub fn assert_near(a: Pos2, b: Pos2) {
    assert!(
        (a - b).length() < 1e-3,
        "expected {b:?}, got {a:?}"
    );
}

pub fn vec(x: f32, y: f32) -> egui::Vec2 {
    egui::vec2(x, y)
}
