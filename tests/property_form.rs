//! The property form, its unsaved-edit guard and the confirmation dialog.

mod common;

use common::*;

use linkdraw::handler::Field;
use linkdraw::model::{Entity, NodeId};
use linkdraw::session::EditorEvent;
use linkdraw::{Editor, HandlerKind, Token};

fn type_label(ed: &mut Editor, value: &str) {
    ed.dispatch(Token::TextChanged {
        field: Field::Label,
        value: value.to_string(),
    });
}

/// A selected process node with the form open and an unsaved label.
fn dirty_form() -> (Editor, NodeId) {
    let mut ed = editor();
    let a = place(&mut ed, PROCESS_T, 0.0, 0.0);
    ed.session.select(Some(Entity::Node(a)));
    ed.dispatch(Token::OpenProperties);
    type_label(&mut ed, "Feed pump");
    assert!(ed.session.form.dirty);
    (ed, a)
}

fn label_of(ed: &Editor, id: NodeId) -> String {
    ed.session.graph.node(id).unwrap().label.clone()
}

#[test]
fn form_shows_the_selection() {
    let mut ed = editor();
    let a = place(&mut ed, PROCESS_T, 0.0, 0.0);
    {
        let n = ed.session.graph.node_mut(a).unwrap();
        n.label = "Boiler".into();
        n.data = "t=90".into();
        n.datasource = Some("plc.7".into());
    }

    ed.session.select(Some(Entity::Node(a)));
    ed.dispatch(Token::OpenProperties);

    let form = &ed.session.form;
    assert!(form.visible);
    assert!(!form.dirty);
    assert_eq!(form.label, "Boiler");
    assert_eq!(form.data, "t=90");
    assert_eq!(form.datasource, "plc.7");

    ed.session.select(None);
    assert_eq!(ed.session.form.label, "");
}

#[test]
fn retyping_the_same_text_keeps_the_form_clean() {
    let mut ed = editor();
    ed.dispatch(Token::OpenProperties);
    type_label(&mut ed, "");
    assert!(!ed.session.form.dirty);
}

#[test]
fn apply_writes_back_and_relabels() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::TextChanged {
        field: Field::Datasource,
        value: String::new(),
    });
    ed.dispatch(Token::Apply);

    assert!(!ed.session.form.dirty);
    assert_eq!(label_of(&ed, a), "Feed pump");
    assert_eq!(ed.session.graph.node(a).unwrap().datasource, None);

    let root = ed.session.graph.node(a).unwrap().prim.unwrap();
    let label = ed
        .session
        .scene
        .find_child(root, linkdraw::scene::LABEL)
        .unwrap();
    assert!(matches!(
        &ed.session.scene.get(label).unwrap().kind,
        linkdraw::scene::PrimKind::Text { text } if text == "Feed pump"
    ));
}

#[test]
fn cancel_reloads_from_the_model() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::CancelEdits);
    assert!(!ed.session.form.dirty);
    assert_eq!(ed.session.form.label, "");
    assert_eq!(label_of(&ed, a), "");
}

#[test]
fn closing_a_clean_form_hides_it() {
    let mut ed = editor();
    ed.dispatch(Token::OpenProperties);
    ed.dispatch(Token::CloseProperties);
    assert!(!ed.session.form.visible);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
}

#[test]
fn closing_a_dirty_form_asks_and_saves() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::CloseProperties);
    assert_eq!(ed.current(), Some(HandlerKind::Confirm));
    let dialog = ed.session.dialog.clone().unwrap();
    assert_eq!(dialog.yes, "Save");

    ed.dispatch(Token::Confirm);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
    assert!(ed.session.dialog.is_none());
    assert!(!ed.session.form.visible);
    assert_eq!(label_of(&ed, a), "Feed pump");
}

#[test]
fn closing_a_dirty_form_can_discard() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::CloseProperties);
    ed.dispatch(Token::Reject);
    assert!(!ed.session.form.visible);
    assert!(!ed.session.form.dirty);
    assert_eq!(label_of(&ed, a), "");
}

#[test]
fn keep_editing_leaves_everything_open() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::CloseProperties);
    ed.dispatch(Token::CancelConfirm);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
    assert!(ed.session.form.visible);
    assert!(ed.session.form.dirty);
    assert_eq!(ed.session.form.label, "Feed pump");
    assert_eq!(label_of(&ed, a), "");
}

#[test]
fn tool_change_over_unsaved_edits_asks_first() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::IconSelected(TERMINAL));
    assert_eq!(ed.current(), Some(HandlerKind::Confirm));

    // Modal: presses are swallowed while the question is open.
    press(&mut ed, 300.0, 300.0);
    assert_eq!(ed.session.graph.node_count(), 1);

    ed.dispatch(Token::Reject);
    assert_eq!(label_of(&ed, a), "");
    assert!(!ed.session.form.dirty);
    assert_eq!(ed.current(), Some(HandlerKind::AddNode));
}

#[test]
fn saving_before_a_tool_change_keeps_the_edit() {
    let (mut ed, a) = dirty_form();
    ed.dispatch(Token::IconSelected(TERMINAL));
    ed.dispatch(Token::Confirm);
    assert_eq!(label_of(&ed, a), "Feed pump");
    assert_eq!(ed.current(), Some(HandlerKind::AddNode));
}

#[test]
fn cancelling_drops_the_pending_action() {
    let (mut ed, a) = dirty_form();
    press(&mut ed, 300.0, 300.0);
    assert_eq!(ed.current(), Some(HandlerKind::Confirm));

    ed.dispatch(Token::Escape);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
    assert!(ed.session.form.dirty);
    assert_eq!(selected(&ed), Some(Entity::Node(a)));
}

#[test]
fn harmless_tokens_pass_a_dirty_form() {
    let (mut ed, _) = dirty_form();
    ed.dispatch(Token::ZoomIn);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
    assert!(ed.session.form.dirty);
}

#[test]
fn exit_asks_and_a_second_exit_confirms() {
    let mut ed = editor();
    ed.dispatch(Token::Exit);
    assert_eq!(ed.current(), Some(HandlerKind::Confirm));
    assert_eq!(ed.session.dialog.as_ref().unwrap().title, "Exit");
    assert!(ed.drain_events().is_empty());

    ed.dispatch(Token::Exit);
    assert_eq!(ed.drain_events(), vec![EditorEvent::ExitRequested]);
    assert_eq!(ed.current(), Some(HandlerKind::Main));
}

#[test]
fn exit_can_be_cancelled() {
    let mut ed = editor();
    ed.dispatch(Token::Exit);
    ed.dispatch(Token::CancelConfirm);
    assert!(ed.drain_events().is_empty());
    assert_eq!(ed.current(), Some(HandlerKind::Main));

    // The exit dialog has no "no" button.
    ed.dispatch(Token::Exit);
    ed.dispatch(Token::Reject);
    assert_eq!(ed.current(), Some(HandlerKind::Confirm));
    ed.dispatch(Token::Confirm);
    assert_eq!(ed.drain_events(), vec![EditorEvent::ExitRequested]);
}

#[test]
fn exit_without_confirmation() {
    let mut ed = editor_with(|s| s.confirm_exit = false);
    ed.dispatch(Token::Exit);
    assert_eq!(ed.drain_events(), vec![EditorEvent::ExitRequested]);
    assert_eq!(ed.depth(), 2);
}
