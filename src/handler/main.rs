use std::path::PathBuf;

use super::{
    AddLink, AddNode, Answer, Confirm, Handler, MoveObject, Outcome, Purpose, Token,
};
use crate::palette::IconKind;
use crate::session::{EditorEvent, EditorSession};

/// Root handler. Owns tool selection, picking and document commands.
#[derive(Debug, Default)]
pub struct Main;

impl Main {
    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        if session.form.dirty && token.clobbers_form() {
            return Outcome::Forward;
        }
        match token {
            Token::IconSelected(index) => select_icon(*index, session),
            Token::MousePressed(pos) => {
                let picked = session.pick(*pos);
                session.select(picked);
                match picked {
                    Some(entity) => {
                        Outcome::Push(Handler::Move(MoveObject::new(entity, session.to_world(*pos))))
                    }
                    None => Outcome::Consumed,
                }
            }
            Token::Escape | Token::RightClick(_) => {
                session.select(None);
                session.set_prompt(None);
                Outcome::Consumed
            }
            Token::Save => {
                let path = PathBuf::from(&session.file_path);
                match session.save_to(&path) {
                    Ok(()) => session.emit(EditorEvent::DiagramSaved(path)),
                    Err(e) => session.report(e),
                }
                Outcome::Consumed
            }
            Token::Load => {
                let path = PathBuf::from(&session.file_path);
                match session.load_from(&path) {
                    Ok(()) => session.emit(EditorEvent::DiagramLoaded(path)),
                    Err(e) => session.report(e),
                }
                Outcome::Consumed
            }
            Token::SetFilePath(path) => {
                session.file_path = path.clone();
                Outcome::Consumed
            }
            Token::New => {
                session.clear();
                session.info("new diagram");
                Outcome::Consumed
            }
            Token::Cut => {
                if let Err(e) = session.cut() {
                    session.report(e);
                }
                Outcome::Consumed
            }
            Token::Paste => {
                if let Err(e) = session.paste() {
                    session.report(e);
                }
                Outcome::Consumed
            }
            Token::Delete => {
                if let Err(e) = session.delete_selection() {
                    session.report(e);
                }
                Outcome::Consumed
            }
            Token::Print => {
                session.emit(EditorEvent::PrintRequested);
                Outcome::Consumed
            }
            Token::ZoomIn => {
                session.zoom_in();
                Outcome::Consumed
            }
            Token::ZoomOut => {
                session.zoom_out();
                Outcome::Consumed
            }
            Token::ZoomReset => {
                session.zoom_reset();
                Outcome::Consumed
            }
            Token::ZoomTo(zoom) => {
                session.zoom_to(*zoom);
                Outcome::Consumed
            }
            Token::ToggleCreateMode => {
                session.sticky = !session.sticky;
                tracing::debug!(sticky = session.sticky, "create mode toggled");
                Outcome::Consumed
            }
            Token::Exit => {
                if session.settings.confirm_exit {
                    Outcome::Push(Handler::Confirm(Confirm::exit_app()))
                } else {
                    session.emit(EditorEvent::ExitRequested);
                    Outcome::Consumed
                }
            }
            Token::Answered {
                purpose: Purpose::Exit,
                answer,
            } => {
                if *answer == Answer::Yes {
                    session.emit(EditorEvent::ExitRequested);
                }
                Outcome::Consumed
            }
            _ => Outcome::Forward,
        }
    }
}

fn select_icon(index: usize, session: &mut EditorSession) -> Outcome {
    let kind = match session.palette.icon(index) {
        Ok(icon) => icon.kind,
        Err(e) => {
            session.report(e);
            return Outcome::Consumed;
        }
    };
    match kind {
        IconKind::Select => {
            session.active_icon = Some(index);
            session.set_prompt(None);
            Outcome::Consumed
        }
        IconKind::Node(template) => match session.palette.node(template) {
            Ok(_) => Outcome::Push(Handler::AddNode(AddNode::new(template, index))),
            Err(e) => {
                session.report(e);
                Outcome::Consumed
            }
        },
        IconKind::Link(template) => match session.palette.link(template) {
            Ok(t) => Outcome::Push(Handler::AddLink(AddLink::new(template, t.style, index))),
            Err(e) => {
                session.report(e);
                Outcome::Consumed
            }
        },
    }
}
