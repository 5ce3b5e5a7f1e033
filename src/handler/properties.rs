use super::{Answer, Confirm, Field, Handler, Outcome, Purpose, Token};
use crate::session::EditorSession;

/// Resident beneath [`super::Main`]. Owns the property form and guards its
/// unsaved edits.
#[derive(Debug, Default)]
pub struct EditProperties;

impl EditProperties {
    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        match token {
            Token::OpenProperties => {
                session.load_form();
                session.form.visible = true;
                Outcome::Consumed
            }
            Token::TextChanged { field, value } => {
                let slot = match field {
                    Field::Label => &mut session.form.label,
                    Field::Data => &mut session.form.data,
                    Field::Datasource => &mut session.form.datasource,
                };
                if *slot != *value {
                    *slot = value.clone();
                    session.form.dirty = true;
                }
                Outcome::Consumed
            }
            Token::Apply => {
                if let Err(e) = session.apply_form() {
                    session.report(e);
                }
                Outcome::Consumed
            }
            Token::CancelEdits => {
                session.load_form();
                Outcome::Consumed
            }
            Token::CloseProperties => {
                if session.form.dirty {
                    Outcome::Push(Handler::Confirm(Confirm::close_form()))
                } else {
                    session.form.visible = false;
                    Outcome::Consumed
                }
            }
            Token::Answered { purpose, answer } => answered(purpose, *answer, session),
            _ if session.form.dirty => {
                tracing::debug!(token = token.name(), "unsaved properties, asking first");
                Outcome::Push(Handler::Confirm(Confirm::discard_edits(token.clone())))
            }
            _ => Outcome::Consumed,
        }
    }
}

/// Yes keeps the edits by applying them, No throws them away.
fn settle(answer: Answer, session: &mut EditorSession) {
    match answer {
        Answer::Yes => {
            if let Err(e) = session.apply_form() {
                session.report(e);
                session.load_form();
            }
        }
        Answer::No => session.load_form(),
        Answer::Cancel => {}
    }
}

fn answered(purpose: &Purpose, answer: Answer, session: &mut EditorSession) -> Outcome {
    match purpose {
        Purpose::CloseForm => {
            settle(answer, session);
            if answer != Answer::Cancel {
                session.form.visible = false;
            }
            Outcome::Consumed
        }
        Purpose::DiscardEdits { then } => {
            settle(answer, session);
            match (answer, then) {
                (Answer::Cancel, _) | (_, None) => Outcome::Consumed,
                (_, Some(next)) => Outcome::Dispatch((**next).clone()),
            }
        }
        Purpose::Exit => Outcome::Consumed,
    }
}
