use super::{Answer, Outcome, Purpose, Token};
use crate::session::EditorSession;

/// What the shell shows while a confirmation is pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub yes: String,
    pub no: Option<String>,
    pub cancel: Option<String>,
}

/// Modal question. The answer is handed to the handler below as
/// [`Token::Answered`].
#[derive(Debug)]
pub struct Confirm {
    purpose: Purpose,
    dialog: ConfirmDialog,
}

impl Confirm {
    pub fn new(purpose: Purpose, dialog: ConfirmDialog) -> Self {
        Self { purpose, dialog }
    }

    pub fn exit_app() -> Self {
        Self::new(
            Purpose::Exit,
            ConfirmDialog {
                title: "Exit".into(),
                message: "Leave the editor? Unsaved changes are lost.".into(),
                yes: "Exit".into(),
                no: None,
                cancel: Some("Cancel".into()),
            },
        )
    }

    pub fn close_form() -> Self {
        Self::new(Purpose::CloseForm, save_or_discard())
    }

    /// Asks before `then` runs over unsaved property edits.
    pub fn discard_edits(then: Token) -> Self {
        Self::new(
            Purpose::DiscardEdits {
                then: Some(Box::new(then)),
            },
            save_or_discard(),
        )
    }

    pub fn enter(&mut self, session: &mut EditorSession) {
        session.dialog = Some(self.dialog.clone());
    }

    pub fn exit(&mut self, session: &mut EditorSession) {
        session.dialog = None;
    }

    fn answer(&self, answer: Answer) -> Outcome {
        tracing::debug!(purpose = ?self.purpose, ?answer, "confirmation answered");
        Outcome::Pop {
            forward: Some(Token::Answered {
                purpose: self.purpose.clone(),
                answer,
            }),
        }
    }

    pub fn handle(&mut self, token: &Token, _session: &mut EditorSession) -> Outcome {
        match token {
            Token::Confirm => self.answer(Answer::Yes),
            Token::Reject if self.dialog.no.is_some() => self.answer(Answer::No),
            Token::CancelConfirm | Token::Escape => self.answer(Answer::Cancel),
            // A second exit request while asking about exit means yes.
            Token::Exit if self.purpose == Purpose::Exit => self.answer(Answer::Yes),
            _ => Outcome::Consumed,
        }
    }
}

fn save_or_discard() -> ConfirmDialog {
    ConfirmDialog {
        title: "Unsaved properties".into(),
        message: "The property form has unsaved edits.".into(),
        yes: "Save".into(),
        no: Some("Discard".into()),
        cancel: Some("Keep editing".into()),
    }
}
