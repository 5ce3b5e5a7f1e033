//! Interaction handlers.
//!
//! The editor keeps a stack of handlers. The top one sees each token first
//! and answers with an [`Outcome`]: it may consume the token, let the handler
//! below try it, install a new handler, or remove itself and hand the token
//! back to whatever is underneath.

use eframe::egui;

use crate::session::EditorSession;

mod add_link;
mod add_node;
mod confirm;
mod main;
mod move_object;
mod properties;

pub use add_link::AddLink;
pub use add_node::AddNode;
pub use confirm::{Confirm, ConfirmDialog};
pub use main::Main;
pub use move_object::MoveObject;
pub use properties::EditProperties;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Label,
    Data,
    Datasource,
}

/// What a confirmation dialog was opened for.
#[derive(Clone, Debug, PartialEq)]
pub enum Purpose {
    Exit,
    CloseForm,
    /// The form has unsaved edits and `then` would clobber them.
    DiscardEdits { then: Option<Box<Token>> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

/// Input alphabet of the editor. Positions are in device pixels relative to
/// the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    IconSelected(usize),
    MousePressed(egui::Pos2),
    MouseMoved(egui::Pos2),
    MouseReleased(egui::Pos2),
    RightClick(egui::Pos2),
    Escape,
    FinishLink,

    Save,
    Load,
    SetFilePath(String),
    New,
    Cut,
    Paste,
    Delete,
    Print,
    Exit,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomTo(f32),
    ToggleCreateMode,

    OpenProperties,
    TextChanged { field: Field, value: String },
    Apply,
    CloseProperties,
    CancelEdits,

    Confirm,
    Reject,
    CancelConfirm,
    /// Result a confirmation dialog hands back to the handler below it.
    Answered { purpose: Purpose, answer: Answer },
}

impl Token {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IconSelected(_) => "IconSelected",
            Self::MousePressed(_) => "MousePressed",
            Self::MouseMoved(_) => "MouseMoved",
            Self::MouseReleased(_) => "MouseReleased",
            Self::RightClick(_) => "RightClick",
            Self::Escape => "Escape",
            Self::FinishLink => "FinishLink",
            Self::Save => "Save",
            Self::Load => "Load",
            Self::SetFilePath(_) => "SetFilePath",
            Self::New => "New",
            Self::Cut => "Cut",
            Self::Paste => "Paste",
            Self::Delete => "Delete",
            Self::Print => "Print",
            Self::Exit => "Exit",
            Self::ZoomIn => "ZoomIn",
            Self::ZoomOut => "ZoomOut",
            Self::ZoomReset => "ZoomReset",
            Self::ZoomTo(_) => "ZoomTo",
            Self::ToggleCreateMode => "ToggleCreateMode",
            Self::OpenProperties => "OpenProperties",
            Self::TextChanged { .. } => "TextChanged",
            Self::Apply => "Apply",
            Self::CloseProperties => "CloseProperties",
            Self::CancelEdits => "CancelEdits",
            Self::Confirm => "Confirm",
            Self::Reject => "Reject",
            Self::CancelConfirm => "CancelConfirm",
            Self::Answered { .. } => "Answered",
        }
    }

    /// Tokens that change the selection or the document and would therefore
    /// clobber an unsaved property form.
    pub fn clobbers_form(&self) -> bool {
        matches!(
            self,
            Self::IconSelected(_)
                | Self::MousePressed(_)
                | Self::Escape
                | Self::RightClick(_)
                | Self::Load
                | Self::New
                | Self::Cut
                | Self::Paste
                | Self::Delete
        )
    }
}

#[derive(Debug)]
pub enum Outcome {
    Consumed,
    /// Offer the token to the next handler down.
    Forward,
    /// Install a handler on top of the stack.
    Push(Handler),
    /// Remove this handler; `forward` is then dispatched from the new top.
    Pop { forward: Option<Token> },
    /// Consumed; dispatch a follow-up token from the top.
    Dispatch(Token),
}

impl Outcome {
    pub fn pop() -> Self {
        Self::Pop { forward: None }
    }

    pub fn pop_and_forward(token: &Token) -> Self {
        Self::Pop {
            forward: Some(token.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerKind {
    Main,
    AddNode,
    AddLink,
    Move,
    EditProperties,
    Confirm,
}

#[derive(Debug)]
pub enum Handler {
    Main(Main),
    AddNode(AddNode),
    AddLink(AddLink),
    Move(MoveObject),
    EditProperties(EditProperties),
    Confirm(Confirm),
}

impl Handler {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Main(_) => HandlerKind::Main,
            Self::AddNode(_) => HandlerKind::AddNode,
            Self::AddLink(_) => HandlerKind::AddLink,
            Self::Move(_) => HandlerKind::Move,
            Self::EditProperties(_) => HandlerKind::EditProperties,
            Self::Confirm(_) => HandlerKind::Confirm,
        }
    }

    /// Resident handlers are never popped.
    pub fn is_resident(&self) -> bool {
        matches!(self, Self::Main(_) | Self::EditProperties(_))
    }

    pub fn enter(&mut self, session: &mut EditorSession) {
        match self {
            Self::AddNode(h) => h.enter(session),
            Self::AddLink(h) => h.enter(session),
            Self::Move(h) => h.enter(session),
            Self::Confirm(h) => h.enter(session),
            Self::Main(_) | Self::EditProperties(_) => {}
        }
    }

    pub fn exit(&mut self, session: &mut EditorSession) {
        match self {
            Self::AddNode(h) => h.exit(session),
            Self::AddLink(h) => h.exit(session),
            Self::Move(h) => h.exit(session),
            Self::Confirm(h) => h.exit(session),
            Self::Main(_) | Self::EditProperties(_) => {}
        }
    }

    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        match self {
            Self::Main(h) => h.handle(token, session),
            Self::AddNode(h) => h.handle(token, session),
            Self::AddLink(h) => h.handle(token, session),
            Self::Move(h) => h.handle(token, session),
            Self::EditProperties(h) => h.handle(token, session),
            Self::Confirm(h) => h.handle(token, session),
        }
    }
}
