use super::{Outcome, Token};
use crate::model::Entity;
use crate::session::EditorSession;

/// Places nodes of one template where the user clicks.
#[derive(Debug)]
pub struct AddNode {
    template: usize,
    icon: usize,
}

impl AddNode {
    pub fn new(template: usize, icon: usize) -> Self {
        Self { template, icon }
    }

    pub fn enter(&mut self, session: &mut EditorSession) {
        session.tracking.motion = true;
        session.active_icon = Some(self.icon);
        let name = session
            .palette
            .node(self.template)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        session.set_prompt(Some(&format!("Click to place {name}")));
    }

    pub fn exit(&mut self, session: &mut EditorSession) {
        session.tracking.motion = false;
        session.select_tool();
        session.set_prompt(None);
    }

    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        match token {
            Token::MousePressed(pos) => {
                match session.create_node_at(self.template, *pos) {
                    Ok(id) => {
                        session.select(Some(Entity::Node(id)));
                        tracing::info!(node = ?id, template = self.template, "node placed");
                    }
                    Err(e) => {
                        session.report(e);
                        return Outcome::pop();
                    }
                }
                if session.sticky {
                    Outcome::Consumed
                } else {
                    Outcome::pop()
                }
            }
            // Reserved for a placement preview.
            Token::MouseMoved(_) => Outcome::Consumed,
            _ => Outcome::pop_and_forward(token),
        }
    }
}
