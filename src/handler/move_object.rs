use eframe::egui;

use super::{Outcome, Token};
use crate::constraint;
use crate::error::EditorError;
use crate::model::Entity;
use crate::session::EditorSession;

/// Drags the picked entity until the button is released.
#[derive(Debug)]
pub struct MoveObject {
    entity: Entity,
    /// Last cursor position, world space.
    last: egui::Pos2,
}

impl MoveObject {
    pub fn new(entity: Entity, start: egui::Pos2) -> Self {
        Self {
            entity,
            last: start,
        }
    }

    pub fn enter(&mut self, session: &mut EditorSession) {
        session.tracking.motion = true;
        session.tracking.release = true;
    }

    pub fn exit(&mut self, session: &mut EditorSession) {
        session.tracking.motion = false;
        session.tracking.release = false;
    }

    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        match token {
            Token::MouseMoved(pos) => {
                if !session.graph.contains(self.entity) {
                    session.report(EditorError::StaleSelection);
                    return Outcome::pop();
                }
                let world = session.to_world(*pos);
                let delta = world - self.last;
                self.last = world;
                if delta == egui::Vec2::ZERO {
                    return Outcome::Consumed;
                }
                let s = session;
                match self.entity {
                    Entity::Node(id) => constraint::move_node(&mut s.scene, &mut s.graph, id, delta),
                    Entity::Link(id) => {
                        constraint::move_link(&mut s.scene, &mut s.graph, &s.palette, id, delta);
                    }
                }
                Outcome::Consumed
            }
            Token::MouseReleased(_) => Outcome::pop(),
            _ => Outcome::pop_and_forward(token),
        }
    }
}
