use eframe::egui;

use super::{Outcome, Token};
use crate::attach::{self, ConnectionPoint, Resolution};
use crate::constraint;
use crate::error::EditorError;
use crate::model::{Direction, EdgeStyle, Endpoint, Entity, LinkId};
use crate::scene::{PointRef, PrimId};
use crate::session::EditorSession;

const PROMPT_FIRST: &str = "Click the first connection point";
const PROMPT_NEXT: &str = "Click the target connection point, or empty space for a waypoint";

/// Draws links from one connection point to another, with optional
/// waypoints in between.
#[derive(Debug)]
pub struct AddLink {
    template: usize,
    style: EdgeStyle,
    icon: usize,
    /// The link being drawn. Lives in the graph but is not listed yet.
    link: Option<LinkId>,
    first: Option<ConnectionPoint>,
    first_node_expected: bool,
    middle_point_added: bool,
    /// World position of the press that bound the start.
    anchor: egui::Pos2,
    moved: bool,
}

impl AddLink {
    pub fn new(template: usize, style: EdgeStyle, icon: usize) -> Self {
        Self {
            template,
            style,
            icon,
            link: None,
            first: None,
            first_node_expected: true,
            middle_point_added: false,
            anchor: egui::Pos2::ZERO,
            moved: false,
        }
    }

    pub fn enter(&mut self, session: &mut EditorSession) {
        session.tracking.motion = true;
        session.active_icon = Some(self.icon);
        session.set_prompt(Some(PROMPT_FIRST));
    }

    pub fn exit(&mut self, session: &mut EditorSession) {
        self.finish(session);
        session.feedback.clear();
        session.tracking.motion = false;
        session.select_tool();
        session.set_prompt(None);
    }

    pub fn handle(&mut self, token: &Token, session: &mut EditorSession) -> Outcome {
        match token {
            Token::MouseMoved(pos) => {
                self.track(*pos, session);
                Outcome::Consumed
            }
            Token::MousePressed(pos) => self.press(*pos, session),
            Token::FinishLink => {
                self.finish(session);
                self.after_creation(session)
            }
            Token::Escape | Token::RightClick(_) => {
                if session.sticky && self.link.is_some() {
                    self.finish(session);
                    self.restart(session);
                    Outcome::Consumed
                } else {
                    Outcome::pop()
                }
            }
            _ => Outcome::pop_and_forward(token),
        }
    }

    fn after_creation(&mut self, session: &mut EditorSession) -> Outcome {
        if session.sticky {
            self.restart(session);
            Outcome::Consumed
        } else {
            Outcome::pop()
        }
    }

    fn restart(&mut self, session: &mut EditorSession) {
        self.link = None;
        self.first = None;
        self.first_node_expected = true;
        self.middle_point_added = false;
        self.moved = false;
        session.feedback.clear();
        session.set_prompt(Some(PROMPT_FIRST));
    }

    fn resolve(&self, pos: egui::Pos2, session: &EditorSession) -> Resolution {
        attach::resolve(
            &session.scene,
            &session.graph,
            &session.palette,
            &session.view,
            pos,
            session.settings.pick_tolerance,
        )
    }

    fn path(&self, session: &EditorSession) -> Option<PrimId> {
        let link = session.graph.link(self.link?)?;
        constraint::link_path(&session.scene, link)
    }

    fn track(&mut self, pos: egui::Pos2, session: &mut EditorSession) {
        session.feedback = self.resolve(pos, session).highlighted();
        if self.link.is_none() {
            return;
        }
        let world = session.to_world(pos);
        if !self.moved {
            self.first_motion(world, session);
        }
        self.drag_to(world, session);
    }

    /// Picks the rectilinear direction from the first movement and shows the
    /// link.
    fn first_motion(&mut self, world: egui::Pos2, session: &mut EditorSession) {
        self.moved = true;
        let Some(id) = self.link else {
            return;
        };
        let direction = Direction::from_delta(world - self.anchor);
        if let EdgeStyle::Rectilinear(_) = self.style {
            self.style = EdgeStyle::Rectilinear(direction);
            if let Some(l) = session.graph.link_mut(id) {
                l.style = self.style;
            }
            if let Some(path) = self.path(session) {
                session.scene.set_route(path, self.style.into());
            }
        }
        if let Some(root) = session.graph.link(id).and_then(|l| l.prim) {
            session.scene.set_visible(root, true);
        }
        tracing::debug!(link = ?id, ?direction, "link direction chosen");
    }

    /// Moves the trailing point of the link to the cursor, or past it once
    /// an arc has its waypoint.
    fn drag_to(&self, world: egui::Pos2, session: &mut EditorSession) {
        let Some(path) = self.path(session) else {
            return;
        };
        let n = session.scene.get(path).map_or(0, |p| p.points.len());
        if n < 2 {
            return;
        }
        let trailing = if self.style.is_arc() && self.middle_point_added {
            let waypoint = session.scene.world_point(PointRef::new(path, 1));
            waypoint.map_or(world, |w| arc_end(w, world, session.settings.arc_end_offset))
        } else {
            world
        };
        session.scene.suspend();
        session.scene.set_world_point(PointRef::new(path, n - 1), trailing);
        if self.style.is_arc() && !self.middle_point_added {
            if let Some(start) = session.scene.world_point(PointRef::new(path, 0)) {
                let mid = start + (world - start) * 0.5;
                session.scene.set_world_point(PointRef::new(path, 1), mid);
            }
        }
        session.scene.release();
    }

    fn press(&mut self, pos: egui::Pos2, session: &mut EditorSession) -> Outcome {
        let world = session.to_world(pos);
        match self.resolve(pos, session) {
            Resolution::Exact(cp) if self.first_node_expected => {
                self.start(cp, world, session);
                Outcome::Consumed
            }
            Resolution::Exact(cp) => self.connect_end(cp, session),
            Resolution::Candidates(candidates) => {
                session.feedback = candidates.iter().map(|c| c.position).collect();
                Outcome::Consumed
            }
            Resolution::Nothing if self.first_node_expected => {
                session.report(EditorError::NoConnectionTarget);
                Outcome::Consumed
            }
            Resolution::Nothing => {
                self.add_waypoint(world, session);
                Outcome::Consumed
            }
        }
    }

    fn start(&mut self, cp: ConnectionPoint, world: egui::Pos2, session: &mut EditorSession) {
        let template = match session.palette.link(self.template) {
            Ok(t) => t,
            Err(e) => {
                session.report(e);
                return;
            }
        };
        let id = session.graph.create_link(self.template, self.style);
        let points = vec![cp.position; self.style.default_point_count()];
        let root = session
            .scene
            .add_link_visual(template, self.style, &points, id, "");
        session.scene.set_visible(root, false);
        if let Some(l) = session.graph.link_mut(id) {
            l.points = points;
            l.prim = Some(root);
        }
        let s = &mut *session;
        let bound = constraint::bind(
            &mut s.scene,
            &mut s.graph,
            &s.palette,
            id,
            Endpoint::Start,
            cp.node,
            &cp.name,
        );
        if let Err(e) = bound {
            self.discard(id, session);
            session.report(e);
            return;
        }
        constraint::sync_frame(&mut session.scene, &session.graph, id);

        tracing::debug!(link = ?id, node = ?cp.node, point = %cp.name, "link started");
        self.link = Some(id);
        self.first = Some(cp);
        self.anchor = world;
        self.first_node_expected = false;
        self.middle_point_added = false;
        self.moved = false;
        session.set_prompt(Some(PROMPT_NEXT));
    }

    fn connect_end(&mut self, cp: ConnectionPoint, session: &mut EditorSession) -> Outcome {
        if self.first.as_ref().is_some_and(|first| first.same_point(&cp)) {
            session.report(EditorError::SelfLoop);
            return Outcome::Consumed;
        }
        let Some(id) = self.link else {
            return Outcome::Consumed;
        };
        if !self.moved {
            self.first_motion(cp.position, session);
        }
        self.drag_to(cp.position, session);
        let s = &mut *session;
        let bound = constraint::bind(
            &mut s.scene,
            &mut s.graph,
            &s.palette,
            id,
            Endpoint::End,
            cp.node,
            &cp.name,
        );
        if let Err(e) = bound {
            session.report(e);
            return Outcome::Consumed;
        }
        self.link = None;
        self.first = None;
        self.finalize(id, session);
        self.after_creation(session)
    }

    fn add_waypoint(&mut self, world: egui::Pos2, session: &mut EditorSession) {
        let (Some(id), Some(path)) = (self.link, self.path(session)) else {
            return;
        };
        if self.style.is_arc() {
            if self.middle_point_added {
                tracing::debug!(link = ?id, "arc already has its waypoint");
                return;
            }
            let start = session
                .scene
                .world_point(PointRef::new(path, 0))
                .unwrap_or(world);
            let end = arc_end(start, world, session.settings.arc_end_offset);
            session.scene.suspend();
            session.scene.set_world_point(PointRef::new(path, 1), world);
            session.scene.set_world_point(PointRef::new(path, 2), end);
            session.scene.release();
        } else {
            let n = session.scene.get(path).map_or(0, |p| p.points.len());
            session.scene.insert_point(path, n.saturating_sub(1), world);
            constraint::sync_frame(&mut session.scene, &session.graph, id);
        }
        self.middle_point_added = true;
        tracing::debug!(link = ?id, "waypoint added");
    }

    /// Ends the gesture: a link with a free end is kept only when the
    /// settings allow it and enough real points remain.
    fn finish(&mut self, session: &mut EditorSession) {
        self.first = None;
        let Some(id) = self.link.take() else {
            return;
        };
        if session.settings.allow_unconnected_links && self.trim_drag_point(session, id) {
            self.finalize(id, session);
        } else {
            self.discard(id, session);
        }
    }

    /// Drops the point that was following the cursor. Arcs keep it as their
    /// end once their waypoint is placed.
    fn trim_drag_point(&self, session: &mut EditorSession, id: LinkId) -> bool {
        if self.style.is_arc() {
            return self.middle_point_added;
        }
        let Some(path) = session
            .graph
            .link(id)
            .and_then(|l| constraint::link_path(&session.scene, l))
        else {
            return false;
        };
        let n = session.scene.get(path).map_or(0, |p| p.points.len());
        if n < 3 {
            return false;
        }
        session.scene.remove_point(path, n - 1);
        constraint::sync_frame(&mut session.scene, &session.graph, id);
        true
    }

    fn finalize(&mut self, id: LinkId, session: &mut EditorSession) {
        session.graph.commit_link(id);
        constraint::sync_frame(&mut session.scene, &session.graph, id);
        if let Some(l) = session.graph.link_mut(id) {
            constraint::store_literal_points(&session.scene, l);
        }
        if let Some(root) = session.graph.link(id).and_then(|l| l.prim) {
            session.scene.set_visible(root, true);
        }
        session.feedback.clear();
        session.select(Some(Entity::Link(id)));
        tracing::info!(link = ?id, "link created");
    }

    fn discard(&mut self, id: LinkId, session: &mut EditorSession) {
        if let Some(root) = session.graph.link(id).and_then(|l| l.prim) {
            session.scene.delete(root);
        }
        session.graph.discard_link(id);
        tracing::debug!(link = ?id, "unfinished link discarded");
    }
}

/// Trailing arc point: `offset` past `cursor`, continuing the line from
/// `from`.
fn arc_end(from: egui::Pos2, cursor: egui::Pos2, offset: f32) -> egui::Pos2 {
    let v = cursor - from;
    let dir = if v.length() > f32::EPSILON {
        v / v.length()
    } else {
        egui::Vec2::X
    };
    cursor + dir * offset
}
