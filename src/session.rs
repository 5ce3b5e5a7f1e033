use std::path::PathBuf;

use eframe::egui;

use crate::constraint;
use crate::error::{EditorError, ErrorKind, Result};
use crate::geometry::View;
use crate::handler::{ConfirmDialog, EditProperties, Handler, HandlerKind, Main, Outcome, Token};
use crate::model::{Endpoint, Entity, Graph, Link, LinkId, Node, NodeId};
use crate::palette::Palette;
use crate::scene::{Owner, Scene};
use crate::selection::{Clipboard, Selection};
use crate::settings::EditorSettings;

/// Upper bound on follow-up tokens produced while handling one input.
const MAX_FOLLOW_UPS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyForm {
    pub label: String,
    pub data: String,
    pub datasource: String,
    pub dirty: bool,
    pub visible: bool,
}

/// Whether pointer motion and release are delivered at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tracking {
    pub motion: bool,
    pub release: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    PrintRequested,
    ExitRequested,
    DiagramLoaded(PathBuf),
    DiagramSaved(PathBuf),
}

#[derive(Debug)]
pub struct EditorSession {
    pub graph: Graph,
    pub scene: Scene,
    pub palette: Palette,
    pub settings: EditorSettings,
    pub view: View,
    /// Canvas size in device pixels; zoom buttons zoom about its centre.
    pub viewport: egui::Vec2,
    pub selection: Selection,
    pub clipboard: Clipboard,
    pub form: PropertyForm,
    pub status: Option<Status>,
    pub prompt: Option<String>,
    /// World positions of connection points currently highlighted.
    pub feedback: Vec<egui::Pos2>,
    pub tracking: Tracking,
    pub sticky: bool,
    pub active_icon: Option<usize>,
    pub dialog: Option<ConfirmDialog>,
    pub file_path: String,
    events: Vec<EditorEvent>,
}

impl EditorSession {
    pub fn new(palette: Palette, settings: EditorSettings) -> Self {
        Self {
            graph: Graph::new(),
            scene: Scene::new(),
            active_icon: palette.select_icon(),
            palette,
            sticky: settings.sticky_create,
            file_path: settings.file_path.clone(),
            settings,
            view: View::default(),
            viewport: egui::vec2(800.0, 600.0),
            selection: Selection::default(),
            clipboard: Clipboard::default(),
            form: PropertyForm::default(),
            status: None,
            prompt: None,
            feedback: Vec::new(),
            tracking: Tracking::default(),
            dialog: None,
            events: Vec::new(),
        }
    }

    pub fn report(&mut self, err: EditorError) {
        match err.kind() {
            ErrorKind::Invariant => {
                tracing::debug!(error = %err, "guard tripped");
                if cfg!(debug_assertions) {
                    self.status = Some(Status::error(err.to_string()));
                }
            }
            kind => {
                tracing::warn!(?kind, error = %err, "operation refused");
                self.status = Some(Status::error(err.to_string()));
            }
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status::info(text));
    }

    pub fn set_prompt(&mut self, prompt: Option<&str>) {
        self.prompt = prompt.map(str::to_string);
    }

    pub fn emit(&mut self, event: EditorEvent) {
        tracing::debug!(?event, "editor event");
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn select_tool(&mut self) {
        self.active_icon = self.palette.select_icon();
    }

    pub fn to_world(&self, device: egui::Pos2) -> egui::Pos2 {
        self.view.screen_to_world(device)
    }

    pub fn pick_tolerance(&self) -> f32 {
        self.view.screen_len_to_world(self.settings.pick_tolerance)
    }

    /// Topmost finished node or link under a device position.
    pub fn pick(&self, device: egui::Pos2) -> Option<Entity> {
        let world = self.to_world(device);
        self.scene
            .hit_test(world, self.pick_tolerance())
            .into_iter()
            .find_map(|prim| match self.scene.owner_of(prim)? {
                Owner::Node(id) => self.graph.node(id).map(|_| Entity::Node(id)),
                Owner::Link(id) => self.graph.is_committed(id).then_some(Entity::Link(id)),
            })
    }

    pub fn create_node_at(&mut self, template: usize, device: egui::Pos2) -> Result<NodeId> {
        let world = self.to_world(device);
        self.place_node(Node::new(template, world))
    }

    pub fn place_node(&mut self, mut node: Node) -> Result<NodeId> {
        let template = self.palette.node(node.template)?;
        node.prim = None;
        let (position, label) = (node.position, node.label.clone());
        let id = self.graph.insert_node(node);
        let root = self.scene.add_node_visual(template, position, id, &label);
        if let Some(n) = self.graph.node_mut(id) {
            n.prim = Some(root);
        }
        Ok(id)
    }

    /// Inserts a finished link, builds its visual and attaches the endpoints
    /// whose nodes still exist.
    pub fn place_link(&mut self, mut link: Link) -> Result<LinkId> {
        let template = self.palette.link(link.template)?;
        if link.points.len() < 2 {
            return Err(EditorError::TooFewPoints);
        }
        let bindings = [
            (Endpoint::Start, link.start.take()),
            (Endpoint::End, link.end.take()),
        ];
        let points = link.points.clone();
        let (style, label) = (link.style, link.label.clone());
        link.prim = None;
        let id = self.graph.insert_link(link);
        let root = self
            .scene
            .add_link_visual(template, style, &points, id, &label);
        if let Some(l) = self.graph.link_mut(id) {
            l.prim = Some(root);
        }
        self.scene.suspend();
        for (end, binding) in bindings {
            let Some(b) = binding else {
                continue;
            };
            if self.graph.node(b.node).is_some() {
                self.graph.bind_endpoint(id, end, b.node, &b.point);
            } else {
                tracing::info!(link = ?id, point = %b.point, "endpoint left free, node is gone");
            }
        }
        let problems = constraint::attach_bindings(&mut self.scene, &mut self.graph, &self.palette, id);
        self.scene.release();
        for p in problems {
            self.report(p);
        }
        Ok(id)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        let mut node = self.graph.take_node(id)?;
        if let Some(prim) = node.prim.take() {
            self.scene.delete(prim);
        }
        tracing::debug!(node = ?id, "node deleted");
        Ok(node)
    }

    /// Removes a link and its visual. Returns the link with its drawn points
    /// captured as literals.
    pub fn delete_link(&mut self, id: LinkId) -> Option<Link> {
        if let Some(link) = self.graph.link(id) {
            if let Some(path) = constraint::link_path(&self.scene, link) {
                let drawn = self.scene.world_points(path);
                if let Some(l) = self.graph.link_mut(id) {
                    l.points = drawn;
                }
            }
        }
        let mut link = self.graph.delete_link(id)?;
        if let Some(prim) = link.prim.take() {
            self.scene.delete(prim);
        }
        tracing::debug!(link = ?id, "link deleted");
        Some(link)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.scene.clear();
        self.selection = Selection::default();
        self.clipboard = Clipboard::default();
        self.form = PropertyForm::default();
        self.feedback.clear();
    }

    fn viewport_centre(&self) -> egui::Pos2 {
        (self.viewport * 0.5).to_pos2()
    }

    pub fn zoom_to(&mut self, zoom: f32) {
        let centre = self.viewport_centre();
        let (min, max, _) = self.settings.zoom_limits();
        self.view.zoom_about_screen_point(centre, zoom, min, max);
        self.scene.request_redraw();
    }

    pub fn zoom_in(&mut self) {
        let (_, _, step) = self.settings.zoom_limits();
        self.zoom_to(self.view.zoom * step);
    }

    pub fn zoom_out(&mut self) {
        let (_, _, step) = self.settings.zoom_limits();
        self.zoom_to(self.view.zoom / step);
    }

    pub fn zoom_reset(&mut self) {
        self.view.reset();
        self.scene.request_redraw();
    }
}

#[derive(Debug)]
pub struct Editor {
    stack: Vec<Handler>,
    pub session: EditorSession,
}

impl Editor {
    pub fn new(session: EditorSession) -> Self {
        Self {
            stack: vec![
                Handler::EditProperties(EditProperties),
                Handler::Main(Main),
            ],
            session,
        }
    }

    pub fn current(&self) -> Option<HandlerKind> {
        self.stack.last().map(Handler::kind)
    }

    pub fn handler_kinds(&self) -> Vec<HandlerKind> {
        self.stack.iter().map(Handler::kind).collect()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.session.drain_events()
    }

    /// Processes one input token, and every follow-up it causes, to
    /// completion.
    pub fn dispatch(&mut self, token: Token) {
        let mut pending = vec![token];
        let mut rounds = 0;
        while let Some(token) = pending.pop() {
            rounds += 1;
            if rounds > MAX_FOLLOW_UPS {
                tracing::debug!(token = token.name(), "dropping follow-up, dispatch loop too deep");
                break;
            }
            if let Some(next) = self.dispatch_one(&token) {
                pending.push(next);
            }
        }
    }

    fn dispatch_one(&mut self, token: &Token) -> Option<Token> {
        let tracked = match token {
            Token::MouseMoved(_) => self.session.tracking.motion,
            Token::MouseReleased(_) => self.session.tracking.release,
            _ => true,
        };
        if !tracked {
            return None;
        }

        let mut level = self.stack.len();
        while level > 0 {
            level -= 1;
            let outcome = self.stack[level].handle(token, &mut self.session);
            match outcome {
                Outcome::Consumed => return None,
                Outcome::Forward => continue,
                Outcome::Push(mut handler) => {
                    tracing::debug!(handler = ?handler.kind(), token = token.name(), "push handler");
                    handler.enter(&mut self.session);
                    self.stack.push(handler);
                    return None;
                }
                Outcome::Pop { forward } => {
                    if self.stack[level].is_resident() {
                        tracing::debug!(handler = ?self.stack[level].kind(), "resident handler asked to pop");
                        return forward;
                    }
                    let mut handler = self.stack.remove(level);
                    tracing::debug!(handler = ?handler.kind(), token = token.name(), "pop handler");
                    handler.exit(&mut self.session);
                    return forward;
                }
                Outcome::Dispatch(next) => return Some(next),
            }
        }
        tracing::trace!(token = token.name(), "token not handled");
        None
    }
}
