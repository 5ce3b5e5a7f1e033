//! In-memory node/link graph.
//!
//! Nodes and links live in slot-map arenas so that scene primitives can carry
//! their id as an opaque back-reference. Insertion order is tracked
//! separately: it is the order used for iteration and for the positional
//! node indices of the saved format.

use eframe::egui;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::error::{EditorError, Result};
use crate::scene::PrimId;

new_key_type! {
    pub struct NodeId;
    pub struct LinkId;
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_premultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn from_color32(c: egui::Color32) -> Self {
        let [r, g, b, a] = c.to_array();
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    /// Dominant axis of a movement; ties go vertical.
    pub fn from_delta(delta: egui::Vec2) -> Self {
        if delta.x.abs() > delta.y.abs() {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeStyle {
    Straight,
    Rectilinear(Direction),
    Arc,
}

impl EdgeStyle {
    pub fn default_point_count(self) -> usize {
        match self {
            Self::Straight | Self::Rectilinear(_) => 2,
            Self::Arc => 3,
        }
    }

    pub fn is_arc(self) -> bool {
        matches!(self, Self::Arc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

/// A link endpoint attached to a named connection point of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub point: String,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub template: usize,
    pub position: egui::Pos2,
    pub label: String,
    pub data: String,
    pub datasource: Option<String>,
    pub prim: Option<PrimId>,
}

impl Node {
    pub fn new(template: usize, position: egui::Pos2) -> Self {
        Self {
            template,
            position,
            label: String::new(),
            data: String::new(),
            datasource: None,
            prim: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub template: usize,
    pub style: EdgeStyle,
    pub label: String,
    pub data: String,
    /// Literal control points. Entries for bound endpoints are not
    /// authoritative; they are recomputed from the bound node.
    pub points: Vec<egui::Pos2>,
    pub start: Option<Binding>,
    pub end: Option<Binding>,
    pub prim: Option<PrimId>,
}

impl Link {
    pub fn new(template: usize, style: EdgeStyle) -> Self {
        Self {
            template,
            style,
            label: String::new(),
            data: String::new(),
            points: vec![egui::Pos2::ZERO; style.default_point_count()],
            start: None,
            end: None,
            prim: None,
        }
    }

    pub fn binding(&self, end: Endpoint) -> Option<&Binding> {
        match end {
            Endpoint::Start => self.start.as_ref(),
            Endpoint::End => self.end.as_ref(),
        }
    }

    pub fn binding_mut(&mut self, end: Endpoint) -> &mut Option<Binding> {
        match end {
            Endpoint::Start => &mut self.start,
            Endpoint::End => &mut self.end,
        }
    }

    pub fn endpoint_index(&self, end: Endpoint) -> usize {
        match end {
            Endpoint::Start => 0,
            Endpoint::End => self.points.len().saturating_sub(1),
        }
    }

    pub fn is_bound_to(&self, node: NodeId) -> bool {
        self.start.as_ref().is_some_and(|b| b.node == node)
            || self.end.as_ref().is_some_and(|b| b.node == node)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Node(NodeId),
    Link(LinkId),
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: SlotMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    links: SlotMap<LinkId, Link>,
    /// Finalised links only; a link being drawn lives in the arena but not here.
    link_order: Vec<LinkId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, template: usize, position: egui::Pos2) -> NodeId {
        self.insert_node(Node::new(template, position))
    }

    pub fn insert_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.node_order.push(id);
        tracing::debug!(node = ?id, "node created");
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Allocates a link with default control points. It is not listed until
    /// [`Graph::commit_link`] is called.
    pub fn create_link(&mut self, template: usize, style: EdgeStyle) -> LinkId {
        self.links.insert(Link::new(template, style))
    }

    pub fn insert_link(&mut self, link: Link) -> LinkId {
        let id = self.links.insert(link);
        self.link_order.push(id);
        id
    }

    pub fn commit_link(&mut self, id: LinkId) -> bool {
        if !self.links.contains_key(id) || self.link_order.contains(&id) {
            return false;
        }
        self.link_order.push(id);
        tracing::debug!(link = ?id, "link committed");
        true
    }

    pub fn is_committed(&self, id: LinkId) -> bool {
        self.link_order.contains(&id)
    }

    pub fn discard_link(&mut self, id: LinkId) -> Option<Link> {
        if self.is_committed(id) {
            return None;
        }
        self.links.remove(id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id)
    }

    pub fn bind_endpoint(&mut self, link: LinkId, end: Endpoint, node: NodeId, point: &str) {
        if !self.nodes.contains_key(node) {
            tracing::debug!(link = ?link, node = ?node, "bind to missing node ignored");
            return;
        }
        let Some(l) = self.links.get_mut(link) else {
            tracing::debug!(link = ?link, "bind on missing link ignored");
            return;
        };
        *l.binding_mut(end) = Some(Binding {
            node,
            point: point.to_string(),
        });
    }

    pub fn unbind_endpoint(&mut self, link: LinkId, end: Endpoint) -> Option<Binding> {
        self.links.get_mut(link)?.binding_mut(end).take()
    }

    /// Every link, committed or in progress, with an endpoint on `node`.
    pub fn links_bound_to(&self, node: NodeId) -> Vec<LinkId> {
        self.links
            .iter()
            .filter(|(_, l)| l.is_bound_to(node))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn is_node_connected(&self, node: NodeId) -> bool {
        self.links.values().any(|l| l.is_bound_to(node))
    }

    /// Removes a node that has no links, handing back its data.
    pub fn take_node(&mut self, id: NodeId) -> Result<Node> {
        let links = self.links_bound_to(id).len();
        if links > 0 {
            return Err(EditorError::NodeConnected { links });
        }
        let node = self.nodes.remove(id).ok_or(EditorError::StaleSelection)?;
        self.node_order.retain(|n| *n != id);
        Ok(node)
    }

    /// Refuses while any link is bound to the node.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        self.take_node(id).is_ok()
    }

    pub fn delete_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.remove(id)?;
        self.link_order.retain(|l| *l != id);
        Some(link)
    }

    pub fn list_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node_order
            .iter()
            .filter_map(move |&id| self.nodes.get(id).map(|n| (id, n)))
    }

    pub fn list_links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.link_order
            .iter()
            .filter_map(move |&id| self.links.get(id).map(|l| (id, l)))
    }

    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.node_order.iter().position(|n| *n == id)
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_order.len()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        match entity {
            Entity::Node(id) => self.nodes.contains_key(id),
            Entity::Link(id) => self.links.contains_key(id),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_order.clear();
        self.links.clear();
        self.link_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> (Graph, NodeId, NodeId) {
        let mut g = Graph::new();
        let a = g.create_node(0, egui::pos2(0.0, 0.0));
        let b = g.create_node(0, egui::pos2(100.0, 0.0));
        (g, a, b)
    }

    #[test]
    fn connected_node_cannot_be_deleted() {
        let (mut g, a, b) = two_nodes();
        let l = g.create_link(0, EdgeStyle::Straight);
        g.bind_endpoint(l, Endpoint::Start, a, "Anchor");
        g.bind_endpoint(l, Endpoint::End, b, "Anchor");
        g.commit_link(l);

        assert!(!g.delete_node(a));
        assert_eq!(g.node_count(), 2);
        assert!(matches!(
            g.take_node(b),
            Err(EditorError::NodeConnected { links: 1 })
        ));

        g.delete_link(l);
        assert!(g.delete_node(a));
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn pending_link_blocks_deletion_but_is_not_listed() {
        let (mut g, a, _) = two_nodes();
        let l = g.create_link(0, EdgeStyle::Arc);
        g.bind_endpoint(l, Endpoint::Start, a, "Anchor");
        assert_eq!(g.link_count(), 0);
        assert_eq!(g.link(l).map(|l| l.points.len()), Some(3));
        assert!(g.is_node_connected(a));
        assert!(g.discard_link(l).is_some());
        assert!(!g.is_node_connected(a));
    }

    #[test]
    fn listing_keeps_insertion_order() {
        let mut g = Graph::new();
        let ids: Vec<_> = (0..5)
            .map(|i| g.create_node(i, egui::pos2(i as f32, 0.0)))
            .collect();
        g.delete_node(ids[1]);
        let listed: Vec<_> = g.list_nodes().map(|(id, _)| id).collect();
        assert_eq!(listed, vec![ids[0], ids[2], ids[3], ids[4]]);
        assert_eq!(g.node_index(ids[3]), Some(2));
    }

    #[test]
    fn binding_to_missing_entities_is_ignored() {
        let (mut g, a, _) = two_nodes();
        let l = g.create_link(0, EdgeStyle::Straight);
        g.delete_node(a);
        g.bind_endpoint(l, Endpoint::Start, a, "Anchor");
        assert!(g.link(l).is_some_and(|l| l.start.is_none()));
    }

    #[test]
    fn committing_twice_is_refused() {
        let mut g = Graph::new();
        let l = g.create_link(0, EdgeStyle::Straight);
        assert!(g.commit_link(l));
        assert!(!g.commit_link(l));
        assert_eq!(g.link_count(), 1);
        assert!(g.discard_link(l).is_none());
    }

    #[test]
    fn direction_follows_dominant_axis() {
        assert_eq!(Direction::from_delta(egui::vec2(5.0, 2.0)), Direction::Horizontal);
        assert_eq!(Direction::from_delta(egui::vec2(-1.0, 3.0)), Direction::Vertical);
        assert_eq!(Direction::from_delta(egui::vec2(2.0, 2.0)), Direction::Vertical);
    }
}
