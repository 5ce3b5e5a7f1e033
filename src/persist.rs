//! JSON diagram files.
//!
//! Nodes are written in insertion order and links refer to them by position
//! in that list plus the connection-point name.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constraint;
use crate::error::{EditorError, Result};
use crate::geometry::Point;
use crate::model::{Binding, EdgeStyle, Graph, Link, Node, NodeId};
use crate::palette::Palette;
use crate::scene::Scene;
use crate::session::EditorSession;

pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedNode {
    pub template: usize,
    pub position: Point,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedBinding {
    /// Position in [`SavedDiagram::nodes`].
    pub node: usize,
    pub point: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedLink {
    pub template: usize,
    pub style: EdgeStyle,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub start: Option<SavedBinding>,
    #[serde(default)]
    pub end: Option<SavedBinding>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedDiagram {
    #[serde(default = "default_version")]
    pub version: u32,
    pub nodes: Vec<SavedNode>,
    pub links: Vec<SavedLink>,
}

impl SavedDiagram {
    /// Snapshot of the finished part of the graph.
    pub fn capture(graph: &Graph, scene: &Scene) -> Self {
        let nodes = graph
            .list_nodes()
            .map(|(_, n)| SavedNode {
                template: n.template,
                position: Point::from_pos2(n.position),
                label: n.label.clone(),
                data: n.data.clone(),
                datasource: n.datasource.clone(),
            })
            .collect();
        let saved_binding = |b: &Binding| {
            graph.node_index(b.node).map(|node| SavedBinding {
                node,
                point: b.point.clone(),
            })
        };
        let links = graph
            .list_links()
            .map(|(_, l)| {
                let points = match constraint::link_path(scene, l) {
                    Some(path) => scene.world_points(path),
                    None => l.points.clone(),
                };
                SavedLink {
                    template: l.template,
                    style: l.style,
                    label: l.label.clone(),
                    data: l.data.clone(),
                    points: points.into_iter().map(Point::from_pos2).collect(),
                    start: l.start.as_ref().and_then(saved_binding),
                    end: l.end.as_ref().and_then(saved_binding),
                }
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            nodes,
            links,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Checks templates, point counts and node indices before anything is
    /// rebuilt.
    pub fn validate(&self, palette: &Palette) -> Result<()> {
        for n in &self.nodes {
            palette.node(n.template)?;
        }
        for (i, l) in self.links.iter().enumerate() {
            palette.link(l.template)?;
            if l.points.len() < 2 {
                return Err(EditorError::TooFewPoints);
            }
            for b in [&l.start, &l.end].into_iter().flatten() {
                if b.node >= self.nodes.len() {
                    return Err(EditorError::DanglingNodeIndex {
                        link: i,
                        index: b.node,
                    });
                }
            }
        }
        Ok(())
    }
}

impl EditorSession {
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        let json = SavedDiagram::capture(&self.graph, &self.scene).to_json()?;
        std::fs::write(path, json).map_err(|e| EditorError::io(path, e))?;
        tracing::info!(
            path = %path.display(),
            nodes = self.graph.node_count(),
            links = self.graph.link_count(),
            "diagram saved"
        );
        self.info(format!("saved {}", path.display()));
        Ok(())
    }

    /// Replaces the diagram with the file's content. On error the current
    /// diagram is left alone.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        let s = std::fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        let saved = SavedDiagram::from_json(&s)?;
        self.restore(saved)?;
        tracing::info!(
            path = %path.display(),
            nodes = self.graph.node_count(),
            links = self.graph.link_count(),
            "diagram loaded"
        );
        self.info(format!("loaded {}", path.display()));
        Ok(())
    }

    pub fn restore(&mut self, saved: SavedDiagram) -> Result<()> {
        saved.validate(&self.palette)?;
        if saved.version != FORMAT_VERSION {
            tracing::warn!(version = saved.version, "unexpected diagram version, reading anyway");
        }
        self.clear();
        self.scene.suspend();
        let result = self.rebuild(saved);
        self.scene.release();
        result
    }

    fn rebuild(&mut self, saved: SavedDiagram) -> Result<()> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(saved.nodes.len());
        for n in saved.nodes {
            let mut node = Node::new(n.template, n.position.to_pos2());
            node.label = n.label;
            node.data = n.data;
            node.datasource = n.datasource;
            ids.push(self.place_node(node)?);
        }
        for l in saved.links {
            let binding = |b: Option<SavedBinding>| {
                b.and_then(|b| {
                    ids.get(b.node).map(|node| Binding {
                        node: *node,
                        point: b.point,
                    })
                })
            };
            let mut link = Link::new(l.template, l.style);
            link.label = l.label;
            link.data = l.data;
            link.points = l.points.into_iter().map(Point::to_pos2).collect();
            link.start = binding(l.start);
            link.end = binding(l.end);
            self.place_link(link)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui;

    use super::*;
    use crate::settings::EditorSettings;

    fn session() -> EditorSession {
        EditorSession::new(Palette::default(), EditorSettings::default())
    }

    const TWO_TERMINALS: &str = r#"{
        "version": 1,
        "nodes": [
            { "template": 0, "position": { "x": 0.0, "y": 0.0 }, "label": "A" },
            { "template": 0, "position": { "x": 100.0, "y": 0.0 } }
        ],
        "links": [
            {
                "template": 0,
                "style": "Straight",
                "points": [ { "x": 5.0, "y": 5.0 }, { "x": 50.0, "y": 50.0 } ],
                "start": { "node": 1, "point": "Anchor" }
            }
        ]
    }"#;

    #[test]
    fn links_are_rebound_by_node_position() {
        let mut s = session();
        s.restore(SavedDiagram::from_json(TWO_TERMINALS).unwrap())
            .unwrap();
        assert_eq!(s.graph.node_count(), 2);
        let (_, link) = s.graph.list_links().next().unwrap();
        let second = s.graph.list_nodes().nth(1).map(|(id, _)| id);
        assert_eq!(link.start.as_ref().map(|b| b.node), second);
        assert!(link.end.is_none());
        let path = constraint::link_path(&s.scene, link).unwrap();
        assert_eq!(
            s.scene.world_points(path),
            vec![egui::pos2(100.0, 0.0), egui::pos2(50.0, 50.0)]
        );
    }

    #[test]
    fn dangling_index_leaves_diagram_untouched() {
        let mut s = session();
        s.create_node_at(1, egui::pos2(10.0, 10.0)).unwrap();
        let broken = TWO_TERMINALS.replace(r#""node": 1"#, r#""node": 7"#);
        let err = s
            .restore(SavedDiagram::from_json(&broken).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::DanglingNodeIndex { link: 0, index: 7 }
        ));
        assert_eq!(s.graph.node_count(), 1);
    }

    #[test]
    fn capture_writes_indices_not_ids() {
        let mut s = session();
        s.restore(SavedDiagram::from_json(TWO_TERMINALS).unwrap())
            .unwrap();
        let saved = SavedDiagram::capture(&s.graph, &s.scene);
        assert_eq!(
            saved.links[0].start,
            Some(SavedBinding {
                node: 1,
                point: "Anchor".into()
            })
        );
        assert_eq!(saved.nodes[0].label, "A");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut s = session();
        let err = s
            .load_from(Path::new("/nonexistent/linkdraw/diagram.json"))
            .unwrap_err();
        assert!(matches!(err, EditorError::Io { .. }));
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(
            SavedDiagram::from_json("{ nodes: "),
            Err(EditorError::Format(_))
        ));
    }
}
