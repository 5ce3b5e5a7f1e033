//! Node and link templates plus the toolbar icons that select them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::geometry::Point;
use crate::model::{Direction, EdgeStyle, Rgba};

/// Named points starting with this prefix are connection points.
pub const CONNECTION_PREFIX: &str = "CP";
/// Connection-point name used for reference-style nodes.
pub const ANCHOR_POINT: &str = "Anchor";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeShape {
    Box,
    Ellipse,
    Dot,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NamedPoint {
    pub name: String,
    /// Offset from the node position.
    pub offset: Point,
}

impl NamedPoint {
    pub fn is_connection_point(&self) -> bool {
        self.name.starts_with(CONNECTION_PREFIX)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// The node position itself is the only connection point.
    Reference,
    /// Named points; only names with [`CONNECTION_PREFIX`] accept links.
    Points { points: Vec<NamedPoint> },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeTemplate {
    pub name: String,
    pub shape: NodeShape,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_fill")]
    pub fill: Rgba,
    #[serde(default = "default_stroke")]
    pub stroke: Rgba,
    pub attachment: Attachment,
}

impl NodeTemplate {
    pub fn is_reference(&self) -> bool {
        matches!(self.attachment, Attachment::Reference)
    }

    pub fn connection_points(&self) -> impl Iterator<Item = &NamedPoint> + '_ {
        let points: &[NamedPoint] = match &self.attachment {
            Attachment::Reference => &[],
            Attachment::Points { points } => points,
        };
        points.iter().filter(|p| p.is_connection_point())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinkTemplate {
    pub name: String,
    pub style: EdgeStyle,
    #[serde(default = "default_stroke")]
    pub color: Rgba,
    #[serde(default = "default_link_width")]
    pub width: f32,
    /// Carries a label frame along the first segment.
    #[serde(default)]
    pub frame: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "template", rename_all = "snake_case")]
pub enum IconKind {
    Select,
    Node(usize),
    Link(usize),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Icon {
    pub label: String,
    pub kind: IconKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    pub nodes: Vec<NodeTemplate>,
    pub links: Vec<LinkTemplate>,
    pub icons: Vec<Icon>,
}

fn default_fill() -> Rgba {
    Rgba::rgb(250, 250, 250)
}

fn default_stroke() -> Rgba {
    Rgba::rgb(30, 30, 30)
}

fn default_link_width() -> f32 {
    2.0
}

fn point(name: &str, x: f32, y: f32) -> NamedPoint {
    NamedPoint {
        name: name.to_string(),
        offset: Point { x, y },
    }
}

impl Default for Palette {
    fn default() -> Self {
        let nodes = vec![
            NodeTemplate {
                name: "Terminal".into(),
                shape: NodeShape::Dot,
                width: 16.0,
                height: 16.0,
                fill: Rgba::rgb(40, 90, 200),
                stroke: default_stroke(),
                attachment: Attachment::Reference,
            },
            NodeTemplate {
                name: "Process".into(),
                shape: NodeShape::Box,
                width: 80.0,
                height: 50.0,
                fill: default_fill(),
                stroke: default_stroke(),
                attachment: Attachment::Points {
                    points: vec![
                        point("CP_N", 0.0, -25.0),
                        point("CP_E", 40.0, 0.0),
                        point("CP_S", 0.0, 25.0),
                        point("CP_W", -40.0, 0.0),
                        point("Center", 0.0, 0.0),
                    ],
                },
            },
            NodeTemplate {
                name: "Tank".into(),
                shape: NodeShape::Ellipse,
                width: 60.0,
                height: 60.0,
                fill: Rgba::rgb(220, 235, 250),
                stroke: default_stroke(),
                attachment: Attachment::Points {
                    points: vec![point("CP_In", 0.0, -30.0), point("CP_Out", 0.0, 30.0)],
                },
            },
        ];
        let links = vec![
            LinkTemplate {
                name: "Straight".into(),
                style: EdgeStyle::Straight,
                color: default_stroke(),
                width: default_link_width(),
                frame: true,
            },
            LinkTemplate {
                name: "Rectilinear".into(),
                style: EdgeStyle::Rectilinear(Direction::Horizontal),
                color: Rgba::rgb(40, 140, 60),
                width: default_link_width(),
                frame: false,
            },
            LinkTemplate {
                name: "Arc".into(),
                style: EdgeStyle::Arc,
                color: Rgba::rgb(130, 60, 180),
                width: default_link_width(),
                frame: false,
            },
        ];
        let mut icons = vec![Icon {
            label: "Select".into(),
            kind: IconKind::Select,
        }];
        icons.extend(nodes.iter().enumerate().map(|(i, t)| Icon {
            label: t.name.clone(),
            kind: IconKind::Node(i),
        }));
        icons.extend(links.iter().enumerate().map(|(i, t)| Icon {
            label: format!("{} link", t.name),
            kind: IconKind::Link(i),
        }));
        Self {
            nodes,
            links,
            icons,
        }
    }
}

impl Palette {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let palette: Self =
            toml::from_str(s).map_err(|e| EditorError::Settings(e.to_string()))?;
        palette.validate()?;
        Ok(palette)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        Self::from_toml_str(&s)
    }

    /// Checks that icons point at existing templates and that multi-point
    /// nodes expose at least one connection point.
    pub fn validate(&self) -> Result<()> {
        for icon in &self.icons {
            match icon.kind {
                IconKind::Select => {}
                IconKind::Node(i) => {
                    self.node(i)?;
                }
                IconKind::Link(i) => {
                    self.link(i)?;
                }
            }
        }
        for (i, t) in self.nodes.iter().enumerate() {
            if !t.is_reference() && t.connection_points().next().is_none() {
                return Err(EditorError::Settings(format!(
                    "node template {i} (`{}`) has no `{CONNECTION_PREFIX}` connection points",
                    t.name
                )));
            }
        }
        Ok(())
    }

    pub fn node(&self, index: usize) -> Result<&NodeTemplate> {
        self.nodes
            .get(index)
            .ok_or(EditorError::UnknownNodeTemplate(index))
    }

    pub fn link(&self, index: usize) -> Result<&LinkTemplate> {
        self.links
            .get(index)
            .ok_or(EditorError::UnknownLinkTemplate(index))
    }

    pub fn icon(&self, index: usize) -> Result<&Icon> {
        self.icons.get(index).ok_or(EditorError::UnknownIcon(index))
    }

    pub fn select_icon(&self) -> Option<usize> {
        self.icons.iter().position(|i| i.kind == IconKind::Select)
    }
}
