//! Finds what a link endpoint would attach to under the cursor.

use eframe::egui;

use crate::geometry::{View, within_tolerance};
use crate::model::{Graph, NodeId};
use crate::palette::{ANCHOR_POINT, Palette};
use crate::scene::{Owner, PointRef, Scene};

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionPoint {
    pub node: NodeId,
    pub name: String,
    pub point: PointRef,
    /// World position at the time of resolution.
    pub position: egui::Pos2,
}

impl ConnectionPoint {
    pub fn same_point(&self, other: &ConnectionPoint) -> bool {
        self.node == other.node && self.name == other.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The point a press would bind to.
    Exact(ConnectionPoint),
    /// Cursor is over a multi-point node but near none of its points; all of
    /// them are offered for highlighting.
    Candidates(Vec<ConnectionPoint>),
    Nothing,
}

impl Resolution {
    /// Points to highlight as feedback.
    pub fn highlighted(&self) -> Vec<egui::Pos2> {
        match self {
            Self::Exact(cp) => vec![cp.position],
            Self::Candidates(cps) => cps.iter().map(|cp| cp.position).collect(),
            Self::Nothing => Vec::new(),
        }
    }
}

/// Resolves the connection target under `cursor` (device coordinates).
/// `tolerance` is in device pixels.
pub fn resolve(
    scene: &Scene,
    graph: &Graph,
    palette: &Palette,
    view: &View,
    cursor: egui::Pos2,
    tolerance: f32,
) -> Resolution {
    let world = view.screen_to_world(cursor);
    let tol = view.screen_len_to_world(tolerance);
    let mut seen: Vec<NodeId> = Vec::new();

    for prim in scene.hit_test(world, tol) {
        let Some(Owner::Node(node_id)) = scene.owner_of(prim) else {
            continue;
        };
        if seen.contains(&node_id) {
            continue;
        }
        seen.push(node_id);
        let Some(node) = graph.node(node_id) else {
            continue;
        };
        let (Ok(template), Some(root)) = (palette.node(node.template), node.prim) else {
            tracing::debug!(node = ?node_id, "hit node without template or visual");
            continue;
        };

        if template.is_reference() {
            let point = PointRef::new(root, 0);
            if let Some(position) = scene.world_point(point) {
                return Resolution::Exact(ConnectionPoint {
                    node: node_id,
                    name: ANCHOR_POINT.to_string(),
                    point,
                    position,
                });
            }
            continue;
        }

        let candidates: Vec<ConnectionPoint> = template
            .connection_points()
            .filter_map(|cp| {
                let point = scene.connection_point(root, template, &cp.name)?;
                Some(ConnectionPoint {
                    node: node_id,
                    name: cp.name.clone(),
                    point,
                    position: scene.world_point(point)?,
                })
            })
            .collect();

        let nearest = candidates
            .iter()
            .filter(|cp| within_tolerance(cp.position, world, tol))
            .min_by(|a, b| {
                (a.position - world)
                    .length()
                    .total_cmp(&(b.position - world).length())
            });
        if let Some(cp) = nearest {
            return Resolution::Exact(cp.clone());
        }
        if !candidates.is_empty() {
            return Resolution::Candidates(candidates);
        }
    }
    Resolution::Nothing
}
