//! Keeps node-bound link endpoints glued to their connection points and label
//! frames glued to a link's first segment.

use eframe::egui;

use crate::error::{EditorError, Result};
use crate::model::{Binding, Endpoint, Graph, Link, LinkId, NodeId};
use crate::palette::Palette;
use crate::scene::{FRAME, PATH, PointRef, PrimId, Scene};

pub fn link_path(scene: &Scene, link: &Link) -> Option<PrimId> {
    scene.find_child(link.prim?, PATH)
}

/// Scene point of a link endpoint, indexed against the drawn path.
pub fn endpoint_ref(scene: &Scene, link: &Link, end: Endpoint) -> Option<PointRef> {
    let path = link_path(scene, link)?;
    let n = scene.get(path)?.points.len();
    let index = match end {
        Endpoint::Start => 0,
        Endpoint::End => n.checked_sub(1)?,
    };
    Some(PointRef::new(path, index))
}

pub fn node_point_ref(
    scene: &Scene,
    graph: &Graph,
    palette: &Palette,
    binding: &Binding,
) -> Result<PointRef> {
    let unknown = || EditorError::UnknownConnectionPoint {
        name: binding.point.clone(),
    };
    let node = graph.node(binding.node).ok_or_else(unknown)?;
    let template = palette.node(node.template)?;
    let root = node.prim.ok_or_else(unknown)?;
    scene
        .connection_point(root, template, &binding.point)
        .ok_or_else(unknown)
}

pub fn attach(scene: &mut Scene, endpoint: PointRef, node_point: PointRef) -> bool {
    scene.suspend();
    let ok = scene.constrain(endpoint, node_point);
    scene.release();
    ok
}

pub fn detach(scene: &mut Scene, endpoint: PointRef) -> Option<PointRef> {
    scene.suspend();
    let source = scene.unconstrain(endpoint);
    scene.release();
    source
}

pub fn bind(
    scene: &mut Scene,
    graph: &mut Graph,
    palette: &Palette,
    link_id: LinkId,
    end: Endpoint,
    node: NodeId,
    point: &str,
) -> Result<()> {
    let binding = Binding {
        node,
        point: point.to_string(),
    };
    let node_point = node_point_ref(scene, graph, palette, &binding)?;
    let link = graph.link(link_id).ok_or(EditorError::StaleSelection)?;
    let endpoint = endpoint_ref(scene, link, end).ok_or(EditorError::StaleSelection)?;
    graph.bind_endpoint(link_id, end, node, point);
    attach(scene, endpoint, node_point);
    Ok(())
}

/// Re-attaches every recorded binding of a link. Bindings that cannot be
/// resolved are dropped and the endpoint stays where it is.
pub fn attach_bindings(
    scene: &mut Scene,
    graph: &mut Graph,
    palette: &Palette,
    link_id: LinkId,
) -> Vec<EditorError> {
    let mut problems = Vec::new();
    for end in [Endpoint::Start, Endpoint::End] {
        let Some(binding) = graph.link(link_id).and_then(|l| l.binding(end).cloned()) else {
            continue;
        };
        let resolved = node_point_ref(scene, graph, palette, &binding).and_then(|np| {
            let link = graph.link(link_id).ok_or(EditorError::StaleSelection)?;
            endpoint_ref(scene, link, end)
                .map(|ep| (ep, np))
                .ok_or(EditorError::StaleSelection)
        });
        match resolved {
            Ok((ep, np)) => {
                attach(scene, ep, np);
            }
            Err(e) => {
                tracing::warn!(link = ?link_id, point = %binding.point, error = %e, "dropping binding");
                graph.unbind_endpoint(link_id, end);
                problems.push(e);
            }
        }
    }
    sync_frame(scene, graph, link_id);
    problems
}

/// Re-ties the label frame of a link to its first segment.
pub fn sync_frame(scene: &mut Scene, graph: &Graph, link_id: LinkId) {
    let Some(link) = graph.link(link_id) else {
        return;
    };
    let (Some(root), Some(path)) = (link.prim, link_path(scene, link)) else {
        return;
    };
    let Some(frame) = scene.find_child(root, FRAME) else {
        return;
    };
    if scene.get(path).map_or(0, |p| p.points.len()) < 2 {
        return;
    }
    scene.suspend();
    for i in 0..2 {
        let dep = PointRef::new(frame, i);
        scene.unconstrain(dep);
        scene.constrain(dep, PointRef::new(path, i));
    }
    scene.release();
}

fn is_bound_index(link: &Link, index: usize, len: usize) -> bool {
    (index == 0 && link.start.is_some()) || (index + 1 == len && link.end.is_some())
}

/// Copies the drawn control points into the link's literal point list.
/// Entries for bound endpoints are left as they were.
pub fn store_literal_points(scene: &Scene, link: &mut Link) {
    let Some(path) = link_path(scene, link) else {
        return;
    };
    let drawn = scene.world_points(path);
    let len = drawn.len();
    let mut stored = Vec::with_capacity(len);
    for (i, p) in drawn.into_iter().enumerate() {
        let keep_old = is_bound_index(link, i, len);
        let old = if i + 1 == len && len > 0 {
            link.points.last().copied()
        } else {
            link.points.get(i).copied()
        };
        stored.push(match (keep_old, old) {
            (true, Some(old)) => old,
            _ => p,
        });
    }
    link.points = stored;
}

pub fn refresh_node_position(scene: &Scene, graph: &mut Graph, node: NodeId) {
    let Some(root) = graph.node(node).and_then(|n| n.prim) else {
        return;
    };
    if let Some(p) = scene.world_point(PointRef::new(root, 0)) {
        if let Some(n) = graph.node_mut(node) {
            n.position = p;
        }
    }
}

/// Moves a link by `delta` as one rigid gesture. Nodes at bound endpoints
/// move with it; the returned nodes are the ones that moved.
pub fn move_link(
    scene: &mut Scene,
    graph: &mut Graph,
    palette: &Palette,
    link_id: LinkId,
    delta: egui::Vec2,
) -> Vec<NodeId> {
    let Some(link) = graph.link(link_id).cloned() else {
        return Vec::new();
    };
    let Some(path) = link_path(scene, &link) else {
        return Vec::new();
    };

    let mut moved = Vec::new();
    let mut detached = Vec::new();
    scene.suspend();
    for end in [Endpoint::Start, Endpoint::End] {
        let Some(binding) = link.binding(end) else {
            continue;
        };
        let reference = graph
            .node(binding.node)
            .and_then(|n| palette.node(n.template).ok())
            .is_some_and(|t| t.is_reference());
        if !moved.contains(&binding.node) {
            moved.push(binding.node);
        }
        if reference {
            continue;
        }
        if let Some(ep) = endpoint_ref(scene, &link, end) {
            if let Some(source) = detach(scene, ep) {
                detached.push((ep, source, binding.node));
            }
        }
    }

    scene.translate(path, delta);

    let mut shifted: Vec<NodeId> = Vec::new();
    for (_, _, node) in &detached {
        if shifted.contains(node) {
            continue;
        }
        if let Some(root) = graph.node(*node).and_then(|n| n.prim) {
            scene.translate(root, delta);
        }
        shifted.push(*node);
    }
    for (ep, source, _) in detached {
        attach(scene, ep, source);
    }
    scene.release();

    for node in &moved {
        refresh_node_position(scene, graph, *node);
    }
    if let Some(l) = graph.link_mut(link_id) {
        store_literal_points(scene, l);
    }
    moved
}

/// Moves a node; every endpoint bound to it follows through its constraint.
pub fn move_node(scene: &mut Scene, graph: &mut Graph, node: NodeId, delta: egui::Vec2) {
    let Some(root) = graph.node(node).and_then(|n| n.prim) else {
        return;
    };
    scene.translate(root, delta);
    refresh_node_position(scene, graph, node);
}
