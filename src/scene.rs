//! Retained scene graph the editor draws into.
//!
//! Primitives form a tree. A group's single point is its origin; every other
//! primitive stores its points relative to the origins of its ancestor
//! groups. Any primitive may carry an [`Owner`] back-reference to the node or
//! link it belongs to.
//!
//! A point may be constrained to another point: reads of the dependent point
//! resolve to the source, and writes to the dependent go through to the
//! source. Constraint edits and other batched changes should be bracketed by
//! [`Scene::suspend`] / [`Scene::release`] so that only one redraw is issued.

use std::collections::HashMap;

use eframe::egui;
use slotmap::{SlotMap, new_key_type};

use crate::geometry::{self, distance_to_polyline};
use crate::model::{Direction, EdgeStyle, LinkId, NodeId, Rgba};
use crate::palette::{ANCHOR_POINT, Attachment, LinkTemplate, NodeShape, NodeTemplate};

new_key_type! {
    pub struct PrimId;
}

pub const TEXT_SIZE: f32 = 14.0;
const MAX_CONSTRAINT_DEPTH: usize = 16;

pub const BODY: &str = "Body";
pub const LABEL: &str = "Label";
pub const PATH: &str = "Path";
pub const FRAME: &str = "Frame";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Node(NodeId),
    Link(LinkId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointRef {
    pub prim: PrimId,
    pub index: usize,
}

impl PointRef {
    pub fn new(prim: PrimId, index: usize) -> Self {
        Self { prim, index }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Straight,
    Rectilinear(Direction),
    Arc,
}

impl From<EdgeStyle> for Route {
    fn from(style: EdgeStyle) -> Self {
        match style {
            EdgeStyle::Straight => Self::Straight,
            EdgeStyle::Rectilinear(d) => Self::Rectilinear(d),
            EdgeStyle::Arc => Self::Arc,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PrimKind {
    /// Point 0 is the origin of the children's frame.
    Group,
    Rect,
    Ellipse,
    /// A single named point, picked within tolerance.
    Marker,
    Path { route: Route },
    /// Two points; the text is drawn at their midpoint.
    Frame { text: String },
    Text { text: String },
}

#[derive(Clone, Debug)]
pub struct Primitive {
    pub name: String,
    pub kind: PrimKind,
    pub points: Vec<egui::Pos2>,
    pub parent: Option<PrimId>,
    pub children: Vec<PrimId>,
    pub owner: Option<Owner>,
    pub visible: bool,
    pub color: Rgba,
    pub fill: Option<Rgba>,
    pub width: f32,
}

impl Primitive {
    pub fn new(name: &str, kind: PrimKind, points: Vec<egui::Pos2>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            points,
            parent: None,
            children: Vec::new(),
            owner: None,
            visible: true,
            color: Rgba::rgb(30, 30, 30),
            fill: None,
            width: 1.0,
        }
    }

    pub fn group(name: &str, origin: egui::Pos2) -> Self {
        Self::new(name, PrimKind::Group, vec![origin])
    }

    fn with_color(mut self, color: Rgba, fill: Option<Rgba>, width: f32) -> Self {
        self.color = color;
        self.fill = fill;
        self.width = width;
        self
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    prims: SlotMap<PrimId, Primitive>,
    /// Top-level primitives, back to front.
    roots: Vec<PrimId>,
    /// Dependent point -> source point.
    constraints: HashMap<PointRef, PointRef>,
    suspend_depth: u32,
    pending_redraw: bool,
    redraws: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut prim: Primitive, parent: Option<PrimId>) -> PrimId {
        prim.parent = parent.filter(|p| self.prims.contains_key(*p));
        let parent = prim.parent;
        let id = self.prims.insert(prim);
        match parent {
            Some(p) => self.prims[p].children.push(id),
            None => self.roots.push(id),
        }
        self.request_redraw();
        id
    }

    pub fn get(&self, id: PrimId) -> Option<&Primitive> {
        self.prims.get(id)
    }

    pub fn get_mut(&mut self, id: PrimId) -> Option<&mut Primitive> {
        self.prims.get_mut(id)
    }

    pub fn contains(&self, id: PrimId) -> bool {
        self.prims.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    fn subtree(&self, id: PrimId) -> Vec<PrimId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(p) = stack.pop() {
            if let Some(prim) = self.prims.get(p) {
                out.push(p);
                stack.extend(prim.children.iter().copied());
            }
        }
        out
    }

    /// Deletes a primitive and its children. Points elsewhere that were
    /// constrained to a deleted point keep their current position.
    pub fn delete(&mut self, id: PrimId) {
        if !self.prims.contains_key(id) {
            return;
        }
        let doomed = self.subtree(id);
        self.suspend();
        let orphaned: Vec<PointRef> = self
            .constraints
            .iter()
            .filter(|(dep, src)| doomed.contains(&src.prim) && !doomed.contains(&dep.prim))
            .map(|(dep, _)| *dep)
            .collect();
        for dep in orphaned {
            self.unconstrain(dep);
        }
        self.constraints.retain(|dep, _| !doomed.contains(&dep.prim));
        match self.prims[id].parent {
            Some(parent) => {
                if let Some(p) = self.prims.get_mut(parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        for p in doomed {
            self.prims.remove(p);
        }
        self.request_redraw();
        self.release();
    }

    pub fn clear(&mut self) {
        self.prims.clear();
        self.roots.clear();
        self.constraints.clear();
        self.request_redraw();
    }

    pub fn suspend(&mut self) {
        self.suspend_depth += 1;
    }

    pub fn release(&mut self) {
        if self.suspend_depth == 0 {
            tracing::debug!("scene release without matching suspend");
            return;
        }
        self.suspend_depth -= 1;
        if self.suspend_depth == 0 && self.pending_redraw {
            self.pending_redraw = false;
            self.redraws += 1;
        }
    }

    pub fn request_redraw(&mut self) {
        if self.suspend_depth > 0 {
            self.pending_redraw = true;
        } else {
            self.redraws += 1;
        }
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// World offset of the frame a primitive's points are expressed in.
    fn frame_offset(&self, id: PrimId) -> egui::Vec2 {
        let mut offset = egui::Vec2::ZERO;
        let mut cur = self.prims.get(id).and_then(|p| p.parent);
        while let Some(p) = cur {
            let Some(prim) = self.prims.get(p) else {
                break;
            };
            if let Some(origin) = prim.points.first() {
                offset += origin.to_vec2();
            }
            cur = prim.parent;
        }
        offset
    }

    fn resolve(&self, r: PointRef) -> PointRef {
        let mut cur = r;
        for _ in 0..MAX_CONSTRAINT_DEPTH {
            match self.constraints.get(&cur) {
                Some(src) => cur = *src,
                None => return cur,
            }
        }
        cur
    }

    // True when `r` is `target` or reaches it through the source chain.
    fn follows(&self, r: PointRef, target: PointRef) -> bool {
        let mut cur = r;
        for _ in 0..=MAX_CONSTRAINT_DEPTH {
            if cur == target {
                return true;
            }
            match self.constraints.get(&cur) {
                Some(src) => cur = *src,
                None => return false,
            }
        }
        true
    }

    pub fn world_point(&self, r: PointRef) -> Option<egui::Pos2> {
        let r = self.resolve(r);
        let local = *self.prims.get(r.prim)?.points.get(r.index)?;
        Some(local + self.frame_offset(r.prim))
    }

    pub fn world_points(&self, id: PrimId) -> Vec<egui::Pos2> {
        let n = self.prims.get(id).map_or(0, |p| p.points.len());
        (0..n)
            .filter_map(|i| self.world_point(PointRef::new(id, i)))
            .collect()
    }

    /// Writes a point in world coordinates, through any constraint.
    pub fn set_world_point(&mut self, r: PointRef, world: egui::Pos2) -> bool {
        let r = self.resolve(r);
        let offset = self.frame_offset(r.prim);
        let Some(slot) = self
            .prims
            .get_mut(r.prim)
            .and_then(|p| p.points.get_mut(r.index))
        else {
            return false;
        };
        *slot = world - offset;
        self.request_redraw();
        true
    }

    /// Moves every point of a primitive by `delta`. Constrained points move
    /// their source.
    pub fn translate(&mut self, id: PrimId, delta: egui::Vec2) {
        let n = self.prims.get(id).map_or(0, |p| p.points.len());
        self.suspend();
        for i in 0..n {
            let r = PointRef::new(id, i);
            if let Some(p) = self.world_point(r) {
                self.set_world_point(r, p + delta);
            }
        }
        self.release();
    }

    pub fn insert_point(&mut self, id: PrimId, index: usize, world: egui::Pos2) -> bool {
        let offset = self.frame_offset(id);
        let Some(prim) = self.prims.get_mut(id) else {
            return false;
        };
        let index = index.min(prim.points.len());
        prim.points.insert(index, world - offset);
        // Shift constraints that address points at or after the insertion.
        let shifted: Vec<(PointRef, PointRef)> = self.constraints.drain().collect();
        for (mut dep, mut src) in shifted {
            if dep.prim == id && dep.index >= index {
                dep.index += 1;
            }
            if src.prim == id && src.index >= index {
                src.index += 1;
            }
            self.constraints.insert(dep, src);
        }
        self.request_redraw();
        true
    }

    pub fn remove_point(&mut self, id: PrimId, index: usize) -> bool {
        let Some(prim) = self.prims.get_mut(id) else {
            return false;
        };
        if index >= prim.points.len() {
            return false;
        }
        prim.points.remove(index);
        let shifted: Vec<(PointRef, PointRef)> = self.constraints.drain().collect();
        for (mut dep, mut src) in shifted {
            if (dep.prim == id && dep.index == index) || (src.prim == id && src.index == index) {
                continue;
            }
            if dep.prim == id && dep.index > index {
                dep.index -= 1;
            }
            if src.prim == id && src.index > index {
                src.index -= 1;
            }
            self.constraints.insert(dep, src);
        }
        self.request_redraw();
        true
    }

    /// Makes `dependent` always equal `source`. Refuses self and cyclic
    /// constraints.
    pub fn constrain(&mut self, dependent: PointRef, source: PointRef) -> bool {
        if self.world_point(dependent).is_none() || self.world_point(source).is_none() {
            return false;
        }
        if self.follows(source, dependent) {
            return false;
        }
        self.constraints.insert(dependent, source);
        self.request_redraw();
        true
    }

    /// Removes the constraint on `dependent`, leaving it at its current
    /// position, and returns the point it followed.
    pub fn unconstrain(&mut self, dependent: PointRef) -> Option<PointRef> {
        let here = self.world_point(dependent);
        let source = self.constraints.remove(&dependent)?;
        if let Some(world) = here {
            self.set_world_point(dependent, world);
        }
        Some(source)
    }

    pub fn source_of(&self, dependent: PointRef) -> Option<PointRef> {
        self.constraints.get(&dependent).copied()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn find_child(&self, root: PrimId, name: &str) -> Option<PrimId> {
        self.subtree(root)
            .into_iter()
            .find(|p| self.prims.get(*p).is_some_and(|prim| prim.name == name))
    }

    pub fn children(&self, id: PrimId) -> &[PrimId] {
        self.prims.get(id).map_or(&[], |p| p.children.as_slice())
    }

    /// Walks the containment chain outwards to the first owned primitive.
    pub fn owner_of(&self, id: PrimId) -> Option<Owner> {
        let mut cur = Some(id);
        while let Some(p) = cur {
            let prim = self.prims.get(p)?;
            if let Some(owner) = prim.owner {
                return Some(owner);
            }
            cur = prim.parent;
        }
        None
    }

    fn is_shown(&self, id: PrimId) -> bool {
        let mut cur = Some(id);
        while let Some(p) = cur {
            let Some(prim) = self.prims.get(p) else {
                return false;
            };
            if !prim.visible {
                return false;
            }
            cur = prim.parent;
        }
        true
    }

    pub fn draw_list(&self) -> Vec<PrimId> {
        let mut out = Vec::new();
        for root in &self.roots {
            self.collect_leaves(*root, &mut out);
        }
        out
    }

    fn collect_leaves(&self, id: PrimId, out: &mut Vec<PrimId>) {
        let Some(prim) = self.prims.get(id) else {
            return;
        };
        if !prim.visible {
            return;
        }
        if prim.kind != PrimKind::Group {
            out.push(id);
        }
        for c in &prim.children {
            self.collect_leaves(*c, out);
        }
    }

    /// Points actually drawn for a primitive, with path routes expanded.
    pub fn rendered_points(&self, id: PrimId) -> Vec<egui::Pos2> {
        let pts = self.world_points(id);
        match self.prims.get(id).map(|p| &p.kind) {
            Some(PrimKind::Path { route }) => match route {
                Route::Straight => pts,
                Route::Rectilinear(dir) => {
                    geometry::rectilinear_route(&pts, *dir == Direction::Horizontal)
                }
                Route::Arc if pts.len() == 3 => geometry::arc_route(pts[0], pts[1], pts[2], 24),
                Route::Arc => pts,
            },
            _ => pts,
        }
    }

    fn hits(&self, id: PrimId, p: egui::Pos2, tolerance: f32) -> bool {
        let Some(prim) = self.prims.get(id) else {
            return false;
        };
        let pts = self.world_points(id);
        match &prim.kind {
            PrimKind::Group => false,
            PrimKind::Rect => geometry::aabb_of_points(&pts)
                .expand(tolerance)
                .contains(p),
            PrimKind::Ellipse => {
                let r = geometry::aabb_of_points(&pts);
                let rx = r.width() * 0.5 + tolerance;
                let ry = r.height() * 0.5 + tolerance;
                if rx <= f32::EPSILON || ry <= f32::EPSILON {
                    return false;
                }
                let v = p - r.center();
                (v.x / rx).powi(2) + (v.y / ry).powi(2) <= 1.0
            }
            PrimKind::Marker => pts
                .first()
                .is_some_and(|m| geometry::within_tolerance(*m, p, tolerance)),
            PrimKind::Path { .. } | PrimKind::Frame { .. } => {
                let drawn = self.rendered_points(id);
                distance_to_polyline(p, &drawn) <= tolerance + prim.width * 0.5
            }
            PrimKind::Text { text } => {
                let Some(pos) = pts.first() else {
                    return false;
                };
                let w = (text.chars().count() as f32).max(1.0) * TEXT_SIZE * 0.6;
                let h = TEXT_SIZE * 1.2;
                egui::Rect::from_center_size(*pos, egui::vec2(w, h))
                    .expand(tolerance)
                    .contains(p)
            }
        }
    }

    /// Visible leaf primitives within `tolerance` of `p`, topmost first.
    pub fn hit_test(&self, p: egui::Pos2, tolerance: f32) -> Vec<PrimId> {
        self.draw_list()
            .into_iter()
            .rev()
            .filter(|id| self.is_shown(*id) && self.hits(*id, p, tolerance))
            .collect()
    }

    pub fn add_node_visual(
        &mut self,
        template: &NodeTemplate,
        position: egui::Pos2,
        owner: NodeId,
        label: &str,
    ) -> PrimId {
        self.suspend();
        let mut group = Primitive::group(&template.name, position);
        group.owner = Some(Owner::Node(owner));
        let root = self.add(group, None);

        let half = egui::vec2(template.width * 0.5, template.height * 0.5);
        let corners = vec![(-half).to_pos2(), half.to_pos2()];
        let kind = match template.shape {
            NodeShape::Box => PrimKind::Rect,
            NodeShape::Ellipse | NodeShape::Dot => PrimKind::Ellipse,
        };
        self.add(
            Primitive::new(BODY, kind, corners).with_color(
                template.stroke,
                Some(template.fill),
                1.5,
            ),
            Some(root),
        );
        self.add(
            Primitive::new(
                LABEL,
                PrimKind::Text {
                    text: label.to_string(),
                },
                vec![egui::pos2(0.0, half.y + TEXT_SIZE)],
            ),
            Some(root),
        );
        if let Attachment::Points { points } = &template.attachment {
            for p in points {
                self.add(
                    Primitive::new(&p.name, PrimKind::Marker, vec![p.offset.to_pos2()])
                        .with_color(template.stroke, None, 1.0),
                    Some(root),
                );
            }
        }
        self.release();
        root
    }

    pub fn add_link_visual(
        &mut self,
        template: &LinkTemplate,
        style: EdgeStyle,
        points: &[egui::Pos2],
        owner: LinkId,
        label: &str,
    ) -> PrimId {
        self.suspend();
        let mut group = Primitive::group(&template.name, egui::Pos2::ZERO);
        group.owner = Some(Owner::Link(owner));
        let root = self.add(group, None);
        self.add(
            Primitive::new(
                PATH,
                PrimKind::Path {
                    route: style.into(),
                },
                points.to_vec(),
            )
            .with_color(template.color, None, template.width),
            Some(root),
        );
        if template.frame {
            let first_two = points.iter().take(2).copied().collect();
            self.add(
                Primitive::new(
                    FRAME,
                    PrimKind::Frame {
                        text: label.to_string(),
                    },
                    first_two,
                )
                .with_color(template.color, None, 0.0),
                Some(root),
            );
        }
        self.release();
        root
    }

    pub fn connection_point(
        &self,
        node_root: PrimId,
        template: &NodeTemplate,
        name: &str,
    ) -> Option<PointRef> {
        match &template.attachment {
            Attachment::Reference => (name == ANCHOR_POINT).then(|| PointRef::new(node_root, 0)),
            Attachment::Points { .. } => {
                let marker = self.find_child(node_root, name)?;
                (self.prims[marker].kind == PrimKind::Marker).then(|| PointRef::new(marker, 0))
            }
        }
    }

    pub fn set_text(&mut self, root: PrimId, text: &str) {
        for name in [LABEL, FRAME] {
            if let Some(id) = self.find_child(root, name) {
                if let Some(prim) = self.prims.get_mut(id) {
                    match &mut prim.kind {
                        PrimKind::Text { text: t } | PrimKind::Frame { text: t } => {
                            *t = text.to_string();
                        }
                        _ => {}
                    }
                }
            }
        }
        self.request_redraw();
    }

    pub fn set_route(&mut self, path: PrimId, route: Route) {
        if let Some(PrimKind::Path { route: r }) = self.prims.get_mut(path).map(|p| &mut p.kind) {
            *r = route;
            self.request_redraw();
        }
    }

    pub fn set_visible(&mut self, id: PrimId, visible: bool) {
        if let Some(p) = self.prims.get_mut(id) {
            p.visible = visible;
            self.request_redraw();
        }
    }
}
