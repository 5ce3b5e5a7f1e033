use eframe::egui;
use serde::{Deserialize, Serialize};

/// Serializable world-space position.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

/// Pan and zoom of the canvas. Device positions are relative to the canvas
/// origin; world positions are what the model stores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub pan_screen: egui::Vec2,
    pub zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan_screen: egui::Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl View {
    pub fn world_to_screen(&self, world: egui::Pos2) -> egui::Pos2 {
        (self.pan_screen + world.to_vec2() * self.zoom).to_pos2()
    }

    pub fn screen_to_world(&self, screen: egui::Pos2) -> egui::Pos2 {
        ((screen.to_vec2() - self.pan_screen) / self.zoom).to_pos2()
    }

    /// Converts a device-pixel distance into world units at the current zoom.
    pub fn screen_len_to_world(&self, len: f32) -> f32 {
        len / self.zoom
    }

    /// Zooms so that the world point under `screen_point` stays put.
    pub fn zoom_about_screen_point(
        &mut self,
        screen_point: egui::Pos2,
        zoom: f32,
        min_zoom: f32,
        max_zoom: f32,
    ) {
        let before = self.screen_to_world(screen_point);
        self.zoom = zoom.clamp(min_zoom, max_zoom);
        let after_screen = self.world_to_screen(before);
        self.pan_screen += screen_point - after_screen;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn within_tolerance(a: egui::Pos2, b: egui::Pos2, tolerance: f32) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

pub fn distance_to_segment(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = (ap.x * ab.x + ap.y * ab.y) / ab_len2;
    let t = t.clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}

pub fn distance_to_polyline(p: egui::Pos2, points: &[egui::Pos2]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => (p - *only).length(),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

pub fn aabb_of_points(points: &[egui::Pos2]) -> egui::Rect {
    let mut min = egui::pos2(f32::INFINITY, f32::INFINITY);
    let mut max = egui::pos2(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    if min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite() {
        egui::Rect::from_min_max(min, max)
    } else {
        egui::Rect::NOTHING
    }
}

/// Axis-aligned route through `points`. Each segment leaves its start point
/// along `horizontal_first`'s axis and turns once.
pub fn rectilinear_route(points: &[egui::Pos2], horizontal_first: bool) -> Vec<egui::Pos2> {
    let mut out = Vec::with_capacity(points.len() * 2);
    let Some(first) = points.first() else {
        return out;
    };
    out.push(*first);
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let elbow = if horizontal_first {
            egui::pos2(b.x, a.y)
        } else {
            egui::pos2(a.x, b.y)
        };
        if elbow != a && elbow != b {
            out.push(elbow);
        }
        out.push(b);
    }
    out
}

/// Quadratic curve from `a` to `c` that passes through `mid` at t = 0.5.
pub fn arc_route(a: egui::Pos2, mid: egui::Pos2, c: egui::Pos2, steps: usize) -> Vec<egui::Pos2> {
    let steps = steps.max(2);
    let ctrl = egui::pos2(
        2.0 * mid.x - 0.5 * (a.x + c.x),
        2.0 * mid.y - 0.5 * (a.y + c.y),
    );
    (0..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            let u = 1.0 - t;
            egui::pos2(
                u * u * a.x + 2.0 * u * t * ctrl.x + t * t * c.x,
                u * u * a.y + 2.0 * u * t * ctrl.y + t * t * c.y,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_round_trips_through_zoom_and_pan() {
        let view = View {
            pan_screen: egui::vec2(30.0, -12.0),
            zoom: 2.5,
        };
        let world = egui::pos2(17.0, 4.0);
        let back = view.screen_to_world(view.world_to_screen(world));
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn zoom_about_point_keeps_point_fixed() {
        let mut view = View::default();
        let anchor = egui::pos2(400.0, 300.0);
        let world_before = view.screen_to_world(anchor);
        view.zoom_about_screen_point(anchor, 2.0, 0.1, 8.0);
        assert_eq!(view.zoom, 2.0);
        let world_after = view.screen_to_world(anchor);
        assert!((world_after - world_before).length() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = View::default();
        view.zoom_about_screen_point(egui::Pos2::ZERO, 100.0, 0.1, 8.0);
        assert_eq!(view.zoom, 8.0);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = egui::pos2(0.0, 0.0);
        let b = egui::pos2(10.0, 0.0);
        assert_eq!(distance_to_segment(egui::pos2(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(egui::pos2(-4.0, 3.0), a, b), 5.0);
    }

    #[test]
    fn rectilinear_route_inserts_elbows() {
        let pts = [egui::pos2(0.0, 0.0), egui::pos2(10.0, 5.0)];
        let h = rectilinear_route(&pts, true);
        assert_eq!(h, vec![pts[0], egui::pos2(10.0, 0.0), pts[1]]);
        let v = rectilinear_route(&pts, false);
        assert_eq!(v, vec![pts[0], egui::pos2(0.0, 5.0), pts[1]]);
    }

    #[test]
    fn arc_route_passes_through_middle() {
        let a = egui::pos2(0.0, 0.0);
        let mid = egui::pos2(5.0, 5.0);
        let c = egui::pos2(10.0, 0.0);
        let pts = arc_route(a, mid, c, 10);
        assert_eq!(pts.first(), Some(&a));
        assert!((pts[5] - mid).length() < 1e-4);
        assert!((pts[10] - c).length() < 1e-4);
    }
}
