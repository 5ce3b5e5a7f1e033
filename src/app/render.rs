use eframe::egui;

use linkdraw::geometry::View;
use linkdraw::scene::{PrimKind, Scene, TEXT_SIZE};
use linkdraw::session::{Status, StatusLevel};

/// Maps a world position onto the canvas.
fn to_screen(origin: egui::Pos2, view: &View, world: egui::Pos2) -> egui::Pos2 {
    origin + view.world_to_screen(world).to_vec2()
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, view: &View) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
    let grid_color = egui::Color32::from_gray(60);
    let spacing_screen = 64.0 * view.zoom;
    if spacing_screen < 24.0 {
        return;
    }
    let start = rect.min + view.pan_screen;
    let x0 = ((rect.min.x - start.x) / spacing_screen).floor() * spacing_screen + start.x;
    let y0 = ((rect.min.y - start.y) / spacing_screen).floor() * spacing_screen + start.y;
    let stroke = egui::Stroke::new(1.0, grid_color);
    let mut x = x0;
    while x < rect.max.x {
        painter.line_segment([egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)], stroke);
        x += spacing_screen;
    }
    let mut y = y0;
    while y < rect.max.y {
        painter.line_segment([egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)], stroke);
        y += spacing_screen;
    }
}

pub(super) fn draw_scene(painter: &egui::Painter, origin: egui::Pos2, view: &View, scene: &Scene) {
    for id in scene.draw_list() {
        let Some(prim) = scene.get(id) else {
            continue;
        };
        let pts: Vec<egui::Pos2> = scene
            .rendered_points(id)
            .into_iter()
            .map(|p| to_screen(origin, view, p))
            .collect();
        let stroke = egui::Stroke::new(prim.width * view.zoom, prim.color.to_color32());
        let fill = prim
            .fill
            .map(|f| f.to_color32())
            .unwrap_or(egui::Color32::TRANSPARENT);
        match &prim.kind {
            PrimKind::Group => {}
            PrimKind::Rect => {
                if let [a, b, ..] = pts.as_slice() {
                    let r = egui::Rect::from_two_pos(*a, *b);
                    painter.rect_filled(r, 0.0, fill);
                    painter.rect_stroke(r, 0.0, stroke, egui::StrokeKind::Middle);
                }
            }
            PrimKind::Ellipse => {
                if let [a, b, ..] = pts.as_slice() {
                    let r = egui::Rect::from_two_pos(*a, *b);
                    painter.add(egui::Shape::ellipse_filled(r.center(), r.size() * 0.5, fill));
                    painter.add(egui::Shape::ellipse_stroke(r.center(), r.size() * 0.5, stroke));
                }
            }
            PrimKind::Marker => {
                if let Some(p) = pts.first() {
                    painter.circle_stroke(*p, 2.5, egui::Stroke::new(1.0, stroke.color));
                }
            }
            PrimKind::Path { .. } => {
                if pts.len() >= 2 {
                    painter.add(egui::Shape::line(pts, stroke));
                }
            }
            PrimKind::Frame { text } | PrimKind::Text { text } => {
                let Some(pos) = (match pts.as_slice() {
                    [a, b, ..] => Some(*a + (*b - *a) * 0.5),
                    [a] => Some(*a),
                    [] => None,
                }) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                painter.text(
                    pos,
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(TEXT_SIZE * view.zoom),
                    prim.color.to_color32(),
                );
            }
        }
    }
}

/// Rings around the connection points a link gesture would use.
pub(super) fn draw_feedback(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    points: &[egui::Pos2],
    color: egui::Color32,
) {
    for p in points {
        painter.circle_stroke(to_screen(origin, view, *p), 6.0, egui::Stroke::new(2.0, color));
    }
}

pub(super) fn status_label(ui: &mut egui::Ui, status: Option<&Status>, prompt: Option<&str>) {
    match (status, prompt) {
        (Some(s), _) if s.level == StatusLevel::Error => {
            ui.colored_label(egui::Color32::from_rgb(220, 60, 60), s.text.as_str());
        }
        (_, Some(p)) => {
            ui.label(p);
        }
        (Some(s), None) => {
            ui.label(s.text.as_str());
        }
        (None, None) => {
            ui.label("Ready");
        }
    }
}
