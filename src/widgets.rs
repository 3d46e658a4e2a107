use std::f32::consts::TAU;

use eframe::egui::{Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Vec2, Widget};

/// Circular countdown display: a track, an arc for the elapsed part and the
/// remaining time in the middle.
pub struct ProgressRing<'a> {
    progress: f32,
    label: &'a str,
    color: Color32,
    radius: Option<f32>,
    stroke_width: f32,
}

impl<'a> ProgressRing<'a> {
    #[must_use]
    pub fn new(progress: f32, label: &'a str, color: Color32) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            label,
            color,
            radius: None,
            stroke_width: 8.0,
        }
    }

    #[must_use]
    pub const fn radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }
}

impl Widget for ProgressRing<'_> {
    fn ui(self, ui: &mut eframe::egui::Ui) -> eframe::egui::Response {
        let radius = self
            .radius
            .unwrap_or_else(|| ui.available_width().min(ui.available_height()) / 2.);
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(radius * 2.), Sense::hover());
        let center = rect.center();
        let ring_radius = radius - self.stroke_width;
        let visuals = ui.style().noninteractive();

        ui.painter().circle_stroke(
            center,
            ring_radius,
            Stroke::new(self.stroke_width, visuals.bg_stroke.color),
        );
        if self.progress > 0. {
            // start at the top and go clockwise
            let segments = (self.progress * 120.).ceil().max(2.);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let points: Vec<Pos2> = (0..=segments as usize)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let angle = (i as f32 / segments).mul_add(self.progress * TAU, -TAU / 4.);
                    center + Vec2::angled(angle) * ring_radius
                })
                .collect();
            ui.painter()
                .add(Shape::line(points, Stroke::new(self.stroke_width, self.color)));
        }
        ui.painter().text(
            center,
            Align2::CENTER_CENTER,
            self.label,
            FontId::monospace(radius / 2.5),
            visuals.fg_stroke.color,
        );
        response
    }
}
