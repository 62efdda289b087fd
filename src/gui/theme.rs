use eframe::egui;
use egui::{Color32, CornerRadius, Margin, Stroke};

pub const ACCENT_COLOR: Color32 = Color32::from_rgb(211, 47, 47);

/// Reference lines on histograms.
pub const REFERENCE_COLOR: Color32 = Color32::from_rgb(178, 34, 34);

/// Series colours, cycled in order.
pub const SERIES_COLORS: [Color32; 6] = [
    Color32::from_rgb(66, 133, 180),
    Color32::from_rgb(230, 140, 50),
    Color32::from_rgb(120, 170, 90),
    Color32::from_rgb(170, 110, 180),
    Color32::from_rgb(150, 150, 150),
    Color32::from_rgb(200, 180, 80),
];

pub const SPACING_SMALL: f32 = 8.0;
pub const SPACING_LARGE: f32 = 20.0;

const MARGIN_SIDEBAR: f32 = 10.0;
const MARGIN_CARD: f32 = 15.0;

pub fn series_color(index: usize) -> Color32 {
    SERIES_COLORS
        .get(index % SERIES_COLORS.len())
        .copied()
        .unwrap_or(ACCENT_COLOR)
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.active.bg_fill = ACCENT_COLOR;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.hovered.corner_radius = CornerRadius::same(6);
    visuals.widgets.inactive.corner_radius = CornerRadius::same(6);
    visuals.selection.bg_fill = ACCENT_COLOR.linear_multiply(0.4);

    visuals.faint_bg_color = Color32::from_rgb(35, 35, 35);
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 20);

    ctx.set_visuals(visuals);
}

pub fn card_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(CornerRadius::same(10))
        .inner_margin(Margin::same(MARGIN_CARD as i8))
        .stroke(Stroke::new(
            1.0,
            ui.visuals().widgets.noninteractive.bg_stroke.color,
        ))
}

pub fn sidebar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgb(25, 25, 25))
        .inner_margin(Margin::same(MARGIN_SIDEBAR as i8))
}
