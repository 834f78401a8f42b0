//! UI theme constants — warm light palette with an orange accent.

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(250, 249, 247);
pub const BG_BUBBLE: Color32 = Color32::from_rgb(240, 239, 236);
pub const ACCENT: Color32 = Color32::from_rgb(255, 107, 53);
pub const ACCENT_SOFT: Color32 = Color32::from_rgb(255, 235, 226);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(35, 35, 40);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(125, 125, 133);
pub const TEXT_ON_ACCENT: Color32 = Color32::WHITE;
pub const ONLINE: Color32 = Color32::from_rgb(34, 197, 94);

pub const BUBBLE_ROUNDING: CornerRadius = CornerRadius::same(12);
pub const CHIP_ROUNDING: CornerRadius = CornerRadius::same(14);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 10.0);

/// Apply the light theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = false;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_PRIMARY;
    style.visuals.extreme_bg_color = Color32::WHITE;
    style.visuals.override_text_color = Some(TEXT_PRIMARY);

    style.visuals.widgets.inactive.bg_fill = BG_BUBBLE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = ACCENT_SOFT;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, TEXT_ON_ACCENT);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.4);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}
