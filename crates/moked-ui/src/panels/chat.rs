//! Chat panel — the entire widget surface: header, transcript, suggestion
//! chips, and the input row.
//!
//! Hebrew-first layout: rows run right-to-left and bubbles mirror the usual
//! chat arrangement (assistant on the right, user on the left). The panel
//! only reads controller state; anything the user does comes back as a
//! [`ChatIntent`] for the host to act on.

use egui::{self, Align, Color32, Layout, RichText, ScrollArea, Vec2};

use moked_core::controller::ChatController;
use moked_types::message::{Message, Role};

use crate::theme::*;

/// What the user asked for this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIntent {
    /// Submit this text (typed, quick action, or follow-up chip).
    Send(String),
    /// Start a fresh conversation.
    NewChat,
}

/// Input field content, owned by the host across frames.
#[derive(Default)]
pub struct InputState {
    pub text: String,
}

/// Render the widget. Returns at most one intent per frame.
pub fn chat_panel(
    ui: &mut egui::Ui,
    controller: &ChatController,
    input: &mut InputState,
) -> Option<ChatIntent> {
    let mut intent = None;

    ui.vertical(|ui| {
        if let Some(i) = header(ui, controller) {
            intent = Some(i);
        }

        // Transcript takes whatever the chips and input row leave over.
        let chips_height = if controller.show_quick_actions() || controller.show_follow_ups() {
            44.0
        } else {
            0.0
        };
        let transcript_height = ui.available_height() - 52.0 - chips_height;

        egui::Frame::default()
            .fill(BG_PRIMARY)
            .inner_margin(PANEL_PADDING)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .max_height(transcript_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        transcript(ui, controller);
                    });
            });

        if let Some(i) = chips(ui, controller) {
            intent = Some(i);
        }

        if let Some(i) = input_row(ui, controller, input) {
            intent = Some(i);
        }
    });

    intent
}

// ─── Header ──────────────────────────────────────────────────

fn header(ui: &mut egui::Ui, controller: &ChatController) -> Option<ChatIntent> {
    let mut intent = None;
    let texts = &controller.config().texts;

    egui::Frame::default()
        .fill(ACCENT)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(&texts.title)
                        .color(TEXT_ON_ACCENT)
                        .strong()
                        .size(16.0),
                );
                let status = if controller.is_loading() {
                    &texts.status_typing
                } else {
                    &texts.status_online
                };
                ui.label(RichText::new("●").color(ONLINE).small());
                ui.label(RichText::new(status).color(TEXT_ON_ACCENT).small());

                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    let new_chat = ui.add(
                        egui::Button::new(RichText::new(&texts.new_chat).color(ACCENT).small())
                            .fill(TEXT_ON_ACCENT)
                            .corner_radius(CHIP_ROUNDING),
                    );
                    if new_chat.clicked() {
                        intent = Some(ChatIntent::NewChat);
                    }
                });
            });
        });

    intent
}

// ─── Transcript ──────────────────────────────────────────────

fn transcript(ui: &mut egui::Ui, controller: &ChatController) {
    if let Some(lines) = controller.welcome_revealed() {
        for line in lines {
            bubble(ui, Role::Assistant, line);
            ui.add_space(4.0);
        }
    }

    for message in controller.messages() {
        message_bubble(ui, message);
        ui.add_space(4.0);
    }

    if let Some(text) = controller.streaming_visible() {
        if !text.is_empty() {
            streaming_bubble(ui, text);
            ui.add_space(4.0);
        }
    }

    if controller.show_typing_indicator() {
        typing_indicator(ui, controller);
    }
}

fn message_bubble(ui: &mut egui::Ui, message: &Message) {
    bubble(ui, message.role, &message.content);
}

fn bubble(ui: &mut egui::Ui, role: Role, text: &str) {
    // RTL mirror: assistant bubbles sit on the right, user on the left.
    let (align, fill, text_color) = match role {
        Role::Assistant => (Align::Max, BG_BUBBLE, TEXT_PRIMARY),
        Role::User => (Align::Min, ACCENT, TEXT_ON_ACCENT),
    };

    ui.with_layout(Layout::top_down(align), |ui| {
        let max_width = ui.available_width() * 0.82;
        egui::Frame::default()
            .fill(fill)
            .corner_radius(BUBBLE_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.label(RichText::new(text).color(text_color));
            });
    });
}

fn streaming_bubble(ui: &mut egui::Ui, text: &str) {
    ui.with_layout(Layout::top_down(Align::Max), |ui| {
        let max_width = ui.available_width() * 0.82;
        egui::Frame::default()
            .fill(BG_BUBBLE)
            .corner_radius(BUBBLE_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(text).color(TEXT_PRIMARY));
                    ui.label(RichText::new("▌").color(ACCENT).strong());
                });
            });
    });
}

fn typing_indicator(ui: &mut egui::Ui, controller: &ChatController) {
    let time = ui.input(|i| i.time);
    let dots = dot_count(time);
    let label = format!(
        "{} {}",
        controller.config().texts.thinking,
        "●".repeat(dots)
    );
    ui.with_layout(Layout::top_down(Align::Max), |ui| {
        egui::Frame::default()
            .fill(BG_BUBBLE)
            .corner_radius(BUBBLE_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
            });
    });
    // Keep the dots moving even when no events arrive.
    ui.ctx()
        .request_repaint_after(std::time::Duration::from_millis(250));
}

/// 1..=3 dots, cycling roughly twice a second.
pub(crate) fn dot_count(time: f64) -> usize {
    ((time * 2.0) as usize) % 3 + 1
}

// ─── Suggestion chips ────────────────────────────────────────

fn chips(ui: &mut egui::Ui, controller: &ChatController) -> Option<ChatIntent> {
    let mut intent = None;

    if controller.show_quick_actions() {
        ui.horizontal_wrapped(|ui| {
            for action in &controller.config().quick_actions {
                let label = format!("{} {}", action.icon, action.label);
                if chip(ui, &label).clicked() {
                    intent = Some(ChatIntent::Send(action.label.clone()));
                }
            }
        });
    } else if controller.show_follow_ups() {
        ui.horizontal_wrapped(|ui| {
            for suggestion in controller.suggestions() {
                if chip(ui, suggestion).clicked() {
                    intent = Some(ChatIntent::Send(suggestion.clone()));
                }
            }
        });
    }

    intent
}

fn chip(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(ACCENT).small())
            .fill(ACCENT_SOFT)
            .stroke(egui::Stroke::new(1.0, ACCENT.linear_multiply(0.5)))
            .corner_radius(CHIP_ROUNDING),
    )
}

// ─── Input row ───────────────────────────────────────────────

fn input_row(
    ui: &mut egui::Ui,
    controller: &ChatController,
    input: &mut InputState,
) -> Option<ChatIntent> {
    let mut intent = None;

    egui::Frame::default()
        .fill(Color32::WHITE)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let field = egui::TextEdit::singleline(&mut input.text)
                    .hint_text(&controller.config().texts.input_hint)
                    .desired_width(ui.available_width() - 52.0)
                    .font(egui::FontId::proportional(14.0));
                let response = ui.add(field);

                let send_enabled = !input.text.trim().is_empty() && !controller.is_loading();
                let send_btn = ui.add_enabled(
                    send_enabled,
                    egui::Button::new(RichText::new("➤").color(TEXT_ON_ACCENT))
                        .fill(if send_enabled { ACCENT } else { BG_BUBBLE })
                        .corner_radius(CHIP_ROUNDING)
                        .min_size(Vec2::new(40.0, 0.0)),
                );

                let submitted = response.lost_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter))
                    && send_enabled;
                if submitted || send_btn.clicked() {
                    let text = input.text.trim().to_string();
                    if !text.is_empty() {
                        intent = Some(ChatIntent::Send(text));
                        input.text.clear();
                        response.request_focus();
                    }
                }
            });
        });

    intent
}
