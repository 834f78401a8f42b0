//! Main egui application — wires the browser adapters to the controller
//! and drives the chat panel.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use egui::CentralPanel;
use wasm_bindgen::JsValue;

use moked_core::controller::ChatController;
use moked_core::event_bus::EventBus;
use moked_core::identity::IdentityProvider;
use moked_core::ports::KeyValueStore;
use moked_platform::storage::{BrowserStorage, UnavailableStorage};
use moked_platform::timer::BrowserTimer;
use moked_platform::transport::FetchTransport;
use moked_types::config::WidgetConfig;
use moked_ui::panels::chat;
use moked_ui::theme;

/// Optional host override: a JSON-encoded [`WidgetConfig`] assigned to
/// `window.MOKED_CONFIG` before the widget loads.
const HOST_CONFIG_GLOBAL: &str = "MOKED_CONFIG";

pub struct WidgetApp {
    controller: ChatController,
    input: chat::InputState,
    first_frame: bool,
    font_loaded: Rc<RefCell<bool>>,
}

impl WidgetApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = host_config();

        let persistent: Rc<dyn KeyValueStore> = match BrowserStorage::local() {
            Ok(s) => Rc::new(s),
            Err(e) => {
                log::warn!("localStorage unavailable: {}", e);
                Rc::new(UnavailableStorage::new(e.to_string()))
            }
        };
        let session: Rc<dyn KeyValueStore> = match BrowserStorage::session() {
            Ok(s) => Rc::new(s),
            Err(e) => {
                log::warn!("sessionStorage unavailable: {}", e);
                Rc::new(UnavailableStorage::new(e.to_string()))
            }
        };
        let identity = IdentityProvider::new(persistent, session);

        let transport = Rc::new(FetchTransport::new(config.api_url.clone()));
        let controller = ChatController::new(
            config,
            identity,
            transport,
            Rc::new(BrowserTimer),
            EventBus::new(),
        );

        // Kick off the paced welcome sequence.
        wasm_bindgen_futures::spawn_local(controller.welcome_job().run());

        Self {
            controller,
            input: chat::InputState::default(),
            first_frame: true,
            font_loaded: Rc::new(RefCell::new(false)),
        }
    }

    /// Fetch a Hebrew-capable font from the server and install it into egui.
    fn load_hebrew_font(ctx: egui::Context, loaded_flag: Rc<RefCell<bool>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return,
            };
            let resp = match wasm_bindgen_futures::JsFuture::from(
                window.fetch_with_str("NotoSansHebrew-Regular.ttf"),
            )
            .await
            {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Failed to fetch Hebrew font: {:?}", e);
                    return;
                }
            };
            let resp: web_sys::Response = resp.into();
            let buf = match resp.array_buffer() {
                Ok(p) => match wasm_bindgen_futures::JsFuture::from(p).await {
                    Ok(b) => b,
                    Err(_) => return,
                },
                Err(_) => return,
            };
            let uint8 = js_sys::Uint8Array::new(&buf);
            let bytes = uint8.to_vec();

            let mut fonts = egui::FontDefinitions::default();
            fonts.font_data.insert(
                "noto_sans_hebrew".to_owned(),
                egui::FontData::from_owned(bytes).into(),
            );
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .insert(0, "noto_sans_hebrew".to_owned());
            fonts
                .families
                .entry(egui::FontFamily::Monospace)
                .or_default()
                .push("noto_sans_hebrew".to_owned());

            ctx.set_fonts(fonts);
            *loaded_flag.borrow_mut() = true;
            ctx.request_repaint();
            log::info!("Hebrew font loaded");
        });
    }

    fn apply_intent(&mut self, intent: chat::ChatIntent, ctx: &egui::Context) {
        match intent {
            chat::ChatIntent::Send(text) => {
                if let Some(job) = self.controller.begin_send(&text) {
                    let ctx = ctx.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        job.run().await;
                        ctx.request_repaint();
                    });
                }
            }
            chat::ChatIntent::NewChat => {
                let job = self.controller.new_conversation();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    job.run().await;
                    ctx.request_repaint();
                });
            }
        }
    }
}

impl eframe::App for WidgetApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            Self::load_hebrew_font(ctx.clone(), self.font_loaded.clone());
            self.first_frame = false;
        }

        if self.controller.pump() {
            ctx.request_repaint();
        }

        if self.controller.is_loading() {
            ctx.request_repaint();
        }

        // The welcome pacing job emits on a timer, not on user input; keep
        // frames coming so its events get applied promptly.
        if self.controller.welcome_revealed().is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        CentralPanel::default().show(ctx, |ui| {
            if let Some(intent) = chat::chat_panel(ui, &self.controller, &mut self.input) {
                self.apply_intent(intent, ctx);
            }
        });
    }
}

/// Widget configuration, with an optional JSON override from the host page.
fn host_config() -> WidgetConfig {
    let Some(window) = web_sys::window() else {
        return WidgetConfig::default();
    };
    let raw = js_sys::Reflect::get(window.as_ref(), &JsValue::from_str(HOST_CONFIG_GLOBAL))
        .ok()
        .and_then(|v| v.as_string());
    let Some(raw) = raw else {
        return WidgetConfig::default();
    };
    match serde_json::from_str(&raw) {
        Ok(config) => {
            log::info!("using host-provided widget config");
            config
        }
        Err(e) => {
            log::warn!("invalid {} JSON, using defaults: {}", HOST_CONFIG_GLOBAL, e);
            WidgetConfig::default()
        }
    }
}
