//! Chat session controller — the client-side state machine.
//!
//! Owns the transcript and the conversation lifecycle:
//! Idle → (send) → Sending → (headers) → Streaming → (exhausted) → Idle.
//!
//! Mutation happens in two places only: synchronously through the public
//! methods, and once per frame in [`ChatController::pump`], which applies
//! events published by spawned jobs. Every job and every event carries the
//! generation it was started under; bumping the generation (a newer send, or
//! "new chat") makes everything older inert, which is what guarantees at
//! most one live request per conversation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::StreamExt;
use moked_types::config::WidgetConfig;
use moked_types::message::Message;
use moked_types::protocol::ChatRequestBody;

use crate::event_bus::{ChatEvent, ChatEventKind, EventBus};
use crate::followups;
use crate::identity::IdentityProvider;
use crate::ports::{AbortHandle, ChatStream, ChatTransport, StreamEvent, Timer};

/// Where the conversation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// User message appended, request not yet answered with headers.
    Sending,
    /// Fragments are arriving.
    Streaming,
}

type AbortSlot = Rc<RefCell<Option<Rc<dyn AbortHandle>>>>;

pub struct ChatController {
    config: WidgetConfig,
    identity: IdentityProvider,
    transport: Rc<dyn ChatTransport>,
    timer: Rc<dyn Timer>,
    bus: EventBus,

    messages: Vec<Message>,
    phase: Phase,
    streaming: String,
    suggestions: Vec<String>,
    /// `Some(revealed_line_count)` while the welcome sequence is playing.
    welcome: Option<usize>,

    current_gen: Rc<Cell<u64>>,
    abort_slot: AbortSlot,
}

impl ChatController {
    pub fn new(
        config: WidgetConfig,
        identity: IdentityProvider,
        transport: Rc<dyn ChatTransport>,
        timer: Rc<dyn Timer>,
        bus: EventBus,
    ) -> Self {
        Self {
            config,
            identity,
            transport,
            timer,
            bus,
            messages: Vec::new(),
            phase: Phase::Idle,
            streaming: String::new(),
            suggestions: Vec::new(),
            welcome: Some(0),
            current_gen: Rc::new(Cell::new(0)),
            abort_slot: Rc::new(RefCell::new(None)),
        }
    }

    // ─── Commands ────────────────────────────────────────────

    /// Start sending `text`. Returns the job the caller must spawn, or
    /// `None` when the input is empty or identity is unavailable.
    ///
    /// Any request still in flight is aborted first; its remaining events
    /// are ignored because the generation has moved on.
    pub fn begin_send(&mut self, text: &str) -> Option<SendJob> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let identity = self.identity.identity();
        if !identity.is_ready() {
            log::warn!("send dropped: session identity unavailable");
            return None;
        }

        if self.welcome.is_some() {
            self.collapse_welcome();
        }

        self.messages.push(Message::user(text));
        self.suggestions.clear();
        self.streaming.clear();
        self.phase = Phase::Sending;

        let generation = self.bump_generation();
        let body =
            ChatRequestBody::new(&self.messages, identity.thread_id, identity.resource_id);

        Some(SendJob {
            generation,
            body,
            delay_ms: self.config.send_delay_ms,
            transport: self.transport.clone(),
            timer: self.timer.clone(),
            bus: self.bus.clone(),
            current_gen: self.current_gen.clone(),
            abort_slot: self.abort_slot.clone(),
        })
    }

    /// Clear the conversation, mint a new thread id, and restart the
    /// welcome sequence. Returns the pacing job the caller must spawn.
    pub fn new_conversation(&mut self) -> WelcomeJob {
        self.bump_generation();
        self.messages.clear();
        self.suggestions.clear();
        self.streaming.clear();
        self.phase = Phase::Idle;
        self.welcome = Some(0);

        let thread_id = self.identity.start_new_thread();
        log::info!("new conversation, thread {}", thread_id);

        self.welcome_job()
    }

    /// Pacing job for the welcome sequence currently set up. Spawn once at
    /// startup and again via [`Self::new_conversation`].
    pub fn welcome_job(&self) -> WelcomeJob {
        WelcomeJob {
            generation: self.current_gen.get(),
            steps: self.config.welcome_lines.len(),
            first_delay_ms: self.config.welcome_first_delay_ms,
            step_delay_ms: self.config.welcome_step_delay_ms,
            timer: self.timer.clone(),
            bus: self.bus.clone(),
            current_gen: self.current_gen.clone(),
        }
    }

    /// Apply pending job events. Returns true when state changed and the
    /// frame should repaint.
    pub fn pump(&mut self) -> bool {
        let events = self.bus.drain();
        if events.is_empty() {
            return false;
        }
        for event in events {
            if event.generation != self.current_gen.get() {
                continue; // superseded request or stale welcome pacing
            }
            match event.kind {
                ChatEventKind::StreamStarted => self.phase = Phase::Streaming,
                ChatEventKind::StreamDelta(fragment) => {
                    self.phase = Phase::Streaming;
                    self.streaming.push_str(&fragment);
                }
                ChatEventKind::StreamDone => self.finish_stream(),
                ChatEventKind::StreamFailed(reason) => self.fail_stream(&reason),
                ChatEventKind::WelcomeStep => self.advance_welcome(),
            }
        }
        true
    }

    // ─── Derived view state ──────────────────────────────────

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Welcome lines revealed so far, while the sequence is playing.
    pub fn welcome_revealed(&self) -> Option<&[String]> {
        self.welcome
            .map(|n| &self.config.welcome_lines[..n.min(self.config.welcome_lines.len())])
    }

    /// Streamed text that is safe to render right now (a trailing unclosed
    /// follow-up marker is held back until it resolves).
    pub fn streaming_visible(&self) -> Option<&str> {
        if self.streaming.is_empty() {
            return None;
        }
        Some(followups::visible_prefix(&self.streaming))
    }

    /// The "three dots" indicator: waiting for headers, or streaming but
    /// nothing renderable yet.
    pub fn show_typing_indicator(&self) -> bool {
        match self.phase {
            Phase::Sending => true,
            Phase::Streaming => self.streaming_visible().map_or(true, str::is_empty),
            Phase::Idle => false,
        }
    }

    pub fn show_quick_actions(&self) -> bool {
        self.messages.is_empty() || self.welcome.is_some()
    }

    pub fn show_follow_ups(&self) -> bool {
        self.phase == Phase::Idle && !self.suggestions.is_empty()
    }

    // ─── Internals ───────────────────────────────────────────

    fn bump_generation(&mut self) -> u64 {
        let generation = self.current_gen.get() + 1;
        self.current_gen.set(generation);
        if let Some(handle) = self.abort_slot.borrow_mut().take() {
            handle.abort();
        }
        generation
    }

    fn collapse_welcome(&mut self) {
        self.messages
            .push(Message::assistant(self.config.welcome_as_message()));
        self.welcome = None;
    }

    fn advance_welcome(&mut self) {
        if let Some(revealed) = self.welcome {
            if revealed + 1 >= self.config.welcome_lines.len() {
                self.collapse_welcome();
            } else {
                self.welcome = Some(revealed + 1);
            }
        }
    }

    fn finish_stream(&mut self) {
        let raw = std::mem::take(&mut self.streaming);
        let extracted = followups::extract(&raw);
        let content = if extracted.content.trim().is_empty() {
            self.config.texts.empty_reply.clone()
        } else {
            extracted.content
        };
        self.messages.push(Message::assistant(content));
        self.suggestions = extracted.suggestions;
        self.phase = Phase::Idle;
        self.abort_slot.borrow_mut().take();
    }

    fn fail_stream(&mut self, reason: &str) {
        log::warn!("chat request failed: {}", reason);
        self.streaming.clear();
        self.messages
            .push(Message::assistant(self.config.texts.error_reply.clone()));
        self.phase = Phase::Idle;
        self.abort_slot.borrow_mut().take();
    }
}

// ─── Jobs ────────────────────────────────────────────────────

/// One outbound request, prepared by [`ChatController::begin_send`] and
/// driven by the host (`wasm_bindgen_futures::spawn_local` in the browser).
pub struct SendJob {
    generation: u64,
    body: ChatRequestBody,
    delay_ms: u32,
    transport: Rc<dyn ChatTransport>,
    timer: Rc<dyn Timer>,
    bus: EventBus,
    current_gen: Rc<Cell<u64>>,
    abort_slot: AbortSlot,
}

impl SendJob {
    pub async fn run(self) {
        // Brief pause between the optimistic append and the request so the
        // transition doesn't feel abrupt.
        self.timer.sleep_ms(self.delay_ms).await;
        if self.current_gen.get() != self.generation {
            return; // superseded while we paused; never hit the network
        }

        let ChatStream { abort, mut events } = self.transport.stream_chat(self.body);
        *self.abort_slot.borrow_mut() = Some(abort);

        while let Some(event) = events.next().await {
            let kind = match event {
                StreamEvent::Started => ChatEventKind::StreamStarted,
                StreamEvent::Delta(fragment) => ChatEventKind::StreamDelta(fragment),
                StreamEvent::Done => ChatEventKind::StreamDone,
                StreamEvent::Error(reason) => ChatEventKind::StreamFailed(reason),
            };
            let terminal = matches!(
                kind,
                ChatEventKind::StreamDone | ChatEventKind::StreamFailed(_)
            );
            self.bus.emit(ChatEvent {
                generation: self.generation,
                kind,
            });
            if terminal {
                break;
            }
        }
    }
}

/// Reveals the welcome lines with increasing delay. Purely presentational
/// pacing; a generation bump (send or new chat) silences it.
pub struct WelcomeJob {
    generation: u64,
    steps: usize,
    first_delay_ms: u32,
    step_delay_ms: u32,
    timer: Rc<dyn Timer>,
    bus: EventBus,
    current_gen: Rc<Cell<u64>>,
}

impl WelcomeJob {
    pub async fn run(self) {
        for step in 0..self.steps {
            let ms = if step == 0 {
                self.first_delay_ms
            } else {
                self.step_delay_ms
            };
            self.timer.sleep_ms(ms).await;
            if self.current_gen.get() != self.generation {
                return;
            }
            self.bus.emit(ChatEvent {
                generation: self.generation,
                kind: ChatEventKind::WelcomeStep,
            });
        }
    }
}
