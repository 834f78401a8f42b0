//! Single-threaded event bus between spawned request jobs and the
//! controller. Jobs push generation-tagged events; the controller drains
//! them once per UI frame and discards anything from a superseded request.

use std::cell::RefCell;
use std::rc::Rc;

/// What happened on a spawned job.
#[derive(Debug, Clone)]
pub enum ChatEventKind {
    /// Response headers received; the typing indicator can clear.
    StreamStarted,
    /// A fragment of streamed answer text.
    StreamDelta(String),
    /// The answer stream ended normally.
    StreamDone,
    /// The request or stream failed (technical reason, log-only).
    StreamFailed(String),
    /// The welcome pacing job says the next line may be revealed.
    WelcomeStep,
}

#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// Generation of the conversation state that produced this event.
    /// Events whose generation is stale are ignored wholesale.
    pub generation: u64,
    pub kind: ChatEventKind,
}

/// Shared event bus — clone-cheap via Rc, single-threaded by design
/// (WASM constraint, same as the rest of the client).
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Vec<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event. Called from spawned jobs.
    pub fn emit(&self, event: ChatEvent) {
        self.inner.borrow_mut().push(event);
    }

    /// Drain all pending events. Called by the controller each frame.
    pub fn drain(&self) -> Vec<ChatEvent> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    /// Whether anything is waiting (useful for egui repaint triggers).
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}
