//! Port traits — the boundary between the session logic and the browser.
//!
//! These traits are defined here in `moked-core` (pure Rust).
//! Implementations live in `moked-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use std::rc::Rc;

use async_trait::async_trait;
use futures::Stream;
use moked_types::protocol::ChatRequestBody;
use moked_types::Result;

// ─── Chat transport ──────────────────────────────────────────

/// One event on the relayed answer stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Response headers arrived; fragments will follow.
    Started,
    /// A fragment of answer text.
    Delta(String),
    /// Stream exhausted normally.
    Done,
    /// The request or the stream failed. Carries a technical reason for the
    /// logs; user-facing wording is the controller's job.
    Error(String),
}

/// Cancels an in-flight request. Calling it more than once is harmless.
pub trait AbortHandle {
    fn abort(&self);
}

/// A live request: the event stream plus the handle that kills it.
pub struct ChatStream {
    pub abort: Rc<dyn AbortHandle>,
    pub events: Pin<Box<dyn Stream<Item = StreamEvent>>>,
}

/// Outbound path to the relay endpoint.
///
/// `stream_chat` must return immediately — the fetch itself happens inside
/// the returned stream, so the abort handle exists before any network I/O.
pub trait ChatTransport {
    fn stream_chat(&self, body: ChatRequestBody) -> ChatStream;
}

// ─── Timer ───────────────────────────────────────────────────

/// Cooperative delay. Backed by `gloo-timers` in the browser and by a
/// no-op in unit tests.
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep_ms(&self, ms: u32);
}

// ─── Key-value storage ───────────────────────────────────────

/// Keyed string store with explicit lifecycle: one instance wraps
/// browser-lifetime storage, another wraps tab-lifetime storage.
/// Synchronous because the Web Storage API is.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}
