//! Identity token formats and storage keys.
//!
//! `resource` tokens identify a browser across sessions; `thread` tokens
//! identify one conversation within a tab. Both are opaque strings, prefixed
//! for namespacing so they are recognisable in storage inspectors and logs.

/// Persistent-storage key for the browser-lifetime resource token.
pub const RESOURCE_KEY: &str = "moked_resource_id";

/// Session-storage key for the tab-lifetime thread token.
pub const THREAD_KEY: &str = "moked_thread_id";

/// Mint a fresh resource token: `user_<uuid>`.
pub fn new_resource_token() -> String {
    format!("user_{}", uuid::Uuid::new_v4())
}

/// Mint a fresh thread token: `thread_<millis>_<suffix>`.
///
/// The millisecond timestamp keeps tokens sortable by creation time; the
/// random suffix keeps two threads minted in the same millisecond distinct.
pub fn new_thread_token() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("thread_{}_{}", millis, &suffix[..9])
}

/// The pair of tokens a send request is correlated with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub resource_id: String,
    pub thread_id: String,
}

impl SessionIdentity {
    /// Sends are gated on both tokens being present.
    pub fn is_ready(&self) -> bool {
        !self.resource_id.is_empty() && !self.thread_id.is_empty()
    }
}
