//! Session identity provider.
//!
//! Lazily mints and caches two opaque tokens: a browser-lifetime
//! `resource_id` in persistent storage and a tab-lifetime `thread_id` in
//! session storage. When storage is unavailable the tokens come back empty
//! and the controller refuses to send — the conversation degrades to
//! read-only rather than erroring.

use std::rc::Rc;

use moked_types::identity::{
    new_resource_token, new_thread_token, SessionIdentity, RESOURCE_KEY, THREAD_KEY,
};

use crate::ports::KeyValueStore;

pub struct IdentityProvider {
    persistent: Rc<dyn KeyValueStore>,
    session: Rc<dyn KeyValueStore>,
}

impl IdentityProvider {
    pub fn new(persistent: Rc<dyn KeyValueStore>, session: Rc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// Stable per-browser token. Created once, reused on every reload.
    pub fn resource_id(&self) -> String {
        get_or_create(&*self.persistent, RESOURCE_KEY, new_resource_token)
    }

    /// Current conversation token, scoped to the tab.
    pub fn thread_id(&self) -> String {
        get_or_create(&*self.session, THREAD_KEY, new_thread_token)
    }

    /// Unconditionally mint and store a new thread token — "new
    /// conversation". Returns the token, or an empty string when session
    /// storage is unavailable.
    pub fn start_new_thread(&self) -> String {
        let token = new_thread_token();
        match self.session.set(THREAD_KEY, &token) {
            Ok(()) => token,
            Err(e) => {
                log::warn!(
                    "could not store new thread id in {}: {}",
                    self.session.backend_name(),
                    e
                );
                String::new()
            }
        }
    }

    /// Both tokens, resolved (and created if needed) in one call.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            resource_id: self.resource_id(),
            thread_id: self.thread_id(),
        }
    }
}

fn get_or_create(store: &dyn KeyValueStore, key: &str, mint: fn() -> String) -> String {
    match store.get(key) {
        Ok(Some(existing)) if !existing.is_empty() => existing,
        Ok(_) => {
            let token = mint();
            match store.set(key, &token) {
                Ok(()) => token,
                Err(e) => {
                    log::warn!("could not persist {} in {}: {}", key, store.backend_name(), e);
                    String::new()
                }
            }
        }
        Err(e) => {
            log::warn!("{} unavailable for {}: {}", store.backend_name(), key, e);
            String::new()
        }
    }
}
