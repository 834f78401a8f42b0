//! Stand-in store for environments where Web Storage cannot be opened.
//! Every operation fails, which leaves identity tokens empty and keeps the
//! widget in its read-only degraded mode (sends are gated on identity).

use moked_core::ports::KeyValueStore;
use moked_types::{Result, WidgetError};

pub struct UnavailableStorage {
    reason: String,
}

impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> WidgetError {
        WidgetError::Storage(self.reason.clone())
    }
}

impl KeyValueStore for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(self.err())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(self.err())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(self.err())
    }

    fn backend_name(&self) -> &str {
        "unavailable"
    }
}
