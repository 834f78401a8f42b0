//! Web Storage adapters.
//!
//! One instance wraps `localStorage` (browser-lifetime, backs the resource
//! id), another wraps `sessionStorage` (tab-lifetime, backs the thread id).
//! Both can be missing or disabled (private browsing, storage permissions),
//! in which case construction fails and the caller falls back to
//! [`super::UnavailableStorage`].

use wasm_bindgen::JsValue;

use moked_core::ports::KeyValueStore;
use moked_types::{Result, WidgetError};

pub struct BrowserStorage {
    area: web_sys::Storage,
    name: &'static str,
}

impl BrowserStorage {
    /// Browser-lifetime storage (`localStorage`).
    pub fn local() -> Result<Self> {
        let area = window()?
            .local_storage()
            .map_err(|e| storage_err("localStorage", e))?
            .ok_or_else(|| WidgetError::Storage("localStorage is disabled".into()))?;
        Ok(Self {
            area,
            name: "localStorage",
        })
    }

    /// Tab-lifetime storage (`sessionStorage`).
    pub fn session() -> Result<Self> {
        let area = window()?
            .session_storage()
            .map_err(|e| storage_err("sessionStorage", e))?
            .ok_or_else(|| WidgetError::Storage("sessionStorage is disabled".into()))?;
        Ok(Self {
            area,
            name: "sessionStorage",
        })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.area
            .get_item(key)
            .map_err(|e| storage_err(self.name, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // set_item throws when the quota is exhausted
        self.area
            .set_item(key, value)
            .map_err(|e| storage_err(self.name, e))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.area
            .remove_item(key)
            .map_err(|e| storage_err(self.name, e))
    }

    fn backend_name(&self) -> &str {
        self.name
    }
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| WidgetError::JsInterop("no window".into()))
}

fn storage_err(name: &str, e: JsValue) -> WidgetError {
    WidgetError::Storage(format!("{name}: {e:?}"))
}
