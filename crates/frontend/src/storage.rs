//! Browser-side collaborators: `localStorage`, the animation clock and id generation.

use radar_shared::error::StoreError;
use radar_shared::markers::MarkerStorage;
use wasm_bindgen::JsValue;

fn js_error(err: JsValue) -> StoreError {
    StoreError::Backend(format!("{err:?}"))
}

fn local_storage() -> Result<web_sys::Storage, StoreError> {
    let window = web_sys::window().ok_or_else(|| StoreError::Backend("no window".to_string()))?;
    window
        .local_storage()
        .map_err(js_error)?
        .ok_or_else(|| StoreError::Backend("localStorage is disabled".to_string()))
}

/// Markers in the page's `localStorage`, shared by every card on the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl MarkerStorage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        local_storage()?.get_item(key).map_err(js_error)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage()?.set_item(key, value).map_err(js_error)
    }
}

/// Milliseconds on the page's monotonic clock.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_default()
}

pub fn browser_language() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().language())
        .unwrap_or_else(|| "en".to_string())
}

pub fn new_marker_id() -> String {
    match web_sys::window().and_then(|w| w.crypto().ok()) {
        Some(crypto) => format!("marker_{}", crypto.random_uuid().replace('-', "")),
        None => format!("marker_{}", now_ms().to_bits()),
    }
}
