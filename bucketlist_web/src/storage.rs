use bucketlist_core::{KeyValueStore, KvError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

/// The browser's `localStorage`, seen as a [`KeyValueStore`].
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let storage = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is not available"))?;
        Ok(LocalStorage { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        // reads only fail when storage access is denied, which looks the same
        // as an empty store to the caller
        self.storage.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.storage.set_item(key, value).map_err(classify)
    }
}

fn classify(err: JsValue) -> KvError {
    match err.dyn_ref::<DomException>() {
        Some(exception) if exception.name() == "QuotaExceededError" => KvError::QuotaExceeded,
        Some(exception) => KvError::Backend(exception.message()),
        None => KvError::Backend(format!("{err:?}")),
    }
}
