//! `window.localStorage` as a credential store

use devportal_core::{CredentialStore, SessionError, SessionResult};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Credential store backed by the origin's local storage.
///
/// Shared by every tab of the origin, so a logout in one tab is seen by the
/// next expiry check in the others.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCredentialStore;

impl LocalCredentialStore {
    pub const fn new() -> Self {
        Self
    }

    fn storage() -> SessionResult<Storage> {
        web_sys::window()
            .ok_or_else(|| SessionError::storage("no window"))?
            .local_storage()
            .map_err(|err| js_error("localStorage unavailable", &err))?
            .ok_or_else(|| SessionError::storage("localStorage disabled"))
    }
}

fn js_error(context: &str, err: &JsValue) -> SessionError {
    SessionError::storage(format!("{context}: {err:?}"))
}

impl CredentialStore for LocalCredentialStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| js_error("read failed", &err))
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| js_error("write failed", &err))
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| js_error("remove failed", &err))
    }
}
