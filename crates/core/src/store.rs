//! Credential persistence
//!
//! The store is a plain string key/value space (the browser's localStorage in
//! production). This module owns the key layout and the typed load/save/purge
//! operations on top of it.

use crate::error::SessionResult;
use crate::types::{CredentialSet, EpochMillis, StoredCredentials};
use std::cell::RefCell;
use std::collections::HashMap;

/// Persisted key names
pub struct StorageKeys;

impl StorageKeys {
    pub const ID_TOKEN: &'static str = "dp_id_token";
    pub const ACCESS_TOKEN: &'static str = "dp_access_token";
    pub const REFRESH_TOKEN: &'static str = "dp_refresh_token";
    /// Absolute expiry, decimal epoch milliseconds
    pub const EXPIRY: &'static str = "dp_expiry";
    /// Transient PKCE verifier, cleared after the code exchange
    pub const CODE_VERIFIER: &'static str = "pkce_code_verifier";

    /// Every key a logout must remove
    pub const ALL: [&'static str; 5] = [
        Self::ID_TOKEN,
        Self::ACCESS_TOKEN,
        Self::REFRESH_TOKEN,
        Self::EXPIRY,
        Self::CODE_VERIFIER,
    ];
}

/// Durable per-origin string storage
pub trait CredentialStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;
    fn remove(&self, key: &str) -> SessionResult<()>;
}

/// In-memory store, used natively and in tests
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read whatever credentials are stored. Returns `None` when nothing is.
///
/// An expiry that does not parse is reported as missing rather than as an
/// error, so the caller treats the set as malformed.
pub fn load(store: &dyn CredentialStore) -> SessionResult<Option<StoredCredentials>> {
    let stored = StoredCredentials {
        identity_token: non_empty(store.get(StorageKeys::ID_TOKEN)?),
        access_token: non_empty(store.get(StorageKeys::ACCESS_TOKEN)?),
        refresh_token: non_empty(store.get(StorageKeys::REFRESH_TOKEN)?),
        expires_at: store
            .get(StorageKeys::EXPIRY)?
            .and_then(|raw| parse_expiry(&raw)),
    };

    if stored.is_absent() {
        Ok(None)
    } else {
        Ok(Some(stored))
    }
}

/// Persist a credential set, replacing whatever was there
pub fn save(store: &dyn CredentialStore, set: &CredentialSet) -> SessionResult<()> {
    store.set(StorageKeys::ID_TOKEN, &set.identity_token)?;
    store.set(StorageKeys::ACCESS_TOKEN, &set.access_token)?;
    match &set.refresh_token {
        Some(refresh) => store.set(StorageKeys::REFRESH_TOKEN, refresh)?,
        None => store.remove(StorageKeys::REFRESH_TOKEN)?,
    }
    store.set(StorageKeys::EXPIRY, &set.expires_at.to_string())
}

/// Remove every credential key.
///
/// Every key is attempted; the first error is returned.
pub fn purge(store: &dyn CredentialStore) -> SessionResult<()> {
    let mut first_error = None;
    for key in StorageKeys::ALL {
        if let Err(err) = store.remove(key) {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Keep the PKCE verifier until the provider redirects back
pub fn stash_verifier(store: &dyn CredentialStore, verifier: &str) -> SessionResult<()> {
    store.set(StorageKeys::CODE_VERIFIER, verifier)
}

/// Consume the PKCE verifier; it is removed even when present
pub fn take_verifier(store: &dyn CredentialStore) -> SessionResult<Option<String>> {
    let verifier = non_empty(store.get(StorageKeys::CODE_VERIFIER)?);
    store.remove(StorageKeys::CODE_VERIFIER)?;
    Ok(verifier)
}

/// Peek at the verifier without consuming it
pub fn has_verifier(store: &dyn CredentialStore) -> SessionResult<bool> {
    Ok(non_empty(store.get(StorageKeys::CODE_VERIFIER)?).is_some())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// The deployed app wrote `Date.now() + n` directly, so tolerate a float form.
fn parse_expiry(raw: &str) -> Option<EpochMillis> {
    let raw = raw.trim();
    raw.parse::<EpochMillis>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value as EpochMillis)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> CredentialSet {
        CredentialSet {
            identity_token: "id".into(),
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_load_empty_store() {
        let store = MemoryCredentialStore::new();
        assert!(load(&store).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryCredentialStore::new();
        save(&store, &sample_set()).unwrap();

        let stored = load(&store).unwrap().unwrap();
        assert_eq!(stored.to_credential_set(), Some(sample_set()));
    }

    #[test]
    fn test_save_without_refresh_clears_old_refresh_token() {
        let store = MemoryCredentialStore::new();
        save(&store, &sample_set()).unwrap();

        let mut set = sample_set();
        set.refresh_token = None;
        save(&store, &set).unwrap();

        assert!(store.get(StorageKeys::REFRESH_TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_garbled_expiry_loads_as_missing() {
        let store = MemoryCredentialStore::new();
        store.set(StorageKeys::ID_TOKEN, "id").unwrap();
        store.set(StorageKeys::EXPIRY, "soon").unwrap();

        let stored = load(&store).unwrap().unwrap();
        assert_eq!(stored.identity_token.as_deref(), Some("id"));
        assert!(stored.expires_at.is_none());
    }

    #[test]
    fn test_float_expiry_is_accepted() {
        let store = MemoryCredentialStore::new();
        store.set(StorageKeys::ID_TOKEN, "id").unwrap();
        store.set(StorageKeys::EXPIRY, "1700000000000.0").unwrap();

        let stored = load(&store).unwrap().unwrap();
        assert_eq!(stored.expires_at, Some(1_700_000_000_000));
    }

    #[test]
    fn test_expiry_alone_is_absent() {
        let store = MemoryCredentialStore::new();
        store.set(StorageKeys::EXPIRY, "1700000000000").unwrap();
        assert!(load(&store).unwrap().is_none());
    }

    #[test]
    fn test_purge_removes_every_key() {
        let store = MemoryCredentialStore::new();
        save(&store, &sample_set()).unwrap();
        stash_verifier(&store, "verifier").unwrap();

        purge(&store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_take_verifier_consumes() {
        let store = MemoryCredentialStore::new();
        stash_verifier(&store, "verifier").unwrap();

        assert_eq!(take_verifier(&store).unwrap().as_deref(), Some("verifier"));
        assert!(take_verifier(&store).unwrap().is_none());
    }
}
