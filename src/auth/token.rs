use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "agentdeck";

/// Fixed key the access token is stored under. At most one token exists
/// at a time; writing replaces any previous value.
const TOKEN_KEY: &str = "access_token";

/// Durable storage for the bearer access token.
///
/// Persistence is behind this trait so the keychain-backed store can be
/// swapped for an in-memory one in tests.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token storage in the OS keychain via keyring.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read access token from keychain"),
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store access token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete access token from keychain"),
        }
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn store(&self, token: &str) -> Result<()> {
        (**self).store(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// In-memory token storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());

        store.store("tok1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok1"));

        // A second write replaces the first; never two tokens at once
        store.store("tok2").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok2"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_clear_is_idempotent() {
        let store = MemoryTokenStore::with_token("tok");
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
