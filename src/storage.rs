//! Dashboard session storage.
//!
//! The back-office keeps its API URL, access token and selected branch in a
//! credential store. On desktop this is the OS credential store via the
//! `keyring` crate (DPAPI on Windows, Keychain on macOS, Secret Service on
//! Linux). [`MemoryStore`] serves tests and hosts without a keyring.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;
use tracing::{info, warn};

const SERVICE_NAME: &str = "the-small-backoffice";

// Credential keys
pub const KEY_DASHBOARD_URL: &str = "dashboard_url";
pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_BRANCH_ID: &str = "branch_id";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[KEY_DASHBOARD_URL, KEY_ACCESS_TOKEN, KEY_BRANCH_ID];

/// Key/value store for session credentials.
pub trait CredentialStore: Send + Sync {
    /// `None` when the entry does not exist or cannot be read.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    /// Succeeds silently when the entry does not exist.
    fn delete(&self, key: &str) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// OS keyring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Separate namespace, e.g. one per environment (staging/production).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    fn entry(&self, key: &str) -> Result<Entry, String> {
        Entry::new(&self.service, key).map_err(|e| format!("keyring entry {key}: {e}"))
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Option<String> {
        let lookup = self
            .entry(key)
            .and_then(|entry| match entry.get_password() {
                Err(keyring::Error::NoEntry) => Ok(None),
                other => other.map(Some).map_err(|e| format!("keyring read {key}: {e}")),
            });
        lookup.unwrap_or_else(|e| {
            warn!(key, error = %e, "credential lookup failed");
            None
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| format!("keyring write {key}: {e}"))
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(format!("keyring delete {key}: {e}")),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut values = self.values.lock().map_err(|e| e.to_string())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        let mut values = self.values.lock().map_err(|e| e.to_string())?;
        values.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// High-level API
// ---------------------------------------------------------------------------

/// Persist a signed-in dashboard session. A `None` branch clears any
/// previously selected branch.
pub fn save_session(
    store: &dyn CredentialStore,
    dashboard_url: &str,
    access_token: &str,
    branch_id: Option<i64>,
) -> Result<(), String> {
    let url = crate::api::normalize_base_url(dashboard_url);
    if url.is_empty() {
        return Err("Missing required field: dashboardUrl".to_string());
    }
    if access_token.trim().is_empty() {
        return Err("Missing required field: accessToken".to_string());
    }

    store.set(KEY_DASHBOARD_URL, &url)?;
    store.set(KEY_ACCESS_TOKEN, access_token.trim())?;
    match branch_id {
        Some(id) => store.set(KEY_BRANCH_ID, &id.to_string())?,
        None => store.delete(KEY_BRANCH_ID)?,
    }

    info!(dashboard_url = %url, branch_id = ?branch_id, "dashboard session stored");
    Ok(())
}

/// Delete every stored credential (sign-out).
pub fn clear_session(store: &dyn CredentialStore) -> Result<(), String> {
    info!("clearing dashboard session credentials");
    for key in ALL_KEYS {
        store.delete(key)?;
    }
    Ok(())
}
