//! Key-value persistence shared by the webhook configuration and the history.
//!
//! Callers depend on [`Storage`] rather than a concrete backend. The desktop
//! app and CLI use [`SqliteStorage`]; tests use [`MemoryStorage`].

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{HookPromptError, Result};

mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

/// Key holding the raw webhook URL string.
pub const WEBHOOK_URL_KEY: &str = "n8n_webhook_url";
/// Key holding the JSON-encoded history list.
pub const HISTORY_KEY: &str = "prompt_history";

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self
            .entries
            .read()
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .map_err(|e| HookPromptError::Storage(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_overwrites_and_removes() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(WEBHOOK_URL_KEY).unwrap(), None);

        storage.set(WEBHOOK_URL_KEY, "https://a.example/hook").unwrap();
        storage.set(WEBHOOK_URL_KEY, "https://b.example/hook").unwrap();
        assert_eq!(
            storage.get(WEBHOOK_URL_KEY).unwrap().as_deref(),
            Some("https://b.example/hook")
        );

        storage.remove(WEBHOOK_URL_KEY).unwrap();
        assert_eq!(storage.get(WEBHOOK_URL_KEY).unwrap(), None);
        storage.remove(WEBHOOK_URL_KEY).unwrap();
    }
}
