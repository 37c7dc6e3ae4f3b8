//! Persistent preferences
//!
//! Hosts supply a [`StorageAdapter`] for one key (browser local storage, a
//! file, a keychain entry). Preferences are stored in it as a JSON blob.

use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Single-key persistence
pub trait StorageAdapter: Send + Sync {
    fn get(&self) -> TransferResult<Option<String>>;

    fn set(&self, value: &str) -> TransferResult<()>;

    fn remove(&self) -> TransferResult<()>;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self) -> TransferResult<Option<String>> {
        let value = self
            .value
            .lock()
            .map_err(|_| TransferError::internal("Storage lock poisoned"))?;
        Ok(value.clone())
    }

    fn set(&self, value: &str) -> TransferResult<()> {
        *self
            .value
            .lock()
            .map_err(|_| TransferError::internal("Storage lock poisoned"))? = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> TransferResult<()> {
        *self
            .value
            .lock()
            .map_err(|_| TransferError::internal("Storage lock poisoned"))? = None;
        Ok(())
    }
}

/// User preferences kept across sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Unset means "use the configured default"
    pub light_clients_enabled: Option<bool>,
    /// SS58 or hex address of the selected account
    pub selected_account: Option<String>,
}

impl Preferences {
    /// Read preferences; an empty store yields defaults
    pub fn load(storage: &dyn StorageAdapter) -> TransferResult<Self> {
        match storage.get()? {
            Some(json) => crate::utils::parse_json(&json),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, storage: &dyn StorageAdapter) -> TransferResult<()> {
        storage.set(&serde_json::to_string(self)?)
    }

    pub fn clear(storage: &dyn StorageAdapter) -> TransferResult<()> {
        storage.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get().unwrap(), None);

        storage.set("value").unwrap();
        assert_eq!(storage.get().unwrap().as_deref(), Some("value"));

        storage.remove().unwrap();
        assert_eq!(storage.get().unwrap(), None);
    }

    #[test]
    fn test_preferences_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(Preferences::load(&storage).unwrap(), Preferences::default());

        let prefs = Preferences {
            light_clients_enabled: Some(true),
            selected_account: Some("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_string()),
        };
        prefs.save(&storage).unwrap();
        assert_eq!(Preferences::load(&storage).unwrap(), prefs);

        Preferences::clear(&storage).unwrap();
        assert_eq!(Preferences::load(&storage).unwrap().light_clients_enabled, None);
    }

    #[test]
    fn test_corrupt_preferences() {
        let storage = MemoryStorage::new();
        storage.set("{not json").unwrap();
        assert_eq!(Preferences::load(&storage).unwrap_err().code, ErrorCode::InvalidInput);
    }
}
