//! Client-side state stores with a persisted subset.
//!
//! Each store owns its full state but writes only a whitelisted part of it to
//! a [`StateStorage`] under a fixed key, wrapped as `{"state": .., "version": 0}`.
//! Writes happen after every update and a failed write is logged, never
//! surfaced. Stores are single-owner (`&mut self`); the last write wins.

pub mod auth;
pub mod job_search;

pub use auth::{AUTH_STORAGE_KEY, AuthStore};
pub use job_search::{JOB_SEARCH_STORAGE_KEY, JobSearchStore};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

use crate::error::PortalError;

/// Version stamped into every persisted envelope.
pub const STATE_VERSION: u32 = 0;

/// Key/value string storage, the shape of browser `localStorage`.
pub trait StateStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PortalError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PortalError>;
    fn remove_item(&mut self, key: &str) -> Result<(), PortalError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PortalError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PortalError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), PortalError> {
        self.items.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per entry inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl StateStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PortalError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PortalError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), PortalError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Read the persisted part of a store. Absent, unreadable or mismatched
/// entries yield `None` so the store starts from defaults.
pub(crate) fn load_persisted<T: DeserializeOwned>(
    storage: &dyn StateStorage,
    key: &str,
) -> Option<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted state");
            return None;
        }
    };
    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == STATE_VERSION => Some(envelope.state),
        Ok(envelope) => {
            warn!(key, version = envelope.version, "ignoring persisted state from another version");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed persisted state");
            None
        }
    }
}

/// Write the persisted part of a store; failures are logged and dropped.
pub(crate) fn save_persisted<T: Serialize>(storage: &mut dyn StateStorage, key: &str, state: &T) {
    let envelope = Envelope {
        state,
        version: STATE_VERSION,
    };
    let result = serde_json::to_string(&envelope)
        .map_err(PortalError::from)
        .and_then(|json| storage.set_item(key, &json));
    if let Err(e) = result {
        warn!(key, error = %e, "failed to persist state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn envelope_round_trip_and_version_gate() {
        let mut storage = MemoryStorage::new();
        save_persisted(&mut storage, "sample", &Sample { count: 3 });
        assert_eq!(
            storage.get_item("sample").unwrap().as_deref(),
            Some(r#"{"state":{"count":3},"version":0}"#)
        );
        assert_eq!(
            load_persisted::<Sample>(&storage, "sample"),
            Some(Sample { count: 3 })
        );

        storage
            .set_item("sample", r#"{"state":{"count":9},"version":4}"#)
            .unwrap();
        assert_eq!(load_persisted::<Sample>(&storage, "sample"), None);

        storage.set_item("sample", "not json").unwrap();
        assert_eq!(load_persisted::<Sample>(&storage, "sample"), None);
    }

    #[test]
    fn file_storage_uses_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("state"));

        assert_eq!(storage.get_item("job-search-store").unwrap(), None);
        storage.set_item("job-search-store", "{}").unwrap();
        assert!(dir.path().join("state/job-search-store.json").exists());
        assert_eq!(
            storage.get_item("job-search-store").unwrap().as_deref(),
            Some("{}")
        );

        storage.remove_item("job-search-store").unwrap();
        storage.remove_item("job-search-store").unwrap();
        assert_eq!(storage.get_item("job-search-store").unwrap(), None);
    }

    #[test]
    fn file_storage_sanitizes_keys() {
        let storage = FileStorage::new("/tmp/x");
        assert_eq!(
            storage.path_for("../etc/passwd"),
            PathBuf::from("/tmp/x/___etc_passwd.json")
        );
    }
}
