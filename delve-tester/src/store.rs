//! JSON file-backed [`KeyValueStore`] so a campaign survives between
//! invocations.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use delve_game::KeyValueStore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Every key lives in one JSON object on disk. Clones share the same
/// in-memory view and file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: Rc<RefCell<BTreeMap<String, String>>>,
}

impl FileStore {
    /// Open `path`, starting empty when the file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_values(&path);
        log::debug!("opened store {} with {} keys", path.display(), values.len());
        Self {
            path,
            values: Rc::new(RefCell::new(values)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json).map_err(|source| FileStoreError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

fn read_values(path: &Path) -> BTreeMap<String, String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        log::warn!("ignoring unreadable store {}: {err}", path.display());
        BTreeMap::new()
    })
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut next = self.values.borrow().clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *self.values.borrow_mut() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "delve-store-{label}-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn values_round_trip_through_disk() {
        let path = temp_file("roundtrip");
        let store = FileStore::open(&path);
        store.set("delve.progression", "{\"total_runs_completed\":2}").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("delve.progression").as_deref(),
            Some("{\"total_runs_completed\":2}")
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn garbage_file_opens_empty() {
        let path = temp_file("garbage");
        fs::write(&path, "not json at all").unwrap();
        let store = FileStore::open(&path);
        assert!(store.get("anything").is_none());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn failed_write_keeps_previous_view() {
        let path = std::env::temp_dir()
            .join("delve-store-missing-dir")
            .join("nested")
            .join("store.json");
        let store = FileStore::open(&path);
        assert!(store.set("k", "v").is_err());
        assert!(store.get("k").is_none());
    }
}
