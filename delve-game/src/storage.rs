//! Key-value persistence seam.
//!
//! The host supplies a [`KeyValueStore`]; the managers keep JSON documents
//! under well-known keys. Reads never fail: a missing or unreadable document
//! is treated as absent.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::DelveError;

/// Trait for abstracting the host's key-value storage.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejected the write.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Deserialize the document under `key`. Corrupt data is logged and
/// reported as absent.
pub fn load_json<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("discarding unreadable data under {key}: {err}");
            None
        }
    }
}

/// Serialize `value` and write it under `key`.
///
/// # Errors
///
/// `DelveError::Persistence` when serialization or the write fails.
pub fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), DelveError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let persistence = |message: String| DelveError::Persistence {
        key: key.to_string(),
        message,
    };
    let json = serde_json::to_string(value).map_err(|err| persistence(err.to_string()))?;
    store
        .set(key, &json)
        .map_err(|err| persistence(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    #[error("write to {key} rejected")]
    WriteRejected { key: String },
}

/// In-process store. Clones share the same map, so one handle can be given
/// to every manager and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    reject_writes: Rc<Cell<bool>>,
    rejected_keys: Rc<RefCell<HashSet<String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a raw value, bypassing serialization.
    pub fn seed(&self, key: &str, raw: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
    }

    /// Make every subsequent write fail until turned back off.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Make writes to `key` alone fail, or succeed again.
    pub fn set_reject_key(&self, key: &str, reject: bool) {
        let mut keys = self.rejected_keys.borrow_mut();
        if reject {
            keys.insert(key.to_string());
        } else {
            keys.remove(key);
        }
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.reject_writes.get() || self.rejected_keys.borrow().contains(key) {
            return Err(MemoryStoreError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
