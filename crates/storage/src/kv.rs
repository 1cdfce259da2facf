use cartkeep_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// Process-wide key-value storage, the shape of an extension's local storage
/// area: each key holds one JSON value, missing keys read as `None`.
pub trait KeyValueStore: Send + Sync {
    fn get_value(&self, key: &str) -> Result<Option<Value>>;
    fn set_value(&self, key: &str, value: Value) -> Result<()>;
}

/// Typed helpers over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Storage(format!("Malformed value for '{}': {}", key, e))),
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_value(key, serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        (**self).get_value(key)
    }

    fn set_value(&self, key: &str, value: Value) -> Result<()> {
        (**self).set_value(key, value)
    }
}

/// Volatile store; state lives as long as the value does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let map = self
            .inner
            .lock()
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))?;
        Ok(map.get(key).cloned())
    }

    fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self
            .inner
            .lock()
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))?;
        map.insert(key.to_string(), value);
        Ok(())
    }
}
