use cartkeep_core::{Error, Paths, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::kv::KeyValueStore;

/// File-backed [`KeyValueStore`]: one pretty-printed JSON object on disk,
/// re-read on every access so separate processes see each other's writes.
#[derive(Clone)]
pub struct LocalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    pub fn new(paths: &Paths) -> Self {
        Self::at(paths.storage_file())
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Storage(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        // Write-then-rename so a crash never leaves a truncated document behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for LocalStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let map = self.read_all()?;
        Ok(map.get(key).cloned())
    }

    fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))?;
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        self.write_all(&map)?;
        debug!(key, path = %self.path.display(), "Stored value");
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KeyValueStoreExt;
    use tempfile::TempDir;

    #[test]
    fn test_local_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_base(temp_dir.path().to_path_buf());

        let store = LocalStore::new(&paths);
        assert_eq!(store.get::<bool>("priceDivsHidden").unwrap(), None);
        store.set("priceDivsHidden", &true).unwrap();
        store.set("other", &"kept").unwrap();

        let reopened = LocalStore::new(&paths);
        assert_eq!(reopened.get::<bool>("priceDivsHidden").unwrap(), Some(true));
        assert_eq!(reopened.get::<String>("other").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let store = LocalStore::at(path);
        assert!(matches!(store.get_value("x"), Err(Error::Storage(_))));
    }

    #[test]
    fn test_empty_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "").unwrap();

        let store = LocalStore::at(path);
        assert_eq!(store.get_value("x").unwrap(), None);
    }
}
