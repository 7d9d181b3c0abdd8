//! Key-value settings stores

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::errors::{Result, SlugError};

/// Opaque key-value store holding JSON values
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one JSON object file, one top-level entry per key
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Store backed by the JSON file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SlugError::StoreError {
                message: format!("{} does not contain a JSON object", self.path.display()),
            }),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.read().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // write-then-rename
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&Value::Object(all))?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Persisted key '{}' to {}", key, self.path.display());
        Ok(())
    }
}
