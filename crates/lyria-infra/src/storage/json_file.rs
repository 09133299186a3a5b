//! JSON-file implementation of `LocalStore`.
//!
//! All keys live in one flat JSON object. Every write rewrites the whole file
//! through a temporary sibling and a rename, so readers never observe a
//! half-written store. An unparsable file reads as empty: every value in it
//! can be regenerated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lyria_core::store::LocalStore;
use lyria_types::error::StoreError;
use tokio::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => {
                return Err(StoreError::Io(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(values) => Ok(values),
            Err(err) => {
                tracing::warn!(
                    "Ignoring unreadable store {}: {err}",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("failed to create {}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(format!("failed to write {}: {e}", tmp.display())))?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("failed to replace {}: {e}", self.path.display())))
    }
}

/// The store holds the session cookie: owner read/write only.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| StoreError::Io(format!("failed to set permissions on {}: {e}", path.display())))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

impl LocalStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.read_all().await?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}
