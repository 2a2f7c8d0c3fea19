//! JSON file store for user snapshots
//!
//! The whole user set is written on every change. Writes go to a sibling
//! temp file that is renamed over the target, so a crash never leaves a
//! half-written snapshot behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use application::error::ApplicationError;
use application::ports::{UserSnapshot, UserSnapshotStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    users: Vec<UserSnapshot>,
}

/// Snapshot store backed by a single JSON file
#[derive(Debug)]
pub struct JsonUserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonUserStore {
    /// Create a store for `path`; nothing is touched until the first save
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(format!("{action} {}: {err}", path.display()))
}

#[async_trait]
impl UserSnapshotStore for JsonUserStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<UserSnapshot>, ApplicationError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No user snapshot found, starting empty");
                return Ok(Vec::new());
            },
            Err(e) => return Err(storage_error("Failed to read", &self.path, e)),
        };

        let file: SnapshotFile = serde_json::from_slice(&raw)
            .map_err(|e| storage_error("Failed to parse", &self.path, e))?;
        debug!(users = file.users.len(), "Loaded user snapshot");
        Ok(file.users)
    }

    #[instrument(skip(self, users), fields(path = %self.path.display(), users = users.len()))]
    async fn save(&self, users: Vec<UserSnapshot>) -> Result<(), ApplicationError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("Failed to create", parent, e))?;
        }

        let body = serde_json::to_vec_pretty(&SnapshotFile { users })
            .map_err(|e| storage_error("Failed to encode", &self.path, e))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, body)
            .await
            .map_err(|e| storage_error("Failed to write", &temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error("Failed to replace", &self.path, e))?;

        debug!("Saved user snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::value_objects::ChatId;
    use tempfile::TempDir;

    fn snapshot(id: i64, city: Option<&str>) -> UserSnapshot {
        UserSnapshot {
            chat_id: ChatId::new(id),
            city: city.map(str::to_string),
            latitude: Some(52.52),
            longitude: Some(13.405),
            notify_enabled: true,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonUserStore::new(dir.path().join("users.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_returns_users() {
        let dir = TempDir::new().unwrap();
        let store = JsonUserStore::new(dir.path().join("nested/deeper/users.json"));
        let users = vec![snapshot(1, Some("Berlin")), snapshot(2, None)];

        store.save(users.clone()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), users);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = JsonUserStore::new(dir.path().join("users.json"));

        store.save(vec![snapshot(1, None), snapshot(2, None)]).await.unwrap();
        store.save(vec![snapshot(3, None)]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].chat_id, ChatId::new(3));
    }

    #[tokio::test]
    async fn file_uses_users_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonUserStore::new(&path);

        store.save(vec![snapshot(7, Some("Oslo"))]).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["users"][0]["chat_id"], 7);
        assert_eq!(raw["users"][0]["city"], "Oslo");
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonUserStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ApplicationError::Storage(m) if m.contains("parse")));
    }

    #[tokio::test]
    async fn empty_object_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(JsonUserStore::new(&path).load().await.unwrap().is_empty());
    }
}
