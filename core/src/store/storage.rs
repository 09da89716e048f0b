//! Durable snapshot storage collaborators.
//!
//! The store rewrites its entire snapshot on every mutation, so the storage
//! contract is just load-once/save-all. The on-disk shape is an
//! implementation detail of the backend as long as the snapshot round-trips.

use std::path::PathBuf;

use thiserror::Error;

use super::StoreSnapshot;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt snapshot {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Durable storage for the full counter snapshot.
///
/// `load` returning `Ok(None)` means the durable target does not exist yet;
/// any other failure is a real error. Implementations are the only
/// suspension points in the store.
#[allow(async_fn_in_trait)]
pub trait SnapshotStorage {
    async fn load(&self) -> Result<Option<StoreSnapshot>, StorageError>;
    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError>;
}

/// Snapshot storage as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<StoreSnapshot>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    path: self.path.clone(),
                    source: e,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(StorageError::Encode)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::Write {
                        path: self.path.clone(),
                        source: e,
                    })?;
            }
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StorageError::Write {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// In-memory backend for unit tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryStorage {
    inner: std::sync::Arc<std::sync::Mutex<Option<StoreSnapshot>>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub(crate) fn saved(&self) -> Option<StoreSnapshot> {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SnapshotStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<StoreSnapshot>, StorageError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        *self.inner.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hitball_types::{Identity, IdentityKey};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "hitball-{}-{}-{name}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    fn sample_snapshot() -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::default();
        let identity = Identity::provisional("bob");
        snapshot.records.insert(
            identity.key.clone(),
            crate::store::CounterRecord::new(&identity, Utc::now(), 0),
        );
        snapshot.next_seq = 1;
        snapshot
    }

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let storage = JsonFileStorage::new(temp_path("missing"));
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let path = temp_path("roundtrip");
        let storage = JsonFileStorage::new(&path);

        let snapshot = sample_snapshot();
        storage.save(&snapshot).await.unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.next_seq, 1);
        assert!(loaded.records.contains_key(&IdentityKey::from_handle("bob")));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();

        let storage = JsonFileStorage::new(&path);
        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = temp_path("nested");
        let path = dir.join("deep").join("data.json");
        let storage = JsonFileStorage::new(&path);

        storage.save(&sample_snapshot()).await.unwrap();
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
