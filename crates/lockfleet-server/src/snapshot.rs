use async_trait::async_trait;
use lockfleet_domain::{DomainError, DomainResult, LockRecord, SnapshotStore};
use std::path::PathBuf;
use tracing::{info, warn};

/// Fleet snapshot persisted as a JSON document on local disk.
///
/// Loading tolerates a missing or corrupt file; a bad snapshot must not
/// keep the service from starting.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> DomainResult<Vec<LockRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no snapshot file, starting empty");
                return Ok(vec![]);
            }
            Err(e) => return Err(DomainError::Snapshot(e.into())),
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "snapshot file unreadable, starting empty"
                );
                Ok(vec![])
            }
        }
    }

    async fn save(&self, records: &[LockRecord]) -> DomainResult<()> {
        let json =
            serde_json::to_string_pretty(records).map_err(|e| DomainError::Snapshot(e.into()))?;

        // Stage into a sibling temp file, then rename into place. A
        // partial write never lands at the final path.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| DomainError::Snapshot(e.into()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| DomainError::Snapshot(e.into()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockfleet_domain::LockState;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("locks.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_restores_records() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("locks.json"));

        let mut record = LockRecord::new("lock-1", "0004A30B001C1234");
        record.state = LockState::Locked;
        store.save(&[record]).await.unwrap();

        let restored = store.load().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, "lock-1");
        assert_eq!(restored[0].state, LockState::Locked);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locks.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = JsonSnapshotStore::new(path);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locks.json");
        let store = JsonSnapshotStore::new(path.clone());

        store
            .save(&[LockRecord::new("lock-1", "aa"), LockRecord::new("lock-2", "bb")])
            .await
            .unwrap();
        store.save(&[LockRecord::new("lock-1", "aa")]).await.unwrap();

        let restored = store.load().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert!(!tokio::fs::try_exists(path.with_extension("json.tmp"))
            .await
            .unwrap());
    }
}
