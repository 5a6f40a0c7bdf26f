// Directory-backed key-value store, one JSON file per key
use crate::application::errors::StoreError;
use crate::application::store::KeyValueStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Map a key onto a safe file name: anything but `[A-Za-z0-9._-]` becomes `_`
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let root = self.root.clone();
        let path = self.path_for(key);
        let len = value.len();

        // Every write gets its own temp file in the store directory; the rename
        // is atomic, so concurrent writers never share or tear a document.
        let written = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut tmp = NamedTempFile::new_in(&root)?;
            tmp.write_all(&value)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&written).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("write task failed: {}", e)))??;

        tracing::debug!("Wrote {} bytes to {}", len, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get("dash.kpis").await.unwrap(), None);
        store.set("dash.kpis", Bytes::from_static(b"{}")).await.unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get("dash.kpis").await.unwrap(), Some(Bytes::from_static(b"{}")));
        assert!(dir.path().join("dash.kpis.json").exists());
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_a_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileStore::open(dir.path()).await.unwrap();
        let b = FileStore::open(dir.path()).await.unwrap();

        let writes = (0..16).map(|i| {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            let doc = serde_json::json!({ "writer": i, "pad": "x".repeat(64 * 1024) });
            async move {
                store
                    .set("dash.activity", Bytes::from(serde_json::to_vec(&doc).unwrap()))
                    .await
            }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        let bytes = a.get("dash.activity").await.unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["writer"].is_u64());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != "dash.activity.json")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_key("auth.token"), "auth.token");
    }
}
