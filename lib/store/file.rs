//! Record store backed by a JSON file.
//!
//! The file holds an array of `{"id": ..., "document": ...}` objects. A commit rewrites
//! the whole file through a sibling temp file and a rename, so readers never see a
//! partially written corpus.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{RecordStore, RecordTx, StoredRecord, select_window};
use crate::error::{RegistryError, RegistryResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

struct FileTx<'a> {
    store: &'a FileStore,
    pending: BTreeMap<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileStore {
    /// Open an existing store file.
    pub fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(RegistryError::Store(format!(
                "record file not found: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    /// Create a store file holding `records`, replacing any existing file.
    pub async fn create(path: impl Into<PathBuf>, records: &[StoredRecord]) -> RegistryResult<Self> {
        let store = Self { path: path.into() };
        store.save(records).await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, sorted by id.
    pub async fn load(&self) -> RegistryResult<Vec<StoredRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut records: Vec<StoredRecord> = serde_json::from_str(&content).map_err(|e| {
            RegistryError::Store(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn save(&self, records: &[StoredRecord]) -> RegistryResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "records.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl RecordStore for FileStore {
    async fn select_records_with_packages(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> RegistryResult<Vec<StoredRecord>> {
        Ok(select_window(&self.load().await?, after, limit))
    }

    async fn begin(&self) -> RegistryResult<Box<dyn RecordTx + '_>> {
        Ok(Box::new(FileTx {
            store: self,
            pending: BTreeMap::new(),
        }))
    }
}

#[async_trait]
impl RecordTx for FileTx<'_> {
    async fn write_packages(&mut self, record_id: &str, packages: Value) -> RegistryResult<()> {
        self.pending.insert(record_id.to_string(), packages);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RegistryResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut records = self.store.load().await?;
        let mut pending = self.pending;
        for record in records.iter_mut() {
            if let Some(packages) = pending.remove(&record.id) {
                let Value::Object(map) = &mut record.document else {
                    return Err(RegistryError::Store(format!(
                        "record '{}' is not a JSON object",
                        record.id
                    )));
                };
                map.insert("packages".into(), packages);
            }
        }
        if let Some(id) = pending.keys().next() {
            return Err(RegistryError::Store(format!("record '{}' not found", id)));
        }

        self.store.save(&records).await
    }

    async fn rollback(self: Box<Self>) -> RegistryResult<()> {
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileStore::create(
            &path,
            &[
                StoredRecord::new("2", json!({"name": "two", "packages": []})),
                StoredRecord::new("1", json!({"name": "one", "packages": [{"registryType": "oci"}]})),
            ],
        )
        .await
        .unwrap();

        let selected = store.select_records_with_packages(None, None).await.unwrap();
        assert_eq!(selected[0].id, "1");

        let mut tx = store.begin().await.unwrap();
        tx.write_packages("1", json!([{"registryType": "npm"}])).await.unwrap();
        tx.commit().await.unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let records = reopened.load().await.unwrap();
        assert_eq!(records[0].document["packages"][0]["registryType"], "npm");
        assert_eq!(records[0].document["name"], "one");
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_rollback_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileStore::create(&path, &[StoredRecord::new("1", json!({"packages": []}))])
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.write_packages("1", json!([1, 2, 3])).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_commit_unknown_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileStore::create(&path, &[]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.write_packages("missing", json!([])).await.unwrap();
        assert!(tx.commit().await.is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileStore::open(dir.path().join("nope.json")).is_err());
    }
}
