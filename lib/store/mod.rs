//! Record store abstraction consumed by the migration runner.
//!
//! A store hands out stored server documents in id order and accepts `packages`
//! rewrites inside a transaction. Nothing in the store knows about canonicalization.

mod file;
mod memory;

use crate::error::RegistryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use file::FileStore;
pub use memory::MemoryStore;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One stored server version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Primary key. Records are ordered by it.
    pub id: String,
    /// The server document as stored.
    pub document: Value,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Read side of a record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose document has a `packages` field, ordered by id, strictly after `after`.
    async fn select_records_with_packages(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> RegistryResult<Vec<StoredRecord>>;

    /// Start a transaction.
    async fn begin(&self) -> RegistryResult<Box<dyn RecordTx + '_>>;
}

/// Write side of a record store. Writes become visible on commit only.
#[async_trait]
pub trait RecordTx: Send {
    /// Replace the `packages` field of one record.
    async fn write_packages(&mut self, record_id: &str, packages: Value) -> RegistryResult<()>;

    async fn commit(self: Box<Self>) -> RegistryResult<()>;

    async fn rollback(self: Box<Self>) -> RegistryResult<()>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StoredRecord {
    pub fn new(id: impl Into<String>, document: Value) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }

    /// The raw `packages` field, if present and not null.
    pub fn packages(&self) -> Option<&Value> {
        self.document.get("packages").filter(|p| !p.is_null())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Apply the id window shared by the shipped stores to an id-sorted list.
pub(crate) fn select_window(
    records: &[StoredRecord],
    after: Option<&str>,
    limit: Option<usize>,
) -> Vec<StoredRecord> {
    let iter = records
        .iter()
        .filter(|r| r.packages().is_some())
        .filter(|r| after.is_none_or(|a| r.id.as_str() > a))
        .cloned();
    match limit {
        Some(n) => iter.take(n).collect(),
        None => iter.collect(),
    }
}
