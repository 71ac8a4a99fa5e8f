//! In-memory record store.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RecordStore, RecordTx, StoredRecord, select_window};
use crate::error::{RegistryError, RegistryResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Records held in a map keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Value>>,
    writes: AtomicUsize,
}

struct MemoryTx<'a> {
    store: &'a MemoryStore,
    pending: Vec<(String, Value)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with records.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = StoredRecord>,
    {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id, r.document)).collect()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: StoredRecord) -> RegistryResult<()> {
        self.records
            .write()
            .map_err(|_| poisoned())?
            .insert(record.id, record.document);
        Ok(())
    }

    /// Current document of a record.
    pub fn get(&self, id: &str) -> RegistryResult<Option<Value>> {
        Ok(self.records.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    /// All records in id order.
    pub fn records(&self) -> RegistryResult<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|_| poisoned())?
            .iter()
            .map(|(id, doc)| StoredRecord::new(id.clone(), doc.clone()))
            .collect())
    }

    /// Number of committed `packages` writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn poisoned() -> RegistryError {
    RegistryError::Store("memory store lock poisoned".into())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select_records_with_packages(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> RegistryResult<Vec<StoredRecord>> {
        Ok(select_window(&self.records()?, after, limit))
    }

    async fn begin(&self) -> RegistryResult<Box<dyn RecordTx + '_>> {
        Ok(Box::new(MemoryTx {
            store: self,
            pending: Vec::new(),
        }))
    }
}

#[async_trait]
impl RecordTx for MemoryTx<'_> {
    async fn write_packages(&mut self, record_id: &str, packages: Value) -> RegistryResult<()> {
        if self.store.get(record_id)?.is_none() {
            return Err(RegistryError::Store(format!("record '{}' not found", record_id)));
        }
        self.pending.push((record_id.to_string(), packages));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RegistryResult<()> {
        let mut records = self.store.records.write().map_err(|_| poisoned())?;
        for (id, packages) in &self.pending {
            let document = records
                .get_mut(id)
                .ok_or_else(|| RegistryError::Store(format!("record '{}' not found", id)))?;
            match document {
                Value::Object(map) => {
                    map.insert("packages".into(), packages.clone());
                }
                _ => {
                    return Err(RegistryError::Store(format!(
                        "record '{}' is not a JSON object",
                        id
                    )));
                }
            }
        }
        self.store
            .writes
            .fetch_add(self.pending.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RegistryResult<()> {
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
