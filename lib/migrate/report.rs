//! Migration report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::diff::RecordDiff;
use super::{MigrationMode, MigrationStrategy};
use crate::model::is_legacy_value;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What a migration run saw and did.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub mode: MigrationMode,
    pub strategy: MigrationStrategy,

    /// Records with a `packages` field that were read.
    pub records_scanned: usize,

    /// Records whose canonical packages differ from the stored ones.
    pub records_changed: usize,

    /// Records whose rewrite was committed. Always zero in dry-run mode.
    pub records_written: usize,

    /// Records holding at least one legacy package before the run.
    pub legacy_records_before: usize,

    /// Records still holding a legacy package afterwards. Live runs recount from the store.
    pub legacy_records_after: usize,

    /// Package counts keyed by registry type.
    pub registry_types: BTreeMap<String, TypeCounts>,

    pub diffs: Vec<RecordDiff>,

    pub failures: Vec<ChunkFailure>,

    /// Id of the last record processed, for resuming.
    pub last_cursor: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Package counts of one registry type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub packages: usize,
    pub legacy_before: usize,
    pub legacy_after: usize,
}

/// A chunk that was rolled back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkFailure {
    /// Zero-based chunk number within this run.
    pub chunk: usize,
    pub first_id: String,
    pub last_id: String,
    pub error: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MigrationReport {
    pub fn new(mode: MigrationMode, strategy: MigrationStrategy) -> Self {
        Self {
            mode,
            strategy,
            records_scanned: 0,
            records_changed: 0,
            records_written: 0,
            legacy_records_before: 0,
            legacy_records_after: 0,
            registry_types: BTreeMap::new(),
            diffs: Vec::new(),
            failures: Vec::new(),
            last_cursor: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// True when every chunk went through.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Count the stored packages of one record.
    pub(crate) fn tally_before(&mut self, packages: &Value) {
        let census = census(packages);
        if census.iter().any(|(_, legacy)| *legacy) {
            self.legacy_records_before += 1;
        }
        for (registry_type, legacy) in census {
            let counts = self.registry_types.entry(registry_type).or_default();
            counts.packages += 1;
            counts.legacy_before += usize::from(legacy);
        }
    }

    /// Count the packages of one record as they stand after the run.
    pub(crate) fn tally_after(&mut self, packages: &Value) {
        let census = census(packages);
        if census.iter().any(|(_, legacy)| *legacy) {
            self.legacy_records_after += 1;
        }
        for (registry_type, legacy) in census {
            if legacy {
                self.registry_types.entry(registry_type).or_default().legacy_after += 1;
            }
        }
    }

    pub(crate) fn reset_after(&mut self) {
        self.legacy_records_after = 0;
        for counts in self.registry_types.values_mut() {
            counts.legacy_after = 0;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Registry type and legacy flag of every element of a `packages` array.
///
/// Classifies the raw objects, so elements that do not deserialize still count.
fn census(packages: &Value) -> Vec<(String, bool)> {
    let Some(items) = packages.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let registry_type = item
                .get("registryType")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            (registry_type.to_string(), is_legacy_value(item))
        })
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
