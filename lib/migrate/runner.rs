//! Migration runner.

use serde_json::Value;

use super::diff::diff_packages;
use super::report::{ChunkFailure, MigrationReport};
use super::{MigrationMode, MigrationStrategy};
use crate::canonical::canonicalize_packages_array;
use crate::error::{RegistryError, RegistryResult};
use crate::store::{RecordStore, RecordTx, StoredRecord};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configured migration of stored `packages` arrays to the canonical shape.
#[derive(Debug, Clone)]
pub struct Migration {
    mode: MigrationMode,
    strategy: MigrationStrategy,
    resume_from: Option<String>,
}

/// Outcome of planning one record.
struct Planned {
    record_id: String,
    packages: Value,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Migration {
    pub fn new(mode: MigrationMode, strategy: MigrationStrategy) -> Self {
        Self {
            mode,
            strategy,
            resume_from: None,
        }
    }

    /// Only consider records with ids strictly greater than `cursor`.
    pub fn with_resume_from(mut self, cursor: impl Into<String>) -> Self {
        self.resume_from = Some(cursor.into());
        self
    }

    pub fn mode(&self) -> MigrationMode {
        self.mode
    }

    pub fn strategy(&self) -> MigrationStrategy {
        self.strategy
    }

    /// Run the migration against a store.
    ///
    /// Atomic runs return the first row-level error after rolling back. Chunked runs record
    /// failed chunks in the report and keep going.
    pub async fn run(&self, store: &dyn RecordStore) -> RegistryResult<MigrationReport> {
        let mut report = MigrationReport::new(self.mode, self.strategy);
        report.last_cursor = self.resume_from.clone();

        match self.strategy {
            MigrationStrategy::Atomic => self.run_atomic(store, &mut report).await?,
            MigrationStrategy::Chunked { size } => {
                if size == 0 {
                    return Err(RegistryError::Config(
                        "migration chunk size must be greater than zero".into(),
                    ));
                }
                self.run_chunked(store, size, &mut report).await?
            }
        }

        if self.mode == MigrationMode::Live {
            self.recount(store, &mut report).await?;
        }

        report.finish();
        tracing::info!(
            "Migration finished: {} scanned, {} changed, {} written, {} legacy records remaining",
            report.records_scanned,
            report.records_changed,
            report.records_written,
            report.legacy_records_after
        );
        Ok(report)
    }

    async fn run_atomic(
        &self,
        store: &dyn RecordStore,
        report: &mut MigrationReport,
    ) -> RegistryResult<()> {
        let records = store
            .select_records_with_packages(self.resume_from.as_deref(), None)
            .await?;
        tracing::info!("Migrating {} records in one transaction", records.len());

        let planned = plan_all(&records, report)?;
        report.last_cursor = records.last().map(|r| r.id.clone()).or(report.last_cursor.take());

        if self.mode == MigrationMode::DryRun || planned.is_empty() {
            return Ok(());
        }

        let tx = store.begin().await?;
        report.records_written += write_and_commit(tx, planned).await?;
        Ok(())
    }

    async fn run_chunked(
        &self,
        store: &dyn RecordStore,
        size: usize,
        report: &mut MigrationReport,
    ) -> RegistryResult<()> {
        let mut cursor = self.resume_from.clone();
        let mut chunk = 0;

        loop {
            let records = store
                .select_records_with_packages(cursor.as_deref(), Some(size))
                .await?;
            let (Some(first), Some(last)) = (records.first(), records.last()) else {
                break;
            };
            let (first_id, last_id) = (first.id.clone(), last.id.clone());
            let checkpoint = report.clone();

            let result = match plan_all(&records, report) {
                Ok(planned) if self.mode == MigrationMode::Live && !planned.is_empty() => {
                    match store.begin().await {
                        Ok(tx) => write_and_commit(tx, planned).await,
                        Err(e) => Err(e),
                    }
                }
                Ok(_) => Ok(0),
                Err(e) => Err(e),
            };

            match result {
                Ok(written) => {
                    report.records_written += written;
                    tracing::info!(
                        "Chunk {} ({}..={}): {} records, {} written",
                        chunk,
                        first_id,
                        last_id,
                        records.len(),
                        written
                    );
                }
                Err(e) => {
                    tracing::warn!("Chunk {} ({}..={}) rolled back: {}", chunk, first_id, last_id, e);
                    let failures = std::mem::take(&mut report.failures);
                    *report = checkpoint;
                    report.failures = failures;
                    report.failures.push(ChunkFailure {
                        chunk,
                        first_id,
                        last_id: last_id.clone(),
                        error: e.to_string(),
                    });
                }
            }

            report.last_cursor = Some(last_id.clone());
            cursor = Some(last_id);
            chunk += 1;

            if records.len() < size {
                break;
            }
        }

        Ok(())
    }

    /// Replace planned legacy-after counts with what the store now holds.
    async fn recount(
        &self,
        store: &dyn RecordStore,
        report: &mut MigrationReport,
    ) -> RegistryResult<()> {
        report.reset_after();
        let records = store
            .select_records_with_packages(self.resume_from.as_deref(), None)
            .await?;
        for record in &records {
            if let Some(packages) = record.packages() {
                report.tally_after(packages);
            }
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Compute the canonical `packages` of one record.
///
/// Returns `None` when the record is already canonical or has nothing to migrate.
pub fn plan_record(record: &StoredRecord) -> RegistryResult<Option<Value>> {
    let Some(packages) = record.packages() else {
        return Ok(None);
    };
    let Some(items) = packages.as_array() else {
        return Err(RegistryError::MalformedRecord {
            id: record.id.clone(),
            reason: "'packages' is not an array".into(),
        });
    };
    if items.is_empty() {
        return Ok(None);
    }

    let canonical = canonicalize_packages_array(packages);
    Ok((canonical != *packages).then_some(canonical))
}

/// Plan every record of a batch, updating the report counters.
fn plan_all(records: &[StoredRecord], report: &mut MigrationReport) -> RegistryResult<Vec<Planned>> {
    let mut planned = Vec::new();
    for record in records {
        let Some(packages) = record.packages() else {
            continue;
        };
        let rewritten = plan_record(record)?;

        report.records_scanned += 1;
        report.tally_before(packages);
        report.tally_after(rewritten.as_ref().unwrap_or(packages));

        if let Some(new_packages) = rewritten {
            report.records_changed += 1;
            if let Some(diff) = diff_packages(&record.id, packages, &new_packages) {
                report.diffs.push(diff);
            }
            planned.push(Planned {
                record_id: record.id.clone(),
                packages: new_packages,
            });
        }
    }
    Ok(planned)
}

/// Write every planned record in `tx` and commit, rolling back on the first failure.
async fn write_and_commit(
    mut tx: Box<dyn RecordTx + '_>,
    planned: Vec<Planned>,
) -> RegistryResult<usize> {
    let count = planned.len();
    for plan in planned {
        if let Err(e) = tx.write_packages(&plan.record_id, plan.packages).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback);
            }
            return Err(e);
        }
    }
    tx.commit().await?;
    Ok(count)
}
