//! Bulk rewrite of stored `packages` arrays into the canonical shape.
//!
//! The runner reads records through a [`RecordStore`](crate::store::RecordStore), runs
//! [`canonicalize_packages_array`](crate::canonical::canonicalize_packages_array) over each
//! and writes back only the records that changed. Running it twice is a no-op the second time.

mod diff;
mod report;
mod runner;


use serde::Serialize;
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use diff::{FieldChange, PackageDiff, RecordDiff, diff_packages};
pub use report::{ChunkFailure, MigrationReport, TypeCounts};
pub use runner::{Migration, plan_record};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Whether a run persists its rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationMode {
    /// Compute diffs and counts only.
    DryRun,
    /// Write changed records back.
    Live,
}

/// How writes are grouped into transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MigrationStrategy {
    /// One transaction for the whole corpus.
    Atomic,
    /// One transaction per `size` records, in id order.
    Chunked { size: usize },
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Live => write!(f, "live"),
        }
    }
}

impl fmt::Display for MigrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::Chunked { size } => write!(f, "chunked ({} per chunk)", size),
        }
    }
}
