//! Canonicalize command handler.

use crate::canonical::canonicalize_record;
use crate::error::{RegistryError, RegistryResult};
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Print the canonical form of a server document.
pub async fn canonicalize_file(path: &Path) -> RegistryResult<()> {
    let document = read_document(path)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&canonicalize_record(&document))?
    );
    Ok(())
}

/// Read a JSON document, naming the file in parse errors.
pub(crate) fn read_document(path: &Path) -> RegistryResult<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
        RegistryError::Generic(format!("{} is not valid JSON: {}", path.display(), e))
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
