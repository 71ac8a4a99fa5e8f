//! MCPB bundle checks. These never touch the network.

use regex::Regex;
use std::sync::LazyLock;

use super::ValidationOutcome;
use crate::error::{RegistryError, RegistryResult};
use crate::model::McpbPackage;

static SHA256_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("Invalid sha256 regex"));

/// Whether `value` is 64 lowercase hex characters.
pub fn is_valid_file_sha256(value: &str) -> bool {
    SHA256_REGEX.is_match(value)
}

pub(crate) fn validate_mcpb(
    pkg: &McpbPackage,
    allowed_hosts: &[String],
) -> RegistryResult<ValidationOutcome> {
    let url = reqwest::Url::parse(&pkg.identifier).map_err(|e| {
        RegistryError::InvalidPackage(format!(
            "MCPB identifier '{}' must be a download URL: {}",
            pkg.identifier, e
        ))
    })?;

    if url.scheme() != "https" {
        return Err(RegistryError::InvalidPackage(format!(
            "MCPB identifier '{}' must use https",
            pkg.identifier
        )));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)) {
        return Err(RegistryError::InvalidPackage(format!(
            "MCPB packages must be hosted on one of: {} (got '{}')",
            allowed_hosts.join(", "),
            host
        )));
    }

    match pkg.file_sha256.as_deref() {
        None => Err(RegistryError::InvalidPackage(
            "MCPB packages must have 'fileSha256' field".into(),
        )),
        Some(sha) if !is_valid_file_sha256(sha) => Err(RegistryError::InvalidPackage(format!(
            "MCPB 'fileSha256' must be 64 lowercase hex characters, got '{}'",
            sha
        ))),
        Some(_) => Ok(ValidationOutcome::Verified),
    }
}
