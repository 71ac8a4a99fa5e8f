//! PyPI ownership validation through the project description.

use serde::Deserialize;

use super::http::{Fetched, check_base_url, declares_mcp_name, get_json};
use super::ValidationOutcome;
use crate::constants::MCP_NAME_MARKER;
use crate::error::{RegistryError, RegistryResult};
use crate::model::NativePackage;

const KIND: &str = "PyPI package";

#[derive(Debug, Deserialize)]
struct PypiRelease {
    info: PypiInfo,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    description: Option<String>,
}

pub(crate) async fn validate_pypi(
    http: &reqwest::Client,
    base_url: &str,
    pkg: &NativePackage,
    owner: &str,
) -> RegistryResult<ValidationOutcome> {
    check_base_url("PyPI", pkg.registry_base_url.as_deref(), base_url)?;
    let version = pkg
        .version
        .as_deref()
        .ok_or_else(|| RegistryError::MissingVersion("PyPI".into()))?;

    let url = format!(
        "{}/pypi/{}/{}/json",
        base_url.trim_end_matches('/'),
        pkg.identifier,
        version
    );
    let reference = format!("{}=={}", pkg.identifier, version);

    let release: PypiRelease = match get_json(http, KIND, &reference, &url).await? {
        Fetched::Found(r) => r,
        Fetched::RateLimited => {
            tracing::warn!("Skipping PyPI validation for {} due to rate limiting", reference);
            return Ok(ValidationOutcome::rate_limited(&reference));
        }
    };

    let description = release.info.description.unwrap_or_default();
    if declares_mcp_name(&description, owner) {
        Ok(ValidationOutcome::Verified)
    } else {
        Err(RegistryError::Ownership(format!(
            "PyPI package '{}' ownership validation failed. The server name '{}' must appear as '{} {}' in the package README",
            pkg.identifier, owner, MCP_NAME_MARKER, owner
        )))
    }
}
