//! NuGet ownership validation through the package README.

use super::http::{Fetched, check_base_url, declares_mcp_name, get_text};
use super::ValidationOutcome;
use crate::constants::MCP_NAME_MARKER;
use crate::error::{RegistryError, RegistryResult};
use crate::model::NativePackage;

const KIND: &str = "NuGet package";

/// The flat container API addresses packages by lowercased id and version.
pub(crate) async fn validate_nuget(
    http: &reqwest::Client,
    base_url: &str,
    pkg: &NativePackage,
    owner: &str,
) -> RegistryResult<ValidationOutcome> {
    check_base_url("NuGet", pkg.registry_base_url.as_deref(), base_url)?;
    let version = pkg
        .version
        .as_deref()
        .ok_or_else(|| RegistryError::MissingVersion("NuGet".into()))?;

    let id = pkg.identifier.to_lowercase();
    let version = version.to_lowercase();
    let url = format!(
        "{}/v3-flatcontainer/{}/{}/readme",
        base_url.trim_end_matches('/'),
        id,
        version
    );
    let reference = format!("{} {}", pkg.identifier, version);

    let readme = match get_text(http, KIND, &reference, &url).await? {
        Fetched::Found(text) => text,
        Fetched::RateLimited => {
            tracing::warn!("Skipping NuGet validation for {} due to rate limiting", reference);
            return Ok(ValidationOutcome::rate_limited(&reference));
        }
    };

    if declares_mcp_name(&readme, owner) {
        Ok(ValidationOutcome::Verified)
    } else {
        Err(RegistryError::Ownership(format!(
            "NuGet package '{}' ownership validation failed. The server name '{}' must appear as '{} {}' in the package README",
            pkg.identifier, owner, MCP_NAME_MARKER, owner
        )))
    }
}
