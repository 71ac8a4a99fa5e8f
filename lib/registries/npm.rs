//! npm ownership validation through the `mcpName` field of package.json.

use serde::Deserialize;

use super::http::{Fetched, check_base_url, get_json};
use super::ValidationOutcome;
use crate::error::{RegistryError, RegistryResult};
use crate::model::NativePackage;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const KIND: &str = "NPM package";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NpmVersion {
    #[serde(default)]
    mcp_name: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

pub(crate) async fn validate_npm(
    http: &reqwest::Client,
    base_url: &str,
    pkg: &NativePackage,
    owner: &str,
) -> RegistryResult<ValidationOutcome> {
    check_base_url("NPM", pkg.registry_base_url.as_deref(), base_url)?;
    let version = pkg
        .version
        .as_deref()
        .ok_or_else(|| RegistryError::MissingVersion("NPM".into()))?;

    let url = format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        pkg.identifier,
        version
    );
    let reference = format!("{}@{}", pkg.identifier, version);

    let manifest: NpmVersion = match get_json(http, KIND, &reference, &url).await? {
        Fetched::Found(m) => m,
        Fetched::RateLimited => {
            tracing::warn!("Skipping NPM validation for {} due to rate limiting", reference);
            return Ok(ValidationOutcome::rate_limited(&reference));
        }
    };

    match manifest.mcp_name.as_deref() {
        None | Some("") => Err(RegistryError::Ownership(format!(
            "NPM package '{}' is missing required 'mcpName' field. Add this to your package.json: \"mcpName\": \"{}\"",
            pkg.identifier, owner
        ))),
        Some(name) if name != owner => Err(RegistryError::Ownership(format!(
            "NPM package ownership validation failed. Expected mcpName '{}', got '{}'",
            owner, name
        ))),
        Some(_) => Ok(ValidationOutcome::Verified),
    }
}
