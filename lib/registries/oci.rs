//! OCI image ownership validation.

use crate::constants::OCI_OWNERSHIP_LABEL;
use crate::context::ValidationContext;
use crate::error::{FetchError, RegistryError, RegistryResult};
use crate::model::{Package, PackageRef};
use crate::oci::{ImageConfig, ImageReference, RegistryPolicy, RemoteRegistry};

use super::ValidationOutcome;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const KIND: &str = "OCI image";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Verify that the image `pkg` names exists and is labelled with `owner`.
///
/// Steps run in order and the first failure wins: format gate, reference parse,
/// registry policy, remote fetch, label check. Nothing touches the network before
/// the policy check passes.
pub async fn validate_oci(
    ctx: &ValidationContext,
    pkg: &Package,
    owner: &str,
    policy: &RegistryPolicy,
    remote: &dyn RemoteRegistry,
) -> RegistryResult<ValidationOutcome> {
    let package_ref = PackageRef::try_from(pkg)?;
    let reference = ImageReference::parse(package_ref.identifier())?;
    policy.check(&reference)?;

    let config = match remote.fetch_image_config(&reference, ctx).await {
        Ok(config) => config,
        Err(FetchError::Cancelled) => return Err(RegistryError::Cancelled),
        Err(e) => match e.status() {
            Some(429) => {
                tracing::warn!(
                    "Skipping OCI validation for {} due to rate limiting",
                    pkg.identifier
                );
                return Ok(ValidationOutcome::rate_limited(&pkg.identifier));
            }
            Some(status @ (401 | 404)) => {
                return Err(RegistryError::NotFound {
                    kind: KIND.into(),
                    reference: pkg.identifier.clone(),
                    status,
                });
            }
            _ => {
                return Err(RegistryError::Fetch {
                    kind: KIND.into(),
                    source: e,
                });
            }
        },
    };

    check_ownership(&pkg.identifier, &config, owner)?;
    Ok(ValidationOutcome::Verified)
}

/// Compare the ownership label against the expected server name.
pub fn check_ownership(identifier: &str, config: &ImageConfig, owner: &str) -> RegistryResult<()> {
    match config.label(OCI_OWNERSHIP_LABEL) {
        None => Err(RegistryError::Ownership(format!(
            "OCI image '{}' is missing required annotation. Add this to your Dockerfile: LABEL {}=\"{}\"",
            identifier, OCI_OWNERSHIP_LABEL, owner
        ))),
        Some(actual) if actual != owner => Err(RegistryError::Ownership(format!(
            "OCI image ownership validation failed. Expected annotation '{}' = '{}', got '{}'",
            OCI_OWNERSHIP_LABEL, owner, actual
        ))),
        Some(_) => Ok(()),
    }
}
