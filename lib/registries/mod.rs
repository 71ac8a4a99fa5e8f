//! Publish-time ownership validators, one per registry type.
//!
//! Every validator fails fast and returns the first error. Rate limiting is not an
//! error: the package is reported as [`ValidationOutcome::Skipped`].

mod http;
mod mcpb;
mod npm;
mod nuget;
mod oci;
mod pypi;

#[cfg(test)]
mod tests;

use crate::config::{DEFAULT_MCPB_ALLOWED_HOSTS, EngineConfig};
use crate::constants::{
    DEFAULT_NPM_BASE_URL, DEFAULT_NUGET_BASE_URL, DEFAULT_PYPI_BASE_URL, USER_AGENT,
};
use crate::context::ValidationContext;
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Package, PackageRef, RegistryType};
use crate::oci::{DistributionClient, RegistryPolicy, RemoteRegistry};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use mcpb::is_valid_file_sha256;
pub use oci::{check_ownership, validate_oci};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What a successful validation established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValidationOutcome {
    /// Ownership was confirmed.
    Verified,
    /// The check was not performed; the package is accepted.
    Skipped { reason: String },
}

/// Dispatches package validation by registry type.
#[derive(Clone)]
pub struct PackageValidators {
    enabled: bool,
    policy: RegistryPolicy,
    remote: Arc<dyn RemoteRegistry>,
    http: reqwest::Client,
    npm_base_url: String,
    pypi_base_url: String,
    nuget_base_url: String,
    mcpb_allowed_hosts: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ValidationOutcome {
    pub(crate) fn rate_limited(reference: &str) -> Self {
        Self::Skipped {
            reason: format!("rate limited while validating {}", reference),
        }
    }

    /// Whether ownership was actually checked.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl PackageValidators {
    /// Validators with default endpoints and policy.
    pub fn new(remote: Arc<dyn RemoteRegistry>) -> RegistryResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RegistryError::Generic(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            enabled: true,
            policy: RegistryPolicy::default(),
            remote,
            http,
            npm_base_url: DEFAULT_NPM_BASE_URL.to_string(),
            pypi_base_url: DEFAULT_PYPI_BASE_URL.to_string(),
            nuget_base_url: DEFAULT_NUGET_BASE_URL.to_string(),
            mcpb_allowed_hosts: DEFAULT_MCPB_ALLOWED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        })
    }

    /// Validators wired from configuration, using [`DistributionClient`] for OCI.
    pub fn from_config(config: &EngineConfig) -> RegistryResult<Self> {
        let remote = DistributionClient::new()?
            .with_plain_http_hosts(config.oci.plain_http_hosts.iter().cloned());
        let v = &config.validation;
        Ok(Self::new(Arc::new(remote))?
            .with_enabled(v.enable_registry_validation)
            .with_policy(config.registry_policy()?)
            .with_npm_base_url(&v.npm_base_url)
            .with_pypi_base_url(&v.pypi_base_url)
            .with_nuget_base_url(&v.nuget_base_url)
            .with_mcpb_allowed_hosts(v.mcpb_allowed_hosts.iter().cloned()))
    }

    /// Turn all validation on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_policy(mut self, policy: RegistryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_npm_base_url(mut self, url: impl Into<String>) -> Self {
        self.npm_base_url = url.into();
        self
    }

    pub fn with_pypi_base_url(mut self, url: impl Into<String>) -> Self {
        self.pypi_base_url = url.into();
        self
    }

    pub fn with_nuget_base_url(mut self, url: impl Into<String>) -> Self {
        self.nuget_base_url = url.into();
        self
    }

    pub fn with_mcpb_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mcpb_allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Validate one package against its registry, checking that `owner` published it.
    ///
    /// The whole validation runs under `ctx`: cancellation and the deadline surface as
    /// [`RegistryError::Cancelled`] and [`RegistryError::Timeout`].
    pub async fn validate_package(
        &self,
        ctx: &ValidationContext,
        pkg: &Package,
        owner: &str,
    ) -> RegistryResult<ValidationOutcome> {
        if !self.enabled {
            return Ok(ValidationOutcome::Skipped {
                reason: "registry validation is disabled".into(),
            });
        }

        if pkg.registry_type == RegistryType::Oci {
            return ctx
                .run(validate_oci(ctx, pkg, owner, &self.policy, self.remote.as_ref()))
                .await;
        }

        let package_ref = PackageRef::try_from(pkg)?;
        ctx.run(async {
            match &package_ref {
                PackageRef::Npm(p) => {
                    npm::validate_npm(&self.http, &self.npm_base_url, p, owner).await
                }
                PackageRef::Pypi(p) => {
                    pypi::validate_pypi(&self.http, &self.pypi_base_url, p, owner).await
                }
                PackageRef::Nuget(p) => {
                    nuget::validate_nuget(&self.http, &self.nuget_base_url, p, owner).await
                }
                PackageRef::Mcpb(p) => mcpb::validate_mcpb(p, &self.mcpb_allowed_hosts),
                PackageRef::Oci(_) => {
                    validate_oci(ctx, pkg, owner, &self.policy, self.remote.as_ref()).await
                }
                PackageRef::Other { registry_type, .. } => {
                    Err(RegistryError::UnsupportedRegistryType(registry_type.clone()))
                }
            }
        })
        .await
    }

    /// Validate every package concurrently. Results are in input order.
    pub async fn validate_packages(
        &self,
        ctx: &ValidationContext,
        packages: &[Package],
        owner: &str,
    ) -> Vec<RegistryResult<ValidationOutcome>> {
        join_all(
            packages
                .iter()
                .map(|pkg| self.validate_package(ctx, pkg, owner)),
        )
        .await
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl std::fmt::Debug for PackageValidators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageValidators")
            .field("enabled", &self.enabled)
            .field("policy", &self.policy)
            .field("npm_base_url", &self.npm_base_url)
            .field("pypi_base_url", &self.pypi_base_url)
            .field("nuget_base_url", &self.nuget_base_url)
            .field("mcpb_allowed_hosts", &self.mcpb_allowed_hosts)
            .finish_non_exhaustive()
    }
}
