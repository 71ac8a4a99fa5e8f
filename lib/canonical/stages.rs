//! Individual canonicalization stages.
//!
//! Each stage is a free function that only touches its own concern and returns
//! packages of other registry types untouched.

use crate::constants::{DEFAULT_OCI_REGISTRY, DEFAULT_OCI_TAG};
use crate::model::{Package, RegistryType, Transport, has_registry_host, is_bare_image_name};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Fold legacy OCI fields into a single `host/name:tag` identifier.
///
/// The host comes from `registryBaseUrl` (scheme stripped, `docker.io` when absent) and the
/// tag from `version` (`latest` when absent or empty). An identifier that already names a
/// registry host is not prefixed again, and one that already has a tag or digest gets no tag.
pub fn rewrite_oci(mut pkg: Package) -> Package {
    if !pkg.is_legacy_oci() {
        return pkg;
    }

    let host = pkg
        .registry_base_url
        .take()
        .map(|url| registry_host(&url))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_OCI_REGISTRY.to_string());

    let tag = pkg
        .version
        .take()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_OCI_TAG.to_string());

    let mut identifier = if has_registry_host(&pkg.identifier) {
        pkg.identifier.clone()
    } else {
        format!("{}/{}", host, pkg.identifier)
    };
    if is_bare_image_name(&identifier) {
        identifier = format!("{}:{}", identifier, tag);
    }

    tracing::debug!(from = %pkg.identifier, to = %identifier, "rewrote legacy OCI package");
    pkg.identifier = identifier;
    pkg
}

/// Drop `version` and `registryBaseUrl` from MCPB packages; the download URL carries both.
pub fn rewrite_mcpb(mut pkg: Package) -> Package {
    if pkg.registry_type == RegistryType::Mcpb {
        pkg.version = None;
        pkg.registry_base_url = None;
    }
    pkg
}

/// Drop `fileSha256` from every package that is not MCPB.
pub fn strip_forbidden_fields(mut pkg: Package) -> Package {
    if pkg.registry_type != RegistryType::Mcpb {
        pkg.file_sha256 = None;
    }
    pkg
}

/// Give packages without a transport the stdio transport.
pub fn default_transport(mut pkg: Package) -> Package {
    if pkg.transport.is_none() {
        pkg.transport = Some(Transport::stdio());
    }
    pkg
}

/// Strip an `http://` or `https://` scheme and trailing slashes from a registry base URL.
pub fn registry_host(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
