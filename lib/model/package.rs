//! Wire form of a package declaration.

use super::{RegistryType, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One installable artifact declared by a server version, as stored and published.
///
/// This type can hold both the legacy and the canonical shape. Use
/// [`PackageRef`](super::PackageRef) for a value that is known to be canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Registry the artifact is published to.
    pub registry_type: RegistryType,

    /// Legacy registry host (OCI) or registry base URL (npm, PyPI, NuGet).
    #[serde(
        rename = "registryBaseUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub registry_base_url: Option<String>,

    /// Ecosystem-native package name, canonical image reference, or bundle URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identifier: String,

    /// Package version. Legacy for OCI and MCPB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// SHA-256 of the bundle file. Only MCPB packages may keep it.
    #[serde(rename = "fileSha256", default, skip_serializing_if = "Option::is_none")]
    pub file_sha256: Option<String>,

    /// Runtime hint (e.g. `npx`, `uvx`, `docker`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_hint: Option<String>,

    /// Transport declaration. Defaults to stdio after canonicalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,

    /// Arguments, environment variables and anything else this crate passes through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Package {
    /// Create a package with only a registry type and identifier.
    pub fn new(registry_type: impl Into<RegistryType>, identifier: impl Into<String>) -> Self {
        Self {
            registry_type: registry_type.into(),
            registry_base_url: None,
            identifier: identifier.into(),
            version: None,
            file_sha256: None,
            runtime_hint: None,
            transport: None,
            extra: Map::new(),
        }
    }

    /// Set the registry base URL.
    pub fn with_registry_base_url(mut self, url: impl Into<String>) -> Self {
        self.registry_base_url = Some(url.into());
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the file hash.
    pub fn with_file_sha256(mut self, sha: impl Into<String>) -> Self {
        self.file_sha256 = Some(sha.into());
        self
    }

    /// Set the transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Parse a package from a JSON value.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    /// Parse only the fields canonicalization reads from a stored package object.
    ///
    /// Everything else, including the transport, is ignored so that one value this crate
    /// cannot interpret does not hide the legacy fields. Returns `None` without a string
    /// `registryType`, or when a read field holds a non-string value.
    pub fn project(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let registry_type = obj.get("registryType")?.as_str()?;

        let field = |name: &str| match obj.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => None,
        };

        Some(Self {
            registry_type: registry_type.into(),
            registry_base_url: field("registryBaseUrl")?,
            identifier: field("identifier")?.unwrap_or_default(),
            version: field("version")?,
            file_sha256: field("fileSha256")?,
            runtime_hint: None,
            transport: None,
            extra: Map::new(),
        })
    }

    /// Serialize this package into a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
