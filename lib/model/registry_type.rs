//! Registry type identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Package registry a [`Package`](super::Package) is published to.
///
/// Unknown values are kept verbatim in [`RegistryType::Other`] so records written by newer
/// publishers survive a round trip through this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistryType {
    /// npm (Node.js).
    Npm,
    /// Python Package Index.
    Pypi,
    /// OCI container image.
    Oci,
    /// NuGet (.NET).
    Nuget,
    /// MCP bundle download.
    Mcpb,
    /// Any other registry type string.
    Other(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RegistryType {
    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Oci => "oci",
            Self::Nuget => "nuget",
            Self::Mcpb => "mcpb",
            Self::Other(s) => s,
        }
    }

    /// Label used in user-facing messages.
    pub fn label(&self) -> &str {
        match self {
            Self::Npm => "NPM",
            Self::Pypi => "PyPI",
            Self::Oci => "OCI",
            Self::Nuget => "NuGet",
            Self::Mcpb => "MCPB",
            Self::Other(s) => s,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for RegistryType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "npm" => Self::Npm,
            "pypi" => Self::Pypi,
            "oci" => Self::Oci,
            "nuget" => Self::Nuget,
            "mcpb" => Self::Mcpb,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for RegistryType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegistryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegistryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RegistryType::from(s.as_str()))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
