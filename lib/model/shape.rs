//! Per-registry field rules and the legacy/canonical recognizer.

use super::{Package, RegistryType, Transport};
use crate::error::{RegistryError, RegistryResult};
use serde_json::Value;
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Fields that only exist in the pre-canonical package shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyField {
    RegistryBaseUrl,
    Version,
    FileSha256,
}

/// Whether a registry type may carry a legacy field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Allowed,
    Forbidden,
}

/// Field rules of one registry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRules {
    pub registry_base_url: FieldRule,
    pub version: FieldRule,
    pub file_sha256: FieldRule,
}

/// Shape of a stored package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Self-describing; no auxiliary fields needed to resolve it.
    Canonical,
    /// Uses fields the canonical shape forbids, or a bare OCI name.
    Legacy,
}

/// A package whose fields satisfy the rules of its registry type.
#[derive(Debug, Clone, PartialEq)]
pub enum PackageRef {
    Oci(OciPackage),
    Mcpb(McpbPackage),
    Npm(NativePackage),
    Pypi(NativePackage),
    Nuget(NativePackage),
    Other {
        registry_type: String,
        identifier: String,
    },
}

/// Canonical OCI package: the identifier alone resolves the image.
#[derive(Debug, Clone, PartialEq)]
pub struct OciPackage {
    pub identifier: String,
    pub transport: Option<Transport>,
}

/// Canonical MCPB package: a download URL plus its file hash.
#[derive(Debug, Clone, PartialEq)]
pub struct McpbPackage {
    pub identifier: String,
    pub file_sha256: Option<String>,
    pub transport: Option<Transport>,
}

/// Ecosystem-native package (npm, PyPI, NuGet).
#[derive(Debug, Clone, PartialEq)]
pub struct NativePackage {
    pub identifier: String,
    pub version: Option<String>,
    pub registry_base_url: Option<String>,
    pub transport: Option<Transport>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LegacyField {
    /// All legacy fields, in the order validators check them.
    pub const ALL: [LegacyField; 3] = [Self::RegistryBaseUrl, Self::Version, Self::FileSha256];

    /// Wire name.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::RegistryBaseUrl => "registryBaseUrl",
            Self::Version => "version",
            Self::FileSha256 => "fileSha256",
        }
    }
}

impl FieldRules {
    /// Rule for one field.
    pub fn rule(&self, field: LegacyField) -> FieldRule {
        match field {
            LegacyField::RegistryBaseUrl => self.registry_base_url,
            LegacyField::Version => self.version,
            LegacyField::FileSha256 => self.file_sha256,
        }
    }
}

impl RegistryType {
    /// Which legacy fields the canonical shape of this type may carry.
    pub fn field_rules(&self) -> FieldRules {
        use FieldRule::*;
        match self {
            RegistryType::Oci => FieldRules {
                registry_base_url: Forbidden,
                version: Forbidden,
                file_sha256: Forbidden,
            },
            RegistryType::Mcpb => FieldRules {
                registry_base_url: Forbidden,
                version: Forbidden,
                file_sha256: Allowed,
            },
            _ => FieldRules {
                registry_base_url: Allowed,
                version: Allowed,
                file_sha256: Forbidden,
            },
        }
    }
}

impl Package {
    /// Raw value of a legacy field. `Some("")` means present but empty.
    pub fn legacy_field(&self, field: LegacyField) -> Option<&str> {
        match field {
            LegacyField::RegistryBaseUrl => self.registry_base_url.as_deref(),
            LegacyField::Version => self.version.as_deref(),
            LegacyField::FileSha256 => self.file_sha256.as_deref(),
        }
    }

    /// Present fields that the rules of this package's type forbid.
    pub fn forbidden_fields(&self) -> Vec<LegacyField> {
        let rules = self.registry_type.field_rules();
        LegacyField::ALL
            .into_iter()
            .filter(|f| rules.rule(*f) == FieldRule::Forbidden && self.legacy_field(*f).is_some())
            .collect()
    }

    /// Whether this is an OCI package the OCI rewrite applies to.
    ///
    /// Empty identifiers are never legacy: they are malformed and left to validation.
    pub fn is_legacy_oci(&self) -> bool {
        self.registry_type == RegistryType::Oci
            && !self.identifier.is_empty()
            && (self.registry_base_url.is_some()
                || self.version.is_some()
                || is_bare_image_name(&self.identifier))
    }

    /// Classify this package.
    pub fn shape(&self) -> Shape {
        if self.is_legacy_oci() || !self.forbidden_fields().is_empty() {
            Shape::Legacy
        } else {
            Shape::Canonical
        }
    }

    /// Whether this package still uses the legacy shape.
    pub fn is_legacy(&self) -> bool {
        self.shape() == Shape::Legacy
    }
}

impl PackageRef {
    /// Identifier of the referenced artifact.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Oci(p) => &p.identifier,
            Self::Mcpb(p) => &p.identifier,
            Self::Npm(p) | Self::Pypi(p) | Self::Nuget(p) => &p.identifier,
            Self::Other { identifier, .. } => identifier,
        }
    }

    /// Registry type of the reference.
    pub fn registry_type(&self) -> RegistryType {
        match self {
            Self::Oci(_) => RegistryType::Oci,
            Self::Mcpb(_) => RegistryType::Mcpb,
            Self::Npm(_) => RegistryType::Npm,
            Self::Pypi(_) => RegistryType::Pypi,
            Self::Nuget(_) => RegistryType::Nuget,
            Self::Other { registry_type, .. } => RegistryType::Other(registry_type.clone()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Whether a stored package object uses the legacy shape.
///
/// Reads the raw object, so a package that does not deserialize is still classified by its
/// legacy fields. A field counts as present unless it is absent or `null`.
pub fn is_legacy_value(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let Some(registry_type) = obj.get("registryType").and_then(Value::as_str) else {
        return false;
    };
    let registry_type = RegistryType::from(registry_type);

    let rules = registry_type.field_rules();
    let forbidden = LegacyField::ALL.into_iter().any(|f| {
        rules.rule(f) == FieldRule::Forbidden
            && obj.get(f.wire_name()).is_some_and(|v| !v.is_null())
    });

    let bare_oci = registry_type == RegistryType::Oci
        && obj
            .get("identifier")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty() && is_bare_image_name(id));

    forbidden || bare_oci
}

/// True if an image identifier carries neither a tag nor a digest.
///
/// Only the last path component is inspected for `:` so a registry port
/// (`localhost:5000/img`) is not mistaken for a tag.
pub fn is_bare_image_name(identifier: &str) -> bool {
    if identifier.contains("@sha256:") {
        return false;
    }
    let last = identifier.rsplit('/').next().unwrap_or(identifier);
    !last.contains(':')
}

/// True if the first path component of an image identifier is a registry host.
pub fn has_registry_host(identifier: &str) -> bool {
    match identifier.split_once('/') {
        Some((first, _)) => first.contains('.') || first.contains(':') || first == "localhost",
        None => false,
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn format_hint(registry_type: &RegistryType, field: LegacyField) -> &'static str {
    match (registry_type, field) {
        (RegistryType::Oci, LegacyField::RegistryBaseUrl) => {
            " - use canonical reference in 'identifier' instead (e.g., 'docker.io/owner/image:1.0.0')"
        }
        (RegistryType::Oci, LegacyField::Version) => {
            " - include version in 'identifier' instead (e.g., 'docker.io/owner/image:1.0.0')"
        }
        (RegistryType::Mcpb, LegacyField::Version) => {
            " - the version is part of the download URL in 'identifier'"
        }
        (RegistryType::Mcpb, LegacyField::RegistryBaseUrl) => {
            " - use the full download URL in 'identifier'"
        }
        (_, LegacyField::FileSha256) if *registry_type != RegistryType::Oci => {
            " - only MCPB packages carry a file hash"
        }
        _ => "",
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl TryFrom<&Package> for PackageRef {
    type Error = RegistryError;

    /// Schema check that runs before any type-specific logic.
    ///
    /// Empty legacy fields are treated as absent here; the canonicalizer still removes them.
    fn try_from(pkg: &Package) -> RegistryResult<Self> {
        if pkg.identifier.is_empty() {
            return Err(RegistryError::MissingIdentifier(
                pkg.registry_type.label().to_string(),
            ));
        }

        let rules = pkg.registry_type.field_rules();
        for field in LegacyField::ALL {
            if rules.rule(field) == FieldRule::Forbidden && non_empty(pkg.legacy_field(field)) {
                return Err(RegistryError::Format {
                    registry_type: pkg.registry_type.label().to_string(),
                    field: field.wire_name(),
                    hint: format_hint(&pkg.registry_type, field).to_string(),
                });
            }
        }

        let identifier = pkg.identifier.clone();
        let transport = pkg.transport.clone();
        let native = || NativePackage {
            identifier: identifier.clone(),
            version: pkg.version.clone().filter(|v| !v.is_empty()),
            registry_base_url: pkg.registry_base_url.clone().filter(|u| !u.is_empty()),
            transport: transport.clone(),
        };

        Ok(match &pkg.registry_type {
            RegistryType::Oci => PackageRef::Oci(OciPackage {
                identifier: identifier.clone(),
                transport: transport.clone(),
            }),
            RegistryType::Mcpb => PackageRef::Mcpb(McpbPackage {
                identifier: identifier.clone(),
                file_sha256: pkg.file_sha256.clone().filter(|s| !s.is_empty()),
                transport: transport.clone(),
            }),
            RegistryType::Npm => PackageRef::Npm(native()),
            RegistryType::Pypi => PackageRef::Pypi(native()),
            RegistryType::Nuget => PackageRef::Nuget(native()),
            RegistryType::Other(t) => PackageRef::Other {
                registry_type: t.clone(),
                identifier: identifier.clone(),
            },
        })
    }
}

impl fmt::Display for LegacyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
