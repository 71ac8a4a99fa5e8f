//! Offline checks of a server document before any registry is contacted.

use crate::canonical::canonicalize;
use crate::model::{
    LegacyField, Package, RegistryType, ServerRecord, TransportType, is_bare_image_name,
};
use crate::oci::ImageReference;
use crate::registries::is_valid_file_sha256;

use super::codes::{ErrorCode, WarningCode};
use super::pattern::validate_transport;
use super::result::ValidationResult;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Options for [`validate_server_record`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOptions {
    /// Report undeclared URL placeholders as errors.
    pub strict_url_variables: bool,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parse and validate a `server.json` document.
pub fn validate_server_json(content: &str, options: RecordOptions) -> ValidationResult {
    match serde_json::from_str::<ServerRecord>(content) {
        Ok(record) => validate_server_record(&record, options),
        Err(e) => {
            let mut result = ValidationResult::default();
            result.error(
                ErrorCode::InvalidJson,
                "invalid server document",
                format!("line {}, column {}", e.line(), e.column()),
                e.to_string(),
                None,
            );
            result
        }
    }
}

/// Validate every package and remote of a server document.
pub fn validate_server_record(record: &ServerRecord, options: RecordOptions) -> ValidationResult {
    let mut result = ValidationResult::default();

    if record.name.trim().is_empty() {
        result.error(
            ErrorCode::MissingRequiredField,
            "missing required field",
            "name",
            "server name is required",
            None,
        );
    }

    for (i, pkg) in record.packages().iter().enumerate() {
        validate_package(pkg, &format!("packages[{}]", i), options, &mut result);
    }

    for (i, remote) in record.remotes().iter().enumerate() {
        let location = format!("remotes[{}]", i);
        if remote.transport_type == TransportType::Stdio {
            result.error(
                ErrorCode::StdioRemote,
                "stdio remote",
                format!("{}.type", location),
                "remotes are reached over the network and cannot use the stdio transport",
                Some("use 'streamable-http' or 'sse'".into()),
            );
            continue;
        }
        validate_transport(remote, &location, options.strict_url_variables, &mut result);
    }

    result
}

fn validate_package(
    pkg: &Package,
    location: &str,
    options: RecordOptions,
    result: &mut ValidationResult,
) {
    let label = pkg.registry_type.label();

    if pkg.identifier.is_empty() {
        result.error(
            ErrorCode::MissingRequiredField,
            "missing required field",
            format!("{}.identifier", location),
            format!("package identifier is required for {} packages", label),
            None,
        );
    }

    let suggestion = canonical_suggestion(pkg);
    for field in pkg.forbidden_fields() {
        if pkg.legacy_field(field).is_some_and(str::is_empty) {
            continue;
        }
        result.error(
            ErrorCode::ForbiddenField,
            "forbidden field",
            format!("{}.{}", location, field),
            format!("{} packages must not have '{}' field", label, field),
            suggestion.clone(),
        );
    }

    match &pkg.registry_type {
        RegistryType::Oci => validate_oci_identifier(pkg, location, suggestion, result),
        RegistryType::Mcpb => validate_mcpb_hash(pkg, location, result),
        RegistryType::Npm | RegistryType::Pypi | RegistryType::Nuget => {
            if pkg.version.as_deref().is_none_or(str::is_empty) {
                result.error(
                    ErrorCode::MissingPackageVersion,
                    "missing package version",
                    format!("{}.version", location),
                    format!("package version is required for {} packages", label),
                    None,
                );
            }
        }
        RegistryType::Other(name) => result.warning(
            WarningCode::UnknownRegistryType,
            "unknown registry type",
            format!("{}.registryType", location),
            format!("no validator exists for registry type '{}'", name),
            None,
        ),
    }

    if let Some(transport) = &pkg.transport {
        validate_transport(
            transport,
            &format!("{}.transport", location),
            options.strict_url_variables,
            result,
        );
    }
}

fn validate_oci_identifier(
    pkg: &Package,
    location: &str,
    suggestion: Option<String>,
    result: &mut ValidationResult,
) {
    if pkg.identifier.is_empty() {
        return;
    }
    let identifier_location = format!("{}.identifier", location);

    if is_bare_image_name(&pkg.identifier) {
        result.error(
            ErrorCode::LegacyOciReference,
            "OCI identifier without tag or digest",
            identifier_location.clone(),
            format!(
                "'{}' does not pin a tag or digest; include the version in the identifier",
                pkg.identifier
            ),
            suggestion,
        );
    }

    if let Err(e) = ImageReference::parse(&pkg.identifier) {
        result.error(
            ErrorCode::InvalidOciReference,
            "invalid OCI reference",
            identifier_location,
            e.to_string(),
            None,
        );
    }
}

fn validate_mcpb_hash(pkg: &Package, location: &str, result: &mut ValidationResult) {
    let field_location = format!("{}.{}", location, LegacyField::FileSha256);
    match pkg.file_sha256.as_deref() {
        None | Some("") => result.error(
            ErrorCode::MissingRequiredField,
            "missing required field",
            field_location,
            "MCPB packages must have 'fileSha256' field",
            Some("compute it with `sha256sum <bundle>.mcpb`".into()),
        ),
        Some(sha) if !is_valid_file_sha256(sha) => result.error(
            ErrorCode::InvalidFileSha256,
            "invalid fileSha256",
            field_location,
            format!("'{}' is not 64 lowercase hex characters", sha),
            None,
        ),
        Some(_) => {}
    }
}

/// Canonical identifier to suggest for a legacy OCI package.
fn canonical_suggestion(pkg: &Package) -> Option<String> {
    if !pkg.is_legacy_oci() {
        return None;
    }
    let canonical = canonicalize(pkg.clone());
    Some(format!("use \"identifier\": \"{}\"", canonical.identifier))
}
