//! Validation error and warning codes.

use serde::Serialize;
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Validation error codes.
///
/// These represent errors that always cause validation to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// E001: Server document is not valid JSON or does not match the document shape.
    #[serde(rename = "E001")]
    InvalidJson,

    /// E002: A required field is missing or empty.
    #[serde(rename = "E002")]
    MissingRequiredField,

    /// E003: A field the package's registry type forbids is present.
    #[serde(rename = "E003")]
    ForbiddenField,

    /// E004: OCI identifier is a bare name without tag or digest.
    #[serde(rename = "E004")]
    LegacyOciReference,

    /// E005: fileSha256 is not 64 lowercase hex characters.
    #[serde(rename = "E005")]
    InvalidFileSha256,

    /// E006: Network transport without a URL.
    #[serde(rename = "E006")]
    MissingTransportUrl,

    /// E007: Transport URL does not match the accepted pattern.
    #[serde(rename = "E007")]
    InvalidTransportUrl,

    /// E008: stdio transport declares a URL.
    #[serde(rename = "E008")]
    UnexpectedTransportUrl,

    /// E009: URL placeholder without a declared variable (strict mode).
    #[serde(rename = "E009")]
    UndeclaredUrlVariable,

    /// E010: OCI identifier does not parse as a container reference.
    #[serde(rename = "E010")]
    InvalidOciReference,

    /// E011: Package version is required for this registry type.
    #[serde(rename = "E011")]
    MissingPackageVersion,

    /// E012: Remote declared with the stdio transport.
    #[serde(rename = "E012")]
    StdioRemote,
}

/// Validation warning codes.
///
/// These represent issues that don't fail validation but are likely mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningCode {
    /// W001: URL placeholder without a declared variable.
    #[serde(rename = "W001")]
    UndeclaredUrlVariable,

    /// W002: Declared variable not used by the URL.
    #[serde(rename = "W002")]
    UnusedUrlVariable,

    /// W003: Registry type has no validator.
    #[serde(rename = "W003")]
    UnknownRegistryType,
}

/// A validation code that can be either an error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidationCode {
    /// An error code.
    Error(ErrorCode),
    /// A warning code.
    Warning(WarningCode),
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::InvalidJson => "E001",
            ErrorCode::MissingRequiredField => "E002",
            ErrorCode::ForbiddenField => "E003",
            ErrorCode::LegacyOciReference => "E004",
            ErrorCode::InvalidFileSha256 => "E005",
            ErrorCode::MissingTransportUrl => "E006",
            ErrorCode::InvalidTransportUrl => "E007",
            ErrorCode::UnexpectedTransportUrl => "E008",
            ErrorCode::UndeclaredUrlVariable => "E009",
            ErrorCode::InvalidOciReference => "E010",
            ErrorCode::MissingPackageVersion => "E011",
            ErrorCode::StdioRemote => "E012",
        };
        write!(f, "{}", code)
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            WarningCode::UndeclaredUrlVariable => "W001",
            WarningCode::UnusedUrlVariable => "W002",
            WarningCode::UnknownRegistryType => "W003",
        };
        write!(f, "{}", code)
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationCode::Error(e) => write!(f, "{}", e),
            ValidationCode::Warning(w) => write!(f, "{}", w),
        }
    }
}

impl From<ErrorCode> for ValidationCode {
    fn from(code: ErrorCode) -> Self {
        ValidationCode::Error(code)
    }
}

impl From<WarningCode> for ValidationCode {
    fn from(code: WarningCode) -> Self {
        ValidationCode::Warning(code)
    }
}
