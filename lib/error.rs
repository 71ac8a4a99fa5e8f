//! Error types for registry-meta.

use std::time::Duration;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for registry-meta operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error type for registry-meta operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A legacy or forbidden field is present on a package that should already be canonical.
    #[error("{registry_type} packages must not have '{field}' field{hint}")]
    Format {
        /// Display label of the registry type (e.g. "OCI").
        registry_type: String,
        /// Wire name of the offending field.
        field: &'static str,
        /// Remediation suffix, empty or starting with " - ".
        hint: String,
    },

    /// The package identifier is empty.
    #[error("package identifier is required for {0} packages")]
    MissingIdentifier(String),

    /// The package version is empty for a registry type that needs one.
    #[error("package version is required for {0} packages")]
    MissingVersion(String),

    /// The identifier does not follow the container reference grammar.
    #[error("invalid OCI reference '{reference}': {reason}")]
    ReferenceParse { reference: String, reason: String },

    /// The registry host is not on the allowlist.
    #[error(
        "unsupported registry '{host}': OCI images must be published to an approved registry"
    )]
    Policy { host: String },

    /// The artifact does not declare the expected owner.
    #[error("{0}")]
    Ownership(String),

    /// The artifact does not exist or cannot be read anonymously.
    #[error("{kind} '{reference}' not found or not accessible (status: {status})")]
    NotFound {
        kind: String,
        reference: String,
        status: u16,
    },

    /// Any other remote fetch failure.
    #[error("failed to fetch {kind}: {source}")]
    Fetch {
        kind: String,
        #[source]
        source: FetchError,
    },

    /// The package points at a registry that does not belong to its type.
    #[error(
        "registry type and base URL do not match: '{actual}' is not valid for {registry_type} (expected '{expected}')"
    )]
    BaseUrlMismatch {
        registry_type: String,
        expected: String,
        actual: String,
    },

    /// Package-level rule violation not covered by a more specific variant.
    #[error("{0}")]
    InvalidPackage(String),

    /// No validator exists for the registry type.
    #[error("unsupported registry type: {0}")]
    UnsupportedRegistryType(String),

    /// A network transport URL does not match the accepted grammar.
    #[error(
        "invalid transport URL '{0}': must start with http:// or https:// and contain no whitespace"
    )]
    InvalidTransportUrl(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller-supplied deadline elapsed.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Record store failure.
    #[error("Record store error: {0}")]
    Store(String),

    /// A stored record cannot be migrated.
    #[error("Malformed record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

/// Error raised while talking to a remote registry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The registry answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not what the protocol requires.
    #[error("invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// An auth challenge could not be answered anonymously.
    #[error("cannot satisfy auth challenge from {url}: {reason}")]
    Auth { url: String, reason: String },

    /// The manifest does not reference an image config blob.
    #[error("manifest at {url} has no usable image config")]
    MissingConfig { url: String },

    /// The fetch was aborted through the validation context.
    #[error("fetch cancelled")]
    Cancelled,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RegistryError {
    /// Returns true for errors caused by the caller aborting the operation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RegistryError::Cancelled | RegistryError::Timeout(_))
    }
}

impl FetchError {
    /// HTTP status carried by the error, if the registry answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<anyhow::Error> for RegistryError {
    fn from(err: anyhow::Error) -> Self {
        RegistryError::Generic(format!("{:#}", err))
    }
}
