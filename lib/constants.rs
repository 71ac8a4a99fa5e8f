//! Constants for registry-meta.
//!
//! Wire names, registry defaults and environment variable names live here so
//! the canonicalizer, validators and configuration agree on them.

use std::path::PathBuf;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Image label that declares which registered server owns an OCI image.
pub const OCI_OWNERSHIP_LABEL: &str = "io.modelcontextprotocol.server.name";

/// Marker that README-based registries (PyPI, NuGet) must contain, followed by the server name.
pub const MCP_NAME_MARKER: &str = "mcp-name:";

/// Registry host assumed when a container reference names none.
pub const DEFAULT_OCI_REGISTRY: &str = "docker.io";

/// Tag assumed when a container reference carries neither tag nor digest.
pub const DEFAULT_OCI_TAG: &str = "latest";

/// Host that actually serves the Docker Hub distribution API.
pub const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// Aliases that all refer to Docker Hub.
pub const DOCKER_HUB_ALIASES: &[&str] = &["docker.io", "index.docker.io", "registry-1.docker.io"];

/// Default npm registry base URL.
pub const DEFAULT_NPM_BASE_URL: &str = "https://registry.npmjs.org";

/// Default PyPI base URL.
pub const DEFAULT_PYPI_BASE_URL: &str = "https://pypi.org";

/// Default NuGet base URL.
pub const DEFAULT_NUGET_BASE_URL: &str = "https://api.nuget.org";

/// Regex a network transport URL must match. Mirrors `schema/server.schema.json`.
pub const TRANSPORT_URL_PATTERN: &str = r"^https?://[^\s]+$";

/// Bundled JSON schema for server documents.
pub const SERVER_SCHEMA: &str = include_str!("../schema/server.schema.json");

/// Configuration file name searched in the working directory and the home directory.
pub const CONFIG_FILE_NAME: &str = "registry.toml";

/// Prefix of all configuration environment variables.
pub const ENV_PREFIX: &str = "MCP_REGISTRY_";

/// Default number of records per committed chunk in chunked migrations.
pub const DEFAULT_MIGRATION_CHUNK_SIZE: usize = 500;

/// Default timeout for one remote validation, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// User agent sent to remote registries.
pub const USER_AGENT: &str = concat!("registry-meta/", env!("CARGO_PKG_VERSION"));

/// Default user-level configuration directory.
pub static DEFAULT_HOME_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .map(|h| h.join(".mcp-registry"))
        .unwrap_or_else(|| PathBuf::from(".mcp-registry"))
});

/// Default user-level configuration file.
pub static DEFAULT_CONFIG_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_HOME_PATH.join(CONFIG_FILE_NAME));
