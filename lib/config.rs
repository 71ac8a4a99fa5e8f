//! Engine configuration.
//!
//! Loaded from TOML, then overridden by `MCP_REGISTRY_*` environment variables.
//! Lookup order for the file: explicit path, `./registry.toml`,
//! `~/.mcp-registry/registry.toml`, built-in defaults.

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_CONFIG_PATH, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MIGRATION_CHUNK_SIZE, DEFAULT_NPM_BASE_URL, DEFAULT_NUGET_BASE_URL,
    DEFAULT_PYPI_BASE_URL, ENV_PREFIX,
};
use crate::error::{RegistryError, RegistryResult};
use crate::oci::{DEFAULT_ALLOWED_HOSTS, HostPattern, PolicyMode, RegistryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Hosts MCPB download URLs may point at by default.
pub const DEFAULT_MCPB_ALLOWED_HOSTS: &[&str] = &["github.com", "gitlab.com"];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub validation: ValidationConfig,
    pub oci: OciConfig,
    pub transport: TransportConfig,
    pub migration: MigrationConfig,
}

/// Registry validator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// When false every package validation is skipped.
    pub enable_registry_validation: bool,
    /// Deadline for one package validation.
    pub fetch_timeout_secs: u64,
    pub npm_base_url: String,
    pub pypi_base_url: String,
    pub nuget_base_url: String,
    /// Hosts MCPB download URLs may use.
    pub mcpb_allowed_hosts: Vec<String>,
}

/// OCI registry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OciConfig {
    pub policy: PolicyMode,
    /// Host patterns, `*` matches within one DNS label.
    pub allowed_hosts: Vec<String>,
    /// Registries reached over plain HTTP (local test registries).
    pub plain_http_hosts: Vec<String>,
}

/// Transport checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Report undeclared URL placeholders as errors instead of warnings.
    pub strict_url_variables: bool,
}

/// Migration defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    pub chunk_size: usize,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EngineConfig {
    /// Load configuration for the CLI: file lookup, process environment, validation.
    pub fn load(explicit: Option<&Path>) -> RegistryResult<Self> {
        let mut config = match resolve_config_path(explicit)? {
            Some(path) => {
                tracing::debug!("loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> RegistryResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `MCP_REGISTRY_*` overrides from `vars`. Unrelated variables are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "ENABLE_REGISTRY_VALIDATION" => {
                    self.validation.enable_registry_validation = parse_bool(&key, &value)?
                }
                "FETCH_TIMEOUT_SECS" => {
                    self.validation.fetch_timeout_secs = parse_number(&key, &value)?
                }
                "NPM_BASE_URL" => self.validation.npm_base_url = value,
                "PYPI_BASE_URL" => self.validation.pypi_base_url = value,
                "NUGET_BASE_URL" => self.validation.nuget_base_url = value,
                "MCPB_ALLOWED_HOSTS" => self.validation.mcpb_allowed_hosts = parse_list(&value),
                "OCI_POLICY" => self.oci.policy = parse_policy(&key, &value)?,
                "OCI_ALLOWED_HOSTS" => self.oci.allowed_hosts = parse_list(&value),
                "PLAIN_HTTP_HOSTS" => self.oci.plain_http_hosts = parse_list(&value),
                "STRICT_URL_VARIABLES" => {
                    self.transport.strict_url_variables = parse_bool(&key, &value)?
                }
                "MIGRATION_CHUNK_SIZE" => self.migration.chunk_size = parse_number(&key, &value)?,
                _ => tracing::debug!("ignoring unknown configuration variable {}", key),
            }
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> RegistryResult<()> {
        let v = &self.validation;
        if v.fetch_timeout_secs == 0 {
            return Err(RegistryError::Config(
                "validation.fetch_timeout_secs must be at least 1".into(),
            ));
        }
        for (field, url) in [
            ("validation.npm_base_url", &v.npm_base_url),
            ("validation.pypi_base_url", &v.pypi_base_url),
            ("validation.nuget_base_url", &v.nuget_base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://"))
                || reqwest::Url::parse(url).is_err()
            {
                return Err(RegistryError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }

        if self.oci.policy == PolicyMode::Allowlist && self.oci.allowed_hosts.is_empty() {
            return Err(RegistryError::Config(
                "oci.allowed_hosts must not be empty in allowlist mode (use policy = \"open\" to accept any registry)".into(),
            ));
        }
        for host in &self.oci.allowed_hosts {
            HostPattern::parse(host)?;
        }

        if self.migration.chunk_size == 0 {
            return Err(RegistryError::Config(
                "migration.chunk_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// OCI registry policy described by this configuration.
    pub fn registry_policy(&self) -> RegistryResult<RegistryPolicy> {
        RegistryPolicy::from_parts(self.oci.policy, &self.oci.allowed_hosts)
    }

    /// Per-package validation deadline.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.validation.fetch_timeout_secs)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Pick the configuration file to read, if any.
fn resolve_config_path(explicit: Option<&Path>) -> RegistryResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(RegistryError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }
    if DEFAULT_CONFIG_PATH.exists() {
        return Ok(Some(DEFAULT_CONFIG_PATH.clone()));
    }
    Ok(None)
}

fn parse_bool(key: &str, value: &str) -> RegistryResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RegistryError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> RegistryResult<T> {
    value.trim().parse().map_err(|_| {
        RegistryError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}

fn parse_policy(key: &str, value: &str) -> RegistryResult<PolicyMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "allowlist" => Ok(PolicyMode::Allowlist),
        "open" => Ok(PolicyMode::Open),
        _ => Err(RegistryError::Config(format!(
            "{} must be 'allowlist' or 'open', got '{}'",
            key, value
        ))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enable_registry_validation: true,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            npm_base_url: DEFAULT_NPM_BASE_URL.to_string(),
            pypi_base_url: DEFAULT_PYPI_BASE_URL.to_string(),
            nuget_base_url: DEFAULT_NUGET_BASE_URL.to_string(),
            mcpb_allowed_hosts: DEFAULT_MCPB_ALLOWED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl Default for OciConfig {
    fn default() -> Self {
        Self {
            policy: PolicyMode::Allowlist,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            plain_http_hosts: Vec::new(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_MIGRATION_CHUNK_SIZE,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert!(config.validation.enable_registry_validation);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.migration.chunk_size, 500);
        assert_eq!(config.oci.policy, PolicyMode::Allowlist);
        assert!(!config.transport.strict_url_variables);
        assert!(config.registry_policy().unwrap().allows_host("ghcr.io"));
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml(
            r#"
            [oci]
            policy = "open"

            [migration]
            chunk_size = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.oci.policy, PolicyMode::Open);
        assert_eq!(config.migration.chunk_size, 50);
        assert_eq!(config.validation.npm_base_url, DEFAULT_NPM_BASE_URL);
        assert!(config.registry_policy().unwrap().allows_host("quay.io"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = EngineConfig::from_toml("[oci]\nregistries = []\n").unwrap_err();
        assert!(matches!(err, RegistryError::ConfigParse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_env(env(&[
                ("MCP_REGISTRY_ENABLE_REGISTRY_VALIDATION", "false"),
                ("MCP_REGISTRY_OCI_ALLOWED_HOSTS", "ghcr.io, quay.io ,"),
                ("MCP_REGISTRY_FETCH_TIMEOUT_SECS", "5"),
                ("MCP_REGISTRY_STRICT_URL_VARIABLES", "1"),
                ("MCP_REGISTRY_MIGRATION_CHUNK_SIZE", "10"),
                ("MCP_REGISTRY_NPM_BASE_URL", "http://localhost:4873"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();

        assert!(!config.validation.enable_registry_validation);
        assert_eq!(config.oci.allowed_hosts, vec!["ghcr.io", "quay.io"]);
        assert_eq!(config.validation.fetch_timeout_secs, 5);
        assert!(config.transport.strict_url_variables);
        assert_eq!(config.migration.chunk_size, 10);
        assert_eq!(config.validation.npm_base_url, "http://localhost:4873");
        config.validate().unwrap();
    }

    #[test]
    fn test_env_parse_errors() {
        let mut config = EngineConfig::default();
        assert!(
            config
                .apply_env(env(&[("MCP_REGISTRY_ENABLE_REGISTRY_VALIDATION", "maybe")]))
                .is_err()
        );
        assert!(
            config
                .apply_env(env(&[("MCP_REGISTRY_MIGRATION_CHUNK_SIZE", "-1")]))
                .is_err()
        );
        assert!(
            config
                .apply_env(env(&[("MCP_REGISTRY_OCI_POLICY", "closed")]))
                .is_err()
        );
    }

    #[test]
    fn test_validation_rules() {
        let mut config = EngineConfig::default();
        config.oci.allowed_hosts.clear();
        assert!(config.validate().is_err());
        config.oci.policy = PolicyMode::Open;
        config.validate().unwrap();

        let mut config = EngineConfig::default();
        config.validation.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.migration.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.validation.pypi_base_url = "pypi.org".into();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.oci.allowed_hosts = vec!["https://ghcr.io".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        std::fs::write(&path, "[transport]\nstrict_url_variables = true\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert!(config.transport.strict_url_variables);

        let err = EngineConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("configuration file not found"));
    }
}
