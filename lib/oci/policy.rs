//! Registry host allowlist applied before any network call.

use crate::error::{RegistryError, RegistryResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::ImageReference;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Hosts accepted when no allowlist is configured.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["docker.io", "ghcr.io", "*-docker.pkg.dev"];

static HOST_PATTERN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9*](?:[a-z0-9*.-]*[a-z0-9*])?(?::[0-9]+)?$")
        .expect("Invalid host pattern regex")
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How the allowlist is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Only listed hosts are accepted.
    #[default]
    Allowlist,
    /// Any host is accepted.
    Open,
}

/// A host name, optionally with `*` wildcards matching one DNS label fragment.
#[derive(Debug, Clone)]
pub struct HostPattern {
    source: String,
    regex: Regex,
}

/// Which registries OCI packages may be published to.
#[derive(Debug, Clone)]
pub struct RegistryPolicy {
    mode: PolicyMode,
    hosts: Vec<HostPattern>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HostPattern {
    /// Parse a pattern such as `ghcr.io` or `*-docker.pkg.dev`.
    pub fn parse(pattern: &str) -> RegistryResult<Self> {
        let source = pattern.trim().to_ascii_lowercase();
        if !HOST_PATTERN_REGEX.is_match(&source) {
            return Err(RegistryError::Config(format!(
                "invalid registry host pattern '{}'",
                pattern
            )));
        }

        let body = source
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[a-z0-9-]+");
        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| RegistryError::Config(format!("invalid host pattern '{}': {}", pattern, e)))?;

        Ok(Self { source, regex })
    }

    /// Whether `host` matches. Comparison is case-insensitive.
    pub fn matches(&self, host: &str) -> bool {
        self.regex.is_match(&host.to_ascii_lowercase())
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl RegistryPolicy {
    /// Allowlist policy over the given patterns.
    pub fn allowlist<I, S>(patterns: I) -> RegistryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = patterns
            .into_iter()
            .map(|p| HostPattern::parse(p.as_ref()))
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(Self {
            mode: PolicyMode::Allowlist,
            hosts,
        })
    }

    /// Policy that accepts every host.
    pub fn open() -> Self {
        Self {
            mode: PolicyMode::Open,
            hosts: Vec::new(),
        }
    }

    /// Build from configuration values.
    pub fn from_parts(mode: PolicyMode, hosts: &[String]) -> RegistryResult<Self> {
        match mode {
            PolicyMode::Open => Ok(Self::open()),
            PolicyMode::Allowlist => Self::allowlist(hosts),
        }
    }

    /// Enforcement mode.
    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Configured host patterns.
    pub fn hosts(&self) -> &[HostPattern] {
        &self.hosts
    }

    /// Whether `host` may be contacted.
    ///
    /// A pattern without a port matches the host on any port.
    pub fn allows_host(&self, host: &str) -> bool {
        if self.mode == PolicyMode::Open {
            return true;
        }
        let without_port = host.split_once(':').map(|(h, _)| h).unwrap_or(host);
        self.hosts
            .iter()
            .any(|p| p.matches(host) || p.matches(without_port))
    }

    /// Reject references whose registry is not allowed.
    pub fn check(&self, reference: &ImageReference) -> RegistryResult<()> {
        if self.allows_host(&reference.registry) {
            Ok(())
        } else {
            Err(RegistryError::Policy {
                host: reference.registry.clone(),
            })
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Allowlist,
            hosts: DEFAULT_ALLOWED_HOSTS
                .iter()
                .filter_map(|p| HostPattern::parse(p).ok())
                .collect(),
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Allowlist => write!(f, "allowlist"),
            PolicyMode::Open => write!(f, "open"),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let policy = RegistryPolicy::default();
        assert_eq!(policy.hosts().len(), 3);
        assert!(policy.allows_host("docker.io"));
        assert!(policy.allows_host("ghcr.io"));
        assert!(policy.allows_host("us-central1-docker.pkg.dev"));
        assert!(!policy.allows_host("docker.pkg.dev"));
        assert!(!policy.allows_host("quay.io"));
        assert!(!policy.allows_host("evil.ghcr.io.example.com"));
    }

    #[test]
    fn test_policy_error_names_host() {
        let policy = RegistryPolicy::default();
        let reference = ImageReference::parse("quay.io/acme/server:1.0").unwrap();
        let err = policy.check(&reference).unwrap_err();
        assert!(matches!(err, RegistryError::Policy { ref host } if host == "quay.io"));
        assert!(err.to_string().contains("unsupported registry 'quay.io'"));
    }

    #[test]
    fn test_open_mode() {
        let policy = RegistryPolicy::open();
        assert!(policy.allows_host("registry.example.com:8443"));
    }

    #[test]
    fn test_port_handling() {
        let policy = RegistryPolicy::allowlist(["localhost"]).unwrap();
        assert!(policy.allows_host("localhost:5000"));

        let pinned = RegistryPolicy::allowlist(["localhost:5000"]).unwrap();
        assert!(pinned.allows_host("localhost:5000"));
        assert!(!pinned.allows_host("localhost:6000"));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["", "ghcr.io/path", "host name", "-bad.io", "https://ghcr.io"] {
            assert!(HostPattern::parse(bad).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_wildcard_stays_within_label() {
        let pattern = HostPattern::parse("*.example.com").unwrap();
        assert!(pattern.matches("registry.example.com"));
        assert!(pattern.matches("Registry.Example.com"));
        assert!(!pattern.matches("a.b.example.com"));
    }
}
