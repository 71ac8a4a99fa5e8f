//! Container image reference grammar.

use crate::constants::{DEFAULT_OCI_REGISTRY, DEFAULT_OCI_TAG, DOCKER_HUB_ALIASES};
use crate::error::{RegistryError, RegistryResult};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("Invalid tag regex"));

static DIGEST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").expect("Invalid digest regex"));

static PATH_COMPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("Invalid path component regex")
});

static HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*(?::[0-9]+)?$")
        .expect("Invalid host regex")
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A parsed, normalized container image reference.
///
/// `registry` is never empty and Docker Hub aliases are folded into `docker.io`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ImageReference {
    /// Parse `[host/]namespace/name[:tag][@sha256:digest]`.
    pub fn parse(reference: &str) -> RegistryResult<Self> {
        let fail = |reason: &str| RegistryError::ReferenceParse {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(fail("reference is empty"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(fail("reference contains whitespace"));
        }

        let (name_and_tag, digest) = match reference.split_once('@') {
            Some((rest, digest)) => {
                if !DIGEST_REGEX.is_match(digest) {
                    return Err(fail("digest must be 'sha256:' followed by 64 lowercase hex"));
                }
                (rest, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        let last_slash = name_and_tag.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match name_and_tag[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                let tag = &name_and_tag[split + 1..];
                if !TAG_REGEX.is_match(tag) {
                    return Err(fail("invalid tag"));
                }
                (&name_and_tag[..split], Some(tag.to_string()))
            }
            None => (name_and_tag, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => (first.to_string(), rest.to_string()),
            _ => (DEFAULT_OCI_REGISTRY.to_string(), name.to_string()),
        };

        if !HOST_REGEX.is_match(&registry) {
            return Err(fail("invalid registry host"));
        }
        let registry = normalize_registry(&registry);

        if repository.is_empty() {
            return Err(fail("repository is empty"));
        }
        for component in repository.split('/') {
            if !PATH_COMPONENT_REGEX.is_match(component) {
                return Err(fail(&format!(
                    "invalid repository component '{}' (must be lowercase alphanumerics with separators)",
                    component
                )));
            }
        }

        let repository = if registry == DEFAULT_OCI_REGISTRY && !repository.contains('/') {
            format!("library/{}", repository)
        } else {
            repository
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Tag to resolve, `latest` when neither tag nor digest was given.
    pub fn tag_or_default(&self) -> Option<&str> {
        match (&self.tag, &self.digest) {
            (Some(tag), _) => Some(tag),
            (None, None) => Some(DEFAULT_OCI_TAG),
            (None, Some(_)) => None,
        }
    }

    /// What to put in the manifest URL: the digest wins over the tag.
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_OCI_TAG)
    }

    /// Whether the image lives on Docker Hub.
    pub fn is_docker_hub(&self) -> bool {
        self.registry == DEFAULT_OCI_REGISTRY
    }

    /// Registry host without a port.
    pub fn hostname(&self) -> &str {
        self.registry
            .split_once(':')
            .map(|(h, _)| h)
            .unwrap_or(&self.registry)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn normalize_registry(host: &str) -> String {
    let lower = host.to_ascii_lowercase();
    if DOCKER_HUB_ALIASES.contains(&lower.as_str()) {
        DEFAULT_OCI_REGISTRY.to_string()
    } else {
        lower
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for ImageReference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = self.tag_or_default() {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:2f5b2b2a8a7e4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5";

    #[test]
    fn test_docker_hub_defaults() {
        let r = ImageReference::parse("nginx").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "library/nginx");
        assert_eq!(r.tag, None);
        assert_eq!(r.tag_or_default(), Some("latest"));
        assert_eq!(r.to_string(), "docker.io/library/nginx:latest");

        let r = ImageReference::parse("acme/server:1.0.0").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "acme/server");
        assert_eq!(r.tag.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_docker_hub_aliases() {
        for host in ["index.docker.io", "registry-1.docker.io", "docker.io"] {
            let r = ImageReference::parse(&format!("{}/acme/server:1", host)).unwrap();
            assert_eq!(r.registry, "docker.io");
            assert!(r.is_docker_hub());
        }
    }

    #[test]
    fn test_other_registries() {
        let r = ImageReference::parse("ghcr.io/acme/tools/server:v2").unwrap();
        assert_eq!(r.registry, "ghcr.io");
        assert_eq!(r.repository, "acme/tools/server");

        let r = ImageReference::parse("localhost:5000/server").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.hostname(), "localhost");
        assert_eq!(r.repository, "server");
        assert_eq!(r.tag, None);
    }

    #[test]
    fn test_digest_references() {
        let r = ImageReference::parse(&format!("ghcr.io/acme/server@{}", DIGEST)).unwrap();
        assert_eq!(r.digest.as_deref(), Some(DIGEST));
        assert_eq!(r.tag_or_default(), None);
        assert_eq!(r.manifest_reference(), DIGEST);

        let r = ImageReference::parse(&format!("ghcr.io/acme/server:1.0@{}", DIGEST)).unwrap();
        assert_eq!(r.tag.as_deref(), Some("1.0"));
        assert_eq!(r.manifest_reference(), DIGEST);
    }

    #[test]
    fn test_invalid_references() {
        for bad in [
            "",
            "Acme/Server:1.0",
            "acme/server:",
            "acme/server:-bad",
            "acme/server@sha256:abc",
            "acme/server@md5:0123",
            "acme//server",
            "acme/server:1.0 beta",
            "ghcr.io/",
        ] {
            let err = ImageReference::parse(bad).unwrap_err();
            assert!(
                err.to_string().starts_with("invalid OCI reference"),
                "{:?} gave {}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_long_tag_boundary() {
        let ok = format!("acme/server:{}", "a".repeat(128));
        assert!(ImageReference::parse(&ok).is_ok());
        let too_long = format!("acme/server:{}", "a".repeat(129));
        assert!(ImageReference::parse(&too_long).is_err());
    }
}
