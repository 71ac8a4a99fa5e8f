//! Manifest, index and image config documents of the distribution protocol.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

pub const OCI_INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
pub const OCI_MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
pub const DOCKER_MANIFEST_LIST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
pub const DOCKER_MANIFEST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v2+json";

/// Media types sent in the manifest `Accept` header, most preferred first.
pub const MANIFEST_ACCEPT: &[&str] = &[
    OCI_INDEX_MEDIA_TYPE,
    DOCKER_MANIFEST_LIST_MEDIA_TYPE,
    OCI_MANIFEST_MEDIA_TYPE,
    DOCKER_MANIFEST_MEDIA_TYPE,
];

/// Platform chosen from a multi-arch index when present.
pub const PREFERRED_OS: &str = "linux";
pub const PREFERRED_ARCHITECTURE: &str = "amd64";

/// OS and architecture of attestation entries in an index.
const UNKNOWN_PLATFORM: &str = "unknown";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Content descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Either a multi-arch index or a single-image manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Index(Vec<Descriptor>),
    Image { config: Descriptor },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    manifests: Option<Vec<Descriptor>>,
    #[serde(default)]
    config: Option<Descriptor>,
}

/// The parts of an image config blob the validators read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

/// Runtime config section of an image config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(rename = "Labels", default)]
    pub labels: Option<BTreeMap<String, String>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Manifest {
    /// Decode a manifest body. `content_type` is the response header, used when the
    /// body does not carry its own `mediaType`.
    pub fn from_slice(content_type: Option<&str>, body: &[u8]) -> Result<Self, String> {
        let raw: RawManifest = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let media_type = raw
            .media_type
            .as_deref()
            .or(content_type)
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_string());

        let is_index = match media_type.as_deref() {
            Some(OCI_INDEX_MEDIA_TYPE) | Some(DOCKER_MANIFEST_LIST_MEDIA_TYPE) => true,
            Some(OCI_MANIFEST_MEDIA_TYPE) | Some(DOCKER_MANIFEST_MEDIA_TYPE) => false,
            _ => raw.manifests.is_some(),
        };

        if is_index {
            return Ok(Manifest::Index(raw.manifests.unwrap_or_default()));
        }
        match raw.config {
            Some(config) => Ok(Manifest::Image { config }),
            None => Err("manifest has no config descriptor".to_string()),
        }
    }
}

/// Pick the entry to follow from a multi-arch index.
///
/// `linux/amd64` wins. Otherwise the first entry that is a runnable Linux image, or that
/// declares no platform, is used. Attestation manifests (`unknown/unknown`) and other
/// operating systems are never chosen.
pub fn select_platform(manifests: &[Descriptor]) -> Option<&Descriptor> {
    manifests
        .iter()
        .find(|d| {
            d.platform.as_ref().is_some_and(|p| {
                p.os == PREFERRED_OS && p.architecture == PREFERRED_ARCHITECTURE
            })
        })
        .or_else(|| {
            manifests.iter().find(|d| match &d.platform {
                Some(p) => p.os == PREFERRED_OS && p.architecture != UNKNOWN_PLATFORM,
                None => true,
            })
        })
}

impl ImageConfig {
    /// Image labels, if the config declares any.
    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.config.as_ref().and_then(|c| c.labels.as_ref())
    }

    /// Value of one label.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().and_then(|l| l.get(key)).map(String::as_str)
    }

    /// A config carrying the given labels.
    pub fn with_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            config: Some(ContainerConfig {
                labels: Some(
                    labels
                        .into_iter()
                        .map(|(k, v)| (k.into(), v.into()))
                        .collect(),
                ),
            }),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
