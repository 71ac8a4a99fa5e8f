//! Anonymous client for the OCI distribution protocol.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};

use super::auth::{BearerChallenge, TokenResponse, pull_scope};
use super::manifest::{ImageConfig, MANIFEST_ACCEPT, Manifest, select_platform};
use super::ImageReference;
use crate::constants::{DEFAULT_OCI_REGISTRY, DOCKER_HUB_API_HOST, USER_AGENT};
use crate::context::ValidationContext;
use crate::error::{FetchError, RegistryError, RegistryResult};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Source of image metadata for the OCI validator.
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// Resolve `reference` to its image config, following multi-arch indexes.
    async fn fetch_image_config(
        &self,
        reference: &ImageReference,
        ctx: &ValidationContext,
    ) -> Result<ImageConfig, FetchError>;
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// [`RemoteRegistry`] over HTTPS with anonymous bearer tokens.
///
/// Tokens are negotiated per fetch and never cached.
#[derive(Debug, Clone)]
pub struct DistributionClient {
    http: reqwest::Client,
    plain_http_hosts: Vec<String>,
}

/// Per-fetch request state.
struct Session<'a> {
    client: &'a DistributionClient,
    base: String,
    scope: String,
    token: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DistributionClient {
    /// Create a client with the crate user agent.
    pub fn new() -> RegistryResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RegistryError::Generic(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(http))
    }

    /// Use an existing HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            plain_http_hosts: Vec::new(),
        }
    }

    /// Registries (`host[:port]`) reached over plain HTTP instead of HTTPS.
    pub fn with_plain_http_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plain_http_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Base URL of the distribution API for a registry.
    pub fn base_url(&self, registry: &str) -> String {
        let host = if registry == DEFAULT_OCI_REGISTRY {
            DOCKER_HUB_API_HOST
        } else {
            registry
        };
        let scheme = if self.plain_http_hosts.iter().any(|h| h == registry) {
            "http"
        } else {
            "https"
        };
        format!("{}://{}/v2", scheme, host)
    }

    async fn fetch(&self, reference: &ImageReference) -> Result<ImageConfig, FetchError> {
        let mut session = Session {
            client: self,
            base: self.base_url(&reference.registry),
            scope: pull_scope(&reference.repository),
            token: None,
        };

        let manifest_url = format!(
            "{}/{}/manifests/{}",
            session.base,
            reference.repository,
            reference.manifest_reference()
        );
        tracing::debug!("fetching manifest {}", manifest_url);

        let config = match session.manifest(&manifest_url).await? {
            Manifest::Image { config } => config,
            Manifest::Index(entries) => {
                let entry = select_platform(&entries).ok_or_else(|| FetchError::Decode {
                    url: manifest_url.clone(),
                    reason: "image index has no linux image manifest".into(),
                })?;
                let platform_url = format!(
                    "{}/{}/manifests/{}",
                    session.base, reference.repository, entry.digest
                );
                tracing::debug!("following index entry {}", entry.digest);
                match session.manifest(&platform_url).await? {
                    Manifest::Image { config } => config,
                    Manifest::Index(_) => {
                        return Err(FetchError::MissingConfig { url: platform_url });
                    }
                }
            }
        };

        let blob_url = format!(
            "{}/{}/blobs/{}",
            session.base, reference.repository, config.digest
        );
        tracing::debug!("fetching config blob {}", blob_url);
        let response = session.get(&blob_url, None).await?;
        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: blob_url.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: blob_url,
            reason: e.to_string(),
        })
    }
}

impl Session<'_> {
    async fn manifest(&mut self, url: &str) -> Result<Manifest, FetchError> {
        let accept = MANIFEST_ACCEPT.join(", ");
        let response = self.get(url, Some(&accept)).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;
        Manifest::from_slice(content_type.as_deref(), &bytes).map_err(|reason| {
            FetchError::Decode {
                url: url.to_string(),
                reason,
            }
        })
    }

    /// GET with at most one anonymous token negotiation on 401.
    async fn get(&mut self, url: &str, accept: Option<&str>) -> Result<reqwest::Response, FetchError> {
        let response = self.send(url, accept).await?;
        if response.status() != StatusCode::UNAUTHORIZED || self.token.is_some() {
            return check_status(url, response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(BearerChallenge::parse);
        let Some(challenge) = challenge else {
            return check_status(url, response);
        };

        self.token = Some(self.fetch_token(&challenge).await?);
        let retried = self.send(url, accept).await?;
        check_status(url, retried)
    }

    async fn send(&self, url: &str, accept: Option<&str>) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.http.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_token(&self, challenge: &BearerChallenge) -> Result<String, FetchError> {
        tracing::debug!("requesting anonymous token from {}", challenge.realm);
        let response = self
            .client
            .http
            .get(&challenge.realm)
            .query(&challenge.token_query(&self.scope))
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: challenge.realm.clone(),
                source,
            })?;

        let response = check_status(&challenge.realm, response)?;

        let body: TokenResponse = response.json().await.map_err(|e| FetchError::Auth {
            url: challenge.realm.clone(),
            reason: e.to_string(),
        })?;
        body.into_token().ok_or_else(|| FetchError::Auth {
            url: challenge.realm.clone(),
            reason: "token response has no token".into(),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl RemoteRegistry for DistributionClient {
    async fn fetch_image_config(
        &self,
        reference: &ImageReference,
        ctx: &ValidationContext,
    ) -> Result<ImageConfig, FetchError> {
        if ctx.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = ctx.token().cancelled() => Err(FetchError::Cancelled),
            result = self.fetch(reference) => result,
        }
    }
}
