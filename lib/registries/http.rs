//! Shared HTTP handling for package registry validators.

use crate::error::{FetchError, RegistryError, RegistryResult};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result of a registry lookup that may be rate limited.
#[derive(Debug)]
pub(crate) enum Fetched<T> {
    Found(T),
    RateLimited,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// GET `url` and decode JSON. `kind` and `reference` only shape error messages.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    kind: &str,
    reference: &str,
    url: &str,
) -> RegistryResult<Fetched<T>> {
    let Some(response) = send(http, kind, reference, url).await? else {
        return Ok(Fetched::RateLimited);
    };
    let bytes = response.bytes().await.map_err(|source| fetch_error(
        kind,
        FetchError::Http {
            url: url.to_string(),
            source,
        },
    ))?;
    serde_json::from_slice(&bytes).map(Fetched::Found).map_err(|e| {
        fetch_error(
            kind,
            FetchError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            },
        )
    })
}

/// GET `url` as text.
pub(crate) async fn get_text(
    http: &reqwest::Client,
    kind: &str,
    reference: &str,
    url: &str,
) -> RegistryResult<Fetched<String>> {
    let Some(response) = send(http, kind, reference, url).await? else {
        return Ok(Fetched::RateLimited);
    };
    response.text().await.map(Fetched::Found).map_err(|source| {
        fetch_error(
            kind,
            FetchError::Http {
                url: url.to_string(),
                source,
            },
        )
    })
}

/// Send a GET. `None` means the registry rate limited the request.
async fn send(
    http: &reqwest::Client,
    kind: &str,
    reference: &str,
    url: &str,
) -> RegistryResult<Option<reqwest::Response>> {
    tracing::debug!("fetching {} metadata from {}", kind, url);
    let response = http.get(url).send().await.map_err(|source| {
        fetch_error(
            kind,
            FetchError::Http {
                url: url.to_string(),
                source,
            },
        )
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(Some(response));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(None);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound {
            kind: kind.to_string(),
            reference: reference.to_string(),
            status: status.as_u16(),
        });
    }
    Err(fetch_error(
        kind,
        FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        },
    ))
}

pub(crate) fn fetch_error(kind: &str, source: FetchError) -> RegistryError {
    RegistryError::Fetch {
        kind: kind.to_string(),
        source,
    }
}

/// Reject a package `registryBaseUrl` that points somewhere other than the configured registry.
pub(crate) fn check_base_url(
    registry_type: &str,
    declared: Option<&str>,
    expected: &str,
) -> RegistryResult<()> {
    let Some(declared) = declared.filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    if declared.trim_end_matches('/') == expected.trim_end_matches('/') {
        Ok(())
    } else {
        Err(RegistryError::BaseUrlMismatch {
            registry_type: registry_type.to_string(),
            expected: expected.to_string(),
            actual: declared.to_string(),
        })
    }
}

/// Whether a README-style text declares `owner` with the `mcp-name:` marker.
///
/// The name must be followed by whitespace, end of text or a non-name character so that
/// `io.github.acme/server` does not match `io.github.acme/server-two`.
pub(crate) fn declares_mcp_name(text: &str, owner: &str) -> bool {
    let needle = format!("{} {}", crate::constants::MCP_NAME_MARKER, owner);
    text.match_indices(&needle).any(|(i, m)| {
        text[i + m.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_check() {
        check_base_url("NPM", None, "https://registry.npmjs.org").unwrap();
        check_base_url("NPM", Some(""), "https://registry.npmjs.org").unwrap();
        check_base_url("NPM", Some("https://registry.npmjs.org/"), "https://registry.npmjs.org")
            .unwrap();

        let err = check_base_url("NPM", Some("https://evil.example.com"), "https://registry.npmjs.org")
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("registry type and base URL do not match")
        );
    }

    #[test]
    fn test_mcp_name_marker() {
        let readme = "# Weather\n\nmcp-name: io.github.acme/weather\n";
        assert!(declares_mcp_name(readme, "io.github.acme/weather"));
        assert!(declares_mcp_name("<!-- mcp-name: io.github.acme/weather -->", "io.github.acme/weather"));
        assert!(!declares_mcp_name(readme, "io.github.acme/weath"));
        assert!(!declares_mcp_name(readme, "io.github.other/weather"));
        assert!(!declares_mcp_name("", "io.github.acme/weather"));
    }
}
