//! Distribution client tests against a mock registry.

use super::*;
use crate::constants::OCI_OWNERSHIP_LABEL;
use crate::context::ValidationContext;
use crate::error::FetchError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

fn client_for(server: &MockServer) -> DistributionClient {
    DistributionClient::new()
        .unwrap()
        .with_plain_http_hosts([server.address().to_string()])
}

fn reference_for(server: &MockServer, image: &str) -> ImageReference {
    ImageReference::parse(&format!("{}/{}", server.address(), image)).unwrap()
}

fn image_manifest(config_digest: &str) -> serde_json::Value {
    json!({
        "schemaVersion": 2,
        "mediaType": OCI_MANIFEST,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "digest": config_digest, "size": 10},
        "layers": []
    })
}

fn config_blob(owner: &str) -> serde_json::Value {
    json!({
        "architecture": "amd64",
        "os": "linux",
        "config": {"Labels": {OCI_OWNERSHIP_LABEL: owner}}
    })
}

async fn mount_image(server: &MockServer, repo: &str, reference: &str, owner: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/manifests/{}", repo, reference)))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_manifest("sha256:cfg")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/blobs/sha256:cfg", repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_blob(owner)))
        .mount(server)
        .await;
}

#[test]
fn test_base_url() {
    let client = DistributionClient::new()
        .unwrap()
        .with_plain_http_hosts(["localhost:5000"]);
    assert_eq!(client.base_url("docker.io"), "https://registry-1.docker.io/v2");
    assert_eq!(client.base_url("ghcr.io"), "https://ghcr.io/v2");
    assert_eq!(client.base_url("localhost:5000"), "http://localhost:5000/v2");
}

#[tokio::test]
async fn test_fetch_single_manifest() {
    let server = MockServer::start().await;
    mount_image(&server, "acme/server", "1.0.0", "io.github.acme/server").await;

    let config = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/server:1.0.0"),
            &ValidationContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(config.label(OCI_OWNERSHIP_LABEL), Some("io.github.acme/server"));
}

#[tokio::test]
async fn test_bare_reference_resolves_latest() {
    let server = MockServer::start().await;
    mount_image(&server, "acme/server", "latest", "io.github.acme/server").await;

    let config = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/server"),
            &ValidationContext::new(),
        )
        .await
        .unwrap();
    assert!(config.labels().is_some());
}

#[tokio::test]
async fn test_token_challenge() {
    let server = MockServer::start().await;
    let realm = format!("{}/token", server.uri());

    Mock::given(method("GET"))
        .and(path("/v2/acme/server/manifests/1.0.0"))
        .and(header("authorization", "Bearer anon-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_manifest("sha256:cfg")))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/server/manifests/1.0.0"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!(
                r#"Bearer realm="{}",service="mock-registry",scope="repository:acme/server:pull""#,
                realm
            )
            .as_str(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("service", "mock-registry"))
        .and(query_param("scope", "repository:acme/server:pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "anon-token"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/server/blobs/sha256:cfg"))
        .and(header("authorization", "Bearer anon-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_blob("io.github.acme/server")))
        .mount(&server)
        .await;

    let config = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/server:1.0.0"),
            &ValidationContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(config.label(OCI_OWNERSHIP_LABEL), Some("io.github.acme/server"));
}

#[tokio::test]
async fn test_multi_arch_prefers_linux_amd64() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/acme/server/manifests/2.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schemaVersion": 2,
            "mediaType": OCI_INDEX,
            "manifests": [
                {"digest": "sha256:arm", "platform": {"os": "linux", "architecture": "arm64"}},
                {"digest": "sha256:amd", "platform": {"os": "linux", "architecture": "amd64"}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/server/manifests/sha256:amd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_manifest("sha256:amdcfg")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/server/blobs/sha256:amdcfg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_blob("io.github.acme/amd")))
        .mount(&server)
        .await;

    let config = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/server:2.0.0"),
            &ValidationContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(config.label(OCI_OWNERSHIP_LABEL), Some("io.github.acme/amd"));
}

#[tokio::test]
async fn test_status_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/missing/manifests/1.0.0"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/busy/manifests/1.0.0"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = ValidationContext::new();

    let err = client
        .fetch_image_config(&reference_for(&server, "acme/missing:1.0.0"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = client
        .fetch_image_config(&reference_for(&server, "acme/busy:1.0.0"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 429, .. }));
}

#[tokio::test]
async fn test_unanswerable_challenge_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/private/manifests/1.0.0"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Basic realm="x""#),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/private:1.0.0"),
            &ValidationContext::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_token_endpoint_status_is_reported() {
    let server = MockServer::start().await;
    let realm = format!("{}/token", server.uri());

    Mock::given(method("GET"))
        .and(path("/v2/acme/server/manifests/1.0.0"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            format!(r#"Bearer realm="{}",service="mock-registry""#, realm).as_str(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_image_config(
            &reference_for(&server, "acme/server:1.0.0"),
            &ValidationContext::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert!(matches!(err, FetchError::Status { ref url, .. } if *url == realm));
}

#[tokio::test]
async fn test_cancellation_is_distinct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/acme/slow/manifests/1.0.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_manifest("sha256:cfg"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let ctx = ValidationContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = client_for(&server)
        .fetch_image_config(&reference_for(&server, "acme/slow:1.0.0"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
}
