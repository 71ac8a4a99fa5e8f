//! Registry validator tests.

use super::*;
use crate::constants::OCI_OWNERSHIP_LABEL;
use crate::error::FetchError;
use crate::oci::{ImageConfig, ImageReference};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWNER: &str = "io.github.acme/server";
const SHA: &str = "fe333e598595000ae021bd27117db32ec69af6987f507ba7a63c90638ff633ce";

//--------------------------------------------------------------------------------------------------
// Fake OCI registry
//--------------------------------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Reply {
    Label(&'static str),
    NoLabels,
    Status(u16),
    Hang,
}

struct FakeRegistry {
    reply: Reply,
    calls: AtomicUsize,
}

impl FakeRegistry {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteRegistry for FakeRegistry {
    async fn fetch_image_config(
        &self,
        reference: &ImageReference,
        ctx: &ValidationContext,
    ) -> Result<ImageConfig, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Label(owner) => Ok(ImageConfig::with_labels([(OCI_OWNERSHIP_LABEL, owner)])),
            Reply::NoLabels => Ok(ImageConfig::default()),
            Reply::Status(status) => Err(FetchError::Status {
                status,
                url: format!("https://{}/v2/{}", reference.registry, reference.repository),
            }),
            Reply::Hang => {
                ctx.token().cancelled().await;
                Err(FetchError::Cancelled)
            }
        }
    }
}

fn validators(registry: Arc<FakeRegistry>) -> PackageValidators {
    PackageValidators::new(registry).unwrap()
}

async fn validate(registry: Arc<FakeRegistry>, pkg: Package) -> RegistryResult<ValidationOutcome> {
    validators(registry)
        .validate_package(&ValidationContext::new(), &pkg, OWNER)
        .await
}

//--------------------------------------------------------------------------------------------------
// OCI
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_oci_verified() {
    let registry = FakeRegistry::new(Reply::Label(OWNER));
    let outcome = validate(registry.clone(), Package::new("oci", "ghcr.io/acme/server:1.0.0"))
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::Verified);
    assert_eq!(registry.calls(), 1);
}

#[tokio::test]
async fn test_oci_format_gate_runs_before_network() {
    let cases = [
        (
            Package::new("oci", ""),
            "package identifier is required for OCI packages",
        ),
        (
            Package::new("oci", "docker.io/test/image:latest")
                .with_registry_base_url("https://docker.io"),
            "OCI packages must not have 'registryBaseUrl' field",
        ),
        (
            Package::new("oci", "docker.io/test/image:latest").with_version("1.0.0"),
            "OCI packages must not have 'version' field",
        ),
        (
            Package::new("oci", "docker.io/test/image:latest").with_file_sha256("abcd1234"),
            "OCI packages must not have 'fileSha256' field",
        ),
    ];

    for (pkg, message) in cases {
        let registry = FakeRegistry::new(Reply::Label(OWNER));
        let err = validate(registry.clone(), pkg).await.unwrap_err();
        assert!(err.to_string().contains(message), "{} !~ {}", err, message);
        assert_eq!(registry.calls(), 0);
    }
}

#[tokio::test]
async fn test_oci_base_url_hint() {
    let err = validate(
        FakeRegistry::new(Reply::Label(OWNER)),
        Package::new("oci", "docker.io/test/image:latest").with_registry_base_url("https://docker.io"),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "OCI packages must not have 'registryBaseUrl' field - use canonical reference in 'identifier' instead (e.g., 'docker.io/owner/image:1.0.0')"
    );
}

#[tokio::test]
async fn test_oci_invalid_reference() {
    let registry = FakeRegistry::new(Reply::Label(OWNER));
    let err = validate(registry.clone(), Package::new("oci", "Docker.io/UPPER/Case:1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::ReferenceParse { .. }));
    assert!(err.to_string().contains("invalid OCI reference"));
    assert_eq!(registry.calls(), 0);
}

#[tokio::test]
async fn test_oci_policy_gate() {
    let registry = FakeRegistry::new(Reply::Label(OWNER));
    let err = validate(registry.clone(), Package::new("oci", "quay.io/test/image:latest"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported registry 'quay.io'"));
    assert_eq!(registry.calls(), 0);

    let open = validators(registry.clone()).with_policy(RegistryPolicy::open());
    let outcome = open
        .validate_package(
            &ValidationContext::new(),
            &Package::new("oci", "quay.io/test/image:latest"),
            OWNER,
        )
        .await
        .unwrap();
    assert!(outcome.is_verified());
    assert_eq!(registry.calls(), 1);
}

#[tokio::test]
async fn test_oci_accepts_default_registries() {
    for identifier in [
        "docker.io/test/image:latest",
        "test/image:latest",
        "index.docker.io/test/image:latest",
        "ghcr.io/test/image:latest",
        "us-central1-docker.pkg.dev/proj/repo/image:latest",
    ] {
        let outcome = validate(
            FakeRegistry::new(Reply::Label(OWNER)),
            Package::new("oci", identifier),
        )
        .await
        .unwrap();
        assert!(outcome.is_verified(), "{}", identifier);
    }
}

#[tokio::test]
async fn test_oci_rate_limit_is_soft_pass() {
    let outcome = validate(
        FakeRegistry::new(Reply::Status(429)),
        Package::new("oci", "ghcr.io/acme/server:1.0.0"),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, ValidationOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_oci_not_found() {
    for status in [401, 404] {
        let err = validate(
            FakeRegistry::new(Reply::Status(status)),
            Package::new("oci", "ghcr.io/acme/server:1.0.0"),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "OCI image 'ghcr.io/acme/server:1.0.0' not found or not accessible (status: {})",
                status
            )
        );
    }

    let err = validate(
        FakeRegistry::new(Reply::Status(500)),
        Package::new("oci", "ghcr.io/acme/server:1.0.0"),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().starts_with("failed to fetch OCI image"));
}

#[tokio::test]
async fn test_oci_ownership_label() {
    let err = validate(
        FakeRegistry::new(Reply::NoLabels),
        Package::new("oci", "ghcr.io/acme/server:1.0.0"),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("missing required annotation"));
    assert!(err.to_string().contains(&format!(
        "LABEL io.modelcontextprotocol.server.name=\"{}\"",
        OWNER
    )));

    let err = validate(
        FakeRegistry::new(Reply::Label("io.github.mallory/server")),
        Package::new("oci", "ghcr.io/acme/server:1.0.0"),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "OCI image ownership validation failed. Expected annotation 'io.modelcontextprotocol.server.name' = 'io.github.acme/server', got 'io.github.mallory/server'"
    );
}

#[tokio::test]
async fn test_oci_cancellation() {
    let ctx = ValidationContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = validators(FakeRegistry::new(Reply::Hang))
        .validate_package(&ctx, &Package::new("oci", "ghcr.io/acme/server:1.0.0"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Cancelled));
}

#[tokio::test]
async fn test_oci_timeout() {
    let ctx = ValidationContext::new().with_timeout(Duration::from_millis(20));
    let err = validators(FakeRegistry::new(Reply::Hang))
        .validate_package(&ctx, &Package::new("oci", "ghcr.io/acme/server:1.0.0"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Timeout(_)));
}

//--------------------------------------------------------------------------------------------------
// Dispatch
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_disabled_validation_skips() {
    let registry = FakeRegistry::new(Reply::Status(500));
    let outcome = validators(registry.clone())
        .with_enabled(false)
        .validate_package(&ValidationContext::new(), &Package::new("oci", ""), OWNER)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ValidationOutcome::Skipped {
            reason: "registry validation is disabled".into()
        }
    );
    assert_eq!(registry.calls(), 0);
}

#[tokio::test]
async fn test_unknown_registry_type() {
    let err = validate(
        FakeRegistry::new(Reply::Label(OWNER)),
        Package::new("cargo", "acme-server"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "unsupported registry type: cargo");
}

#[tokio::test]
async fn test_validate_packages_keeps_order() {
    let validators = validators(FakeRegistry::new(Reply::Label(OWNER)));
    let packages = vec![
        Package::new("oci", "ghcr.io/acme/server:1.0.0"),
        Package::new("oci", "quay.io/acme/server:1.0.0"),
        Package::new("mcpb", "https://github.com/acme/server/releases/download/v1/server.mcpb")
            .with_file_sha256(SHA),
    ];
    let results = validators
        .validate_packages(&ValidationContext::new(), &packages, OWNER)
        .await;
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().is_verified());
    assert!(matches!(results[1], Err(RegistryError::Policy { .. })));
    assert!(results[2].as_ref().unwrap().is_verified());
}

//--------------------------------------------------------------------------------------------------
// MCPB
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_mcpb_rules() {
    let url = "https://github.com/acme/server/releases/download/v1/server.mcpb";
    let registry = FakeRegistry::new(Reply::Label(OWNER));

    let ok = validate(registry.clone(), Package::new("mcpb", url).with_file_sha256(SHA)).await;
    assert!(ok.unwrap().is_verified());

    let missing = validate(registry.clone(), Package::new("mcpb", url)).await.unwrap_err();
    assert!(missing.to_string().contains("must have 'fileSha256'"));

    let upper = validate(
        registry.clone(),
        Package::new("mcpb", url).with_file_sha256(SHA.to_uppercase()),
    )
    .await
    .unwrap_err();
    assert!(upper.to_string().contains("64 lowercase hex"));

    let http = validate(
        registry.clone(),
        Package::new("mcpb", "http://github.com/acme/server.mcpb").with_file_sha256(SHA),
    )
    .await
    .unwrap_err();
    assert!(http.to_string().contains("must use https"));

    let host = validate(
        registry.clone(),
        Package::new("mcpb", "https://example.com/server.mcpb").with_file_sha256(SHA),
    )
    .await
    .unwrap_err();
    assert!(host.to_string().contains("(got 'example.com')"));

    let version = validate(
        registry,
        Package::new("mcpb", url).with_file_sha256(SHA).with_version("1.0.0"),
    )
    .await
    .unwrap_err();
    assert!(version.to_string().contains("MCPB packages must not have 'version' field"));
}

#[test]
fn test_file_sha256_format() {
    assert!(is_valid_file_sha256(SHA));
    assert!(!is_valid_file_sha256(&SHA[1..]));
    assert!(!is_valid_file_sha256(&SHA.to_uppercase()));
    assert!(!is_valid_file_sha256(""));
}

//--------------------------------------------------------------------------------------------------
// npm, PyPI, NuGet
//--------------------------------------------------------------------------------------------------

async fn native_validators(server: &MockServer) -> PackageValidators {
    validators(FakeRegistry::new(Reply::Label(OWNER)))
        .with_npm_base_url(server.uri())
        .with_pypi_base_url(server.uri())
        .with_nuget_base_url(server.uri())
}

#[tokio::test]
async fn test_npm_mcp_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@acme/server/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "@acme/server",
            "version": "1.0.0",
            "mcpName": OWNER
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@acme/server/2.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "@acme/server"})))
        .mount(&server)
        .await;

    let validators = native_validators(&server).await;
    let ctx = ValidationContext::new();

    let ok = validators
        .validate_package(&ctx, &Package::new("npm", "@acme/server").with_version("1.0.0"), OWNER)
        .await
        .unwrap();
    assert!(ok.is_verified());

    let err = validators
        .validate_package(&ctx, &Package::new("npm", "@acme/server").with_version("1.0.0"), "io.github.other/x")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Expected mcpName 'io.github.other/x'"));

    let err = validators
        .validate_package(&ctx, &Package::new("npm", "@acme/server").with_version("2.0.0"), OWNER)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing required 'mcpName' field"));

    let err = validators
        .validate_package(&ctx, &Package::new("npm", "@acme/server"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingVersion(_)));
}

#[tokio::test]
async fn test_npm_base_url_mismatch() {
    let server = MockServer::start().await;
    let err = native_validators(&server)
        .await
        .validate_package(
            &ValidationContext::new(),
            &Package::new("npm", "left-pad")
                .with_version("1.0.0")
                .with_registry_base_url("https://npm.evil.example.com"),
            OWNER,
        )
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .starts_with("registry type and base URL do not match")
    );
}

#[tokio::test]
async fn test_pypi_description_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pypi/weather/1.0.0/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"name": "weather", "description": format!("# Weather\n\nmcp-name: {}\n", OWNER)}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pypi/weather/0.9.0/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"name": "weather", "description": null}
        })))
        .mount(&server)
        .await;

    let validators = native_validators(&server).await;
    let ctx = ValidationContext::new();

    let ok = validators
        .validate_package(&ctx, &Package::new("pypi", "weather").with_version("1.0.0"), OWNER)
        .await
        .unwrap();
    assert!(ok.is_verified());

    let err = validators
        .validate_package(&ctx, &Package::new("pypi", "weather").with_version("0.9.0"), OWNER)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must appear as 'mcp-name: io.github.acme/server'"));
}

#[tokio::test]
async fn test_nuget_readme_lowercases_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3-flatcontainer/acme.server/1.0.0-beta/readme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("mcp-name: {}", OWNER)))
        .mount(&server)
        .await;

    let outcome = native_validators(&server)
        .await
        .validate_package(
            &ValidationContext::new(),
            &Package::new("nuget", "Acme.Server").with_version("1.0.0-BETA"),
            OWNER,
        )
        .await
        .unwrap();
    assert!(outcome.is_verified());
}

#[tokio::test]
async fn test_native_status_handling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pypi/busy/1.0.0/json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pypi/broken/1.0.0/json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let validators = native_validators(&server).await;
    let ctx = ValidationContext::new();

    let skipped = validators
        .validate_package(&ctx, &Package::new("pypi", "busy").with_version("1.0.0"), OWNER)
        .await
        .unwrap();
    assert!(matches!(skipped, ValidationOutcome::Skipped { .. }));

    let missing = validators
        .validate_package(&ctx, &Package::new("pypi", "absent").with_version("1.0.0"), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(missing, RegistryError::NotFound { status: 404, .. }));

    let broken = validators
        .validate_package(&ctx, &Package::new("pypi", "broken").with_version("1.0.0"), OWNER)
        .await
        .unwrap_err();
    match broken {
        RegistryError::Fetch { source, .. } => assert_eq!(source.status(), Some(503)),
        other => panic!("unexpected error: {:?}", other),
    }
}
