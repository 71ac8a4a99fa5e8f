//! Transport URL pattern and URL variable checks.

use crate::constants::TRANSPORT_URL_PATTERN;
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Transport, TransportType};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::codes::{ErrorCode, WarningCode};
use super::result::ValidationResult;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static TRANSPORT_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TRANSPORT_URL_PATTERN).expect("Invalid transport URL regex"));

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}\s]+)\}").expect("Invalid placeholder regex"));

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Whether `url` matches the transport URL pattern.
///
/// Placeholders such as `{tenant_id}` are allowed anywhere, including the host.
pub fn is_valid_transport_url(url: &str) -> bool {
    TRANSPORT_URL_REGEX.is_match(url)
}

/// Check a transport URL against the pattern.
pub fn validate_transport_url(url: &str) -> RegistryResult<()> {
    if is_valid_transport_url(url) {
        Ok(())
    } else {
        Err(RegistryError::InvalidTransportUrl(url.to_string()))
    }
}

/// Placeholder names in a URL, deduplicated, in order of first appearance.
pub fn url_placeholders(url: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    PLACEHOLDER_REGEX
        .captures_iter(url)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Validate one transport declaration, recording issues under `location`.
///
/// Undeclared placeholders are warnings unless `strict_variables` is set.
pub fn validate_transport(
    transport: &Transport,
    location: &str,
    strict_variables: bool,
    result: &mut ValidationResult,
) {
    let url_location = format!("{}.url", location);

    if transport.transport_type == TransportType::Stdio {
        if transport.url.is_some() {
            result.error(
                ErrorCode::UnexpectedTransportUrl,
                "unexpected transport URL",
                url_location,
                "stdio transports run a local process and must not declare a URL",
                Some("remove 'url' or use the 'streamable-http' or 'sse' transport".into()),
            );
        }
        return;
    }

    let Some(url) = transport.url.as_deref() else {
        result.error(
            ErrorCode::MissingTransportUrl,
            "missing transport URL",
            url_location,
            format!("'{}' transports require a URL", transport.transport_type),
            None,
        );
        return;
    };

    if let Err(e) = validate_transport_url(url) {
        result.error(
            ErrorCode::InvalidTransportUrl,
            "invalid transport URL",
            url_location.clone(),
            e.to_string(),
            Some(format!("expected a URL matching {}", TRANSPORT_URL_PATTERN)),
        );
    }

    let placeholders = url_placeholders(url);
    let declared: BTreeSet<&str> = transport.variable_names().collect();

    for name in &placeholders {
        if declared.contains(name.as_str()) {
            continue;
        }
        let details = format!("URL placeholder '{{{}}}' has no entry in 'variables'", name);
        let help = Some(format!(
            "declare '{}' under {}.variables so clients can prompt for it",
            name, location
        ));
        if strict_variables {
            result.error(
                ErrorCode::UndeclaredUrlVariable,
                "undeclared URL variable",
                url_location.clone(),
                details,
                help,
            );
        } else {
            result.warning(
                WarningCode::UndeclaredUrlVariable,
                "undeclared URL variable",
                url_location.clone(),
                details,
                help,
            );
        }
    }

    for name in declared {
        if !placeholders.iter().any(|p| p == name) {
            result.warning(
                WarningCode::UnusedUrlVariable,
                "unused URL variable",
                format!("{}.variables.{}", location, name),
                format!("variable '{}' does not appear in the URL", name),
                None,
            );
        }
    }
}
