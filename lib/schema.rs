//! Bundled JSON schema for server documents.

use crate::constants::SERVER_SCHEMA;
use crate::error::RegistryResult;
use serde_json::Value;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The bundled schema text.
pub fn server_schema_text() -> &'static str {
    SERVER_SCHEMA
}

/// The bundled schema as JSON.
pub fn server_schema() -> RegistryResult<Value> {
    Ok(serde_json::from_str(SERVER_SCHEMA)?)
}

/// URL pattern a transport definition declares, e.g. `SseTransport`.
pub fn transport_url_pattern<'a>(schema: &'a Value, definition: &str) -> Option<&'a str> {
    schema
        .pointer(&format!("/definitions/{}/properties/url/pattern", definition))
        .and_then(Value::as_str)
}

/// Property names of the `Package` definition.
pub fn package_properties(schema: &Value) -> Vec<&str> {
    schema
        .pointer("/definitions/Package/properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
