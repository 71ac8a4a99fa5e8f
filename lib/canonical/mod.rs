//! Canonicalization of package declarations.
//!
//! `canonicalize` is pure, total and idempotent. Input it cannot interpret is returned
//! unchanged; rejecting it is the validators' job.

mod pipeline;
mod stages;


use crate::model::{LegacyField, Package, ServerRecord};
use serde_json::Value;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use pipeline::{Pipeline, Stage};
pub use stages::{
    default_transport, registry_host, rewrite_mcpb, rewrite_oci, strip_forbidden_fields,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static STANDARD_PIPELINE: LazyLock<Pipeline> = LazyLock::new(Pipeline::standard);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Rewrite one package into canonical form.
pub fn canonicalize(pkg: Package) -> Package {
    STANDARD_PIPELINE.run(pkg)
}

/// Rewrite every package of a list.
pub fn canonicalize_packages(packages: Vec<Package>) -> Vec<Package> {
    packages.into_iter().map(canonicalize).collect()
}

/// Rewrite the packages of a server document.
pub fn canonicalize_server(mut server: ServerRecord) -> ServerRecord {
    server.packages = server.packages.map(canonicalize_packages);
    server
}

/// Rewrite a stored JSON `packages` array.
///
/// Null, non-array and empty input is returned unchanged. Elements without a string
/// `registryType`, or that are already canonical, are returned byte-for-byte. Elements with
/// values this crate cannot interpret only have their legacy fields rewritten.
pub fn canonicalize_packages_array(packages: &Value) -> Value {
    match packages {
        Value::Array(items) if !items.is_empty() => {
            Value::Array(items.iter().map(canonicalize_package_value).collect())
        }
        _ => packages.clone(),
    }
}

/// Rewrite the `packages` field of a stored server document.
///
/// Used for reads while a corpus still mixes legacy and canonical records.
pub fn canonicalize_record(document: &Value) -> Value {
    let mut out = document.clone();
    if let Some(packages) = out.get_mut("packages") {
        *packages = canonicalize_packages_array(packages);
    }
    out
}

fn canonicalize_package_value(value: &Value) -> Value {
    let pkg = match Package::from_value(value) {
        Ok(pkg) => pkg,
        Err(e) => {
            tracing::debug!("rewriting package fields in place: {}", e);
            return canonicalize_object_in_place(value);
        }
    };

    let canonical = canonicalize(pkg.clone());
    if canonical == pkg {
        return value.clone();
    }

    match canonical.to_value() {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("leaving package untouched, serialization failed: {}", e);
            value.clone()
        }
    }
}

/// Canonicalize a package object that does not deserialize as a whole.
///
/// Runs the pipeline over the projected fields and writes only those back, so values this
/// crate cannot interpret are kept as stored. An existing transport is never replaced.
fn canonicalize_object_in_place(value: &Value) -> Value {
    let (Some(obj), Some(pkg)) = (value.as_object(), Package::project(value)) else {
        return value.clone();
    };

    let canonical = canonicalize(pkg);
    let mut out = obj.clone();

    if !canonical.identifier.is_empty() {
        out.insert("identifier".into(), Value::String(canonical.identifier.clone()));
    }
    for field in LegacyField::ALL {
        let stored = obj.get(field.wire_name()).is_some_and(|v| !v.is_null());
        if stored && canonical.legacy_field(field).is_none() {
            out.remove(field.wire_name());
        }
    }
    if obj.get("transport").is_none_or(Value::is_null)
        && let Some(transport) = &canonical.transport
        && let Ok(transport) = serde_json::to_value(transport)
    {
        out.insert("transport".into(), transport);
    }

    if out == *obj {
        value.clone()
    } else {
        Value::Object(out)
    }
}
