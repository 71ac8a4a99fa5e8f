//! Package reference model shared by the canonicalizer, validators and migration.

mod package;
mod registry_type;
mod server;
mod shape;
mod transport;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use package::Package;
pub use registry_type::RegistryType;
pub use server::ServerRecord;
pub use shape::{
    FieldRule, FieldRules, LegacyField, McpbPackage, NativePackage, OciPackage, PackageRef, Shape,
    has_registry_host, is_bare_image_name, is_legacy_value,
};
pub use transport::{Input, Transport, TransportType};
