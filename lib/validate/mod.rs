//! Offline validation of server documents.
//!
//! Checks run without network access and report every problem they find as a coded
//! [`ValidationIssue`]. Ownership checks against package registries live in
//! [`crate::registries`].

mod codes;
mod pattern;
mod record;
mod result;


//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use codes::{ErrorCode, ValidationCode, WarningCode};
pub use pattern::{
    is_valid_transport_url, url_placeholders, validate_transport, validate_transport_url,
};
pub use record::{RecordOptions, validate_server_json, validate_server_record};
pub use result::{ValidationIssue, ValidationResult};
