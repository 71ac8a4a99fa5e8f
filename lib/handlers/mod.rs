//! CLI command handlers.

mod canonicalize;
mod migrate;
mod schema;
mod validate;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use canonicalize::canonicalize_file;
pub use migrate::migrate_store;
pub use schema::print_schema;
pub use validate::{PackageCheck, validate_file};
