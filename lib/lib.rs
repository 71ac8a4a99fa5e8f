//! `registry-meta` library.
//!
//! Canonicalizes, validates and migrates the package metadata of MCP registry server
//! documents.

pub mod canonical;
pub mod commands;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod handlers;
pub mod migrate;
pub mod model;
pub mod oci;
pub mod registries;
pub mod schema;
pub mod store;
pub mod styles;
pub mod validate;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use canonical::*;
pub use commands::*;
pub use config::*;
pub use constants::*;
pub use context::*;
pub use error::*;
pub use migrate::*;
pub use model::*;
pub use registries::*;
pub use store::*;
pub use validate::*;
