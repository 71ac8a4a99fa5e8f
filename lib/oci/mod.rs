//! OCI image references, registry policy and the distribution client.

mod auth;
mod client;
mod manifest;
mod policy;
mod reference;

#[cfg(test)]
mod tests;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use auth::{BearerChallenge, pull_scope};
pub use client::{DistributionClient, RemoteRegistry};
pub use manifest::{
    ContainerConfig, Descriptor, ImageConfig, MANIFEST_ACCEPT, Manifest, Platform,
    select_platform,
};
pub use policy::{DEFAULT_ALLOWED_HOSTS, HostPattern, PolicyMode, RegistryPolicy};
pub use reference::ImageReference;
