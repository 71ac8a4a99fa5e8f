//! Ordered composition of canonicalization stages.

use super::stages::{default_transport, rewrite_mcpb, rewrite_oci, strip_forbidden_fields};
use crate::model::Package;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A canonicalization stage.
pub type Stage = fn(Package) -> Package;

/// Stages applied in order, each to the output of the previous one.
///
/// The type-specific rewrites must run before [`strip_forbidden_fields`], and
/// [`default_transport`] runs last.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<(&'static str, Stage)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Pipeline {
    /// The pipeline used for publishing and migration.
    pub fn standard() -> Self {
        Self::empty()
            .then("oci-rewrite", rewrite_oci)
            .then("mcpb-rewrite", rewrite_mcpb)
            .then("strip-forbidden-fields", strip_forbidden_fields)
            .then("default-transport", default_transport)
    }

    /// A pipeline with no stages.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    pub fn then(mut self, name: &'static str, stage: Stage) -> Self {
        self.stages.push((name, stage));
        self
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    /// Run every stage.
    pub fn run(&self, pkg: Package) -> Package {
        self.stages.iter().fold(pkg, |pkg, (_, stage)| stage(pkg))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
