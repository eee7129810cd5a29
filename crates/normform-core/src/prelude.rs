//! Convenient re-exports for downstream crates.

pub use crate::config::NormalizeConfig;
pub use crate::dependency::{
    resolve_transitive, DependencySet, FunctionalDependency, MultivaluedDependency,
};
pub use crate::error::{Error, Result};
pub use crate::form::NormalForm;
pub use crate::hash::{hash_relation, Hash256};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::relation::{attr_set, AttrSet, Column, CrunchBy, Origin, Relation, Tuple};
pub use crate::types::{Scalar, Value};
