//! Stage trait.
//!
//! The driver resolves a target normal form into a chain of stages and feeds
//! each one the previous stage's output together with the full dependency set.
//! A stage may be applied to one relation at a time; stages that report
//! `filters_redundant` get their merged output filtered by the driver.

use normform_core::prelude::{DependencySet, NormalForm, NormalizeConfig, Relation, Result};

/// Trait that all normal-form stages implement.
///
/// Invariants:
/// - `apply` must be deterministic given the same inputs.
/// - Every returned relation has its key inside its attributes and no two
///   rows agreeing on the key.
pub trait Stage: Send + Sync + 'static {
    /// Human-readable stage name (stable).
    fn name(&self) -> &'static str;

    /// Normal form the output satisfies with respect to the dependencies.
    fn form(&self) -> NormalForm;

    /// Transform `relations`. Input is owned; output is a new collection.
    fn apply(
        &self,
        relations: Vec<Relation>,
        deps: &DependencySet,
        cfg: &NormalizeConfig,
    ) -> Result<Vec<Relation>>;

    /// Whether redundant relations are dropped from this stage's output.
    ///
    /// `apply` already filters its own output; the driver uses this to
    /// filter across relations applied separately.
    fn filters_redundant(&self) -> bool {
        false
    }
}
