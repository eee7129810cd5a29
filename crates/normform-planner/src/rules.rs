//! Dependency-set rewrites applied before any stage runs.

use normform_core::prelude::{DependencySet, NormalizeConfig};

/// Drop trivial dependencies (`dependent ⊆ determinant`), which never carve
/// anything, and sort into canonical order when the config asks for it.
pub fn optimize(mut deps: DependencySet, cfg: &NormalizeConfig) -> DependencySet {
    deps.fds.retain(|fd| !fd.is_trivial());
    deps.mvds.retain(|mvd| !mvd.is_trivial());
    if cfg.canonical_order {
        deps.canonicalize();
    }
    deps
}
