//! Dependency validation against the declared relations.
//!
//! A dependency naming attributes that no relation carries can never apply.
//! Stages skip such dependencies silently, so they are surfaced here: as
//! warnings by default, or as `Error::MalformedDependency` in strict mode.

use std::fmt;

use normform_core::prelude::{AttrSet, DependencySet, Error, Relation};

/// One dependency with attributes absent from every relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyWarning {
    /// Rendered dependency, e.g. `{a} -> {b}`.
    pub dependency: String,
    /// Attributes of the dependency that no relation has.
    pub missing: Vec<String>,
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dependency {} names unknown attributes: {}",
            self.dependency,
            self.missing.join(", ")
        )
    }
}

impl From<&DependencyWarning> for Error {
    fn from(w: &DependencyWarning) -> Self {
        Error::MalformedDependency {
            attributes: w.missing.clone(),
        }
    }
}

/// Check every FD and MVD in `deps` against the union of attributes of
/// `relations`. Warnings come out in declaration order, FDs first.
pub fn validate_dependencies(relations: &[Relation], deps: &DependencySet) -> Vec<DependencyWarning> {
    let known: AttrSet = relations.iter().flat_map(Relation::attribute_set).collect();

    let check = |dependency: String, attrs: AttrSet| {
        let missing: Vec<String> = attrs.into_iter().filter(|a| !known.contains(a)).collect();
        (!missing.is_empty()).then_some(DependencyWarning {
            dependency,
            missing,
        })
    };

    let fds = deps
        .fds
        .iter()
        .filter_map(|fd| check(fd.to_string(), fd.attributes()));
    let mvds = deps
        .mvds
        .iter()
        .filter_map(|mvd| check(mvd.to_string(), mvd.attributes()));
    fds.chain(mvds).collect()
}

/// Log `warnings`, and fail on the first one when `strict` is set.
pub fn enforce(warnings: &[DependencyWarning], strict: bool) -> Result<(), Error> {
    for w in warnings {
        tracing::warn!(dependency = %w.dependency, missing = ?w.missing, "malformed dependency");
    }
    match warnings.first() {
        Some(w) if strict => Err(w.into()),
        _ => Ok(()),
    }
}
