//! Functional and multivalued dependencies, plus transitive resolution.
//!
//! Both dependency kinds share one shape (determinant set, dependent set); the
//! difference is only in which stage reads them. Distinct types keep an FD
//! from being handed to the 4NF stage by accident.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::relation::AttrSet;

macro_rules! dependency_type {
    ($name:ident, $arrow:literal) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name {
            pub determinant: AttrSet,
            pub dependent: AttrSet,
        }

        impl $name {
            pub fn new<I, J, S, T>(determinant: I, dependent: J) -> Self
            where
                I: IntoIterator<Item = S>,
                J: IntoIterator<Item = T>,
                S: Into<String>,
                T: Into<String>,
            {
                Self {
                    determinant: determinant.into_iter().map(Into::into).collect(),
                    dependent: dependent.into_iter().map(Into::into).collect(),
                }
            }

            /// Every attribute mentioned on either side.
            pub fn attributes(&self) -> AttrSet {
                self.determinant.union(&self.dependent).cloned().collect()
            }

            pub fn is_trivial(&self) -> bool {
                self.dependent.is_subset(&self.determinant)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let join = |s: &AttrSet| s.iter().cloned().collect::<Vec<_>>().join(", ");
                write!(
                    f,
                    "{{{}}} {} {{{}}}",
                    join(&self.determinant),
                    $arrow,
                    join(&self.dependent)
                )
            }
        }
    };
}

dependency_type!(FunctionalDependency, "->");
dependency_type!(MultivaluedDependency, "->>");

/// All dependencies declared for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencySet {
    #[serde(default)]
    pub fds: Vec<FunctionalDependency>,
    #[serde(default)]
    pub mvds: Vec<MultivaluedDependency>,
}

impl DependencySet {
    pub fn new(fds: Vec<FunctionalDependency>, mvds: Vec<MultivaluedDependency>) -> Self {
        Self { fds, mvds }
    }

    /// Sort lexicographically on (determinant, dependent) and drop exact
    /// duplicates, so results do not depend on declaration order.
    pub fn canonicalize(&mut self) {
        self.fds.sort();
        self.fds.dedup();
        self.mvds.sort();
        self.mvds.dedup();
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty() && self.mvds.is_empty()
    }

    /// Every attribute mentioned by any dependency.
    pub fn attributes(&self) -> AttrSet {
        self.fds
            .iter()
            .map(FunctionalDependency::attributes)
            .chain(self.mvds.iter().map(MultivaluedDependency::attributes))
            .flatten()
            .collect()
    }
}

/// Rewrite `fd`'s determinant in terms of `terminals`.
///
/// A determinant attribute outside `terminals` is replaced by the determinant
/// of the first other FD that has it as a dependent, recursively. Attributes
/// with no defining FD are kept as they are. Fails with
/// `Error::CyclicDependency` if resolution revisits an attribute on its own
/// path; the path never holds more attributes than the FDs mention, which
/// bounds recursion depth.
pub fn resolve_transitive(
    fd: &FunctionalDependency,
    fds: &[FunctionalDependency],
    terminals: &AttrSet,
) -> Result<FunctionalDependency> {
    let mut determinant = AttrSet::new();
    let mut path = AttrSet::new();
    for attr in &fd.determinant {
        resolve_attribute(attr, fds, terminals, &mut path, &mut determinant)?;
    }
    Ok(FunctionalDependency {
        determinant,
        dependent: fd.dependent.clone(),
    })
}

fn resolve_attribute(
    attr: &str,
    fds: &[FunctionalDependency],
    terminals: &AttrSet,
    path: &mut AttrSet,
    out: &mut AttrSet,
) -> Result<()> {
    if terminals.contains(attr) {
        out.insert(attr.to_string());
        return Ok(());
    }

    let Some(defining) = fds
        .iter()
        .find(|f| f.dependent.contains(attr) && !f.determinant.contains(attr))
    else {
        out.insert(attr.to_string());
        return Ok(());
    };

    if !path.insert(attr.to_string()) {
        return Err(Error::CyclicDependency {
            attribute: attr.to_string(),
        });
    }
    for det in &defining.determinant {
        resolve_attribute(det, fds, terminals, path, out)?;
    }
    path.remove(attr);
    Ok(())
}
