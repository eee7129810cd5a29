//! 2NF: remove partial dependencies on the key.
//!
//! Each FD is first resolved against the relation's key so a chain such as
//! `student -> advisor -> office` is seen as anchored on `student`. A resolved
//! determinant that sits inside the relation without containing the whole
//! key is a partial dependency and is carved out.

use normform_core::prelude::{
    resolve_transitive, DependencySet, FunctionalDependency, NormalForm, NormalizeConfig,
    Relation, Result,
};

use crate::redundancy::filter_redundant;
use crate::stages::{attributes_where, decompose_to_fixpoint, Carve};
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct SecondNormalForm;

impl Stage for SecondNormalForm {
    fn name(&self) -> &'static str {
        "second_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::Second
    }

    fn filters_redundant(&self) -> bool {
        true
    }

    fn apply(
        &self,
        relations: Vec<Relation>,
        deps: &DependencySet,
        _cfg: &NormalizeConfig,
    ) -> Result<Vec<Relation>> {
        let mut out = Vec::with_capacity(relations.len());
        for relation in relations {
            out.extend(decompose_to_fixpoint(relation, |r| partial_dependency(r, &deps.fds))?);
        }
        Ok(filter_redundant(out))
    }
}

fn partial_dependency(
    relation: &Relation,
    fds: &[FunctionalDependency],
) -> Result<Option<Carve>> {
    for fd in fds {
        let resolved = resolve_transitive(fd, fds, relation.key())?;
        let det = &resolved.determinant;
        if det.is_empty() || !relation.contains_all(det) || relation.key().is_subset(det) {
            continue;
        }

        let moved = attributes_where(relation, |a| {
            resolved.dependent.contains(a) && !relation.is_key(a) && !det.contains(a)
        });
        if let Some(carve) = Carve::proper(relation, det.clone(), moved, None) {
            return Ok(Some(carve));
        }
    }
    Ok(None)
}
