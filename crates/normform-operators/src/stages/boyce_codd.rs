//! BCNF: every non-trivial determinant must be a superkey.
//!
//! Same shape as 3NF, but the carved dependents may include key attributes.
//! When one is moved, the stripped relation is re-keyed on
//! `(key - moved) ∪ determinant`, which still identifies every tuple.

use normform_core::prelude::{
    AttrSet, DependencySet, FunctionalDependency, NormalForm, NormalizeConfig, Relation, Result,
};

use crate::redundancy::filter_redundant;
use crate::stages::{attributes_where, decompose_to_fixpoint, Carve};
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct BoyceCoddNormalForm;

impl Stage for BoyceCoddNormalForm {
    fn name(&self) -> &'static str {
        "boyce_codd_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::BoyceCodd
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
            out.extend(decompose_to_fixpoint(relation, |r| {
                Ok(non_superkey_determinant(r, &deps.fds))
            })?);
        }
        Ok(filter_redundant(out))
    }
}

fn non_superkey_determinant(relation: &Relation, fds: &[FunctionalDependency]) -> Option<Carve> {
    fds.iter().find_map(|fd| {
        let det = &fd.determinant;
        if det.is_empty()
            || !relation.contains_all(det)
            || det.iter().all(|a| relation.is_key(a))
            || relation.key().is_subset(det)
        {
            return None;
        }
        let moved = attributes_where(relation, |a| fd.dependent.contains(a) && !det.contains(a));

        let rekey = moved.iter().any(|a| relation.is_key(a)).then(|| {
            relation
                .key()
                .iter()
                .filter(|k| !moved.contains(*k))
                .chain(det)
                .cloned()
                .collect::<AttrSet>()
        });
        Carve::proper(relation, det.clone(), moved, rekey)
    })
}
