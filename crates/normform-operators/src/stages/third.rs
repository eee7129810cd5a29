//! 3NF: remove transitive dependencies among non-key attributes.

use normform_core::prelude::{
    DependencySet, FunctionalDependency, NormalForm, NormalizeConfig, Relation, Result,
};

use crate::redundancy::filter_redundant;
use crate::stages::{attributes_where, decompose_to_fixpoint, Carve};
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct ThirdNormalForm;

impl Stage for ThirdNormalForm {
    fn name(&self) -> &'static str {
        "third_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::Third
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
                Ok(transitive_dependency(r, &deps.fds))
            })?);
        }
        Ok(filter_redundant(out))
    }
}

/// First FD whose determinant lives in `relation`, reaches outside the key,
/// and fixes some non-key attribute.
fn transitive_dependency(relation: &Relation, fds: &[FunctionalDependency]) -> Option<Carve> {
    fds.iter().find_map(|fd| {
        let det = &fd.determinant;
        if det.is_empty()
            || !relation.contains_all(det)
            || det.iter().all(|a| relation.is_key(a))
            || relation.key().is_subset(det)
        {
            return None;
        }
        let moved = attributes_where(relation, |a| {
            fd.dependent.contains(a) && !relation.is_key(a) && !det.contains(a)
        });
        Carve::proper(relation, det.clone(), moved, None)
    })
}
