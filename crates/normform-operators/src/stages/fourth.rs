//! 4NF: split independent multivalued facts apart.
//!
//! An MVD `X ->> Y` applies when `X` is a proper part of the key, at least two
//! attributes of `Y` are present, and something outside `X ∪ Y` remains.
//! `X ∪ Y` is carved into an all-key relation; the original keeps `X` and
//! the rest.

use normform_core::prelude::{
    AttrSet, DependencySet, MultivaluedDependency, NormalForm, NormalizeConfig, Relation, Result,
};

use crate::redundancy::filter_redundant;
use crate::stages::{attributes_where, decompose_to_fixpoint, Carve};
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct FourthNormalForm;

impl Stage for FourthNormalForm {
    fn name(&self) -> &'static str {
        "fourth_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::Fourth
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
                Ok(independent_facts(r, &deps.mvds))
            })?);
        }
        Ok(filter_redundant(out))
    }
}

fn independent_facts(relation: &Relation, mvds: &[MultivaluedDependency]) -> Option<Carve> {
    mvds.iter().find_map(|mvd| {
        let det = &mvd.determinant;
        if !relation.contains_all(det) || !det.is_subset(relation.key()) || det == relation.key() {
            return None;
        }
        let moved = attributes_where(relation, |a| mvd.dependent.contains(a) && !det.contains(a));
        if moved.len() < 2 {
            return None;
        }

        // All-key: crunching by `X` alone would keep one `Y` per `X` and lose
        // the multivalued rows.
        let carved_key: AttrSet = det.iter().chain(&moved).cloned().collect();
        let rekey = moved.iter().any(|a| relation.is_key(a)).then(|| {
            let remaining: AttrSet = relation
                .key()
                .iter()
                .filter(|k| !moved.contains(*k))
                .cloned()
                .collect();
            if remaining.is_empty() {
                relation
                    .attributes()
                    .filter(|a| !carved_key.contains(*a) || det.contains(*a))
                    .map(str::to_string)
                    .collect()
            } else {
                remaining
            }
        });
        Carve::proper(relation, carved_key, moved, rekey)
    })
}
