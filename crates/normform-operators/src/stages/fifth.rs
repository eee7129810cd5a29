//! 5NF: lossless two-way join decomposition.
//!
//! For a relation over attributes `U`, every non-empty common set `C ⊆ U`
//! leaving at least two attributes is tried against every split `(A, B)` of
//! `U - C`. Parts sharing no attribute would only be a cross product, so
//! `C = ∅` is never a candidate.
//! `R1 = π(C ∪ A)` and `R2 = π(C ∪ B)` are a candidate when their natural
//! join gives back exactly the original tuples. The cheapest lossless
//! candidate by footprint replaces the relation when it is no more expensive,
//! and both parts are searched again.
//!
//! The search visits `(3ⁿ - 1) / 2 - (2ⁿ - 1) - (2ⁿ⁻¹ - 1)` candidates for `n`
//! attributes
//! and runs an `O(rows²)` join for each one that is not already beaten on
//! cost, so it is gated by `max_join_attributes`.

use std::collections::VecDeque;

use normform_core::prelude::{
    DependencySet, Error, NormalForm, NormalizeConfig, Relation, Result, Tuple,
};

use crate::combinatorics::{bipartitions, power_set};
use crate::join::natural_join;
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct FifthNormalForm;

impl Stage for FifthNormalForm {
    fn name(&self) -> &'static str {
        "fifth_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::Fifth
    }

    fn apply(
        &self,
        relations: Vec<Relation>,
        _deps: &DependencySet,
        cfg: &NormalizeConfig,
    ) -> Result<Vec<Relation>> {
        let mut out = Vec::with_capacity(relations.len());
        for relation in relations {
            out.extend(decompose(relation, cfg.max_join_attributes)?);
        }
        Ok(out)
    }
}

/// A candidate split of one relation into two projections.
#[derive(Debug, Clone)]
pub struct JoinDecomposition {
    pub left: Relation,
    pub right: Relation,
    /// `footprint(left) + footprint(right)`.
    pub cost: usize,
}

impl JoinDecomposition {
    /// Project `relation` onto `common ∪ a` and `common ∪ b`.
    ///
    /// Each part keeps the original key when it holds all of it and is keyed
    /// on every attribute otherwise.
    pub fn new(relation: &Relation, common: &[String], a: &[String], b: &[String]) -> Result<Self> {
        if a.is_empty() || b.is_empty() {
            return Err(Error::EmptyPartition);
        }
        let left = part(relation, common, a)?;
        let right = part(relation, common, b)?;
        let cost = left.footprint() + right.footprint();
        Ok(Self { left, right, cost })
    }

    /// True when joining the parts reproduces `relation` exactly: same
    /// cardinality, and every joined tuple is an original tuple.
    pub fn is_lossless(&self, relation: &Relation) -> Result<bool> {
        let joined = natural_join(&self.left, &self.right)?;
        if joined.num_rows() != relation.num_rows() {
            return Ok(false);
        }
        let original: Vec<Tuple> = relation.tuples().collect();
        let lossless = joined.tuples().all(|t| original.contains(&t));
        Ok(lossless)
    }
}

fn part(relation: &Relation, common: &[String], exclusive: &[String]) -> Result<Relation> {
    let attrs: Vec<String> = relation
        .attributes()
        .filter(|a| common.iter().chain(exclusive).any(|c| c.as_str() == *a))
        .map(str::to_string)
        .collect();

    let mut projected = relation.project(&attrs)?;
    if !relation.key().is_empty() && projected.contains_all(relation.key()) {
        projected.set_key(relation.key().clone())?;
    }
    projected.name = format!("{}_{}", relation.name, exclusive.join("_"));
    Ok(projected)
}

/// Cheapest lossless two-way decomposition of `relation`, if any exists.
/// Ties go to the first candidate found.
pub fn best_join_decomposition(relation: &Relation) -> Result<Option<JoinDecomposition>> {
    let attrs: Vec<String> = relation.attributes().map(str::to_string).collect();
    let mut best: Option<JoinDecomposition> = None;

    for common in power_set(&attrs) {
        if common.is_empty() {
            continue;
        }
        let rest: Vec<String> = attrs
            .iter()
            .filter(|a| !common.contains(*a))
            .cloned()
            .collect();
        if rest.len() < 2 {
            continue;
        }
        for (a, b) in bipartitions(&rest) {
            let candidate = JoinDecomposition::new(relation, &common, &a, &b)?;
            if best.as_ref().is_some_and(|cur| candidate.cost >= cur.cost) {
                continue;
            }
            if candidate.is_lossless(relation)? {
                best = Some(candidate);
            }
        }
    }
    Ok(best)
}

/// Number of candidates the search visits for a relation with `attributes`
/// attributes. Saturates at `u128::MAX`.
pub fn search_space(attributes: usize) -> u128 {
    if attributes == 0 {
        return 0;
    }
    let n = u32::try_from(attributes).unwrap_or(u32::MAX);
    let threes = 3u128.saturating_pow(n);
    if threes == u128::MAX {
        return u128::MAX;
    }
    // 2ⁿ < 3ⁿ, so this cannot overflow.
    let twos = 2u128.pow(n);
    ((threes - 1) / 2)
        .saturating_sub(twos - 1)
        .saturating_sub(twos / 2 - 1)
}

fn decompose(relation: Relation, max_attributes: usize) -> Result<Vec<Relation>> {
    let mut queue = VecDeque::from([relation]);
    let mut done = Vec::new();

    while let Some(current) = queue.pop_front() {
        if current.num_attributes() > max_attributes {
            tracing::warn!(
                relation = %current.name,
                attributes = current.num_attributes(),
                limit = max_attributes,
                "skipping join decomposition search"
            );
            done.push(current);
            continue;
        }
        if current.is_empty() {
            done.push(current);
            continue;
        }

        match best_join_decomposition(&current)? {
            Some(split) if split.cost <= current.footprint() => {
                tracing::debug!(
                    source = %current.name,
                    left = %split.left.name,
                    right = %split.right.name,
                    cost = split.cost,
                    footprint = current.footprint(),
                    "join decomposition"
                );
                queue.push_back(split.left);
                queue.push_back(split.right);
            }
            _ => done.push(current),
        }
    }
    Ok(done)
}
