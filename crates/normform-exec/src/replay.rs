//! Deterministic replay & provenance helpers.
//!
//! The input digest covers every source relation, the optimized dependency
//! set, the stage chain, and the config. The output digest covers every
//! produced relation in output order. Identical inputs give identical
//! digests, which is what the manifest records.

use normform_core::hash::{hash_relation, hash_serde, hash_str, Hash256};
use normform_core::prelude::Relation;
use normform_planner::NormalizationPlan;

use crate::runtime::ExecError;

pub fn hash_inputs(plan: &NormalizationPlan) -> Result<Hash256, ExecError> {
    let deps = hash_serde(&plan.deps).map_err(|e| ExecError::Hash(e.to_string()))?;
    let cfg = hash_serde(&plan.config).map_err(|e| ExecError::Hash(e.to_string()))?;
    let stages = hash_serde(&plan.stages).map_err(|e| ExecError::Hash(e.to_string()))?;

    let mut acc = deps.chain(&cfg).chain(&stages);
    for r in &plan.relations {
        acc = acc.chain(&hash_str(&r.name)).chain(&hash_relation(r));
    }
    Ok(acc)
}

pub fn hash_outputs<'a, I>(relations: I) -> Hash256
where
    I: IntoIterator<Item = &'a Relation>,
{
    relations
        .into_iter()
        .fold(hash_str("normform-output"), |acc, r| acc.chain(&hash_relation(r)))
}
