//! Sizing of the 5NF join search.
//!
//! The stages before 5NF run in time polynomial in rows and dependencies.
//! The join search enumerates `(3ⁿ - 1) / 2 - (2ⁿ - 1) - (2ⁿ⁻¹ - 1)`
//! candidates for `n` attributes, so `explain` reports that figure per source relation along
//! with whether the configured bound skips the search.

use serde::Serialize;

use normform_core::prelude::Relation;
use normform_operators::search_space;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEstimate {
    pub relation: String,
    pub attributes: usize,
    pub rows: usize,
    /// Candidate decompositions the search would visit.
    pub candidates: u128,
    /// True when the relation exceeds `max_join_attributes`.
    pub skipped: bool,
}

/// Estimate the join search for each relation as given. Decomposition by the
/// earlier stages only shrinks relations, so this is an upper bound.
pub fn estimate_join_search(relations: &[Relation], max_join_attributes: usize) -> Vec<SearchEstimate> {
    relations
        .iter()
        .map(|r| SearchEstimate {
            relation: r.name.clone(),
            attributes: r.num_attributes(),
            rows: r.num_rows(),
            candidates: search_space(r.num_attributes()),
            skipped: r.num_attributes() > max_join_attributes,
        })
        .collect()
}
