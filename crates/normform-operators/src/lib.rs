#![forbid(unsafe_code)]
//! normform-operators: relational primitives and the normal-form stages.
//!
//! Design intent:
//! - Pure and synchronous; every stage owns its input and returns a fresh
//!   collection, so no stage can observe another's in-progress mutation.
//! - Shared primitives (power set, bipartitions, natural join, redundancy
//!   filtering) live at the crate root; stage logic lives under `stages`.

pub mod combinatorics;
pub mod join;
pub mod redundancy;
pub mod registry;
pub mod stages;
pub mod traits;

pub use combinatorics::{bipartitions, power_set};
pub use join::natural_join;
pub use redundancy::{filter_redundant, redundancy_mask};
pub use registry::Registry;
pub use stages::fifth::{best_join_decomposition, search_space, JoinDecomposition};
pub use traits::Stage;
