#![forbid(unsafe_code)]
//! normform-planner: input document → validated dependencies → stage chain.
//!
//! Design:
//! - The document format (YAML, or JSON as a YAML subset) is parsed into
//!   `normform-core` relations and dependencies by `dsl::yaml`.
//! - `validate` flags dependencies that mention attributes no relation has.
//! - `rules` rewrites the dependency set (drop trivial, canonical order).
//! - `lower` turns a target normal form into the ordered stage chain that
//!   exec resolves through `normform-operators::Registry`.
//! - `cost` sizes the 5NF join search for `explain`.
//!
//! NOTE: no threads or scheduling here; exec owns that.

pub mod cost;
pub mod dsl;
pub mod error;
pub mod lower;
pub mod plan;
pub mod rules;
pub mod validate;

pub use cost::{estimate_join_search, SearchEstimate};
pub use dsl::yaml::{parse_document, DocumentConfig, ParsedDocument, RelationDef};
pub use error::PlanError;
pub use lower::stage_chain;
pub use plan::{build_plan, Explain, NormalizationPlan};
pub use validate::{enforce, validate_dependencies, DependencyWarning};
