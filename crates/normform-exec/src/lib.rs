#![forbid(unsafe_code)]
//! normform-exec: runtime, worker pool, deterministic replay, and metrics.
//!
//! The runtime resolves a plan's stage chain through the operator registry
//! and runs it stage by stage over every source relation on a rayon pool. A
//! failing relation is reported in the `RunReport` without aborting the
//! others, and every run emits a `RunManifest`.

pub mod metrics;
pub mod replay;
pub mod runtime;
pub mod scheduler;

pub use runtime::{Engine, ExecError, RelationOutcome, RunReport};
