#![forbid(unsafe_code)]
//! normform-core: relation model, dependency model, and shared plumbing.
//!
//! Everything here is pure data plus small algorithms over it. Stages,
//! planning, and scheduling live in the downstream crates.

pub mod config;
pub mod dependency;
pub mod error;
pub mod form;
pub mod hash;
pub mod manifest;
pub mod prelude;
pub mod relation;
pub mod types;

/// Engine version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
