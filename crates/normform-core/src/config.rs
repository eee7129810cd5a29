//! Run configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::form::NormalForm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Normal form the pipeline stops at.
    pub target: NormalForm,

    /// Worker threads used to normalize independent source relations.
    pub max_parallel_tasks: usize,

    /// Relations with more attributes than this skip the 5NF join search,
    /// which enumerates roughly 3^n candidate decompositions.
    pub max_join_attributes: usize,

    /// Fail the run when a dependency names attributes no relation has,
    /// instead of only warning.
    pub strict_dependencies: bool,

    /// Sort dependencies lexicographically before every run so the output
    /// does not depend on declaration order.
    pub canonical_order: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target: NormalForm::Fifth,
            max_parallel_tasks: 4,
            max_join_attributes: 10,
            strict_dependencies: false,
            canonical_order: true,
        }
    }
}

impl NormalizeConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `NORMFORM_TARGET`: target normal form (`1NF` .. `5NF`, `BCNF`)
    /// - `NORMFORM_MAX_PARALLEL_TASKS`: worker threads
    /// - `NORMFORM_MAX_JOIN_ATTRIBUTES`: 5NF search bound
    /// - `NORMFORM_STRICT_DEPENDENCIES`: `true`/`false`
    /// - `NORMFORM_CANONICAL_ORDER`: `true`/`false`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("NORMFORM_TARGET") {
            if let Ok(v) = s.parse::<NormalForm>() {
                cfg.target = v;
            }
        }

        if let Ok(s) = std::env::var("NORMFORM_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v;
            }
        }

        if let Ok(s) = std::env::var("NORMFORM_MAX_JOIN_ATTRIBUTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_join_attributes = v;
            }
        }

        if let Ok(s) = std::env::var("NORMFORM_STRICT_DEPENDENCIES") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.strict_dependencies = v;
            }
        }

        if let Ok(s) = std::env::var("NORMFORM_CANONICAL_ORDER") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.canonical_order = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_tasks == 0 {
            return Err(Error::Config("max_parallel_tasks must be at least 1".into()));
        }
        Ok(())
    }
}
