//! A validated, lowered normalization plan.

use serde::Serialize;

use normform_core::prelude::{DependencySet, NormalForm, NormalizeConfig, Relation};

use crate::cost::{estimate_join_search, SearchEstimate};
use crate::error::PlanError;
use crate::lower::stage_chain;
use crate::rules::optimize;
use crate::validate::{enforce, validate_dependencies, DependencyWarning};

/// Everything the engine needs for one run.
#[derive(Debug, Clone)]
pub struct NormalizationPlan {
    pub config: NormalizeConfig,
    /// Stages to run, in order.
    pub stages: Vec<NormalForm>,
    pub relations: Vec<Relation>,
    /// Dependencies after `rules::optimize`.
    pub deps: DependencySet,
    pub warnings: Vec<DependencyWarning>,
}

/// Validate config and dependencies, rewrite the dependency set, and lower
/// the target into a stage chain.
pub fn build_plan(
    relations: Vec<Relation>,
    deps: DependencySet,
    config: NormalizeConfig,
) -> Result<NormalizationPlan, PlanError> {
    config.validate()?;

    let warnings = validate_dependencies(&relations, &deps);
    enforce(&warnings, config.strict_dependencies)?;

    let deps = optimize(deps, &config);
    let stages = stage_chain(config.target);
    tracing::debug!(
        target = %config.target,
        stages = stages.len(),
        relations = relations.len(),
        fds = deps.fds.len(),
        mvds = deps.mvds.len(),
        "built normalization plan"
    );

    Ok(NormalizationPlan {
        config,
        stages,
        relations,
        deps,
        warnings,
    })
}

/// Serializable summary printed by `explain`.
#[derive(Debug, Clone, Serialize)]
pub struct Explain {
    pub target: NormalForm,
    pub stages: Vec<NormalForm>,
    pub relations: usize,
    pub fds: Vec<String>,
    pub mvds: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_search: Option<Vec<SearchEstimate>>,
}

impl NormalizationPlan {
    pub fn explain(&self) -> Explain {
        let join_search = self
            .stages
            .contains(&NormalForm::Fifth)
            .then(|| estimate_join_search(&self.relations, self.config.max_join_attributes));
        Explain {
            target: self.config.target,
            stages: self.stages.clone(),
            relations: self.relations.len(),
            fds: self.deps.fds.iter().map(ToString::to_string).collect(),
            mvds: self.deps.mvds.iter().map(ToString::to_string).collect(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
            join_search,
        }
    }
}
