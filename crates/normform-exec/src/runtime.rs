//! Runtime: run a `NormalizationPlan` and emit a `RunReport`.
//!
//! Behavior:
//! - Resolves the plan's stage chain through `normform-operators::Registry`.
//! - Runs the chain stage by stage over the whole collection. Inside a stage
//!   each relation is applied on its own on the worker pool, then the merged
//!   output is filtered for redundancy when the stage asks for it.
//! - Tags every relation with the source it came from so outcomes are
//!   reported per source in input order; one failure never aborts the batch.
//! - Emits a `RunManifest` with stable input and output hashes.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use normform_core::prelude::{DependencySet, NormalizeConfig, Relation, RunManifest};
use normform_operators::{redundancy_mask, Registry, Stage};
use normform_planner::NormalizationPlan;

use crate::metrics::emit_span;
use crate::replay::{hash_inputs, hash_outputs};
use crate::scheduler::WorkerPool;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("stage registry: {0}")]
    Registry(String),

    #[error("relation '{relation}': {source}")]
    Stage {
        relation: String,
        #[source]
        source: normform_core::error::Error,
    },

    #[error("worker pool: {0}")]
    Pool(String),

    #[error("hashing error: {0}")]
    Hash(String),
}

/// Result of normalizing one source relation.
#[derive(Debug)]
pub struct RelationOutcome {
    pub source: String,
    pub result: Result<Vec<Relation>, ExecError>,
}

#[derive(Debug)]
pub struct RunReport {
    pub manifest: RunManifest,
    pub outcomes: Vec<RelationOutcome>,
}

impl RunReport {
    /// Every relation produced by a successful source, in output order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ExecError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.source.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Consume the report, keeping only the produced relations.
    pub fn into_relations(self) -> Vec<Relation> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .flatten()
            .collect()
    }
}

/// Engine owns the stage registry and the worker pool.
#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    pool: WorkerPool,
}

impl Engine {
    pub fn new(cfg: &NormalizeConfig) -> Result<Self, ExecError> {
        Self::with_registry(cfg, Registry::new())
    }

    pub fn with_registry(cfg: &NormalizeConfig, registry: Registry) -> Result<Self, ExecError> {
        Ok(Self {
            registry,
            pool: WorkerPool::try_new(cfg.max_parallel_tasks)?,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute `plan` and return per-relation outcomes plus a manifest.
    pub fn run(&self, plan: &NormalizationPlan) -> Result<RunReport, ExecError> {
        let started = now_millis();
        let input_hash = hash_inputs(plan)?;
        let manifest = RunManifest::new(input_hash, plan.config.target, started);

        let stages = plan
            .stages
            .iter()
            .map(|form| {
                self.registry
                    .make(*form)
                    .ok_or_else(|| ExecError::Registry(format!("no stage registered for {form}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outcomes = self.run_chain(plan.relations.clone(), &stages, &plan.deps, &plan.config);

        let failures = outcomes.iter().filter(|o| o.result.is_err()).count();
        let output_hash = hash_outputs(
            outcomes
                .iter()
                .filter_map(|o| o.result.as_ref().ok())
                .flatten(),
        );
        let manifest = manifest.finish(now_millis(), Some(output_hash), failures);

        emit_span(
            "run",
            &[
                ("target", plan.config.target.to_string()),
                ("sources", outcomes.len().to_string()),
                ("failures", failures.to_string()),
                ("duration_ms", manifest.duration_ms().to_string()),
            ],
        );

        Ok(RunReport { manifest, outcomes })
    }

    /// Push `relations` through `stages` in order, one outcome per source.
    ///
    /// A source whose relation fails a stage is dropped from later stages.
    pub fn run_chain(
        &self,
        relations: Vec<Relation>,
        stages: &[Arc<dyn Stage>],
        deps: &DependencySet,
        cfg: &NormalizeConfig,
    ) -> Vec<RelationOutcome> {
        let sources: Vec<String> = relations.iter().map(|r| r.name.clone()).collect();
        let mut failed: Vec<Option<ExecError>> = sources.iter().map(|_| None).collect();
        let mut current: Vec<(usize, Relation)> = relations.into_iter().enumerate().collect();

        for stage in stages {
            let results = self.pool.map_ordered(current, |(source, relation)| {
                (source, stage.apply(vec![relation], deps, cfg))
            });

            let mut next = Vec::with_capacity(results.len());
            for (source, result) in results {
                match result {
                    Ok(out) => next.extend(out.into_iter().map(|r| (source, r))),
                    Err(e) => {
                        if failed[source].is_none() {
                            failed[source] = Some(ExecError::Stage {
                                relation: sources[source].clone(),
                                source: e,
                            });
                        }
                    }
                }
            }
            next.retain(|(source, _)| failed[*source].is_none());
            if stage.filters_redundant() {
                next = drop_redundant(next);
            }

            emit_span(
                "stage",
                &[
                    ("stage", stage.name().to_string()),
                    ("outputs", next.len().to_string()),
                ],
            );
            current = next;
        }

        let mut produced: Vec<Vec<Relation>> = sources.iter().map(|_| Vec::new()).collect();
        for (source, relation) in current {
            produced[source].push(relation);
        }

        sources
            .into_iter()
            .zip(failed)
            .zip(produced)
            .map(|((source, error), relations)| RelationOutcome {
                source,
                result: match error {
                    Some(e) => Err(e),
                    None => Ok(relations),
                },
            })
            .collect()
    }
}

/// Stage-wide redundancy filter over source-tagged relations.
fn drop_redundant(tagged: Vec<(usize, Relation)>) -> Vec<(usize, Relation)> {
    let (sources, relations): (Vec<usize>, Vec<Relation>) = tagged.into_iter().unzip();
    let keep = redundancy_mask(&relations);
    sources
        .into_iter()
        .zip(relations)
        .zip(keep)
        .filter_map(|(tagged, keep)| keep.then_some(tagged))
        .collect()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use normform_core::prelude::{
        attr_set, Error, FunctionalDependency, NormalForm, Result as CoreResult,
    };
    use normform_planner::build_plan;

    fn enrollment() -> Relation {
        Relation::from_rows(
            "enrollment",
            vec!["course", "student", "student_name"],
            attr_set(["course", "student"]),
            vec![
                vec!["CS101".into(), 1i64.into(), "Alice".into()],
                vec!["CS102".into(), 1i64.into(), "Alice".into()],
            ],
        )
        .unwrap()
    }

    fn cfg(target: NormalForm) -> NormalizeConfig {
        NormalizeConfig {
            target,
            max_parallel_tasks: 2,
            ..NormalizeConfig::default()
        }
    }

    #[test]
    fn runs_chain_and_records_manifest() {
        let deps = DependencySet::new(
            vec![FunctionalDependency::new(["student"], ["student_name"])],
            vec![],
        );
        let plan = build_plan(vec![enrollment()], deps, cfg(NormalForm::Second)).unwrap();
        let engine = Engine::new(&plan.config).unwrap();
        let report = engine.run(&plan).unwrap();

        assert!(report.is_success());
        assert_eq!(report.relations().count(), 2);
        assert_eq!(report.manifest.target, NormalForm::Second);
        assert_eq!(report.manifest.failures, 0);
        assert!(report.manifest.output_hash.is_some());

        let again = engine.run(&plan).unwrap();
        assert_eq!(again.manifest.input_hash, report.manifest.input_hash);
        assert_eq!(again.manifest.output_hash, report.manifest.output_hash);
        assert_ne!(again.manifest.id, report.manifest.id);
    }

    struct Exploding;

    impl Stage for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }
        fn form(&self) -> NormalForm {
            NormalForm::First
        }
        fn apply(
            &self,
            relations: Vec<Relation>,
            _deps: &DependencySet,
            _cfg: &NormalizeConfig,
        ) -> CoreResult<Vec<Relation>> {
            if relations.iter().any(|r| r.name == "bad") {
                return Err(Error::Invariant("boom".into()));
            }
            Ok(relations)
        }
    }

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        let mut bad = enrollment();
        bad.name = "bad".into();
        let plan = build_plan(
            vec![enrollment(), bad],
            DependencySet::default(),
            cfg(NormalForm::First),
        )
        .unwrap();

        let mut registry = Registry::new();
        registry.register(Arc::new(Exploding));
        let engine = Engine::with_registry(&plan.config, registry).unwrap();
        let report = engine.run(&plan).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.manifest.failures, 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "bad");
        assert!(matches!(failures[0].1, ExecError::Stage { relation, .. } if relation == "bad"));
        assert_eq!(report.into_relations().len(), 1);
    }

    #[test]
    fn redundancy_is_filtered_across_sources() {
        let grades = Relation::from_rows(
            "grades",
            vec!["exam", "student", "student_name"],
            attr_set(["exam", "student"]),
            vec![
                vec!["midterm".into(), 1i64.into(), "Alice".into()],
                vec!["final".into(), 1i64.into(), "Alice".into()],
            ],
        )
        .unwrap();
        let deps = DependencySet::new(
            vec![FunctionalDependency::new(["student"], ["student_name"])],
            vec![],
        );
        let plan = build_plan(vec![enrollment(), grades], deps, cfg(NormalForm::Second)).unwrap();
        let report = Engine::new(&plan.config).unwrap().run(&plan).unwrap();

        assert!(report.is_success());
        let per_source: Vec<(&str, usize)> = report
            .outcomes
            .iter()
            .map(|o| (o.source.as_str(), o.result.as_ref().map_or(0, Vec::len)))
            .collect();
        assert_eq!(per_source, vec![("enrollment", 2), ("grades", 1)]);

        let names: Vec<&str> = report.relations().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["enrollment", "enrollment_student", "grades"]);
    }

    #[test]
    fn missing_stage_is_a_registry_error() {
        let plan = build_plan(
            vec![enrollment()],
            DependencySet::default(),
            cfg(NormalForm::Third),
        )
        .unwrap();
        let engine = Engine::with_registry(&plan.config, Registry::empty()).unwrap();
        assert!(matches!(engine.run(&plan), Err(ExecError::Registry(_))));
    }
}
