//! End-to-end integration tests: document → plan → engine → relations.


use normform_core::prelude::{attr_set, Error, NormalForm, NormalizeConfig, Value};
use normform_exec::{Engine, ExecError};
use normform_operators::natural_join;
use normform_planner::{build_plan, parse_document, PlanError, RelationDef};
use test_data_gen::{
    assert_keys_hold, attribute_lists, normalize, plan_document, run_plan, same_tuples,
    staff_document, EMPLOYEES, ENROLLMENT, ENROLLMENT_AND_GRADES, ITEMS, OFFERINGS,
};

#[test]
fn test_first_normal_form_splits_set_valued_attributes() {
    let report = normalize(ITEMS);
    assert!(report.is_success());
    let out = report.into_relations();

    assert_eq!(attribute_lists(&out), vec![vec!["id"], vec!["id", "tags"]]);
    assert_eq!(out[0].num_rows(), 2);

    let tags = &out[1];
    assert_eq!(tags.name, "items_tags");
    assert_eq!(tags.key(), &attr_set(["id", "tags"]));
    assert_eq!(tags.num_rows(), 2);
    assert_eq!(tags.value(0, "tags"), Some(&Value::from("a")));
    assert_eq!(tags.value(1, "tags"), Some(&Value::from("b")));
    assert!(out.iter().all(|r| r.columns().iter().all(|c| !c.values.iter().any(Value::is_set))));
    assert_keys_hold(&out);
}

#[test]
fn test_second_normal_form_removes_partial_dependency() {
    let out = normalize(ENROLLMENT).into_relations();

    assert_eq!(
        attribute_lists(&out),
        vec![vec!["course", "student"], vec!["student", "student_name"]]
    );
    let names = &out[1];
    assert_eq!(names.name, "enrollment_student");
    assert_eq!(names.key(), &attr_set(["student"]));
    assert_eq!(names.num_rows(), 2);
    assert_eq!(out[0].num_rows(), 3);
    assert_keys_hold(&out);
}

#[test]
fn test_third_normal_form_removes_transitive_dependency() {
    let out = normalize(EMPLOYEES).into_relations();

    assert_eq!(
        attribute_lists(&out),
        vec![vec!["emp", "dept"], vec!["dept", "floor", "manager"]]
    );
    assert_eq!(out[1].key(), &attr_set(["dept"]));
    assert_eq!(out[1].num_rows(), 2);
    assert_keys_hold(&out);
}

#[test]
fn test_boyce_codd_target_skips_third_normal_form() {
    let plan = plan_document(&EMPLOYEES.replace("target: 3NF", "target: BCNF"));
    assert_eq!(
        plan.stages,
        vec![NormalForm::First, NormalForm::Second, NormalForm::BoyceCodd]
    );
    let out = run_plan(&plan).into_relations();
    assert_eq!(out.len(), 2);
    assert_keys_hold(&out);
}

#[test]
fn test_fourth_normal_form_runs_the_full_chain() {
    let plan = plan_document(OFFERINGS);
    assert_eq!(
        plan.stages,
        vec![
            NormalForm::First,
            NormalForm::Second,
            NormalForm::BoyceCodd,
            NormalForm::Fourth
        ]
    );
    let original = plan.relations[0].clone();
    let out = run_plan(&plan).into_relations();

    assert_eq!(
        attribute_lists(&out),
        vec![vec!["course", "book"], vec!["course", "teacher", "office"]]
    );
    assert_eq!(out[0].num_rows(), 2);
    assert_eq!(out[1].num_rows(), 2);
    assert_keys_hold(&out);

    let joined = natural_join(&out[0], &out[1]).unwrap();
    assert_eq!(joined.num_rows(), 4);
    assert!(same_tuples(&joined, &original));
}

#[test]
fn test_relations_carved_from_different_sources_are_deduplicated() {
    let report = normalize(ENROLLMENT_AND_GRADES);
    assert!(report.is_success());

    let per_source: Vec<usize> = report
        .outcomes
        .iter()
        .map(|o| o.result.as_ref().map_or(0, Vec::len))
        .collect();
    assert_eq!(per_source, vec![2, 1]);

    let out = report.into_relations();
    assert_eq!(
        attribute_lists(&out),
        vec![
            vec!["course", "student"],
            vec!["student", "student_name"],
            vec!["exam", "student"]
        ]
    );
    assert_eq!(out[1].name, "enrollment_student");
    assert_eq!(out[1].num_rows(), 2);
    assert_keys_hold(&out);
}

#[test]
fn test_fifth_normal_form_split_is_lossless() {
    let plan = plan_document(&staff_document("5NF"));
    let original = plan.relations[0].clone();
    let out = run_plan(&plan).into_relations();

    assert_eq!(
        attribute_lists(&out),
        vec![vec!["emp", "skill"], vec!["emp", "lang"]]
    );
    assert_keys_hold(&out);

    let joined = natural_join(&out[0], &out[1]).unwrap();
    assert!(same_tuples(&joined, &original));

    let footprint: usize = out.iter().map(|r| r.footprint()).sum();
    assert!(footprint <= original.footprint());
}

#[test]
fn test_fifth_normal_form_respects_attribute_bound() {
    let parsed = parse_document(&staff_document("5NF")).unwrap();
    let cfg = NormalizeConfig {
        max_join_attributes: 2,
        ..NormalizeConfig::default()
    };
    let plan = build_plan(parsed.relations, parsed.deps, cfg).unwrap();
    let out = run_plan(&plan).into_relations();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].num_rows(), 6);

    let search = plan.explain().join_search.unwrap();
    assert!(search[0].skipped);
}

#[test]
fn test_normalizing_twice_changes_nothing() {
    let plan = plan_document(EMPLOYEES);
    let first = run_plan(&plan);

    let again = build_plan(
        first.relations().cloned().collect(),
        plan.deps.clone(),
        plan.config.clone(),
    )
    .unwrap();
    let second = run_plan(&again);

    assert_eq!(first.manifest.output_hash, second.manifest.output_hash);
}

#[test]
fn test_fifth_normal_form_is_idempotent() {
    let plan = plan_document(&staff_document("5NF"));
    let first = run_plan(&plan).into_relations();

    let again = build_plan(first.clone(), plan.deps.clone(), plan.config.clone()).unwrap();
    let second = run_plan(&again).into_relations();

    assert_eq!(attribute_lists(&first), attribute_lists(&second));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.key(), b.key());
        assert!(same_tuples(a, b));
    }
}

#[test]
fn test_no_output_relation_is_contained_in_another() {
    let out = normalize(ENROLLMENT).into_relations();
    for (i, a) in out.iter().enumerate() {
        for (j, b) in out.iter().enumerate() {
            if i != j {
                assert!(
                    !a.attribute_set().is_subset(&b.attribute_set()),
                    "{} is redundant with {}",
                    a.name,
                    b.name
                );
            }
        }
    }
}

#[test]
fn test_strict_mode_rejects_unknown_attributes() {
    let doc = ENROLLMENT.replace("dependent: [student_name]", "dependent: [grade]");
    let parsed = parse_document(&doc).unwrap();

    let lenient = build_plan(
        parsed.relations.clone(),
        parsed.deps.clone(),
        NormalizeConfig::default(),
    )
    .unwrap();
    assert_eq!(lenient.warnings.len(), 1);

    let strict = NormalizeConfig {
        strict_dependencies: true,
        ..NormalizeConfig::default()
    };
    let err = build_plan(parsed.relations, parsed.deps, strict).unwrap_err();
    assert!(matches!(
        err,
        PlanError::Core(Error::MalformedDependency { .. })
    ));
}

#[test]
fn test_cyclic_dependencies_are_reported_per_relation() {
    let doc = r#"
config: { target: 2NF }
relations:
  - name: looped
    key: [k, x]
    attributes: [k, x, a, b]
    rows:
      - [1, 1, 2, 3]
  - name: plain
    key: [id]
    attributes: [id, v]
    rows:
      - [1, 2]
fds:
  - { determinant: [a], dependent: [b] }
  - { determinant: [b], dependent: [a] }
"#;
    let report = normalize(doc);
    assert!(!report.is_success());
    assert_eq!(report.manifest.failures, 2);
    assert!(report.manifest.output_hash.is_some());

    let sources: Vec<&str> = report.failures().map(|(source, _)| source).collect();
    assert_eq!(sources, vec!["looped", "plain"]);
    assert!(report.failures().all(|(_, e)| matches!(
        e,
        ExecError::Stage {
            source: Error::CyclicDependency { .. },
            ..
        }
    )));

    // 1NF never resolves dependencies, so the same document flattens fine.
    let flat = normalize(&doc.replace("target: 2NF", "target: 1NF"));
    assert!(flat.is_success());
    assert_eq!(flat.relations().count(), 2);
}

#[test]
fn test_manifest_is_reproducible() {
    let plan = plan_document(ENROLLMENT);
    let engine = Engine::new(&plan.config).unwrap();
    let a = engine.run(&plan).unwrap();
    let b = engine.run(&plan).unwrap();

    assert_eq!(a.manifest.input_hash, b.manifest.input_hash);
    assert_eq!(a.manifest.output_hash, b.manifest.output_hash);
    assert_eq!(a.manifest.target, NormalForm::Second);
    assert!(a.manifest.finished_ms >= a.manifest.started_ms);

    let other = plan_document(&ENROLLMENT.replace("target: 2NF", "target: 3NF"));
    let c = engine.run(&other).unwrap();
    assert_ne!(a.manifest.input_hash, c.manifest.input_hash);
}

#[test]
fn test_output_documents_can_be_normalized_again() {
    let out = normalize(ENROLLMENT).into_relations();
    let defs: Vec<RelationDef> = out.iter().map(RelationDef::from).collect();
    let json = serde_json::json!({
        "config": { "target": "2NF" },
        "relations": defs,
        "fds": [{ "determinant": ["student"], "dependent": ["student_name"] }],
    })
    .to_string();

    let reparsed = parse_document(&json).unwrap();
    assert_eq!(reparsed.relations.len(), out.len());
    for (a, b) in reparsed.relations.iter().zip(&out) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.key(), b.key());
        assert!(same_tuples(a, b));
    }

    let rerun = normalize(&json).into_relations();
    assert_eq!(attribute_lists(&rerun), attribute_lists(&out));
}
