//! 1NF: eliminate set-valued attributes.
//!
//! Each non-key attribute holding at least one set becomes its own relation
//! over `key ∪ {attribute}` with one row per set element. A scalar found in a
//! set-valued column counts as a singleton; an empty set contributes no rows.
//! A relation arriving without a key is keyed on its scalar attributes first.

use normform_core::prelude::{
    AttrSet, CrunchBy, DependencySet, NormalForm, NormalizeConfig, Relation, Result, Tuple, Value,
};

use crate::stages::attributes_where;
use crate::traits::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct FirstNormalForm;

impl Stage for FirstNormalForm {
    fn name(&self) -> &'static str {
        "first_normal_form"
    }

    fn form(&self) -> NormalForm {
        NormalForm::First
    }

    fn apply(
        &self,
        relations: Vec<Relation>,
        _deps: &DependencySet,
        _cfg: &NormalizeConfig,
    ) -> Result<Vec<Relation>> {
        let mut out = Vec::with_capacity(relations.len());
        for relation in relations {
            out.extend(flatten(relation)?);
        }
        Ok(out)
    }
}

fn is_set_valued(relation: &Relation, attribute: &str) -> bool {
    relation
        .column(attribute)
        .is_some_and(|c| c.values.iter().any(Value::is_set))
}

fn flatten(mut table: Relation) -> Result<Vec<Relation>> {
    if table.key().is_empty() {
        let scalar_key: AttrSet = attributes_where(&table, |a| !is_set_valued(&table, a))
            .into_iter()
            .collect();
        table.set_key(scalar_key)?;
    }

    let set_attrs = attributes_where(&table, |a| is_set_valued(&table, a) && !table.is_key(a));
    let mut carved_out = Vec::with_capacity(set_attrs.len());

    for attr in set_attrs {
        let key = table.key().clone();
        let mut attrs = attributes_where(&table, |a| key.contains(a));
        attrs.push(attr.clone());
        let mut carved_key = key.clone();
        carved_key.insert(attr.clone());

        let mut carved = Relation::new(format!("{}_{attr}", table.name), attrs, carved_key)?
            .with_origin(table.origin);

        for row in 0..table.num_rows() {
            let Some(tuple) = table.get(row) else {
                continue;
            };
            let base: Tuple = tuple
                .iter()
                .filter(|(name, _)| key.contains(*name))
                .map(|(name, v)| (name.clone(), v.clone()))
                .collect();
            let expanded = tuple[attr.as_str()].elements().into_iter().map(|element| {
                let mut t = base.clone();
                t.insert(attr.clone(), Value::Scalar(element));
                t
            });
            carved.insert(expanded)?;
        }
        carved.crunch(CrunchBy::Key);

        tracing::debug!(
            source = %table.name,
            attribute = %attr,
            rows = carved.num_rows(),
            "flattened set-valued attribute"
        );
        table.remove_attribute(&attr);
        carved_out.push(carved);
    }

    table.crunch(CrunchBy::All);

    let mut out = Vec::with_capacity(carved_out.len() + 1);
    if table.num_attributes() > 0 {
        out.push(table);
    }
    out.extend(carved_out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_util::{assert_keys_hold, names, rel};
    use normform_core::prelude::{attr_set, Scalar};

    fn run(relations: Vec<Relation>) -> Vec<Relation> {
        FirstNormalForm
            .apply(relations, &DependencySet::default(), &NormalizeConfig::default())
            .unwrap()
    }

    #[test]
    fn splits_tags_into_own_relation() {
        let raw = rel(
            "items",
            &["id", "tags"],
            &["id"],
            vec![vec![
                1i64.into(),
                Value::Set(vec![Scalar::from("a"), Scalar::from("b")]),
            ]],
        );
        let out = run(vec![raw]);

        assert_eq!(names(&out), vec![vec!["id"], vec!["id", "tags"]]);
        assert_eq!(out[0].num_rows(), 1);
        let tags = &out[1];
        assert_eq!(tags.key(), &attr_set(["id", "tags"]));
        assert_eq!(tags.num_rows(), 2);
        assert_eq!(tags.value(0, "tags"), Some(&Value::from("a")));
        assert_eq!(tags.value(1, "tags"), Some(&Value::from("b")));
        assert_eq!(tags.value(1, "id"), Some(&Value::from(1i64)));
        assert_keys_hold(&out);
    }

    #[test]
    fn scalars_in_set_columns_are_singletons_and_empty_sets_vanish() {
        let raw = rel(
            "items",
            &["id", "tags"],
            &["id"],
            vec![
                vec![1i64.into(), "solo".into()],
                vec![2i64.into(), Value::Set(vec![])],
                vec![3i64.into(), Value::Set(vec![Scalar::from("x"), Scalar::from("x")])],
            ],
        );
        let out = run(vec![raw]);
        let tags = &out[1];
        assert_eq!(tags.num_rows(), 2);
        assert_eq!(tags.value(0, "tags"), Some(&Value::from("solo")));
        assert_eq!(tags.value(1, "id"), Some(&Value::from(3i64)));
    }

    #[test]
    fn keyless_relation_is_keyed_on_scalars() {
        let raw = rel(
            "r",
            &["name", "phones"],
            &[],
            vec![vec!["ann".into(), Value::Set(vec![Scalar::I64(1), Scalar::I64(2)])]],
        );
        let out = run(vec![raw]);
        assert_eq!(out[0].key(), &attr_set(["name"]));
        assert_eq!(out[1].key(), &attr_set(["name", "phones"]));
        assert_eq!(out[1].num_rows(), 2);
    }

    #[test]
    fn already_flat_relations_pass_through() {
        let flat = rel("flat", &["a", "b"], &["a"], vec![vec![1i64.into(), 2i64.into()]]);
        let out = run(vec![flat.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(names(&out), names(&[flat]));
    }
}
