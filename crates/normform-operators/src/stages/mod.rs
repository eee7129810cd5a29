//! The six normal-form stages.
//!
//! 2NF, 3NF, BCNF, and 4NF share one shape: look for the first dependency
//! (in declaration order) that applies to the relation, carve
//! `key ∪ moved` out into a new relation keyed on `key`, strip `moved` from
//! the original, and repeat until nothing applies. Carved relations go back on
//! a worklist so the stage output is a fixpoint. Every carve removes at least
//! one attribute from the relation it splits, which bounds the work.

pub mod boyce_codd;
pub mod fifth;
pub mod first;
pub mod fourth;
pub mod second;
pub mod third;

use std::collections::{BTreeSet, VecDeque};

use normform_core::prelude::{AttrSet, CrunchBy, Relation, Result};

pub use boyce_codd::BoyceCoddNormalForm;
pub use fifth::FifthNormalForm;
pub use first::FirstNormalForm;
pub use fourth::FourthNormalForm;
pub use second::SecondNormalForm;
pub use third::ThirdNormalForm;

/// One decomposition step proposed by a stage.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Carve {
    /// Key of the carved relation.
    pub key: AttrSet,
    /// Attributes moved out of the original, in the original's order.
    pub moved: Vec<String>,
    /// Key the original takes after `moved` is stripped, if it changes
    /// beyond losing the moved attributes.
    pub rekey: Option<AttrSet>,
}

impl Carve {
    /// Build a carve, or `None` when it would not split `relation`: nothing
    /// moves, or `key ∪ moved` already spans every attribute.
    pub fn proper(
        relation: &Relation,
        key: AttrSet,
        moved: Vec<String>,
        rekey: Option<AttrSet>,
    ) -> Option<Carve> {
        if moved.is_empty() {
            return None;
        }
        let spans_all = relation
            .attributes()
            .all(|a| key.contains(a) || moved.iter().any(|m| m == a));
        if spans_all {
            return None;
        }
        Some(Carve { key, moved, rekey })
    }
}

/// Attributes of `relation` that `pred` accepts, in declaration order.
pub(crate) fn attributes_where<F>(relation: &Relation, mut pred: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    relation
        .attributes()
        .filter(|a| pred(a))
        .map(str::to_string)
        .collect()
}

pub(crate) fn carved_name(base: &str, key: &AttrSet) -> String {
    let parts: Vec<&str> = key.iter().map(String::as_str).collect();
    format!("{base}_{}", parts.join("_"))
}

/// Apply `carve` to `relation`: returns the carved relation and strips the
/// moved attributes from `relation` in place.
pub(crate) fn apply_carve(relation: &mut Relation, carve: &Carve) -> Result<Relation> {
    let mut attrs = attributes_where(relation, |a| carve.key.contains(a));
    attrs.extend(carve.moved.iter().cloned());

    let mut carved = relation.project(&attrs)?;
    carved.set_key(carve.key.clone())?;
    carved.crunch(CrunchBy::Key);
    carved.name = carved_name(&relation.name, &carve.key);

    for attr in &carve.moved {
        relation.remove_attribute(attr);
    }
    if let Some(rekey) = &carve.rekey {
        relation.set_key(rekey.clone())?;
    }
    relation.crunch(CrunchBy::All);

    tracing::debug!(
        source = %relation.name,
        carved = %carved.name,
        moved = ?carve.moved,
        rows = carved.num_rows(),
        "carved relation"
    );
    Ok(carved)
}

/// Run `find` on `relation` and on everything carved from it until no carve
/// applies. The stripped original comes first in the output. Names stay
/// unique: a carve whose derived name is taken gets a `_2`, `_3`, ... suffix.
pub(crate) fn decompose_to_fixpoint<F>(relation: Relation, mut find: F) -> Result<Vec<Relation>>
where
    F: FnMut(&Relation) -> Result<Option<Carve>>,
{
    let mut names = BTreeSet::from([relation.name.clone()]);
    let mut queue = VecDeque::from([relation]);
    let mut done = Vec::new();

    while let Some(mut current) = queue.pop_front() {
        while let Some(carve) = find(&current)? {
            let mut carved = apply_carve(&mut current, &carve)?;
            carved.name = unique_name(&mut names, carved.name);
            queue.push_back(carved);
        }
        done.push(current);
    }
    Ok(done)
}

fn unique_name(taken: &mut BTreeSet<String>, name: String) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use normform_core::prelude::{attr_set, Relation, Value};

    pub fn rel(name: &str, attrs: &[&str], key: &[&str], rows: Vec<Vec<Value>>) -> Relation {
        Relation::from_rows(
            name,
            attrs.to_vec(),
            attr_set(key.iter().copied()),
            rows,
        )
        .unwrap()
    }

    pub fn names(relations: &[Relation]) -> Vec<Vec<String>> {
        relations
            .iter()
            .map(|r| r.attributes().map(str::to_string).collect())
            .collect()
    }

    pub fn assert_keys_hold(relations: &[Relation]) {
        for r in relations {
            assert!(
                r.key().iter().all(|k| r.has_attribute(k)),
                "key of {} escapes its attributes",
                r.name
            );
            assert!(r.has_unique_key(), "key of {} is not unique", r.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::rel;
    use super::*;
    use normform_core::prelude::attr_set;

    #[test]
    fn carve_must_split() {
        let r = rel("r", &["a", "b"], &["a"], vec![]);
        assert!(Carve::proper(&r, attr_set(["b"]), vec!["a".into()], None).is_none());
        assert!(Carve::proper(&r, attr_set(["a"]), vec![], None).is_none());

        let r = rel("r", &["a", "b", "c"], &["a"], vec![]);
        assert!(Carve::proper(&r, attr_set(["b"]), vec!["c".into()], None).is_some());
    }

    #[test]
    fn apply_carve_strips_and_dedupes() {
        let mut r = rel(
            "emp",
            &["emp", "dept", "floor"],
            &["emp"],
            vec![
                vec!["ann".into(), "d1".into(), 1i64.into()],
                vec!["bob".into(), "d1".into(), 1i64.into()],
                vec!["cat".into(), "d2".into(), 3i64.into()],
            ],
        );
        let carve = Carve::proper(&r, attr_set(["dept"]), vec!["floor".into()], None).unwrap();
        let carved = apply_carve(&mut r, &carve).unwrap();

        assert_eq!(carved.name, "emp_dept");
        assert_eq!(carved.num_rows(), 2);
        assert_eq!(carved.key(), &attr_set(["dept"]));
        assert_eq!(r.attributes().collect::<Vec<_>>(), vec!["emp", "dept"]);
        assert_eq!(r.num_rows(), 3);
    }
}
