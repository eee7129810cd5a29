//! Redundancy filtering across a stage's output.

use normform_core::prelude::Relation;

/// `outer` holds everything `inner` says: `inner`'s key is inside `outer`'s
/// key and every non-key attribute of `inner` is an attribute of `outer`.
fn covers(outer: &Relation, inner: &Relation) -> bool {
    inner.key().is_subset(outer.key())
        && inner.non_key_attributes().all(|a| outer.has_attribute(a))
}

/// Drop every relation covered by another relation in the list.
///
/// When two relations cover each other the earlier one survives.
pub fn filter_redundant(relations: Vec<Relation>) -> Vec<Relation> {
    let keep = redundancy_mask(&relations);
    relations
        .into_iter()
        .zip(keep)
        .filter_map(|(r, k)| k.then_some(r))
        .collect()
}

/// `filter_redundant` as a mask: `true` marks a relation that survives.
pub fn redundancy_mask(relations: &[Relation]) -> Vec<bool> {
    let n = relations.len();
    let mut keep = vec![true; n];

    for i in 0..n {
        for j in 0..n {
            if i == j || !keep[j] {
                continue;
            }
            let (candidate, other) = (&relations[i], &relations[j]);
            if covers(other, candidate) && (j < i || !covers(candidate, other)) {
                tracing::debug!(dropped = %candidate.name, kept = %other.name, "redundant relation");
                keep[i] = false;
                break;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use normform_core::prelude::attr_set;

    fn empty(name: &str, attrs: &[&str], key: &[&str]) -> Relation {
        Relation::new(name, attrs.iter().copied(), attr_set(key.iter().copied())).unwrap()
    }

    #[test]
    fn drops_relation_contained_in_another() {
        let out = filter_redundant(vec![
            empty("wide", &["a", "b", "c"], &["a", "b"]),
            empty("narrow", &["a", "c"], &["a"]),
            empty("other", &["d", "e"], &["d"]),
        ]);
        let names: Vec<_> = out.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["wide", "other"]);
    }

    #[test]
    fn identical_relations_collapse_to_the_first() {
        let out = filter_redundant(vec![
            empty("first", &["a", "b"], &["a"]),
            empty("second", &["a", "b"], &["a"]),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "first");
    }

    #[test]
    fn wider_key_is_not_covered_by_narrower() {
        let out = filter_redundant(vec![
            empty("link", &["course", "student"], &["course", "student"]),
            empty("names", &["student", "name"], &["student"]),
        ]);
        assert_eq!(out.len(), 2);
    }
}
