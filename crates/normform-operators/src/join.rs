//! Natural join.
//!
//! Rows match when they agree on every attribute name the two relations
//! share. With no shared attributes this is the cross product. Nested loops:
//! inputs are small extraction artifacts, and the 5NF search calls this on
//! projections of a single relation.

use normform_core::prelude::{AttrSet, Column, CrunchBy, Relation, Result};

/// Join `left` and `right` on their shared attributes.
///
/// Output attributes are `left`'s followed by `right`'s non-shared ones; the
/// key is every attribute and duplicate tuples are removed.
pub fn natural_join(left: &Relation, right: &Relation) -> Result<Relation> {
    let shared: Vec<(usize, usize)> = left
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(li, lc)| {
            right
                .columns()
                .iter()
                .position(|rc| rc.name == lc.name)
                .map(|ri| (li, ri))
        })
        .collect();
    let right_only: Vec<usize> = (0..right.num_attributes())
        .filter(|ri| !shared.iter().any(|(_, s)| s == ri))
        .collect();

    let mut columns: Vec<Column> = left
        .columns()
        .iter()
        .map(|c| Column::new(c.name.clone(), Vec::new()))
        .chain(
            right_only
                .iter()
                .map(|&ri| Column::new(right.columns()[ri].name.clone(), Vec::new())),
        )
        .collect();

    let l = left.columns();
    let r = right.columns();
    for lrow in 0..left.num_rows() {
        for rrow in 0..right.num_rows() {
            let matches = shared
                .iter()
                .all(|&(li, ri)| l[li].values[lrow] == r[ri].values[rrow]);
            if !matches {
                continue;
            }
            for (out, col) in columns.iter_mut().zip(l) {
                out.values.push(col.values[lrow].clone());
            }
            for (out, &ri) in columns[l.len()..].iter_mut().zip(&right_only) {
                out.values.push(r[ri].values[rrow].clone());
            }
        }
    }

    let key: AttrSet = columns.iter().map(|c| c.name.clone()).collect();
    let mut joined = Relation::from_columns(
        format!("{}_join_{}", left.name, right.name),
        columns,
        key,
    )?;
    joined.crunch(CrunchBy::All);
    Ok(joined)
}
