//! The relation (table) every stage operates on.
//!
//! Columns are kept in lock-step by row index, the same layout as a row batch:
//! one named `Column` per attribute, each holding exactly `len` values.
//! Tuples are materialized on demand and never stored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::Value;

/// Set of attribute names. Ordered so iteration (and therefore every stage) is
/// deterministic.
pub type AttrSet = BTreeSet<String>;

/// Ephemeral view of one row: attribute name to value.
pub type Tuple = BTreeMap<String, Value>;

/// Build an `AttrSet` from anything yielding string-ish names.
pub fn attr_set<I, S>(names: I) -> AttrSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where the relation was found in its source sheet. Not used by any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Origin {
    pub row: usize,
    pub col: usize,
}

/// Attribute set used when deciding whether two rows are duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrunchBy {
    /// Compare key attributes only (all attributes when the key is empty).
    Key,
    /// Compare every attribute.
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct Relation {
    pub name: String,
    pub origin: Option<Origin>,
    columns: Vec<Column>,
    len: usize,
    key: AttrSet,
}

impl Relation {
    /// Create an empty relation over `attributes`.
    pub fn new<I, S>(name: impl Into<String>, attributes: I, key: AttrSet) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = attributes
            .into_iter()
            .map(|a| Column::new(a, Vec::new()))
            .collect();
        Self::from_columns(name, columns, key)
    }

    /// Build a relation from pre-filled columns, validating the shape.
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<Column>,
        key: AttrSet,
    ) -> Result<Self> {
        let name = name.into();
        let len = columns.first().map(|c| c.len()).unwrap_or(0);

        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(Error::Schema(format!(
                    "relation '{name}': duplicate attribute '{}'",
                    col.name
                )));
            }
            if col.len() != len {
                return Err(Error::Schema(format!(
                    "relation '{name}': column '{}' has {} values, expected {len}",
                    col.name,
                    col.len()
                )));
            }
        }
        if let Some(missing) = key.iter().find(|k| !seen.contains(k.as_str())) {
            return Err(Error::Schema(format!(
                "relation '{name}': key attribute '{missing}' is not an attribute"
            )));
        }

        Ok(Self {
            name,
            origin: None,
            columns,
            len,
            key,
        })
    }

    /// Build a relation from row-major data.
    pub fn from_rows<S: Into<String>>(
        name: impl Into<String>,
        attributes: Vec<S>,
        key: AttrSet,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut columns: Vec<Column> = attributes
            .into_iter()
            .map(|a| Column::new(a, Vec::with_capacity(rows.len())))
            .collect();

        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::Schema(format!(
                    "relation '{name}': row {r} has {} cells, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }

        Self::from_columns(name, columns, key)
    }

    pub fn with_origin(mut self, origin: Option<Origin>) -> Self {
        self.origin = origin;
        self
    }

    pub fn num_rows(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_attributes(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Attribute names in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn attribute_set(&self) -> AttrSet {
        self.attributes().map(str::to_string).collect()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// True when every name in `attrs` is an attribute of this relation.
    pub fn contains_all<'a, I>(&self, attrs: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        attrs.into_iter().all(|a| self.has_attribute(a))
    }

    pub fn key(&self) -> &AttrSet {
        &self.key
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key.contains(name)
    }

    /// Replace the key. Every key attribute must exist.
    pub fn set_key(&mut self, key: AttrSet) -> Result<()> {
        if let Some(missing) = key.iter().find(|k| !self.has_attribute(k)) {
            return Err(Error::Schema(format!(
                "relation '{}': key attribute '{missing}' is not an attribute",
                self.name
            )));
        }
        self.key = key;
        Ok(())
    }

    /// Non-key attributes in declaration order.
    pub fn non_key_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes().filter(|a| !self.key.contains(*a))
    }

    pub fn value(&self, row: usize, attribute: &str) -> Option<&Value> {
        self.column(attribute)?.values.get(row)
    }

    /// Materialize row `row` as a tuple.
    pub fn get(&self, row: usize) -> Option<Tuple> {
        if row >= self.len {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values[row].clone()))
                .collect(),
        )
    }

    /// Iterate all rows as tuples.
    pub fn tuples(&self) -> impl Iterator<Item = Tuple> + '_ {
        (0..self.len).filter_map(move |r| self.get(r))
    }

    fn check_tuples(&self, tuples: &[Tuple]) -> Result<()> {
        for tuple in tuples {
            if let Some(missing) = self.attributes().find(|a| !tuple.contains_key(*a)) {
                return Err(Error::Schema(format!(
                    "relation '{}': tuple is missing attribute '{missing}'",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Append tuples. Extra entries in a tuple are ignored.
    pub fn insert<I>(&mut self, tuples: I) -> Result<()>
    where
        I: IntoIterator<Item = Tuple>,
    {
        let tuples: Vec<Tuple> = tuples.into_iter().collect();
        self.check_tuples(&tuples)?;

        for col in &mut self.columns {
            col.values
                .extend(tuples.iter().map(|t| t[col.name.as_str()].clone()));
        }
        self.len += tuples.len();
        Ok(())
    }

    /// Splice row `row` out and `tuples` in at the same position.
    pub fn replace(&mut self, row: usize, tuples: Vec<Tuple>) -> Result<()> {
        if row >= self.len {
            return Err(Error::Schema(format!(
                "relation '{}': row {row} out of range ({} rows)",
                self.name, self.len
            )));
        }
        self.check_tuples(&tuples)?;

        for col in &mut self.columns {
            let incoming: Vec<Value> = tuples
                .iter()
                .map(|t| t[col.name.as_str()].clone())
                .collect();
            col.values.splice(row..=row, incoming);
        }
        self.len = self.len - 1 + tuples.len();
        Ok(())
    }

    pub fn remove_row(&mut self, row: usize) -> Option<Tuple> {
        let tuple = self.get(row)?;
        for col in &mut self.columns {
            col.values.remove(row);
        }
        self.len -= 1;
        Some(tuple)
    }

    /// Drop a column (and its key membership). Returns the removed column.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Column> {
        let pos = self.position(name)?;
        self.key.remove(name);
        let col = self.columns.remove(pos);
        if self.columns.is_empty() {
            self.len = 0;
        }
        Some(col)
    }

    /// Append a column. `values` is moved in, so no other relation aliases it.
    pub fn add_attribute(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.has_attribute(&name) {
            return Err(Error::Schema(format!(
                "relation '{}': attribute '{name}' already exists",
                self.name
            )));
        }
        if !self.columns.is_empty() && values.len() != self.len {
            return Err(Error::Schema(format!(
                "relation '{}': column '{name}' has {} values, expected {}",
                self.name,
                values.len(),
                self.len
            )));
        }
        self.len = values.len();
        self.columns.push(Column::new(name, values));
        Ok(())
    }

    pub fn add_key_attribute(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        self.add_attribute(name.clone(), values)?;
        self.key.insert(name);
        Ok(())
    }

    /// Point mutation of one cell. Returns the previous value.
    pub fn set(&mut self, row: usize, attribute: &str, value: Value) -> Result<Value> {
        let len = self.len;
        let name = self.name.clone();
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == attribute)
            .ok_or_else(|| {
                Error::Schema(format!("relation '{name}': no attribute '{attribute}'"))
            })?;
        let slot = col.values.get_mut(row).ok_or_else(|| {
            Error::Schema(format!(
                "relation '{name}': row {row} out of range ({len} rows)"
            ))
        })?;
        Ok(std::mem::replace(slot, value))
    }

    fn comparison_positions(&self, by: CrunchBy) -> Vec<usize> {
        match by {
            CrunchBy::Key if !self.key.is_empty() => self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| self.key.contains(&c.name))
                .map(|(i, _)| i)
                .collect(),
            _ => (0..self.columns.len()).collect(),
        }
    }

    fn rows_agree(&self, a: usize, b: usize, positions: &[usize]) -> bool {
        positions
            .iter()
            .all(|&p| self.columns[p].values[a] == self.columns[p].values[b])
    }

    /// Remove later rows that agree with an earlier surviving row.
    ///
    /// Scans pairs in index order; the first-seen tuple survives. O(n²).
    pub fn crunch(&mut self, by: CrunchBy) {
        let positions = self.comparison_positions(by);
        let mut kept: Vec<usize> = Vec::with_capacity(self.len);
        for row in 0..self.len {
            if !kept.iter().any(|&k| self.rows_agree(k, row, &positions)) {
                kept.push(row);
            }
        }
        if kept.len() == self.len {
            return;
        }

        for col in &mut self.columns {
            col.values = kept.iter().map(|&r| col.values[r].clone()).collect();
        }
        self.len = kept.len();
    }

    /// New relation over `attributes` (in the given order), keyed on all of
    /// them, with duplicate tuples removed.
    pub fn project(&self, attributes: &[String]) -> Result<Relation> {
        let mut columns = Vec::with_capacity(attributes.len());
        let mut key = AttrSet::new();
        for attr in attributes {
            if !key.insert(attr.clone()) {
                continue;
            }
            let col = self.column(attr).ok_or_else(|| {
                Error::Schema(format!(
                    "relation '{}': cannot project unknown attribute '{attr}'",
                    self.name
                ))
            })?;
            columns.push(col.clone());
        }

        let mut out = Relation::from_columns(self.name.clone(), columns, key)?;
        out.origin = self.origin;
        out.crunch(CrunchBy::All);
        Ok(out)
    }

    /// Storage-footprint proxy: rows × attributes.
    pub fn footprint(&self) -> usize {
        self.len * self.columns.len()
    }

    /// True when no two rows agree on every key attribute.
    pub fn has_unique_key(&self) -> bool {
        let positions = self.comparison_positions(CrunchBy::Key);
        (0..self.len).all(|a| (a + 1..self.len).all(|b| !self.rows_agree(a, b, &positions)))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if self.key.contains(&c.name) {
                    format!("*{}", c.name)
                } else {
                    c.name.clone()
                }
            })
            .collect();
        writeln!(f, "{} ({} rows)", self.name, self.len)?;
        writeln!(f, "  {}", header.join(" | "))?;
        for row in 0..self.len {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values[row].to_string())
                .collect();
            writeln!(f, "  {}", cells.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;

    fn people() -> Relation {
        Relation::from_rows(
            "people",
            vec!["id", "name"],
            attr_set(["id"]),
            vec![
                vec![1i64.into(), "ann".into()],
                vec![2i64.into(), "bob".into()],
                vec![1i64.into(), "ann".into()],
                vec![1i64.into(), "ann2".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns_and_foreign_keys() {
        let cols = vec![
            Column::new("a", vec![1i64.into()]),
            Column::new("b", vec![]),
        ];
        assert!(Relation::from_columns("r", cols, AttrSet::new()).is_err());

        let err = Relation::new("r", ["a"], attr_set(["z"])).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn crunch_by_key_keeps_first_seen() {
        let mut r = people();
        r.crunch(CrunchBy::Key);
        assert_eq!(r.num_rows(), 2);
        assert_eq!(r.value(0, "name"), Some(&Value::from("ann")));
        assert_eq!(r.value(1, "name"), Some(&Value::from("bob")));
        assert!(r.has_unique_key());
    }

    #[test]
    fn crunch_all_only_drops_exact_duplicates() {
        let mut r = people();
        r.crunch(CrunchBy::All);
        assert_eq!(r.num_rows(), 3);
        assert!(!r.has_unique_key());
    }

    #[test]
    fn crunch_with_empty_key_compares_everything() {
        let mut r = people();
        r.set_key(AttrSet::new()).unwrap();
        r.crunch(CrunchBy::Key);
        assert_eq!(r.num_rows(), 3);
    }

    #[test]
    fn replace_splices_rows() {
        let mut r = people();
        let t1: Tuple = [
            ("id".to_string(), Value::from(7i64)),
            ("name".to_string(), Value::from("x")),
        ]
        .into_iter()
        .collect();
        let mut t2 = t1.clone();
        t2.insert("name".into(), Value::from("y"));

        r.replace(1, vec![t1, t2]).unwrap();
        assert_eq!(r.num_rows(), 5);
        assert_eq!(r.value(1, "name"), Some(&Value::from("x")));
        assert_eq!(r.value(2, "name"), Some(&Value::from("y")));
        assert_eq!(r.value(3, "name"), Some(&Value::from("ann")));

        r.replace(0, vec![]).unwrap();
        assert_eq!(r.num_rows(), 4);
        assert!(r.replace(10, vec![]).is_err());
    }

    #[test]
    fn insert_requires_every_attribute() {
        let mut r = people();
        let partial: Tuple = [("id".to_string(), Value::from(3i64))].into_iter().collect();
        assert!(r.insert(vec![partial]).is_err());
        assert_eq!(r.num_rows(), 4);

        let full = r.get(1).unwrap();
        r.insert(vec![full]).unwrap();
        assert_eq!(r.num_rows(), 5);
    }

    #[test]
    fn attribute_edits_track_key() {
        let mut r = people();
        r.add_key_attribute("dept", vec!["d".into(); 4]).unwrap();
        assert!(r.is_key("dept"));
        assert!(r.add_attribute("short", vec!["x".into()]).is_err());

        let removed = r.remove_attribute("id").unwrap();
        assert_eq!(removed.len(), 4);
        assert_eq!(r.key(), &attr_set(["dept"]));
        assert_eq!(r.attributes().collect::<Vec<_>>(), vec!["name", "dept"]);
    }

    #[test]
    fn project_dedupes_and_keys_on_all() {
        let r = people();
        let p = r.project(&["id".to_string()]).unwrap();
        assert_eq!(p.num_rows(), 2);
        assert_eq!(p.key(), &attr_set(["id"]));
        assert!(r.project(&["nope".to_string()]).is_err());
    }

    #[test]
    fn clone_is_deep() {
        let r = people();
        let mut c = r.clone();
        c.set(0, "name", Value::Scalar(Scalar::Null)).unwrap();
        assert_eq!(r.value(0, "name"), Some(&Value::from("ann")));
        assert_eq!(c.footprint(), 8);
    }
}
