//! YAML (or JSON) input document → relations + dependencies.
//!
//! Example:
//! ```yaml
//! config: { target: "3NF", max_join_attributes: 8 }
//! relations:
//!   - name: enrollment
//!     origin: { row: 0, col: 0 }
//!     key: [course, student]
//!     attributes: [course, student, student_name, tags]
//!     rows:
//!       - [CS101, 1, Alice, "{intro, core}"]
//!       - [CS102, 1, Alice, NONE]
//! fds:
//!   - { determinant: [student], dependent: [student_name] }
//! mvds: []
//! ```
//!
//! Cells: YAML scalars become scalars and YAML sequences become sets. A
//! string written as `{a, b}` is a set too (numeric when every item parses
//! as a number), and `NONE` is the empty set. Once any cell of a column is a
//! set, every other cell of that column is wrapped into a singleton set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use normform_core::prelude::{
    DependencySet, FunctionalDependency, MultivaluedDependency, NormalForm, NormalizeConfig,
    Origin, Relation, Scalar, Value,
};

use crate::error::PlanError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub config: Option<DocumentConfig>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
    #[serde(default)]
    pub fds: Vec<FunctionalDependency>,
    #[serde(default)]
    pub mvds: Vec<MultivaluedDependency>,
}

/// Per-document overrides. Unset fields leave the base config alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub target: Option<NormalForm>,
    pub max_parallel_tasks: Option<usize>,
    pub max_join_attributes: Option<usize>,
    pub strict_dependencies: Option<bool>,
    pub canonical_order: Option<bool>,
}

impl DocumentConfig {
    pub fn apply(&self, cfg: &mut NormalizeConfig) {
        if let Some(v) = self.target {
            cfg.target = v;
        }
        if let Some(v) = self.max_parallel_tasks {
            cfg.max_parallel_tasks = v;
        }
        if let Some(v) = self.max_join_attributes {
            cfg.max_join_attributes = v;
        }
        if let Some(v) = self.strict_dependencies {
            cfg.strict_dependencies = v;
        }
        if let Some(v) = self.canonical_order {
            cfg.canonical_order = v;
        }
    }
}

/// Wire shape of one relation, used for input documents and for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(default)]
    pub key: Vec<String>,
    pub attributes: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl RelationDef {
    /// Parse cells, regularize set-valued columns, and build the relation.
    pub fn into_relation(self) -> Result<Relation, PlanError> {
        let rows: Vec<Vec<Value>> = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(parse_cell).collect())
            .collect();
        let rows = regularize_sets(rows);

        let key = self.key.into_iter().collect();
        let relation = Relation::from_rows(self.name, self.attributes, key, rows)?;
        Ok(relation.with_origin(self.origin))
    }
}

impl From<&Relation> for RelationDef {
    fn from(r: &Relation) -> Self {
        let rows = (0..r.num_rows())
            .map(|row| r.columns().iter().map(|c| c.values[row].clone()).collect())
            .collect();
        Self {
            name: r.name.clone(),
            origin: r.origin,
            key: r.key().iter().cloned().collect(),
            attributes: r.attributes().map(str::to_string).collect(),
            rows,
        }
    }
}

/// Everything a run needs from one document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub relations: Vec<Relation>,
    pub deps: DependencySet,
    pub config: DocumentConfig,
}

/// Parse a document. JSON is accepted as a subset of YAML.
pub fn parse_document(src: &str) -> Result<ParsedDocument, PlanError> {
    let doc: Document = serde_yaml::from_str(src)?;
    if doc.relations.is_empty() {
        return Err(PlanError::Invalid("document declares no relations".into()));
    }

    let mut names = BTreeSet::new();
    for def in &doc.relations {
        if !names.insert(def.name.as_str()) {
            return Err(PlanError::Invalid(format!(
                "relation '{}' is declared twice",
                def.name
            )));
        }
    }

    let relations = doc
        .relations
        .into_iter()
        .map(RelationDef::into_relation)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedDocument {
        relations,
        deps: DependencySet::new(doc.fds, doc.mvds),
        config: doc.config.unwrap_or_default(),
    })
}

/// Interpret set syntax inside string cells; everything else is kept.
pub fn parse_cell(cell: Value) -> Value {
    match cell {
        Value::Scalar(Scalar::Str(s)) => parse_text(&s).unwrap_or(Value::Scalar(Scalar::Str(s))),
        other => other,
    }
}

fn parse_text(s: &str) -> Option<Value> {
    let t = s.trim();
    if t == "NONE" {
        return Some(Value::Set(Vec::new()));
    }
    let inner = t.strip_prefix('{')?.strip_suffix('}')?.trim();
    if inner.is_empty() {
        return Some(Value::Set(Vec::new()));
    }

    let items: Vec<&str> = inner.split(',').map(str::trim).collect();
    let numbers: Option<Vec<Scalar>> = items.iter().map(|i| parse_number(i)).collect();
    Some(Value::Set(numbers.unwrap_or_else(|| {
        items.iter().map(|i| Scalar::from(*i)).collect()
    })))
}

fn parse_number(s: &str) -> Option<Scalar> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Scalar::I64(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(Scalar::F64)
}

/// Wrap scalar cells into singleton sets in every column that holds a set.
fn regularize_sets(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for col in 0..width {
        let has_set = rows
            .iter()
            .any(|row| row.get(col).is_some_and(Value::is_set));
        if !has_set {
            continue;
        }
        for row in &mut rows {
            if let Some(Value::Scalar(s)) = row.get(col) {
                let wrapped = Value::Set(vec![s.clone()]);
                row[col] = wrapped;
            }
        }
    }
    rows
}
