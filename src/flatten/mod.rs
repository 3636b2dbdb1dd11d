//! Flattening of submission instances against a resolved schema.
//!
//! `Flattener::to_flat_row` produces the export row of one instance. Every
//! multi-select expands into one `<path>/<option>` cell per declared option;
//! the mode decides whether unselected options and unanswered fields are
//! materialized (`Full`) or left out (`Sparse`). Paths the schema does not
//! know are dropped with an `UnknownFieldWarning`.
//!
//! The nested views live in `nested`.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use crate::config::ExportMode;
use crate::error::UnknownFieldWarning;
use crate::instance::Instance;
use crate::schema::{FieldSpec, ResolvedSchema, XFORM_ID_STRING};

pub mod nested;

pub use nested::flatten_nested;

/// Option token that enables the free-text `<path>_other` answer
pub const OTHER_OPTION: &str = "other";

/// One cell of a flattened row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// Whether a multi-select option was chosen
    Flag(bool),
    /// Unanswered field in `Full` mode
    Absent,
}

impl Cell {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// A flattened instance keyed by canonical path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRow {
    cells: BTreeMap<String, Cell>,
}

impl FlatRow {
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Cell> {
        self.cells.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON object view: flags become booleans, absent cells `null`
    #[must_use]
    pub fn into_json(self) -> Map<String, Value> {
        self.cells
            .into_iter()
            .map(|(k, cell)| {
                let value = match cell {
                    Cell::Text(text) => Value::String(text),
                    Cell::Flag(flag) => Value::Bool(flag),
                    Cell::Absent => Value::Null,
                };
                (k, value)
            })
            .collect()
    }

    fn insert(&mut self, path: String, cell: Cell) {
        self.cells.insert(path, cell);
    }
}

/// Flattens instances of one resolved schema
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    schema: &'a ResolvedSchema,
}

impl<'a> Flattener<'a> {
    #[must_use]
    pub const fn new(schema: &'a ResolvedSchema) -> Self {
        Self { schema }
    }

    #[must_use]
    pub const fn schema(&self) -> &'a ResolvedSchema {
        self.schema
    }

    /// Value of a metadata header for `instance`. An untagged instance is
    /// reported under the form's own id string.
    #[must_use]
    pub fn meta_value<'b>(&'b self, instance: &'b Instance, header: &str) -> Option<&'b str> {
        instance.meta_value(header).or_else(|| {
            (header == XFORM_ID_STRING && instance.id_string().is_none())
                .then(|| self.schema.id_string())
        })
    }

    /// Flatten one instance, logging the paths the schema does not know
    #[must_use]
    pub fn to_flat_row(&self, instance: &Instance, mode: ExportMode) -> FlatRow {
        let (row, warnings) = self.flatten(instance, mode);
        for warning in &warnings {
            log::debug!("{warning}");
        }
        row
    }

    /// Flatten one instance and report the paths that were dropped
    #[must_use]
    pub fn flatten(
        &self,
        instance: &Instance,
        mode: ExportMode,
    ) -> (FlatRow, Vec<UnknownFieldWarning>) {
        let leaves = instance.leaves();
        let warnings: Vec<UnknownFieldWarning> = leaves
            .iter()
            .filter(|(path, _)| !self.schema.is_known(path))
            .map(|(path, _)| UnknownFieldWarning::new(path.as_str()))
            .collect();
        let answers: FxHashMap<&str, &str> = leaves
            .iter()
            .map(|(path, value)| (path.as_str(), *value))
            .collect();

        let full = mode == ExportMode::Full;
        let mut row = FlatRow::default();
        for field in self.schema.fields() {
            let answer = answers.get(field.path.as_str()).copied();
            match &field.spec {
                FieldSpec::Scalar => match answer {
                    Some(value) => row.insert(field.path.clone(), Cell::text(value)),
                    None if full => row.insert(field.path.clone(), Cell::Absent),
                    None => {}
                },
                FieldSpec::MultiSelect { options } => {
                    let tokens: FxHashSet<&str> = answer
                        .map(|value| value.split_whitespace().collect())
                        .unwrap_or_default();
                    for token in &tokens {
                        if !options.iter().any(|option| option.as_str() == *token) {
                            log::debug!("Undeclared option '{token}' for {} ignored", field.path);
                        }
                    }
                    for option in options {
                        let selected = tokens.contains(option.as_str());
                        if selected || full {
                            row.insert(format!("{}/{option}", field.path), Cell::Flag(selected));
                        }
                    }
                }
                FieldSpec::OtherText { select } => {
                    let other_selected = answers.get(select.as_str()).is_some_and(|value| {
                        value.split_whitespace().any(|token| token == OTHER_OPTION)
                    });
                    match answer {
                        Some(value) if other_selected => {
                            row.insert(field.path.clone(), Cell::text(value));
                        }
                        _ if full => row.insert(field.path.clone(), Cell::Absent),
                        _ => {}
                    }
                }
            }
        }
        (row, warnings)
    }
}
