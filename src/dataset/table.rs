//! Feature table assembly and column selection.

use crate::core::error::{DatasetError, DatasetResult};
use crate::core::types::FeatureMap;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Name of the label column, always written last.
pub const LABEL_COLUMN: &str = "class";

/// Features of one image together with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Class label.
    pub class: String,
    /// Extracted features.
    pub features: FeatureMap,
}

impl FeatureRecord {
    /// Create a record.
    pub fn new(class: impl Into<String>, features: FeatureMap) -> Self {
        Self {
            class: class.into(),
            features,
        }
    }
}

/// One table row: feature values aligned with the table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Values in column order; NaN marks a missing value.
    pub values: Vec<f64>,
    /// Class label.
    pub class: String,
}

/// Rectangular feature table with a class label per row.
///
/// Feature columns are kept in byte-wise sorted order when built from
/// records; selections keep the order they were asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    index: IndexMap<String, usize>,
    classes: Vec<String>,
    rows: Vec<Row>,
}

impl FeatureTable {
    /// Build a table from per-image records.
    ///
    /// Columns are the union of all feature names, sorted. `classes` is the
    /// nominal enumeration of the label and may list classes with no rows.
    pub fn from_records(records: Vec<FeatureRecord>, classes: Vec<String>) -> Self {
        let columns: Vec<String> = records
            .iter()
            .flat_map(|r| r.features.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = records
            .into_iter()
            .map(|record| Row {
                values: columns
                    .iter()
                    .map(|c| record.features.get(c).copied().unwrap_or(f64::NAN))
                    .collect(),
                class: record.class,
            })
            .collect();

        Self::from_parts(columns, classes, rows)
    }

    fn from_parts(columns: Vec<String>, classes: Vec<String>, rows: Vec<Row>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            index,
            classes,
            rows,
        }
    }

    /// Feature column names, without the label.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Full header: feature columns then [`LABEL_COLUMN`].
    pub fn header(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .chain(std::iter::once(LABEL_COLUMN))
            .collect()
    }

    /// Class enumeration.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a feature column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Value of `column` in row `row`.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = *self.index.get(column)?;
        self.rows.get(row).map(|r| r.values[col])
    }

    /// New table holding `names` in the given order.
    ///
    /// Fails on the first unknown column.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<FeatureTable> {
        let positions = names
            .iter()
            .map(|n| {
                self.index
                    .get(n.as_ref())
                    .copied()
                    .ok_or_else(|| DatasetError::ColumnNotFound(n.as_ref().to_string()))
            })
            .collect::<DatasetResult<Vec<usize>>>()?;

        let columns = positions.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| Row {
                values: positions.iter().map(|&i| row.values[i]).collect(),
                class: row.class.clone(),
            })
            .collect();

        Ok(Self::from_parts(columns, self.classes.clone(), rows))
    }

    /// Names of the columns matching `predicate`, in table order.
    pub fn columns_where<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        self.columns
            .iter()
            .filter(|c| predicate(c.as_str()))
            .cloned()
            .collect()
    }

    /// New table holding the columns matching `predicate`, in table order.
    pub fn select_where<F>(&self, predicate: F) -> FeatureTable
    where
        F: Fn(&str) -> bool,
    {
        let names = self.columns_where(predicate);
        // every name comes from this table
        self.select(&names).unwrap_or_else(|_| self.empty_like())
    }

    fn empty_like(&self) -> FeatureTable {
        let rows = self
            .rows
            .iter()
            .map(|r| Row {
                values: Vec::new(),
                class: r.class.clone(),
            })
            .collect();
        Self::from_parts(Vec::new(), self.classes.clone(), rows)
    }
}
