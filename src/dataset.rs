//! Applying rules to numeric datasets.
//!
//! A dataset is a rectangular table of doubles whose columns are named by a
//! [`ColumnCatalog`]. Rule application flags each row: a row is an outlier
//! when the full conjunction of at least one OUTLIER rule holds for it.
//! INLIER rules carve nothing out; they are descriptive only.

use tracing::debug;

use crate::error::DatasetError;
use crate::parser::ColumnCatalog;
use crate::rule::Rule;

/// A rectangular, row-major numeric table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: ColumnCatalog,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Creates a dataset, validating that every row matches the column
    /// count.
    ///
    /// # Errors
    /// Returns [`DatasetError::RowWidthMismatch`] for the first row whose
    /// width differs from the catalog's column count.
    pub fn new(columns: ColumnCatalog, rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        let expected = columns.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != expected {
                return Err(DatasetError::RowWidthMismatch {
                    row,
                    found: values.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// The column catalog.
    #[must_use]
    pub fn columns(&self) -> &ColumnCatalog {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flags each row against the given rules.
    ///
    /// The returned vector has one entry per row, `true` when any OUTLIER
    /// rule's entire conjunction matches the row.
    ///
    /// # Errors
    /// Returns [`DatasetError::UnknownColumn`] when a rule references a
    /// column the dataset does not have.
    pub fn flag_outliers(&self, rules: &[Rule]) -> Result<Vec<bool>, DatasetError> {
        // Resolve each rule's predicates to column indices up front so the
        // row scan is index arithmetic only.
        let mut resolved: Vec<Vec<(usize, &crate::predicate::Predicate)>> = Vec::new();
        for rule in rules {
            if !rule.is_outlier() {
                debug!(rule = %rule, "skipping INLIER rule during flagging");
                continue;
            }
            let mut indexed = Vec::with_capacity(rule.conjunction().len());
            for predicate in rule.conjunction() {
                let index = self.columns.index_of(&predicate.parameter).ok_or_else(|| {
                    DatasetError::UnknownColumn {
                        column: predicate.parameter.clone(),
                    }
                })?;
                indexed.push((index, predicate));
            }
            resolved.push(indexed);
        }

        Ok(self
            .rows
            .iter()
            .map(|row| {
                resolved.iter().any(|conjunction| {
                    conjunction
                        .iter()
                        .all(|(index, predicate)| predicate.matches(row[*index]))
                })
            })
            .collect())
    }
}
