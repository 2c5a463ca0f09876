//! Feature alignment between input columns and the model's training layout
//!
//! When the artifact records the column names it was fitted on, input
//! columns are matched by name and reordered, and a column the model was
//! not fitted on is an error. Otherwise the input columns are passed
//! through in file order and only their count is checked.

use crate::error::FeatureError;
use crate::models::FeatureMatrix;

/// Expected input shape of a model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    n_features: usize,
    names: Option<Vec<String>>,
}

impl FeatureLayout {
    pub fn positional(n_features: usize) -> Self {
        Self {
            n_features,
            names: None,
        }
    }

    pub fn named(names: Vec<String>) -> Self {
        Self {
            n_features: names.len(),
            names: Some(names),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Index into the input columns for each model feature
    fn column_indices(&self, columns: &[String]) -> Result<Vec<usize>, FeatureError> {
        match &self.names {
            Some(names) => {
                if let Some(extra) = columns.iter().find(|c| !names.contains(c)) {
                    return Err(FeatureError::UnexpectedColumn(extra.clone()));
                }
                names
                    .iter()
                    .map(|name| {
                        columns
                            .iter()
                            .position(|c| c == name)
                            .ok_or_else(|| FeatureError::MissingColumn(name.clone()))
                    })
                    .collect()
            }
            None => {
                if columns.len() != self.n_features {
                    return Err(FeatureError::CountMismatch {
                        expected: self.n_features,
                        actual: columns.len(),
                    });
                }
                Ok((0..self.n_features).collect())
            }
        }
    }

    /// Rows rearranged into model order
    pub fn project(&self, matrix: &FeatureMatrix) -> Result<Vec<Vec<f64>>, FeatureError> {
        let indices = self.column_indices(&matrix.columns)?;
        let width = matrix.columns.len();

        matrix
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != width {
                    return Err(FeatureError::RaggedRow {
                        row: i + 1,
                        expected: width,
                        actual: row.len(),
                    });
                }
                Ok(indices.iter().map(|&idx| row[idx]).collect())
            })
            .collect()
    }
}
