use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};

use super::FilePreprocessor;
use crate::data::{load_table, CellValue, Table};
use crate::dataset::{FeatureArray, Processed};

/// Reads precomputed descriptor columns straight from the file, skipping
/// SMILES handling altogether.
#[derive(Debug, Clone, Default)]
pub struct NumericColumnsPreprocessor {
    pub feature_cols: Vec<String>,
    pub target_col: Option<String>,
}

impl NumericColumnsPreprocessor {
    pub fn new<S: Into<String>>(feature_cols: impl IntoIterator<Item = S>) -> Self {
        Self {
            feature_cols: feature_cols.into_iter().map(Into::into).collect(),
            target_col: None,
        }
    }

    pub fn with_target(mut self, target_col: impl Into<String>) -> Self {
        self.target_col = Some(target_col.into());
        self
    }

    /// Same as [`FilePreprocessor::process`] on an already loaded table.
    pub fn process_table(&self, table: &Table) -> Result<Processed> {
        if self.feature_cols.is_empty() {
            bail!("no feature columns configured");
        }
        let feature_idxs = self
            .feature_cols
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<Vec<_>, _>>()?;
        let target_idx = self
            .target_col
            .as_deref()
            .map(|c| table.column_index(c))
            .transpose()?;

        let mut features = Array2::<f64>::zeros((table.len(), feature_idxs.len()));
        let mut targets = Array1::<f64>::zeros(table.len());
        for (row, record) in table.records().iter().enumerate() {
            for (j, &idx) in feature_idxs.iter().enumerate() {
                features[[row, j]] = numeric_cell(&record[idx])
                    .with_context(|| format!("row {row}, column '{}'", table.columns()[idx]))?;
            }
            if let Some(idx) = target_idx {
                targets[row] = numeric_cell(&record[idx])
                    .with_context(|| format!("row {row}, column '{}'", table.columns()[idx]))?;
            }
        }

        let features = FeatureArray::from(features);
        Ok(match target_idx {
            Some(_) => Processed::Tuple(vec![features, FeatureArray::from(targets)]),
            None => Processed::Single(features),
        })
    }
}

fn numeric_cell(cell: &CellValue) -> Result<f64> {
    if cell.is_null() {
        bail!("missing value");
    }
    match cell.as_f64() {
        Some(v) => Ok(v),
        None => bail!("failed to parse value '{cell}' as a number"),
    }
}

impl FilePreprocessor for NumericColumnsPreprocessor {
    fn process(&self, path: &Path) -> Result<Processed> {
        let table = load_table(path)?;
        self.process_table(&table)
            .with_context(|| format!("reading numeric columns from {}", path.display()))
    }
}
