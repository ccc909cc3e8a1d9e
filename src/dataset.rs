use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{stack, Array1, Array2, ArrayD, ArrayView, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("array {slot} has length {found}, expected {expected}")]
    LengthMismatch {
        slot: usize,
        expected: usize,
        found: usize,
    },
    #[error("array {slot} is a scalar; every slot needs a leading example axis")]
    Scalar { slot: usize },
    #[error("dataset I/O failed")]
    Io(#[from] std::io::Error),
    #[error("dataset JSON is malformed")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// FeatureArray – one slot of the dataset
// ---------------------------------------------------------------------------

/// One feature slot: either a dense array whose first axis indexes examples,
/// or a per-example list of arrays whose shapes differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FeatureArray {
    Dense(ArrayD<f64>),
    Ragged(Vec<ArrayD<f64>>),
}

impl FeatureArray {
    /// Stack per-example rows along a new leading axis. Rows with
    /// inconsistent shapes are kept as a ragged list instead.
    pub fn from_rows(rows: Vec<ArrayD<f64>>) -> Self {
        if rows.is_empty() {
            return FeatureArray::Dense(ArrayD::zeros(IxDyn(&[0])));
        }
        let views: Vec<ArrayView<'_, f64, IxDyn>> = rows.iter().map(|r| r.view()).collect();
        match stack(Axis(0), &views) {
            Ok(dense) => FeatureArray::Dense(dense),
            Err(_) => FeatureArray::Ragged(rows),
        }
    }

    /// Number of examples (length of the leading axis, 0 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            FeatureArray::Dense(a) => a.shape().first().copied().unwrap_or(0),
            FeatureArray::Ragged(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ragged(&self) -> bool {
        matches!(self, FeatureArray::Ragged(_))
    }

    pub fn as_dense(&self) -> Option<&ArrayD<f64>> {
        match self {
            FeatureArray::Dense(a) => Some(a),
            FeatureArray::Ragged(_) => None,
        }
    }

    /// The values of example `index`.
    pub fn row(&self, index: usize) -> Option<ArrayD<f64>> {
        match self {
            FeatureArray::Dense(a) if a.ndim() > 0 && index < a.shape()[0] => {
                Some(a.index_axis(Axis(0), index).to_owned())
            }
            FeatureArray::Dense(_) => None,
            FeatureArray::Ragged(rows) => rows.get(index).cloned(),
        }
    }

    /// Human-readable shape, e.g. `[120, 1024]` or `[120] ragged`.
    pub fn describe(&self) -> String {
        match self {
            FeatureArray::Dense(a) => format!("{:?}", a.shape()),
            FeatureArray::Ragged(rows) => format!("[{}] ragged", rows.len()),
        }
    }
}

impl From<ArrayD<f64>> for FeatureArray {
    fn from(a: ArrayD<f64>) -> Self {
        FeatureArray::Dense(a)
    }
}

impl From<Array1<f64>> for FeatureArray {
    fn from(a: Array1<f64>) -> Self {
        FeatureArray::Dense(a.into_dyn())
    }
}

impl From<Array2<f64>> for FeatureArray {
    fn from(a: Array2<f64>) -> Self {
        FeatureArray::Dense(a.into_dyn())
    }
}

/// Output of a preprocessing stage before it is packaged into a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    Single(FeatureArray),
    Tuple(Vec<FeatureArray>),
}

impl Processed {
    pub fn into_arrays(self) -> Vec<FeatureArray> {
        match self {
            Processed::Single(a) => vec![a],
            Processed::Tuple(arrays) => arrays,
        }
    }
}

// ---------------------------------------------------------------------------
// TupleDataset – the packaged result
// ---------------------------------------------------------------------------

/// Aligned feature slots sharing one example count. Example `i` is the
/// tuple of row `i` from every slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TupleDataset {
    arrays: Vec<FeatureArray>,
}

impl TupleDataset {
    pub fn new(arrays: Vec<FeatureArray>) -> Result<Self, DatasetError> {
        if let Some(slot) = arrays
            .iter()
            .position(|a| a.as_dense().is_some_and(|d| d.ndim() == 0))
        {
            return Err(DatasetError::Scalar { slot });
        }
        if let Some(first) = arrays.first() {
            let expected = first.len();
            for (slot, array) in arrays.iter().enumerate().skip(1) {
                if array.len() != expected {
                    return Err(DatasetError::LengthMismatch {
                        slot,
                        expected,
                        found: array.len(),
                    });
                }
            }
        }
        Ok(TupleDataset { arrays })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.arrays.first().map(FeatureArray::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots per example.
    pub fn num_slots(&self) -> usize {
        self.arrays.len()
    }

    pub fn features(&self) -> &[FeatureArray] {
        &self.arrays
    }

    pub fn slot(&self, index: usize) -> Option<&FeatureArray> {
        self.arrays.get(index)
    }

    pub fn into_arrays(self) -> Vec<FeatureArray> {
        self.arrays
    }

    /// Example `index` as one array per slot.
    pub fn get(&self, index: usize) -> Option<Vec<ArrayD<f64>>> {
        if index >= self.len() {
            return None;
        }
        self.arrays.iter().map(|a| a.row(index)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec<ArrayD<f64>>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Write the dataset as JSON. NaN values are written as `null`, which
    /// [`TupleDataset::load`] rejects.
    pub fn save(&self, path: &Path) -> Result<(), DatasetError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a dataset written by [`TupleDataset::save`], re-checking alignment.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let reader = BufReader::new(File::open(path)?);
        let raw: TupleDataset = serde_json::from_reader(reader)?;
        TupleDataset::new(raw.arrays)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn equal_shapes_stack_densely() {
        let a = FeatureArray::from_rows(vec![arr1(&[1.0, 2.0]).into_dyn(), arr1(&[3.0, 4.0]).into_dyn()]);
        assert_eq!(a.as_dense().map(|d| d.shape().to_vec()), Some(vec![2, 2]));
        assert_eq!(a.row(1), Some(arr1(&[3.0, 4.0]).into_dyn()));
    }

    #[test]
    fn mismatched_shapes_fall_back_to_ragged() {
        let a = FeatureArray::from_rows(vec![arr1(&[1.0]).into_dyn(), arr1(&[2.0, 3.0]).into_dyn()]);
        assert!(a.is_ragged());
        assert_eq!(a.len(), 2);
        assert_eq!(a.row(1), Some(arr1(&[2.0, 3.0]).into_dyn()));
    }

    #[test]
    fn no_rows_is_an_empty_dense_slot() {
        let a = FeatureArray::from_rows(Vec::new());
        assert_eq!(a.len(), 0);
        assert!(!a.is_ragged());
    }

    #[test]
    fn slots_must_align() {
        let x = FeatureArray::from(arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        let y = FeatureArray::from(arr1(&[1.0]));
        let err = TupleDataset::new(vec![x.clone(), y]).unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { slot: 1, expected: 2, found: 1 }));

        let ds = TupleDataset::new(vec![x, FeatureArray::from(arr1(&[0.0, 1.0]))]).unwrap();
        assert_eq!(ds.len(), 2);
        let example = ds.get(1).unwrap();
        assert_eq!(example[0], arr1(&[3.0, 4.0]).into_dyn());
        assert_eq!(example[1], ndarray::arr0(1.0).into_dyn());
        assert_eq!(ds.iter().count(), 2);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn scalar_slots_are_rejected() {
        let scalar = FeatureArray::from(ndarray::arr0(1.0).into_dyn());
        assert_eq!(scalar.len(), 0);
        assert!(scalar.row(0).is_none());
        let err = TupleDataset::new(vec![FeatureArray::from(arr1(&[1.0])), scalar]).unwrap_err();
        assert!(matches!(err, DatasetError::Scalar { slot: 1 }));
    }

    #[test]
    fn json_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ds.json");
        let ds = TupleDataset::new(vec![
            FeatureArray::from_rows(vec![arr1(&[1.0]).into_dyn(), arr1(&[2.0, 3.0]).into_dyn()]),
            FeatureArray::from(arr1(&[0.0, 1.0])),
        ])
        .unwrap();
        ds.save(&path).unwrap();
        assert_eq!(TupleDataset::load(&path).unwrap(), ds);
    }
}
