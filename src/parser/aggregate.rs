use ndarray::ArrayD;

use super::error::ParserError;
use crate::dataset::FeatureArray;
use crate::preprocess::InputFeatures;

/// Parallel per-slot accumulators filled one successful row at a time.
///
/// The slot layout is taken from the first row and then frozen.
#[derive(Debug, Default)]
pub struct FeatureAggregator {
    with_labels: bool,
    arity: Option<usize>,
    slots: Vec<Vec<ArrayD<f64>>>,
}

impl FeatureAggregator {
    pub fn new(with_labels: bool) -> Self {
        Self {
            with_labels,
            arity: None,
            slots: Vec::new(),
        }
    }

    /// Append one row. `labels` is ignored unless the aggregator was built
    /// with labels, in which case a missing label vector is stored as empty.
    pub fn push(
        &mut self,
        row: usize,
        features: InputFeatures,
        labels: Option<ArrayD<f64>>,
    ) -> Result<(), ParserError> {
        let found = features.arity();
        match self.arity {
            None => {
                self.arity = Some(found);
                let n = found + usize::from(self.with_labels);
                self.slots = vec![Vec::new(); n];
            }
            Some(expected) if expected != found => {
                return Err(ParserError::ArityMismatch {
                    row,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }

        for (slot, value) in self.slots.iter_mut().zip(features.into_vec()) {
            slot.push(value);
        }
        if self.with_labels {
            let labels = labels.unwrap_or_else(|| ArrayD::zeros(ndarray::IxDyn(&[0])));
            if let Some(last) = self.slots.last_mut() {
                last.push(labels);
            }
        }
        Ok(())
    }

    /// Rows appended so far.
    pub fn len(&self) -> usize {
        self.slots.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Convert every slot; empty when no row was ever pushed.
    pub fn finish(self) -> Vec<FeatureArray> {
        self.slots.into_iter().map(FeatureArray::from_rows).collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    fn pair(n: usize) -> InputFeatures {
        InputFeatures::Tuple(vec![
            ArrayD::zeros(ndarray::IxDyn(&[n])),
            ArrayD::zeros(ndarray::IxDyn(&[n, n])),
        ])
    }

    #[test]
    fn label_slot_comes_last() {
        let mut agg = FeatureAggregator::new(true);
        agg.push(0, pair(2), Some(arr1(&[1.0]).into_dyn())).unwrap();
        agg.push(2, pair(2), Some(arr1(&[0.0]).into_dyn())).unwrap();
        assert_eq!(agg.num_slots(), 3);
        assert_eq!(agg.len(), 2);
        let arrays = agg.finish();
        assert_eq!(
            arrays[2].as_dense().unwrap(),
            &arr2(&[[1.0], [0.0]]).into_dyn()
        );
    }

    #[test]
    fn ragged_slots() {
        let mut agg = FeatureAggregator::new(false);
        agg.push(0, pair(2), None).unwrap();
        agg.push(1, pair(3), None).unwrap();
        let arrays = agg.finish();
        assert!(arrays.iter().all(FeatureArray::is_ragged));
    }

    #[test]
    fn arity_is_frozen() {
        let mut agg = FeatureAggregator::new(false);
        agg.push(0, pair(1), None).unwrap();
        let err = agg
            .push(4, InputFeatures::Single(arr1(&[1.0]).into_dyn()), None)
            .unwrap_err();
        assert!(matches!(
            err,
            ParserError::ArityMismatch { row: 4, expected: 2, found: 1 }
        ));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn nothing_pushed() {
        let agg = FeatureAggregator::new(true);
        assert!(agg.is_empty());
        assert!(agg.finish().is_empty());
    }
}
