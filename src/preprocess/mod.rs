//! Preprocessors turn molecules (or whole files) into feature arrays.
//!
//! A [`MolPreprocessor`] works row by row on parsed molecules and is driven by
//! [`crate::parser::CsvFileParser`]. A [`FilePreprocessor`] takes over the
//! whole file and bypasses the row path entirely.

pub mod common;
pub mod descriptor;
pub mod fingerprint;
pub mod graph;
pub mod numeric;

use std::path::Path;

use anyhow::anyhow;
use ndarray::ArrayD;
use thiserror::Error;

use crate::chem::{parse_smiles, to_canonical_smiles, Mol};
use crate::dataset::Processed;

pub use descriptor::DescriptorPreprocessor;
pub use fingerprint::FingerprintPreprocessor;
pub use graph::GraphPreprocessor;
pub use numeric::NumericColumnsPreprocessor;

#[derive(Debug, Error)]
pub enum FeatureError {
    /// Expected failure for this molecule (too large, unsupported motif).
    #[error("feature extraction failed: {0}")]
    Extraction(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl FeatureError {
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureError::Extraction(_) => "FeatureExtraction",
            FeatureError::Unexpected(_) => "Unexpected",
        }
    }
}

/// Features of one molecule: one array, or a fixed-size tuple of arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFeatures {
    Single(ArrayD<f64>),
    Tuple(Vec<ArrayD<f64>>),
}

impl InputFeatures {
    pub fn arity(&self) -> usize {
        match self {
            InputFeatures::Single(_) => 1,
            InputFeatures::Tuple(values) => values.len(),
        }
    }

    pub fn into_vec(self) -> Vec<ArrayD<f64>> {
        match self {
            InputFeatures::Single(value) => vec![value],
            InputFeatures::Tuple(values) => values,
        }
    }
}

pub trait MolPreprocessor {
    /// Canonical SMILES plus a molecule whose atoms follow the canonical order.
    ///
    /// The string is always derived from the structure; two inputs for the same
    /// molecule give the same result.
    fn prepare_smiles_and_mol(&self, mol: Mol) -> Result<(String, Mol), FeatureError> {
        let canonical = to_canonical_smiles(&mol);
        let mol = parse_smiles(&canonical)
            .map_err(|e| anyhow!(e).context(format!("re-reading canonical SMILES {canonical}")))?;
        Ok((canonical, mol))
    }

    fn get_input_features(&self, mol: &Mol) -> Result<InputFeatures, FeatureError>;
}

/// Escape hatch for inputs that are not processed molecule by molecule.
pub trait FilePreprocessor {
    fn process(&self, path: &Path) -> anyhow::Result<Processed>;
}

pub enum Preprocessor {
    Molecule(Box<dyn MolPreprocessor>),
    File(Box<dyn FilePreprocessor>),
}

impl Preprocessor {
    pub fn molecule(p: impl MolPreprocessor + 'static) -> Self {
        Preprocessor::Molecule(Box::new(p))
    }

    pub fn file(p: impl FilePreprocessor + 'static) -> Self {
        Preprocessor::File(Box::new(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AtomCount;

    impl MolPreprocessor for AtomCount {
        fn get_input_features(&self, mol: &Mol) -> Result<InputFeatures, FeatureError> {
            Ok(InputFeatures::Single(ndarray::arr0(mol.num_atoms() as f64).into_dyn()))
        }
    }

    #[test]
    fn default_canonicalization_reorders_atoms() {
        let (smiles, mol) = AtomCount
            .prepare_smiles_and_mol(parse_smiles("OCC").unwrap())
            .unwrap();
        assert_eq!(smiles, "CCO");
        assert_eq!(mol.atom(2).element.symbol, "O");
        assert_eq!(to_canonical_smiles(&mol), smiles);
    }

    #[test]
    fn arity() {
        assert_eq!(InputFeatures::Single(ndarray::arr0(1.0).into_dyn()).arity(), 1);
        let pair = InputFeatures::Tuple(vec![ndarray::arr0(1.0).into_dyn(); 2]);
        assert_eq!(pair.arity(), 2);
        assert_eq!(pair.into_vec().len(), 2);
    }
}
