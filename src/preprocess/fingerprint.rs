use ndarray::Array1;

use super::common::check_num_atoms;
use super::{FeatureError, InputFeatures, MolPreprocessor};
use crate::chem::{morgan_fingerprint, Mol};

/// Folded circular fingerprint as a dense 0/1 vector of `n_bits`.
#[derive(Debug, Clone)]
pub struct FingerprintPreprocessor {
    pub radius: usize,
    pub n_bits: usize,
    pub max_atoms: Option<usize>,
}

impl Default for FingerprintPreprocessor {
    fn default() -> Self {
        Self {
            radius: 2,
            n_bits: 1024,
            max_atoms: None,
        }
    }
}

impl FingerprintPreprocessor {
    pub fn new(radius: usize, n_bits: usize) -> Self {
        Self {
            radius,
            n_bits,
            max_atoms: None,
        }
    }

    pub fn with_max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = Some(max_atoms);
        self
    }
}

impl MolPreprocessor for FingerprintPreprocessor {
    fn get_input_features(&self, mol: &Mol) -> Result<InputFeatures, FeatureError> {
        check_num_atoms(mol, self.max_atoms)?;
        if self.n_bits == 0 {
            return Err(anyhow::anyhow!("fingerprint length must be positive").into());
        }
        let mut bits = Array1::<f64>::zeros(self.n_bits);
        for bit in morgan_fingerprint(mol, self.radius, self.n_bits) {
            bits[bit] = 1.0;
        }
        Ok(InputFeatures::Single(bits.into_dyn()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    #[test]
    fn dense_bits() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        let p = FingerprintPreprocessor::new(2, 256);
        let InputFeatures::Single(bits) = p.get_input_features(&mol).unwrap() else {
            panic!("expected a single array");
        };
        assert_eq!(bits.shape(), &[256]);
        assert!(bits.iter().all(|&b| b == 0.0 || b == 1.0));
        assert!(bits.sum() > 0.0);
    }

    #[test]
    fn zero_length_is_unexpected() {
        let mol = parse_smiles("C").unwrap();
        let err = FingerprintPreprocessor::new(2, 0).get_input_features(&mol).unwrap_err();
        assert_eq!(err.kind(), "Unexpected");
    }
}
