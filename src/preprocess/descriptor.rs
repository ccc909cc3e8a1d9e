use ndarray::Array1;

use super::common::check_num_atoms;
use super::{FeatureError, InputFeatures, MolPreprocessor};
use crate::chem::{Descriptors, Mol};

/// Physicochemical descriptor vector, ordered as [`crate::chem::DESCRIPTOR_NAMES`].
#[derive(Debug, Clone, Default)]
pub struct DescriptorPreprocessor {
    pub max_atoms: Option<usize>,
}

impl DescriptorPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = Some(max_atoms);
        self
    }
}

impl MolPreprocessor for DescriptorPreprocessor {
    fn get_input_features(&self, mol: &Mol) -> Result<InputFeatures, FeatureError> {
        check_num_atoms(mol, self.max_atoms)?;
        let values = Array1::from(Descriptors::compute(mol).to_vec());
        Ok(InputFeatures::Single(values.into_dyn()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::chem::{parse_smiles, DESCRIPTOR_NAMES};

    #[test]
    fn one_value_per_name() {
        let mol = parse_smiles("CCO").unwrap();
        let InputFeatures::Single(values) = DescriptorPreprocessor::new().get_input_features(&mol).unwrap() else {
            panic!("expected a single array");
        };
        assert_eq!(values.len(), DESCRIPTOR_NAMES.len());
        assert_relative_eq!(values[[0]], 46.069, epsilon = 0.01);
    }
}
