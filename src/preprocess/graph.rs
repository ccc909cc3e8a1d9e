use super::common::{
    check_num_atoms, construct_adj_matrix, construct_atomic_number_array,
    construct_discrete_edge_matrix,
};
use super::{FeatureError, InputFeatures, MolPreprocessor};
use crate::chem::Mol;

/// Atomic numbers plus adjacency, the input of most graph networks.
///
/// Without `out_size` the arrays follow the molecule's atom count, so a file
/// of differently sized molecules yields ragged slots.
#[derive(Debug, Clone, Default)]
pub struct GraphPreprocessor {
    pub max_atoms: Option<usize>,
    pub out_size: Option<usize>,
    /// Emit a `[4, N, N]` tensor with one channel per bond type.
    pub bond_channels: bool,
    pub self_loops: bool,
}

impl GraphPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = Some(max_atoms);
        self
    }

    pub fn with_out_size(mut self, out_size: usize) -> Self {
        self.out_size = Some(out_size);
        self
    }

    pub fn with_bond_channels(mut self, on: bool) -> Self {
        self.bond_channels = on;
        self
    }

    pub fn with_self_loops(mut self, on: bool) -> Self {
        self.self_loops = on;
        self
    }
}

impl MolPreprocessor for GraphPreprocessor {
    fn get_input_features(&self, mol: &Mol) -> Result<InputFeatures, FeatureError> {
        check_num_atoms(mol, self.max_atoms)?;
        let atoms = construct_atomic_number_array(mol, self.out_size)?.into_dyn();
        let adj = if self.bond_channels {
            construct_discrete_edge_matrix(mol, self.out_size)?.into_dyn()
        } else {
            construct_adj_matrix(mol, self.out_size, self.self_loops)?.into_dyn()
        };
        Ok(InputFeatures::Tuple(vec![atoms, adj]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    #[test]
    fn natural_size_tuple() {
        let mol = parse_smiles("CCO").unwrap();
        let features = GraphPreprocessor::new().get_input_features(&mol).unwrap();
        let arrays = features.into_vec();
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].shape(), &[3]);
        assert_eq!(arrays[1].shape(), &[3, 3]);
    }

    #[test]
    fn padded_channels() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let p = GraphPreprocessor::new().with_out_size(8).with_bond_channels(true);
        let arrays = p.get_input_features(&mol).unwrap().into_vec();
        assert_eq!(arrays[0].shape(), &[8]);
        assert_eq!(arrays[1].shape(), &[4, 8, 8]);
        assert_eq!(arrays[1][[3, 0, 1]], 1.0);
    }

    #[test]
    fn too_many_atoms() {
        let mol = parse_smiles("CCCCCC").unwrap();
        let err = GraphPreprocessor::new()
            .with_max_atoms(5)
            .get_input_features(&mol)
            .unwrap_err();
        assert_eq!(err.kind(), "FeatureExtraction");
    }
}
