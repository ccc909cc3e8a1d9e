//! Array builders shared by the graph-style preprocessors.

use anyhow::anyhow;
use ndarray::{Array1, Array2, Array3};

use super::FeatureError;
use crate::chem::Mol;

/// Reject molecules with more than `max_atoms` atoms as an expected failure.
pub fn check_num_atoms(mol: &Mol, max_atoms: Option<usize>) -> Result<(), FeatureError> {
    match max_atoms {
        Some(max) if mol.num_atoms() > max => Err(FeatureError::Extraction(format!(
            "number of atoms {} exceeds max_atoms {max}",
            mol.num_atoms()
        ))),
        _ => Ok(()),
    }
}

fn padded_size(mol: &Mol, out_size: Option<usize>) -> Result<usize, FeatureError> {
    let n = mol.num_atoms();
    match out_size {
        None => Ok(n),
        Some(size) if size >= n => Ok(size),
        Some(size) => Err(anyhow!("out_size {size} is smaller than number of atoms in mol {n}").into()),
    }
}

/// Atomic numbers in atom order, zero-padded to `out_size` when given.
pub fn construct_atomic_number_array(
    mol: &Mol,
    out_size: Option<usize>,
) -> Result<Array1<f64>, FeatureError> {
    let size = padded_size(mol, out_size)?;
    let mut atoms = Array1::zeros(size);
    for (i, atom) in mol.atoms().iter().enumerate() {
        atoms[i] = f64::from(atom.element.atomic_number);
    }
    Ok(atoms)
}

/// Symmetric 0/1 adjacency matrix, optionally with self connections on
/// the diagonal of real atoms.
pub fn construct_adj_matrix(
    mol: &Mol,
    out_size: Option<usize>,
    self_connection: bool,
) -> Result<Array2<f64>, FeatureError> {
    let size = padded_size(mol, out_size)?;
    let mut adj = Array2::zeros((size, size));
    for bond in mol.bonds() {
        adj[[bond.begin, bond.end]] = 1.0;
        adj[[bond.end, bond.begin]] = 1.0;
    }
    if self_connection {
        for i in 0..mol.num_atoms() {
            adj[[i, i]] = 1.0;
        }
    }
    Ok(adj)
}

/// One adjacency channel per bond type: single, double, triple, aromatic.
pub fn construct_discrete_edge_matrix(
    mol: &Mol,
    out_size: Option<usize>,
) -> Result<Array3<f64>, FeatureError> {
    let size = padded_size(mol, out_size)?;
    let mut adj = Array3::zeros((4, size, size));
    for bond in mol.bonds() {
        let ch = bond.order.channel();
        adj[[ch, bond.begin, bond.end]] = 1.0;
        adj[[ch, bond.end, bond.begin]] = 1.0;
    }
    Ok(adj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    #[test]
    fn max_atoms_is_an_expected_failure() {
        let mol = parse_smiles("CCCC").unwrap();
        assert!(check_num_atoms(&mol, Some(4)).is_ok());
        assert!(matches!(check_num_atoms(&mol, Some(3)), Err(FeatureError::Extraction(_))));
    }

    #[test]
    fn padding() {
        let mol = parse_smiles("CO").unwrap();
        let atoms = construct_atomic_number_array(&mol, Some(4)).unwrap();
        assert_eq!(atoms.to_vec(), vec![6.0, 8.0, 0.0, 0.0]);
        assert!(matches!(
            construct_atomic_number_array(&mol, Some(1)),
            Err(FeatureError::Unexpected(_))
        ));
    }

    #[test]
    fn adjacency_channels() {
        let mol = parse_smiles("C=CC#N").unwrap();
        let adj = construct_adj_matrix(&mol, None, true).unwrap();
        assert_eq!(adj[[0, 1]], 1.0);
        assert_eq!(adj[[0, 0]], 1.0);
        assert_eq!(adj[[0, 2]], 0.0);
        let edges = construct_discrete_edge_matrix(&mol, None).unwrap();
        assert_eq!(edges.shape(), &[4, 4, 4]);
        assert_eq!(edges[[1, 0, 1]], 1.0);
        assert_eq!(edges[[0, 1, 2]], 1.0);
        assert_eq!(edges[[2, 3, 2]], 1.0);
    }
}
