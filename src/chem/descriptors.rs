//! Molecular descriptors and hashed circular fingerprints.
//!
//! | Descriptor         | Meaning                                              |
//! |--------------------|------------------------------------------------------|
//! | MolWt              | Average molecular weight including hydrogens         |
//! | ExactMass          | Monoisotopic mass (isotope labels use mass number)   |
//! | HeavyAtomCount     | Non-hydrogen atoms                                   |
//! | NumHeteroatoms     | Atoms other than C and H                             |
//! | NumHDonors         | N and O atoms carrying at least one hydrogen         |
//! | NumHAcceptors      | N and O atoms (Lipinski count)                       |
//! | NumRotatableBonds  | Non-ring single bonds between non-terminal heavy atoms |
//! | RingCount          | Cyclomatic number                                    |
//! | NumAromaticAtoms   | Atoms written as aromatic                            |
//! | FormalCharge       | Net formal charge                                    |

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use super::element::Element;
use super::mol::{BondOrder, Mol};

/// Names of the values produced by [`Descriptors::to_vec`], in order.
pub const DESCRIPTOR_NAMES: [&str; 10] = [
    "MolWt",
    "ExactMass",
    "HeavyAtomCount",
    "NumHeteroatoms",
    "NumHDonors",
    "NumHAcceptors",
    "NumRotatableBonds",
    "RingCount",
    "NumAromaticAtoms",
    "FormalCharge",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptors {
    pub mol_wt: f64,
    pub exact_mass: f64,
    pub heavy_atom_count: usize,
    pub num_heteroatoms: usize,
    pub h_bond_donors: usize,
    pub h_bond_acceptors: usize,
    pub num_rotatable_bonds: usize,
    pub ring_count: usize,
    pub num_aromatic_atoms: usize,
    pub formal_charge: i32,
}

impl Descriptors {
    pub fn compute(mol: &Mol) -> Self {
        let hydrogen = Element::from_symbol("H");
        let h_avg = hydrogen.map(|h| h.average_mass).unwrap_or(1.008);
        let h_mono = hydrogen.map(|h| h.monoisotopic_mass).unwrap_or(1.00782503223);

        let mut mol_wt = 0.0;
        let mut exact_mass = 0.0;
        for atom in mol.atoms() {
            let hs = f64::from(atom.hydrogens);
            mol_wt += atom.element.average_mass + hs * h_avg;
            let heavy = atom
                .isotope
                .map(f64::from)
                .unwrap_or(atom.element.monoisotopic_mass);
            exact_mass += heavy + hs * h_mono;
        }

        let is_no = |z: u8| matches!(z, 7 | 8);
        let atoms = mol.atoms();
        Descriptors {
            mol_wt,
            exact_mass,
            heavy_atom_count: atoms.iter().filter(|a| a.element.atomic_number > 1).count(),
            num_heteroatoms: atoms.iter().filter(|a| a.element.is_hetero()).count(),
            h_bond_donors: atoms
                .iter()
                .filter(|a| is_no(a.element.atomic_number) && a.hydrogens > 0)
                .count(),
            h_bond_acceptors: atoms.iter().filter(|a| is_no(a.element.atomic_number)).count(),
            num_rotatable_bonds: count_rotatable_bonds(mol),
            ring_count: mol.num_rings(),
            num_aromatic_atoms: atoms.iter().filter(|a| a.aromatic).count(),
            formal_charge: atoms.iter().map(|a| i32::from(a.charge)).sum(),
        }
    }

    /// Values in [`DESCRIPTOR_NAMES`] order.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.mol_wt,
            self.exact_mass,
            self.heavy_atom_count as f64,
            self.num_heteroatoms as f64,
            self.h_bond_donors as f64,
            self.h_bond_acceptors as f64,
            self.num_rotatable_bonds as f64,
            self.ring_count as f64,
            self.num_aromatic_atoms as f64,
            f64::from(self.formal_charge),
        ]
    }
}

fn count_rotatable_bonds(mol: &Mol) -> usize {
    let has_triple = |atom: usize| {
        mol.neighbors(atom)
            .any(|(_, b)| matches!(b.order, BondOrder::Triple))
    };
    mol.bonds()
        .iter()
        .enumerate()
        .filter(|(idx, b)| {
            b.order == BondOrder::Single
                && !mol.is_ring_bond(*idx)
                && [b.begin, b.end].iter().all(|&a| {
                    mol.atom(a).element.atomic_number > 1
                        && mol.heavy_degree(a) > 1
                        && !has_triple(a)
                })
        })
        .count()
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Morgan / ECFP-style fingerprint: sorted indices of the set bits in a
/// folded bit vector of length `n_bits`.
///
/// Radius 2 corresponds to ECFP4.
pub fn morgan_fingerprint(mol: &Mol, radius: usize, n_bits: usize) -> Vec<usize> {
    if n_bits == 0 {
        return Vec::new();
    }
    let mut ids: Vec<u64> = (0..mol.num_atoms())
        .map(|i| {
            let a = mol.atom(i);
            hash_of(&(
                a.element.atomic_number,
                mol.heavy_degree(i),
                a.hydrogens,
                a.charge,
                a.isotope,
                a.aromatic,
                mol.atom_in_ring(i),
            ))
        })
        .collect();

    let mut bits: BTreeSet<usize> = ids.iter().map(|id| (*id % n_bits as u64) as usize).collect();
    for iteration in 1..=radius {
        ids = (0..mol.num_atoms())
            .map(|i| {
                let mut env: Vec<(u8, u64)> = mol
                    .neighbors(i)
                    .map(|(n, b)| (b.order.code(), ids[n]))
                    .collect();
                env.sort_unstable();
                hash_of(&(iteration, ids[i], env))
            })
            .collect();
        bits.extend(ids.iter().map(|id| (*id % n_bits as u64) as usize));
    }
    bits.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::chem::parse_smiles;

    #[test]
    fn ethanol() {
        let d = Descriptors::compute(&parse_smiles("CCO").unwrap());
        assert_relative_eq!(d.mol_wt, 46.069, epsilon = 0.01);
        assert_relative_eq!(d.exact_mass, 46.0419, epsilon = 0.001);
        assert_eq!(d.heavy_atom_count, 3);
        assert_eq!(d.h_bond_donors, 1);
        assert_eq!(d.h_bond_acceptors, 1);
        assert_eq!(d.num_rotatable_bonds, 0);
        assert_eq!(d.ring_count, 0);
    }

    #[test]
    fn aspirin() {
        let d = Descriptors::compute(&parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap());
        assert_relative_eq!(d.mol_wt, 180.159, epsilon = 0.05);
        assert_eq!(d.heavy_atom_count, 13);
        assert_eq!(d.num_heteroatoms, 4);
        assert_eq!(d.h_bond_donors, 1);
        assert_eq!(d.h_bond_acceptors, 4);
        assert_eq!(d.num_rotatable_bonds, 3);
        assert_eq!(d.ring_count, 1);
        assert_eq!(d.num_aromatic_atoms, 6);
        assert_eq!(d.to_vec().len(), DESCRIPTOR_NAMES.len());
    }

    #[test]
    fn charged_pair() {
        let d = Descriptors::compute(&parse_smiles("[NH4+].[Cl-]").unwrap());
        assert_eq!(d.formal_charge, 0);
        assert_eq!(d.num_heteroatoms, 2);
    }

    #[test]
    fn fingerprint_is_deterministic_and_bounded() {
        let mol = parse_smiles("c1ccccc1O").unwrap();
        let a = morgan_fingerprint(&mol, 2, 1024);
        let b = morgan_fingerprint(&mol, 2, 1024);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.iter().all(|&bit| bit < 1024));
        assert!(morgan_fingerprint(&mol, 0, 1024).len() <= a.len());
    }
}
