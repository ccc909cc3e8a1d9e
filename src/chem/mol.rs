//! Molecular graph: atoms, bonds and ring membership.

use std::collections::VecDeque;

use super::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the valence of each end. Aromatic bonds count as one;
    /// the ring's extra bond is added per atom when hydrogens are computed.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    /// Stable small integer used in canonical invariants and hashing.
    pub fn code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 5,
        }
    }

    /// Bond-type channel for adjacency tensors (single, double, triple, aromatic).
    pub fn channel(self) -> usize {
        match self {
            BondOrder::Single => 0,
            BondOrder::Double => 1,
            BondOrder::Triple | BondOrder::Quadruple => 2,
            BondOrder::Aromatic => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Total attached hydrogens (implicit or bracket count).
    pub hydrogens: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// A validated molecule. Atoms are indexed in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Mol {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// atom → [(neighbour, bond index)]
    adjacency: Vec<Vec<(usize, usize)>>,
    ring_bond: Vec<bool>,
}

impl Mol {
    pub(crate) fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (idx, b) in bonds.iter().enumerate() {
            adjacency[b.begin].push((b.end, idx));
            adjacency[b.end].push((b.begin, idx));
        }
        let mut mol = Mol {
            atoms,
            bonds,
            adjacency,
            ring_bond: Vec::new(),
        };
        mol.ring_bond = (0..mol.bonds.len()).map(|b| mol.bond_closes_cycle(b)).collect();
        mol
    }

    /// A bond is in a ring iff its ends stay connected without it.
    fn bond_closes_cycle(&self, bond: usize) -> bool {
        let Bond { begin, end, .. } = self.bonds[bond];
        let mut seen = vec![false; self.atoms.len()];
        let mut queue = VecDeque::from([begin]);
        seen[begin] = true;
        while let Some(a) = queue.pop_front() {
            for &(n, b) in &self.adjacency[a] {
                if b == bond || seen[n] {
                    continue;
                }
                if n == end {
                    return true;
                }
                seen[n] = true;
                queue.push_back(n);
            }
        }
        false
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Neighbours of `atom` with the connecting bond.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[atom].iter().map(move |&(n, b)| (n, &self.bonds[b]))
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Number of non-hydrogen neighbours.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.neighbors(atom)
            .filter(|(n, _)| self.atoms[*n].element.atomic_number > 1)
            .count()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.neighbors(a).find(|(n, _)| *n == b).map(|(_, bond)| bond)
    }

    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.ring_bond[bond]
    }

    pub fn atom_in_ring(&self, atom: usize) -> bool {
        self.adjacency[atom].iter().any(|&(_, b)| self.ring_bond[b])
    }

    /// Sum of bond valence contributions at `atom`, saturating at `u8::MAX`.
    pub fn bond_valence(&self, atom: usize) -> u8 {
        self.neighbors(atom)
            .fold(0u8, |acc, (_, b)| acc.saturating_add(b.order.valence()))
    }

    /// Connected components as lists of atom indices.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut out = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut comp = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(a) = queue.pop_front() {
                for &(n, _) in &self.adjacency[a] {
                    if !seen[n] {
                        seen[n] = true;
                        comp.push(n);
                        queue.push_back(n);
                    }
                }
            }
            out.push(comp);
        }
        out
    }

    /// Cyclomatic number: independent rings in the graph.
    pub fn num_rings(&self) -> usize {
        (self.bonds.len() + self.components().len()).saturating_sub(self.atoms.len())
    }
}

/// Implicit hydrogens for an atom written outside brackets, or `None` when
/// its bonds exceed every allowed valence.
pub(crate) fn implicit_hydrogens(
    element: &Element,
    aromatic: bool,
    bond_valence: u8,
    has_multiple_bond: bool,
) -> Option<u8> {
    if element.valences.is_empty() {
        return Some(0);
    }
    let used = if aromatic && element.aromatic_pi_bond() && !has_multiple_bond {
        bond_valence.saturating_add(1)
    } else {
        bond_valence
    };
    element
        .valences
        .iter()
        .find(|&&v| v >= used)
        .map(|&v| v - used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    #[test]
    fn ring_membership() {
        let mol = parse_smiles("C1CC1CO").unwrap();
        assert!(mol.atom_in_ring(0));
        assert!(mol.atom_in_ring(2));
        assert!(!mol.atom_in_ring(3));
        assert_eq!(mol.num_rings(), 1);
    }

    #[test]
    fn components_split_on_dot() {
        let mol = parse_smiles("CC.O").unwrap();
        assert_eq!(mol.components().len(), 2);
        assert_eq!(mol.num_rings(), 0);
    }

    #[test]
    fn implicit_hydrogen_rules() {
        let c = Element::from_symbol("C").unwrap();
        let s = Element::from_symbol("S").unwrap();
        assert_eq!(implicit_hydrogens(c, false, 1, false), Some(3));
        assert_eq!(implicit_hydrogens(c, true, 2, false), Some(1));
        assert_eq!(implicit_hydrogens(s, true, 2, false), Some(0));
        assert_eq!(implicit_hydrogens(s, false, 3, false), Some(1));
        assert_eq!(implicit_hydrogens(c, false, 5, false), None);
        assert_eq!(implicit_hydrogens(c, true, u8::MAX, false), None);
    }
}
