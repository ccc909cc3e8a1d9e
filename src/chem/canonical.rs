//! Canonical atom ranking and SMILES writing.
//!
//! Ranks come from iterative refinement of per-atom graph invariants. Remaining
//! ties (symmetry-equivalent atoms) are broken one at a time, refining again
//! after each break. The writer then performs two depth-first passes from the
//! lowest-ranked atom of each component, always visiting neighbours in rank
//! order: the first finds ring closures, the second emits the string.

use std::collections::BTreeSet;

use super::mol::{implicit_hydrogens, BondOrder, Mol};

/// Dense ranks (0-based) of the distinct keys, in key order.
fn dense_rank<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let distinct: BTreeSet<K> = keys.iter().cloned().collect();
    let ordered: Vec<K> = distinct.into_iter().collect();
    keys.iter()
        .map(|k| ordered.binary_search(k).unwrap_or_default())
        .collect()
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().collect::<BTreeSet<_>>().len()
}

fn refine(mol: &Mol, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.num_atoms())
            .map(|i| {
                let mut env: Vec<(usize, u8)> = mol
                    .neighbors(i)
                    .map(|(n, b)| (ranks[n], b.order.code()))
                    .collect();
                env.sort_unstable();
                (ranks[i], env)
            })
            .collect();
        let next = dense_rank(&keys);
        if class_count(&next) == class_count(&ranks) {
            return ranks;
        }
        ranks = next;
    }
}

/// Canonical rank of every atom; a permutation of `0..num_atoms`.
pub fn canonical_ranks(mol: &Mol) -> Vec<usize> {
    let invariants: Vec<_> = mol
        .atoms()
        .iter()
        .enumerate()
        .map(|(i, a)| {
            (
                mol.degree(i),
                a.element.atomic_number,
                a.isotope.unwrap_or(0),
                a.charge,
                a.hydrogens,
                a.aromatic,
                mol.atom_in_ring(i),
            )
        })
        .collect();
    let mut ranks = refine(mol, dense_rank(&invariants));

    while class_count(&ranks) < mol.num_atoms() {
        // lowest tied class; its first member keeps the lower rank
        let mut seen = BTreeSet::new();
        let tied = ranks
            .iter()
            .copied()
            .filter(|r| !seen.insert(*r))
            .min()
            .unwrap_or_default();
        let chosen = ranks.iter().position(|&r| r == tied).unwrap_or_default();
        let split: Vec<(usize, bool)> = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| (r, r == tied && i != chosen))
            .collect();
        ranks = refine(mol, dense_rank(&split));
    }
    ranks
}

fn bond_symbol(order: BondOrder, both_aromatic: bool) -> &'static str {
    match order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Quadruple => "$",
    }
}

fn atom_symbol(mol: &Mol, idx: usize) -> String {
    let atom = mol.atom(idx);
    let element = atom.element;
    let symbol = if atom.aromatic {
        element.symbol.to_ascii_lowercase()
    } else {
        element.symbol.to_string()
    };

    let has_multiple = mol
        .neighbors(idx)
        .any(|(_, b)| matches!(b.order, BondOrder::Double | BondOrder::Triple | BondOrder::Quadruple));
    let implicit = implicit_hydrogens(element, atom.aromatic, mol.bond_valence(idx), has_multiple);
    let bare = element.is_organic_subset()
        && atom.charge == 0
        && atom.isotope.is_none()
        && implicit == Some(atom.hydrogens);
    if bare {
        return symbol;
    }

    let mut out = String::from("[");
    if let Some(iso) = atom.isotope {
        out.push_str(&iso.to_string());
    }
    out.push_str(&symbol);
    match atom.hydrogens {
        0 => {}
        1 => out.push('H'),
        h => out.push_str(&format!("H{h}")),
    }
    match atom.charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => out.push_str(&format!("+{c}")),
        c => out.push_str(&format!("-{}", -c)),
    }
    out.push(']');
    out
}

/// Traversal state shared by the two passes.
struct Walk<'a> {
    mol: &'a Mol,
    ranks: Vec<usize>,
    visited: Vec<bool>,
    on_path: Vec<bool>,
    children: Vec<Vec<usize>>,
    /// ring bonds opened at an atom: (partner, order)
    opens: Vec<Vec<(usize, BondOrder)>>,
    /// ring bonds closed at an atom: partner
    closes: Vec<Vec<usize>>,
    digits: BTreeSet<usize>,
    /// digit assigned to the ring bond (opener, closer)
    assigned: Vec<(usize, usize, usize)>,
}

impl<'a> Walk<'a> {
    fn new(mol: &'a Mol, ranks: Vec<usize>) -> Self {
        let n = mol.num_atoms();
        Walk {
            mol,
            ranks,
            visited: vec![false; n],
            on_path: vec![false; n],
            children: vec![Vec::new(); n],
            opens: vec![Vec::new(); n],
            closes: vec![Vec::new(); n],
            digits: BTreeSet::new(),
            assigned: Vec::new(),
        }
    }

    fn sorted_neighbors(&self, atom: usize, parent: Option<usize>) -> Vec<(usize, BondOrder)> {
        let mut nbrs: Vec<(usize, BondOrder)> = self
            .mol
            .neighbors(atom)
            .filter(|(n, _)| Some(*n) != parent)
            .map(|(n, b)| (n, b.order))
            .collect();
        nbrs.sort_by_key(|(n, _)| self.ranks[*n]);
        nbrs
    }

    fn discover(&mut self, atom: usize, parent: Option<usize>) {
        self.visited[atom] = true;
        self.on_path[atom] = true;
        for (nbr, order) in self.sorted_neighbors(atom, parent) {
            if self.on_path[nbr] {
                self.opens[nbr].push((atom, order));
                self.closes[atom].push(nbr);
            } else if !self.visited[nbr] {
                self.children[atom].push(nbr);
                self.discover(nbr, Some(atom));
            }
        }
        self.on_path[atom] = false;
    }

    fn next_digit(&mut self) -> usize {
        let digit = (1..).find(|d| !self.digits.contains(d)).unwrap_or(1);
        self.digits.insert(digit);
        digit
    }

    fn write(&mut self, atom: usize, out: &mut String) {
        let mol = self.mol;
        let aromatic = |i: usize| mol.atom(i).aromatic;
        out.push_str(&atom_symbol(mol, atom));

        for partner in self.closes[atom].clone() {
            let pos = self
                .assigned
                .iter()
                .position(|&(o, c, _)| o == partner && c == atom);
            if let Some(pos) = pos {
                let (_, _, digit) = self.assigned.remove(pos);
                self.digits.remove(&digit);
                push_digit(out, digit);
            }
        }
        for (partner, order) in self.opens[atom].clone() {
            let digit = self.next_digit();
            self.assigned.push((atom, partner, digit));
            out.push_str(bond_symbol(order, aromatic(atom) && aromatic(partner)));
            push_digit(out, digit);
        }

        let children = self.children[atom].clone();
        let last = children.len().saturating_sub(1);
        for (k, child) in children.into_iter().enumerate() {
            let order = mol
                .bond_between(atom, child)
                .map(|b| b.order)
                .unwrap_or(BondOrder::Single);
            let both_aromatic = aromatic(atom) && aromatic(child);
            if k != last {
                out.push('(');
            }
            out.push_str(bond_symbol(order, both_aromatic));
            self.write(child, out);
            if k != last {
                out.push(')');
            }
        }
    }
}

fn push_digit(out: &mut String, digit: usize) {
    if digit < 10 {
        out.push_str(&digit.to_string());
    } else {
        out.push_str(&format!("%{digit:02}"));
    }
}

/// Write the canonical SMILES of `mol`.
///
/// The output depends only on the molecular graph, so re-parsing it and
/// writing again yields the same string.
///
/// ```
/// use molparse::chem::{parse_smiles, to_canonical_smiles};
///
/// let a = to_canonical_smiles(&parse_smiles("OCC").unwrap());
/// let b = to_canonical_smiles(&parse_smiles("C(O)C").unwrap());
/// assert_eq!(a, b);
/// ```
pub fn to_canonical_smiles(mol: &Mol) -> String {
    let ranks = canonical_ranks(mol);
    let mut order: Vec<usize> = (0..mol.num_atoms()).collect();
    order.sort_by_key(|&i| ranks[i]);

    let mut walk = Walk::new(mol, ranks);
    let mut roots = Vec::new();
    for &atom in &order {
        if !walk.visited[atom] {
            roots.push(atom);
            walk.discover(atom, None);
        }
    }

    let mut out = String::new();
    for (k, root) in roots.into_iter().enumerate() {
        if k > 0 {
            out.push('.');
        }
        walk.write(root, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn canon(s: &str) -> String {
        to_canonical_smiles(&parse_smiles(s).unwrap())
    }

    #[test]
    fn equivalent_inputs_agree() {
        assert_eq!(canon("CCO"), canon("OCC"));
        assert_eq!(canon("CC(=O)O"), canon("OC(C)=O"));
        assert_eq!(canon("c1ccccc1O"), canon("Oc1ccccc1"));
        assert_eq!(canon("CC.O"), canon("O.CC"));
    }

    #[test]
    fn canonical_form_is_idempotent() {
        for s in [
            "CCO",
            "c1ccccc1",
            "CC(=O)Oc1ccccc1C(=O)O",
            "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
            "C1CC2CCC1CC2",
            "[NH4+].[Cl-]",
            "c1cc[nH]c1",
            "[13CH3]C#N",
            "C1CCC2CCCCC2C1",
        ] {
            let once = canon(s);
            assert_eq!(canon(&once), once, "input {s}");
        }
    }

    #[test]
    fn ring_bonds_between_aromatic_atoms_keep_single_order() {
        let biphenyl = canon("c1ccccc1-c1ccccc1");
        assert!(biphenyl.contains('-'));
        let mol = parse_smiles(&biphenyl).unwrap();
        let singles = mol.bonds().iter().filter(|b| b.order == BondOrder::Single).count();
        assert_eq!(singles, 1);
    }

    #[test]
    fn bracket_only_when_needed() {
        assert_eq!(canon("[CH4]"), "C");
        assert_eq!(canon("[O-]C"), "C[O-]");
        assert_eq!(canon("C"), "C");
    }

    #[test]
    fn ranks_form_a_permutation() {
        let mol = parse_smiles("CC(C)(C)C").unwrap();
        let mut ranks = canonical_ranks(&mol);
        ranks.sort_unstable();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }
}
