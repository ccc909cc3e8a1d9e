//! Periodic table subset used by the SMILES parser and the descriptors.

/// Static data for one chemical element.
#[derive(Debug, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub atomic_number: u8,
    /// Standard atomic weight (Daltons).
    pub average_mass: f64,
    /// Mass of the most abundant isotope.
    pub monoisotopic_mass: f64,
    /// Allowed valences, ascending. Empty for elements without implicit hydrogens.
    pub valences: &'static [u8],
}

macro_rules! element {
    ($sym:literal, $z:literal, $avg:literal, $mono:literal, [$($v:literal),*]) => {
        Element {
            symbol: $sym,
            atomic_number: $z,
            average_mass: $avg,
            monoisotopic_mass: $mono,
            valences: &[$($v),*],
        }
    };
}

static ELEMENTS: &[Element] = &[
    element!("H", 1, 1.008, 1.00782503223, [1]),
    element!("He", 2, 4.0026, 4.00260325413, []),
    element!("Li", 3, 6.94, 7.0160034366, [1]),
    element!("Be", 4, 9.0122, 9.012183065, [2]),
    element!("B", 5, 10.81, 11.00930536, [3]),
    element!("C", 6, 12.011, 12.0, [4]),
    element!("N", 7, 14.007, 14.00307400443, [3, 5]),
    element!("O", 8, 15.999, 15.99491461957, [2]),
    element!("F", 9, 18.998, 18.99840316273, [1]),
    element!("Ne", 10, 20.180, 19.9924401762, []),
    element!("Na", 11, 22.990, 22.989769282, [1]),
    element!("Mg", 12, 24.305, 23.985041697, [2]),
    element!("Al", 13, 26.982, 26.98153853, [3]),
    element!("Si", 14, 28.085, 27.97692653465, [4]),
    element!("P", 15, 30.974, 30.97376199842, [3, 5]),
    element!("S", 16, 32.06, 31.9720711744, [2, 4, 6]),
    element!("Cl", 17, 35.45, 34.968852682, [1]),
    element!("Ar", 18, 39.948, 39.9623831237, []),
    element!("K", 19, 39.098, 38.9637064864, [1]),
    element!("Ca", 20, 40.078, 39.962590863, [2]),
    element!("Cr", 24, 51.996, 51.94050623, []),
    element!("Mn", 25, 54.938, 54.93804391, []),
    element!("Fe", 26, 55.845, 55.93493633, []),
    element!("Co", 27, 58.933, 58.93319429, []),
    element!("Ni", 28, 58.693, 57.93534241, []),
    element!("Cu", 29, 63.546, 62.92959772, []),
    element!("Zn", 30, 65.38, 63.92914201, []),
    element!("Ga", 31, 69.723, 68.9255735, [3]),
    element!("Ge", 32, 72.630, 73.921177761, [4]),
    element!("As", 33, 74.922, 74.92159457, [3, 5]),
    element!("Se", 34, 78.971, 79.9165218, [2, 4, 6]),
    element!("Br", 35, 79.904, 78.9183376, [1]),
    element!("Kr", 36, 83.798, 83.9114977282, []),
    element!("Rb", 37, 85.468, 84.9117897379, [1]),
    element!("Sr", 38, 87.62, 87.9056125, [2]),
    element!("Pd", 46, 106.42, 105.9034804, []),
    element!("Ag", 47, 107.87, 106.9050916, []),
    element!("Cd", 48, 112.41, 113.90336509, []),
    element!("Sn", 50, 118.71, 119.90220163, []),
    element!("Sb", 51, 121.76, 120.903812, [3, 5]),
    element!("Te", 52, 127.60, 129.906222748, [2, 4, 6]),
    element!("I", 53, 126.90, 126.9044719, [1]),
    element!("Xe", 54, 131.29, 131.9041550856, []),
    element!("Cs", 55, 132.91, 132.905451961, [1]),
    element!("Ba", 56, 137.33, 137.905247, [2]),
    element!("Pt", 78, 195.08, 194.9647917, []),
    element!("Au", 79, 196.97, 196.96656879, []),
    element!("Hg", 80, 200.59, 201.9706434, []),
    element!("Tl", 81, 204.38, 204.9744278, []),
    element!("Pb", 82, 207.2, 207.9766525, []),
    element!("Bi", 83, 208.98, 208.9803991, []),
];

/// Symbols that may appear outside brackets.
const ORGANIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Elements that may be written as lowercase aromatic atoms.
const AROMATIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S", "Se", "As"];

impl Element {
    /// Look up an element by its capitalised symbol.
    pub fn from_symbol(symbol: &str) -> Option<&'static Element> {
        ELEMENTS.iter().find(|e| e.symbol == symbol)
    }

    pub fn is_organic_subset(&self) -> bool {
        ORGANIC_SUBSET.contains(&self.symbol)
    }

    pub fn can_be_aromatic(&self) -> bool {
        AROMATIC_SUBSET.contains(&self.symbol)
    }

    /// Carbon and hydrogen are the only non-heteroatoms.
    pub fn is_hetero(&self) -> bool {
        !matches!(self.atomic_number, 1 | 6)
    }

    /// Whether an aromatic atom of this element contributes an extra bond
    /// to the ring system when computing implicit hydrogens.
    pub(crate) fn aromatic_pi_bond(&self) -> bool {
        matches!(self.symbol, "B" | "C" | "N" | "P" | "As")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(Element::from_symbol("Cl").map(|e| e.atomic_number), Some(17));
        assert!(Element::from_symbol("CL").is_none());
        assert!(Element::from_symbol("c").is_none());
    }

    #[test]
    fn subsets() {
        let br = Element::from_symbol("Br").unwrap();
        assert!(br.is_organic_subset());
        assert!(!br.can_be_aromatic());
        let fe = Element::from_symbol("Fe").unwrap();
        assert!(!fe.is_organic_subset());
        assert!(fe.is_hetero());
    }
}
