//! SMILES reader.
//!
//! Supports the organic subset, bracket atoms (`[13CH3+]`, `[nH]`, `[Fe+2]`),
//! explicit bonds `- = # $ : / \`, branches, ring closures (`1`, `%12`) and
//! dot-separated components. Stereo marks are accepted and discarded.

use std::collections::HashMap;

use thiserror::Error;

use super::element::Element;
use super::mol::{implicit_hydrogens, Atom, Bond, BondOrder, Mol};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },
    #[error("unterminated bracket atom starting at position {0}")]
    UnclosedBracket(usize),
    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedBranch(usize),
    #[error("bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("ring closure {0} is never closed")]
    UnclosedRing(u16),
    #[error("ring closure {digit} at position {pos} is invalid")]
    InvalidRingClosure { digit: u16, pos: usize },
    #[error("atom {atom} ({symbol}) exceeds its allowed valence")]
    Valence { atom: usize, symbol: String },
}

struct PendingAtom {
    element: &'static Element,
    aromatic: bool,
    charge: i8,
    isotope: Option<u16>,
    bracket_h: Option<u8>,
}

#[derive(Default)]
struct Builder {
    atoms: Vec<PendingAtom>,
    bonds: Vec<Bond>,
    prev: Option<usize>,
    /// (atom the branch returns to, position of '(')
    branches: Vec<(usize, usize)>,
    bond: Option<(BondOrder, usize)>,
    rings: HashMap<u16, (usize, Option<BondOrder>)>,
}

impl Builder {
    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn add_atom(&mut self, atom: PendingAtom) -> Result<(), SmilesError> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        match (self.prev, self.bond.take()) {
            (Some(p), bond) => {
                let order = bond.map(|(o, _)| o).unwrap_or_else(|| self.default_order(p, idx));
                self.bonds.push(Bond { begin: p, end: idx, order });
            }
            (None, Some((_, bond_pos))) => return Err(SmilesError::DanglingBond(bond_pos)),
            (None, None) => {}
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn set_bond(&mut self, order: BondOrder, pos: usize) -> Result<(), SmilesError> {
        if self.prev.is_none() || self.bond.is_some() {
            return Err(SmilesError::DanglingBond(pos));
        }
        self.bond = Some((order, pos));
        Ok(())
    }

    fn ring_closure(&mut self, digit: u16, pos: usize) -> Result<(), SmilesError> {
        let Some(current) = self.prev else {
            return Err(SmilesError::InvalidRingClosure { digit, pos });
        };
        let order = self.bond.take().map(|(o, _)| o);
        match self.rings.remove(&digit) {
            None => {
                self.rings.insert(digit, (current, order));
            }
            Some((open, open_order)) => {
                let already_bonded = self
                    .bonds
                    .iter()
                    .any(|b| (b.begin == open && b.end == current) || (b.begin == current && b.end == open));
                if open == current || already_bonded {
                    return Err(SmilesError::InvalidRingClosure { digit, pos });
                }
                let order = match (open_order, order) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::InvalidRingClosure { digit, pos });
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => self.default_order(open, current),
                };
                self.bonds.push(Bond { begin: open, end: current, order });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Mol, SmilesError> {
        if let Some((_, pos)) = self.bond {
            return Err(SmilesError::DanglingBond(pos));
        }
        if let Some(&(_, open_pos)) = self.branches.last() {
            return Err(SmilesError::UnbalancedBranch(open_pos));
        }
        if let Some(digit) = self.rings.keys().min() {
            return Err(SmilesError::UnclosedRing(*digit));
        }
        if self.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        let mut valence = vec![0u8; self.atoms.len()];
        let mut multiple = vec![false; self.atoms.len()];
        for b in &self.bonds {
            for end in [b.begin, b.end] {
                valence[end] = valence[end].saturating_add(b.order.valence());
                if matches!(b.order, BondOrder::Double | BondOrder::Triple | BondOrder::Quadruple) {
                    multiple[end] = true;
                }
            }
        }

        let atoms = self
            .atoms
            .into_iter()
            .enumerate()
            .map(|(i, a)| {
                let hydrogens = match a.bracket_h {
                    Some(h) => h,
                    None => implicit_hydrogens(a.element, a.aromatic, valence[i], multiple[i])
                        .ok_or_else(|| SmilesError::Valence {
                            atom: i,
                            symbol: a.element.symbol.to_string(),
                        })?,
                };
                Ok(Atom {
                    element: a.element,
                    aromatic: a.aromatic,
                    charge: a.charge,
                    isotope: a.isotope,
                    hydrogens,
                })
            })
            .collect::<Result<Vec<_>, SmilesError>>()?;

        Ok(Mol::new(atoms, self.bonds))
    }
}

/// Parse a SMILES string into a [`Mol`].
///
/// # Examples
///
/// ```
/// use molparse::chem::parse_smiles;
///
/// let ethanol = parse_smiles("CCO").unwrap();
/// assert_eq!(ethanol.num_atoms(), 3);
/// assert_eq!(ethanol.atom(0).hydrogens, 3);
/// assert!(parse_smiles("not_a_molecule").is_err());
/// ```
pub fn parse_smiles(smiles: &str) -> Result<Mol, SmilesError> {
    let chars: Vec<char> = smiles.trim().chars().collect();
    let mut b = Builder::default();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .map(|off| i + off)
                    .ok_or(SmilesError::UnclosedBracket(i))?;
                let atom = parse_bracket(&chars[i + 1..close], i + 1)?;
                b.add_atom(atom)?;
                i = close + 1;
            }
            '(' => {
                let Some(prev) = b.prev else {
                    return Err(SmilesError::UnbalancedBranch(i));
                };
                if b.bond.is_some() {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos: i });
                }
                b.branches.push((prev, i));
                i += 1;
            }
            ')' => {
                if b.bond.is_some() {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos: i });
                }
                let (prev, _) = b.branches.pop().ok_or(SmilesError::UnbalancedBranch(i))?;
                b.prev = Some(prev);
                i += 1;
            }
            '.' => {
                if b.bond.is_some() || b.prev.is_none() {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos: i });
                }
                b.prev = None;
                i += 1;
            }
            '-' | '/' | '\\' => {
                b.set_bond(BondOrder::Single, i)?;
                i += 1;
            }
            '=' => {
                b.set_bond(BondOrder::Double, i)?;
                i += 1;
            }
            '#' => {
                b.set_bond(BondOrder::Triple, i)?;
                i += 1;
            }
            '$' => {
                b.set_bond(BondOrder::Quadruple, i)?;
                i += 1;
            }
            ':' => {
                b.set_bond(BondOrder::Aromatic, i)?;
                i += 1;
            }
            '0'..='9' => {
                b.ring_closure(c as u16 - '0' as u16, i)?;
                i += 1;
            }
            '%' => {
                let digits: String = chars[i + 1..].iter().take(2).collect();
                if digits.len() != 2 || !digits.chars().all(|d| d.is_ascii_digit()) {
                    return Err(SmilesError::UnexpectedChar { ch: c, pos: i });
                }
                let digit = digits
                    .parse()
                    .map_err(|_| SmilesError::UnexpectedChar { ch: c, pos: i })?;
                b.ring_closure(digit, i)?;
                i += 3;
            }
            _ => {
                let (atom, len) = parse_organic(&chars[i..], i)?;
                b.add_atom(atom)?;
                i += len;
            }
        }
    }

    b.finish()
}

/// Organic-subset atom outside brackets. Returns the atom and consumed length.
fn parse_organic(chars: &[char], pos: usize) -> Result<(PendingAtom, usize), SmilesError> {
    let c = chars[0];
    let two: Option<String> = chars.get(1).map(|n| [c, *n].iter().collect());
    let (symbol, aromatic, len) = match two.as_deref() {
        Some("Cl") | Some("Br") => (two.clone().unwrap_or_default(), false, 2),
        _ if c.is_ascii_uppercase() => (c.to_string(), false, 1),
        _ if c.is_ascii_lowercase() => (c.to_ascii_uppercase().to_string(), true, 1),
        _ => return Err(SmilesError::UnexpectedChar { ch: c, pos }),
    };
    let element = Element::from_symbol(&symbol)
        .filter(|e| e.is_organic_subset() && (!aromatic || e.can_be_aromatic()))
        .ok_or_else(|| SmilesError::UnknownElement {
            symbol: chars[..len].iter().collect(),
            pos,
        })?;
    Ok((
        PendingAtom {
            element,
            aromatic,
            charge: 0,
            isotope: None,
            bracket_h: None,
        },
        len,
    ))
}

/// Contents of `[...]`: isotope? symbol chirality? hcount? charge? class?
fn parse_bracket(chars: &[char], pos: usize) -> Result<PendingAtom, SmilesError> {
    let mut i = 0usize;
    let unexpected = |i: usize| SmilesError::UnexpectedChar {
        ch: chars.get(i).copied().unwrap_or(']'),
        pos: pos + i,
    };

    let isotope_digits: String = chars.iter().take_while(|c| c.is_ascii_digit()).collect();
    i += isotope_digits.len();
    let isotope = if isotope_digits.is_empty() {
        None
    } else {
        Some(isotope_digits.parse().map_err(|_| unexpected(0))?)
    };

    let first = *chars.get(i).ok_or_else(|| unexpected(i))?;
    let aromatic = first.is_ascii_lowercase();
    if !first.is_ascii_alphabetic() {
        return Err(unexpected(i));
    }
    let mut symbol = first.to_ascii_uppercase().to_string();
    i += 1;
    if let Some(&next) = chars.get(i) {
        if next.is_ascii_lowercase() {
            let candidate = format!("{symbol}{next}");
            if Element::from_symbol(&candidate).is_some() {
                symbol = candidate;
                i += 1;
            }
        }
    }
    let element = Element::from_symbol(&symbol)
        .filter(|e| !aromatic || e.can_be_aromatic())
        .ok_or_else(|| SmilesError::UnknownElement {
            symbol: symbol.clone(),
            pos,
        })?;

    // chirality: @, @@, @TH1, @AL2, @SP3, @TB12, @OH30
    if chars.get(i) == Some(&'@') {
        i += 1;
        if chars.get(i) == Some(&'@') {
            i += 1;
        } else {
            let class: String = chars[i..].iter().take(2).collect();
            if matches!(class.as_str(), "TH" | "AL" | "SP" | "TB" | "OH") {
                i += 2;
                i += chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
            }
        }
    }

    let mut bracket_h = 0u8;
    if chars.get(i) == Some(&'H') {
        i += 1;
        let digits: String = chars[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
        i += digits.len();
        bracket_h = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| unexpected(i))?
        };
    }

    let mut charge: i8 = 0;
    if let Some(&sign_ch @ ('+' | '-')) = chars.get(i) {
        let sign: i8 = if sign_ch == '+' { 1 } else { -1 };
        i += 1;
        let digits: String = chars[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            let mut count = 1i8;
            while chars.get(i) == Some(&sign_ch) {
                count = count.checked_add(1).ok_or_else(|| unexpected(i))?;
                i += 1;
            }
            charge = sign * count;
        } else {
            i += digits.len();
            let magnitude: i8 = digits.parse().map_err(|_| unexpected(i))?;
            charge = sign * magnitude;
        }
    }

    // atom class is accepted and dropped
    if chars.get(i) == Some(&':') {
        i += 1;
        let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(unexpected(i));
        }
        i += digits;
    }

    if i != chars.len() {
        return Err(unexpected(i));
    }

    Ok(PendingAtom {
        element,
        aromatic,
        charge,
        isotope,
        bracket_h: Some(bracket_h),
    })
}
