//! Minimal molecule toolkit: SMILES parsing, canonical SMILES and descriptors.
//!
//! ```text
//!   "OCC"  ──parse_smiles──▶  Mol  ──to_canonical_smiles──▶  "CCO"
//!                              │
//!                              ├──Descriptors::compute──▶ [MolWt, ...]
//!                              └──morgan_fingerprint────▶ set bits
//! ```

pub mod canonical;
pub mod descriptors;
pub mod element;
pub mod mol;
pub mod smiles;

pub use canonical::{canonical_ranks, to_canonical_smiles};
pub use descriptors::{morgan_fingerprint, Descriptors, DESCRIPTOR_NAMES};
pub use element::Element;
pub use mol::{Atom, Bond, BondOrder, Mol};
pub use smiles::{parse_smiles, SmilesError};
