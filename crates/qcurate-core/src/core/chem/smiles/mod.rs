//! Reading and writing SMILES strings.
//!
//! The parser produces molecules with explicit hydrogens. The writer can emit
//! the input atom order, a canonical order, explicit hydrogens, and atom-map
//! numbers. Together they give every molecule a stable text identity.

mod parser;
mod writer;

use crate::core::models::molecule::MoleculeError;
use thiserror::Error;

pub(crate) use parser::implicit_hydrogens;
pub use parser::parse;
pub use writer::write;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    #[error("SMILES string is empty")]
    Empty,
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Unknown element '{symbol}' at position {position}")]
    UnknownElement { symbol: String, position: usize },
    #[error("Bracket atom starting at position {0} is not terminated")]
    UnterminatedBracket(usize),
    #[error("Bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("Unbalanced parenthesis at position {0}")]
    UnbalancedParenthesis(usize),
    #[error("Ring closure {0} is never closed")]
    UnclosedRing(u32),
    #[error("Ring closure {digit} at position {position} has conflicting bond symbols")]
    ConflictingRingBond { digit: u32, position: usize },
    #[error("Quadruple bonds are not supported (position {0})")]
    UnsupportedBond(usize),
    #[error("Invalid molecular graph: {0}")]
    Graph(#[from] MoleculeError),
}

/// Controls how a molecule is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmilesOptions {
    /// Write every hydrogen as its own atom.
    pub explicit_hydrogens: bool,
    /// Give every atom its index + 1 as atom-map number. Implies bracket atoms.
    pub mapped: bool,
    /// Traverse the graph in canonical rank order instead of input order.
    pub canonical: bool,
}

impl SmilesOptions {
    pub fn canonical() -> Self {
        Self {
            canonical: true,
            ..Self::default()
        }
    }

    pub fn mapped() -> Self {
        Self {
            explicit_hydrogens: true,
            mapped: true,
            canonical: true,
        }
    }
}
