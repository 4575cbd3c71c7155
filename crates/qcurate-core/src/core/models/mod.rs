//! # Core Models Module
//!
//! Data structures that represent the molecules flowing through a curation
//! workflow.
//!
//! ## Key Components
//!
//! - [`element`] - The periodic table subset supported by the library, with masses and valences
//! - [`atom`] - Individual atom representation (element, charge, isotope, aromaticity)
//! - [`topology`] - Bond orders and undirected bonds
//! - [`molecule`] - The molecular graph with explicit hydrogens and its conformers
//!
//! ## Usage
//!
//! ```ignore
//! use qcurate::core::models::molecule::Molecule;
//!
//! let ethanol = Molecule::from_smiles("CCO")?;
//! assert_eq!(ethanol.formula(), "C2H6O");
//! assert_eq!(ethanol.canonical_smiles(), "CCO");
//! ```

pub mod atom;
pub mod element;
pub mod molecule;
pub mod topology;
