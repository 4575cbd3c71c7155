//! # Core Module
//!
//! Stateless building blocks shared by the workflow engine: the molecular
//! model, the chemistry algorithms that give molecules an identity, molecule
//! file formats, and quantum-chemistry specifications.
//!
//! - **Molecular Representation** ([`models`]) - elements, atoms, bonds, and
//!   molecules with conformers
//! - **Cheminformatics** ([`chem`]) - SMILES, canonical ranking, aromaticity,
//!   stereochemistry, ring/rotor perception, and 3D embedding
//! - **File I/O** ([`io`]) - SMILES, CSV, SDF, and XYZ molecule files
//! - **QC Specifications** ([`qcspec`]) - validated method/basis/program bundles
//! - **Geometry** ([`utils`]) - rotations and RMSD on conformers

pub mod chem;
pub mod io;
pub mod models;
pub mod qcspec;
pub mod utils;
