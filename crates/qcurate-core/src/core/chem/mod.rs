//! # Cheminformatics
//!
//! Graph algorithms on [`Molecule`](crate::core::models::molecule::Molecule)
//! that give molecules a stable identity and expose the structural features the
//! workflow components filter on.
//!
//! - [`smiles`] - SMILES parsing and writing (input order, canonical, mapped)
//! - [`canon`] - canonical atom ranking
//! - [`aromaticity`] - aromatic ring perception from Kekulé structures
//! - [`perception`] - rings, rotatable bonds, and graph distances
//! - [`stereo`] - tetrahedral and cis/trans configuration
//! - [`embed`] - 3D coordinates from the graph by distance geometry

pub mod aromaticity;
pub mod canon;
pub mod embed;
pub mod perception;
pub mod smiles;
pub mod stereo;
