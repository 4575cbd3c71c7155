//! # qcurate
//!
//! A library for curating molecule collections into quantum-chemistry datasets.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that chemistry, pipeline
//! mechanics and user-facing workflows stay independent of each other.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `QCSpec`),
//!   chemistry perception (SMILES, canonical ranking, aromaticity, rotatable
//!   bonds), geometry utilities, and molecule file I/O.
//!
//! - **[`engine`]: The Logic Core.** The `WorkflowComponent` abstraction, the
//!   built-in filter and conformer components, parallel execution over
//!   molecule collections, uniqueness-enforcing results and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The `DatasetFactory` that chains
//!   components into a curation run and the `Dataset` it produces, with
//!   settings and dataset serialization.

pub mod core;
pub mod engine;
pub mod workflows;
