//! # Workflows Module
//!
//! The user-facing layer: a [`factory::DatasetFactory`] holds QC
//! specifications, compute settings and an ordered list of workflow
//! components, runs molecule collections through them and packages the
//! survivors into a [`dataset::Dataset`].
//!
//! ## Key Capabilities
//!
//! - **Staged filtering** where each component only sees what the previous one kept
//! - **Audit trail** of every removed molecule, grouped by the stage that removed it
//! - **Reproducible settings** exported to and imported from JSON or TOML
//! - **Dataset export** as JSON and as SMILES, SDF or XYZ molecule files

pub mod dataset;
pub mod factory;
