//! Provides input/output functionality for molecule collections.
//!
//! Every supported format implements [`MoleculeFile`](traits::MoleculeFile).
//! [`read_molecules`] and [`write_molecules`] pick the implementation from the
//! file extension.

pub mod delimited;
pub mod error;
pub mod sdf;
pub mod smi;
pub mod traits;
pub mod xyz;

use crate::core::models::molecule::Molecule;
use delimited::CsvFile;
use error::Error;
use sdf::SdfFile;
use serde::{Deserialize, Serialize};
use smi::{MappedSmiFile, SmiFile};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use traits::MoleculeFile;
use xyz::XyzFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Smi,
    Csv,
    Sdf,
    Xyz,
}

impl Format {
    /// Infers the format from a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| Error::UnknownExtension(path.display().to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Smi => "smi",
            Format::Csv => "csv",
            Format::Sdf => "sdf",
            Format::Xyz => "xyz",
        }
    }
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smi" | "smiles" | "txt" => Ok(Format::Smi),
            "csv" => Ok(Format::Csv),
            "sdf" | "mol" | "sd" => Ok(Format::Sdf),
            "xyz" => Ok(Format::Xyz),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Smi => write!(f, "SMILES"),
            Format::Csv => write!(f, "CSV"),
            Format::Sdf => write!(f, "SDF"),
            Format::Xyz => write!(f, "XYZ"),
        }
    }
}

/// Reads every molecule from a file, choosing the reader by extension.
pub fn read_molecules(path: impl AsRef<Path>) -> Result<Vec<Molecule>, Error> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Smi => SmiFile::read_from_path(path),
        Format::Csv => CsvFile::read_from_path(path),
        Format::Sdf => SdfFile::read_from_path(path),
        Format::Xyz => XyzFile::read_from_path(path),
    }
}

/// Writes molecules to a file, choosing the writer by extension.
pub fn write_molecules(path: impl AsRef<Path>, molecules: &[Molecule]) -> Result<(), Error> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Smi => SmiFile::write_to_path(molecules, path),
        Format::Csv => CsvFile::write_to_path(molecules, path),
        Format::Sdf => SdfFile::write_to_path(molecules, path),
        Format::Xyz => XyzFile::write_to_path(molecules, path),
    }
}

/// Writes atom-mapped, explicit-hydrogen SMILES. Only SMILES paths are accepted.
pub fn write_mapped_smiles(path: impl AsRef<Path>, molecules: &[Molecule]) -> Result<(), Error> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Smi => MappedSmiFile::write_to_path(molecules, path),
        other => Err(Error::UnsupportedWriteFormat(other)),
    }
}
