use super::Format;
use crate::core::chem::smiles::SmilesError;
use crate::core::models::molecule::MoleculeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("invalid SMILES on line {line}: {source}")]
    Smiles { line: usize, source: SmilesError },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),

    #[error("the '{0}' format is not supported for this read operation")]
    UnsupportedReadFormat(Format),

    #[error("the '{0}' format is not supported for this write operation")]
    UnsupportedWriteFormat(Format),

    #[error("cannot infer a molecule format from the file name '{0}'")]
    UnknownExtension(String),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }
}
