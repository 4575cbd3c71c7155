use qcurate::core::io::error::Error as MoleculeIoError;
use qcurate::workflows::dataset::DatasetError;
use qcurate::workflows::factory::FactoryError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Failed to read molecules from '{path}': {source}", path = path.display())]
    MoleculeFile {
        path: PathBuf,
        #[source]
        source: MoleculeIoError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
