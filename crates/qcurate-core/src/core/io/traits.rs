use super::Format;
use super::error::Error;
use crate::core::models::molecule::Molecule;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing molecule collections.
///
/// Implementors handle the format-specific parsing and serialization; the path
/// helpers open buffered files and delegate to them.
pub trait MoleculeFile {
    /// The format handled by the implementor, used in error messages.
    const FORMAT: Format;

    /// Reads all molecules from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the format cannot be read. The
    /// default implementation always returns [`Error::UnsupportedReadFormat`].
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Error> {
        let _ = reader;
        Err(Error::UnsupportedReadFormat(Self::FORMAT))
    }

    /// Writes molecules to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error>;

    /// Reads all molecules from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Molecule>, Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes molecules to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(molecules: &[Molecule], path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecules, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
