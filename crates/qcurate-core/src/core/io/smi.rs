use super::Format;
use super::error::Error;
use super::traits::MoleculeFile;
use crate::core::models::molecule::Molecule;
use std::io::{BufRead, Write};

/// Plain SMILES files: one molecule per line, optionally followed by a name.
///
/// Blank lines and lines starting with `#` are skipped. Written files hold one
/// canonical SMILES per line.
pub struct SmiFile;

/// SMILES files written with explicit hydrogens and atom map numbers, so that
/// reading them back restores each molecule's atom order.
pub struct MappedSmiFile;

impl MoleculeFile for SmiFile {
    const FORMAT: Format = Format::Smi;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Error> {
        let mut molecules = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let mut fields = content.split_whitespace();
            let Some(smiles) = fields.next() else {
                continue;
            };
            let mut molecule = Molecule::from_smiles(smiles).map_err(|source| Error::Smiles {
                line: line_no,
                source,
            })?;
            molecule.name = fields.collect::<Vec<_>>().join(" ");
            molecules.push(molecule);
        }
        Ok(molecules)
    }

    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error> {
        for molecule in molecules {
            writeln!(writer, "{}", molecule.canonical_smiles())?;
        }
        Ok(())
    }
}

impl MoleculeFile for MappedSmiFile {
    const FORMAT: Format = Format::Smi;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Error> {
        SmiFile::read_from(reader)
    }

    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error> {
        for molecule in molecules {
            writeln!(writer, "{}", molecule.mapped_smiles())?;
        }
        Ok(())
    }
}
