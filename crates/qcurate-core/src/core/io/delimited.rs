use super::Format;
use super::error::Error;
use super::traits::MoleculeFile;
use crate::core::models::molecule::Molecule;
use std::io::{BufRead, Write};

/// Comma-separated tables with a header row.
///
/// The `smiles` column is required and `name` is optional (both matched
/// case-insensitively); any other column is stored as a molecule property.
pub struct CsvFile;

impl MoleculeFile for CsvFile {
    const FORMAT: Format = Format::Csv;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Error> {
        let mut table = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = table.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let smiles_col =
            find("smiles").ok_or_else(|| Error::parse(Format::Csv, 1, "missing 'smiles' column"))?;
        let name_col = find("name");

        let mut molecules = Vec::new();
        for (i, record) in table.records().enumerate() {
            let record = record?;
            let line_no = i + 2;
            let smiles = record.get(smiles_col).unwrap_or_default();
            if smiles.is_empty() {
                continue;
            }
            let mut molecule = Molecule::from_smiles(smiles).map_err(|source| Error::Smiles {
                line: line_no,
                source,
            })?;
            if let Some(name) = name_col.and_then(|col| record.get(col)) {
                molecule.name = name.to_string();
            }
            for (col, value) in record.iter().enumerate() {
                if col != smiles_col && Some(col) != name_col && !value.is_empty() {
                    molecule
                        .properties
                        .insert(headers[col].to_string(), value.to_string());
                }
            }
            molecules.push(molecule);
        }
        Ok(molecules)
    }

    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error> {
        let mut table = csv::Writer::from_writer(writer);
        table.write_record(["smiles", "name"])?;
        for molecule in molecules {
            table.write_record([molecule.canonical_smiles().as_str(), molecule.name.as_str()])?;
        }
        table.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_smiles_name_and_extra_columns() {
        let content = "Name,SMILES,source\nethanol, CCO ,vendor-a\nwater,O,\n";
        let molecules = CsvFile::read_from(&mut Cursor::new(content)).unwrap();
        assert_eq!(molecules.len(), 2);
        assert_eq!(molecules[0].name, "ethanol");
        assert_eq!(molecules[0].formula(), "C2H6O");
        assert_eq!(molecules[0].properties.get("source").unwrap(), "vendor-a");
        assert!(molecules[1].properties.is_empty());
    }

    #[test]
    fn missing_smiles_column_is_a_parse_error() {
        let content = "name,formula\nwater,H2O\n";
        let err = CsvFile::read_from(&mut Cursor::new(content)).unwrap_err();
        assert!(matches!(err, Error::Parse { format: Format::Csv, .. }));
    }

    #[test]
    fn writes_header_and_canonical_rows() {
        let mut ethanol = Molecule::from_smiles("OCC").unwrap();
        ethanol.name = "ethanol".to_string();
        let mut buf = Vec::new();
        CsvFile::write_to(&[ethanol], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["smiles,name", "CCO,ethanol"]);
    }
}
