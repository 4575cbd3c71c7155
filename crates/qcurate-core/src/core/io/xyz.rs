use super::Format;
use super::error::Error;
use super::traits::MoleculeFile;
use crate::core::models::molecule::Molecule;
use std::io::Write;
use tracing::warn;

/// XYZ trajectories, one frame per conformer. Write only.
pub struct XyzFile;

impl MoleculeFile for XyzFile {
    const FORMAT: Format = Format::Xyz;

    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error> {
        for molecule in molecules {
            if molecule.conformers().is_empty() {
                warn!(name = %molecule.name, "Molecule has no conformers; skipping XYZ output");
                continue;
            }
            let total = molecule.n_conformers();
            for (k, conformer) in molecule.conformers().iter().enumerate() {
                writeln!(writer, "{}", molecule.n_atoms())?;
                writeln!(
                    writer,
                    "{} conformer {}/{} {}",
                    molecule.name,
                    k + 1,
                    total,
                    molecule.canonical_smiles()
                )?;
                for (atom, point) in molecule.atoms().iter().zip(conformer) {
                    writeln!(
                        writer,
                        "{:<3}{:>14.6}{:>14.6}{:>14.6}",
                        atom.element.symbol(),
                        point.x,
                        point.y,
                        point.z
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn writes_one_frame_per_conformer() {
        let mut water = Molecule::from_smiles("O").unwrap();
        water.name = "water".to_string();
        let conformer = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.96, 0.0, 0.0),
            Point3::new(-0.24, 0.93, 0.0),
        ];
        water.add_conformer(conformer.clone()).unwrap();
        water.add_conformer(conformer).unwrap();

        let mut buf = Vec::new();
        XyzFile::write_to(&[water, Molecule::from_smiles("C").unwrap()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "water conformer 1/2 O");
        assert!(lines[2].starts_with("O "));
        assert!(lines[3].trim_end().ends_with("0.000000"));
        assert_eq!(lines[6], "water conformer 2/2 O");
    }
}
