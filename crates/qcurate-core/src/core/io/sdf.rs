use super::Format;
use super::error::Error;
use super::traits::MoleculeFile;
use crate::core::chem::stereo;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::io::{BufRead, Write};
use tracing::debug;

/// MDL V2000 structure-data files with any number of records.
///
/// Hydrogens are taken as written, so records should carry explicit
/// hydrogens. A record flagged `2D` in its header, or whose coordinates are all
/// zero, is read without a conformer; otherwise stereocentres and double-bond
/// configuration are taken from the coordinates. Data items become molecule
/// properties.
///
/// On output every conformer becomes its own record; a molecule without
/// conformers is written once with zero coordinates and a `2D` flag.
pub struct SdfFile;

const PROGRAM_NAME: &str = "qcurate";

impl MoleculeFile for SdfFile {
    const FORMAT: Format = Format::Sdf;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Error> {
        let mut molecules = Vec::new();
        let mut block: Vec<(usize, String)> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim_end() == "$$$$" {
                if block.iter().any(|(_, l)| !l.trim().is_empty()) {
                    molecules.push(parse_record(&block)?);
                }
                block.clear();
            } else {
                block.push((i + 1, line));
            }
        }
        if block.iter().any(|(_, l)| !l.trim().is_empty()) {
            molecules.push(parse_record(&block)?);
        }
        Ok(molecules)
    }

    fn write_to(molecules: &[Molecule], writer: &mut impl Write) -> Result<(), Error> {
        for molecule in molecules {
            if molecule.conformers().is_empty() {
                let flat = vec![Point3::origin(); molecule.n_atoms()];
                write_record(writer, molecule, &flat, "2D")?;
            } else {
                for conformer in molecule.conformers() {
                    write_record(writer, molecule, conformer, "3D")?;
                }
            }
        }
        Ok(())
    }
}

fn parse_record(lines: &[(usize, String)]) -> Result<Molecule, Error> {
    let first_line = lines.first().map_or(1, |(ln, _)| *ln);
    if lines.len() < 4 {
        return Err(Error::parse(
            Format::Sdf,
            first_line,
            "SDF record must contain at least a header and counts line",
        ));
    }

    let mut molecule = Molecule::with_name(lines[0].1.trim());
    let is_2d = lines[1].1.get(20..22) == Some("2D");

    let (counts_line_no, counts_line) = (&lines[3].0, &lines[3].1);
    if counts_line.contains("V3000") {
        return Err(Error::parse(Format::Sdf, *counts_line_no, "V3000 is not supported"));
    }
    let atom_count: usize =
        fixed_field(counts_line, 0..3, *counts_line_no, "invalid atom count")?;
    let bond_count: usize =
        fixed_field(counts_line, 3..6, *counts_line_no, "invalid bond count")?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;
    if lines.len() < props_start {
        return Err(Error::parse(
            Format::Sdf,
            lines.last().map_or(*counts_line_no, |(ln, _)| *ln),
            "SDF record ended before atoms/bonds were fully specified",
        ));
    }

    let mut coords = Vec::with_capacity(atom_count);
    for (ln, raw) in &lines[atom_start..bond_start] {
        let padded = format!("{raw:<40}");
        let column = |range: std::ops::Range<usize>, what: &str| {
            padded.get(range).map(str::trim).ok_or_else(|| {
                Error::parse(Format::Sdf, *ln, format!("malformed {what} column in atom line"))
            })
        };
        let coord = |range: std::ops::Range<usize>, axis: &str| {
            column(range, axis)?.parse::<f64>().map_err(|_| {
                Error::parse(Format::Sdf, *ln, format!("invalid {axis} coordinate in atom line"))
            })
        };
        let point = Point3::new(coord(0..10, "x")?, coord(10..20, "y")?, coord(20..30, "z")?);
        let symbol = column(31..34, "element")?;
        let element: Element = symbol.parse().map_err(|_| {
            Error::parse(Format::Sdf, *ln, format!("unknown element symbol '{symbol}'"))
        })?;
        let charge_code = column(36..39, "charge")?.parse::<i8>().unwrap_or(0);
        let charge = match charge_code {
            1 => 3,
            2 => 2,
            3 => 1,
            5 => -1,
            6 => -2,
            7 => -3,
            _ => 0,
        };
        molecule.add_atom(Atom::new(element).with_charge(charge));
        coords.push(point);
    }

    for (ln, raw) in &lines[bond_start..props_start] {
        let a1: usize = fixed_field(raw, 0..3, *ln, "invalid first atom index")?;
        let a2: usize = fixed_field(raw, 3..6, *ln, "invalid second atom index")?;
        let code: u8 = fixed_field(raw, 6..9, *ln, "invalid bond order value")?;
        let order = match code {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Aromatic,
            _ => {
                return Err(Error::parse(Format::Sdf, *ln, "unsupported bond order in bond line"));
            }
        };
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(Error::parse(
                Format::Sdf,
                *ln,
                "bond references atom outside declared range",
            ));
        }
        molecule
            .add_bond(a1 - 1, a2 - 1, order)
            .map_err(|e| Error::parse(Format::Sdf, *ln, e.to_string()))?;
        if order == BondOrder::Aromatic {
            for idx in [a1 - 1, a2 - 1] {
                if let Some(atom) = molecule.atom_mut(idx) {
                    atom.is_aromatic = true;
                }
            }
        }
    }

    let mut rest = lines[props_start..].iter();
    let mut charges_reset = false;
    for (ln, raw) in rest.by_ref() {
        if raw.starts_with("M  END") {
            break;
        }
        if let Some(entries) = raw.strip_prefix("M  CHG") {
            if !charges_reset {
                for idx in 0..molecule.n_atoms() {
                    if let Some(atom) = molecule.atom_mut(idx) {
                        atom.formal_charge = 0;
                    }
                }
                charges_reset = true;
            }
            for (idx, value) in property_pairs(entries, *ln, atom_count)? {
                if let Some(atom) = molecule.atom_mut(idx) {
                    atom.formal_charge = i8::try_from(value).map_err(|_| {
                        Error::parse(Format::Sdf, *ln, "formal charge out of range")
                    })?;
                }
            }
        } else if let Some(entries) = raw.strip_prefix("M  ISO") {
            for (idx, value) in property_pairs(entries, *ln, atom_count)? {
                if let Some(atom) = molecule.atom_mut(idx) {
                    atom.isotope = u16::try_from(value).ok();
                }
            }
        }
    }

    let mut current_key: Option<String> = None;
    let mut current_value: Vec<&str> = Vec::new();
    for (_, raw) in rest {
        if let Some(header) = raw.strip_prefix('>') {
            if let Some(key) = current_key.take() {
                molecule.properties.insert(key, current_value.join("\n"));
            }
            current_value.clear();
            current_key = header
                .split_once('<')
                .and_then(|(_, tail)| tail.split_once('>'))
                .map(|(key, _)| key.to_string());
        } else if raw.trim().is_empty() {
            if let Some(key) = current_key.take() {
                molecule.properties.insert(key, current_value.join("\n"));
            }
            current_value.clear();
        } else if current_key.is_some() {
            current_value.push(raw);
        }
    }
    if let Some(key) = current_key {
        molecule.properties.insert(key, current_value.join("\n"));
    }

    let all_zero = coords.iter().all(|p| p.coords.norm_squared() == 0.0);
    if is_2d || all_zero {
        debug!(name = %molecule.name, "SDF record has no 3D coordinates");
    } else {
        molecule.add_conformer(coords)?;
        stereo::assign_from_conformer(&mut molecule, 0);
    }
    Ok(molecule)
}

fn fixed_field<T: std::str::FromStr>(
    line: &str,
    range: std::ops::Range<usize>,
    line_no: usize,
    details: &str,
) -> Result<T, Error> {
    line.get(range)
        .unwrap_or_default()
        .trim()
        .parse::<T>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, details))
}

/// Parses the `nn8 aaa vvv ...` tail of an `M  CHG`/`M  ISO` line into
/// zero-based atom indices and values.
fn property_pairs(
    entries: &str,
    line_no: usize,
    atom_count: usize,
) -> Result<Vec<(usize, i32)>, Error> {
    let tokens: Vec<i32> = entries
        .split_whitespace()
        .map(|t| t.parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, "invalid property block entry"))?;
    let Some((&count, pairs)) = tokens.split_first() else {
        return Err(Error::parse(Format::Sdf, line_no, "empty property block"));
    };
    if count < 0 || pairs.len() != 2 * count as usize {
        return Err(Error::parse(Format::Sdf, line_no, "property block count mismatch"));
    }
    pairs
        .chunks(2)
        .map(|pair| {
            let idx = pair[0];
            if idx < 1 || idx as usize > atom_count {
                return Err(Error::parse(
                    Format::Sdf,
                    line_no,
                    "property block references atom outside declared range",
                ));
            }
            Ok((idx as usize - 1, pair[1]))
        })
        .collect()
}

fn write_record(
    writer: &mut impl Write,
    molecule: &Molecule,
    coords: &[Point3<f64>],
    dimension: &str,
) -> Result<(), Error> {
    writeln!(writer, "{}", molecule.name)?;
    writeln!(writer, "  {PROGRAM_NAME:<8}{:<10}{dimension}", "")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        molecule.n_atoms(),
        molecule.n_bonds()
    )?;

    for (atom, point) in molecule.atoms().iter().zip(coords) {
        writeln!(
            writer,
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
            point.x,
            point.y,
            point.z,
            atom.element.symbol()
        )?;
    }

    for bond in molecule.bonds() {
        let code = match bond.order {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        };
        writeln!(writer, "{:>3}{:>3}{:>3}  0  0  0  0", bond.i + 1, bond.j + 1, code)?;
    }

    let charged: Vec<(usize, i32)> = molecule
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, a)| a.formal_charge != 0)
        .map(|(i, a)| (i + 1, i32::from(a.formal_charge)))
        .collect();
    write_property_lines(writer, "CHG", &charged)?;

    let isotopes: Vec<(usize, i32)> = molecule
        .atoms()
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.isotope.map(|iso| (i + 1, i32::from(iso))))
        .collect();
    write_property_lines(writer, "ISO", &isotopes)?;

    writeln!(writer, "M  END")?;
    for (key, value) in &molecule.properties {
        writeln!(writer, "> <{key}>")?;
        writeln!(writer, "{value}")?;
        writeln!(writer)?;
    }
    writeln!(writer, "$$$$")?;
    Ok(())
}

fn write_property_lines(
    writer: &mut impl Write,
    tag: &str,
    entries: &[(usize, i32)],
) -> Result<(), Error> {
    for chunk in entries.chunks(8) {
        write!(writer, "M  {tag}{:>3}", chunk.len())?;
        for (idx, value) in chunk {
            write!(writer, " {idx:>3} {value:>3}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ACETATE: &str = "\
acetate
  manual  3D

  7  6  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000    1.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000   -1.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
   -0.4000    1.0000    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
   -0.4000   -0.5000    0.9000 H   0  0  0  0  0  0  0  0  0  0  0  0
   -0.4000   -0.5000   -0.9000 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  2  0  0  0  0
  2  4  1  0  0  0  0
  1  5  1  0  0  0  0
  1  6  1  0  0  0  0
  1  7  1  0  0  0  0
M  CHG  1   4  -1
M  END
> <source>
vendor-a

$$$$
";

    #[test]
    fn reads_record_with_charges_and_data_items() {
        let molecules = SdfFile::read_from(&mut Cursor::new(ACETATE)).unwrap();
        assert_eq!(molecules.len(), 1);
        let acetate = &molecules[0];
        assert_eq!(acetate.name, "acetate");
        assert_eq!(acetate.total_charge(), -1);
        assert_eq!(acetate.n_conformers(), 1);
        assert_eq!(acetate.properties.get("source").unwrap(), "vendor-a");
        assert_eq!(acetate.canonical_smiles(), "CC([O-])=O");
    }

    #[test]
    fn written_records_read_back_per_conformer() {
        let mut acetate = SdfFile::read_from(&mut Cursor::new(ACETATE)).unwrap().remove(0);
        let mut shifted = acetate.conformers()[0].clone();
        for p in &mut shifted {
            p.x += 1.0;
        }
        acetate.add_conformer(shifted).unwrap();

        let mut buf = Vec::new();
        SdfFile::write_to(&[acetate.clone()], &mut buf).unwrap();
        let read = SdfFile::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read.len(), 2);
        for molecule in &read {
            assert_eq!(molecule.canonical_smiles(), acetate.canonical_smiles());
            assert_eq!(molecule.properties, acetate.properties);
            assert_eq!(molecule.n_conformers(), 1);
        }
        assert!((read[1].conformers()[0][0].x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn molecules_without_conformers_are_written_flat() {
        let mol = Molecule::from_smiles("[NH4+]").unwrap();
        let mut buf = Vec::new();
        SdfFile::write_to(&[mol], &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("M  CHG  1   1   1"));
        let read = SdfFile::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read[0].n_conformers(), 0);
        assert_eq!(read[0].total_charge(), 1);
    }

    #[test]
    fn multibyte_characters_in_atom_lines_are_parse_errors() {
        let content = ACETATE.replacen(
            "    0.0000    0.0000    0.0000 C ",
            "    0.0000    0.0000    0.0000\u{e9}C",
            1,
        );
        assert!(content.contains('\u{e9}'));
        let err = SdfFile::read_from(&mut Cursor::new(content)).unwrap_err();
        assert!(matches!(err, Error::Parse { format: Format::Sdf, line: 5, .. }));
    }

    #[test]
    fn stereocentres_are_read_from_coordinates() {
        let mut mol = Molecule::from_smiles("FC(Cl)Br").unwrap();
        // Carbon at the origin, F above, Cl, Br and H counter-clockwise below.
        let conformer = vec![
            Point3::new(0.0, 0.0, 1.4),
            Point3::origin(),
            Point3::new(1.7, 0.0, -0.6),
            Point3::new(-0.9, 1.6, -0.6),
            Point3::new(-0.5, -0.9, -0.4),
        ];
        let mirrored = conformer.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        mol.add_conformer(conformer).unwrap();
        mol.add_conformer(mirrored).unwrap();

        let mut buf = Vec::new();
        SdfFile::write_to(&[mol], &mut buf).unwrap();
        let read = SdfFile::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read[0].canonical_smiles(), "F[C@H](Cl)Br");
        assert_eq!(read[1].canonical_smiles(), "F[C@@H](Cl)Br");
    }

    #[test]
    fn truncated_record_is_a_parse_error() {
        let content = "name\n  manual  3D\n\n  3  2  0  0  0  0  0  0  0  0999 V2000\n";
        let err = SdfFile::read_from(&mut Cursor::new(content)).unwrap_err();
        assert!(matches!(err, Error::Parse { format: Format::Sdf, .. }));
    }
}
