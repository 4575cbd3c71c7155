use crate::cli::ExportArgs;
use crate::error::Result;
use qcurate::workflows::dataset::Dataset;
use tracing::info;

pub fn run(args: ExportArgs) -> Result<()> {
    info!("Loading dataset from {:?}", &args.dataset);
    let dataset = Dataset::parse_file(&args.dataset)?;
    for path in &args.outputs {
        dataset.molecules_to_file(path, args.mapped)?;
        println!(
            "✓ {} molecule(s) written to {}",
            dataset.n_molecules(),
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcurate::core::io;
    use qcurate::core::models::molecule::Molecule;
    use qcurate::workflows::dataset::ComputeSettings;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Water with one conformer, read from an SDF record.
    fn water(dir: &Path) -> Molecule {
        let path = dir.join("water.sdf");
        let record = [
            "water",
            "  qcurate",
            "",
            "  3  2  0  0  0  0  0  0  0  0999 V2000",
            "    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0",
            "    0.9600    0.0000    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0",
            "   -0.2400    0.9300    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0",
            "  1  2  1  0",
            "  1  3  1  0",
            "M  END",
            "$$$$",
            "",
        ]
        .join("\n");
        fs::write(&path, record).unwrap();
        io::read_molecules(&path).unwrap().remove(0)
    }

    #[test]
    fn writes_every_requested_format() {
        let dir = tempdir().unwrap();
        let mut dataset = Dataset::new("export", "t", "d", ComputeSettings::default());
        dataset.add_molecule("O", water(dir.path())).unwrap();
        dataset
            .add_molecule("CCO", Molecule::from_smiles("CCO").unwrap())
            .unwrap();
        let dataset_path = dir.path().join("dataset.json");
        dataset.export_dataset(&dataset_path).unwrap();

        let outputs = vec![
            dir.path().join("out.smi"),
            dir.path().join("out.sdf"),
            dir.path().join("out.xyz"),
        ];
        run(ExportArgs {
            dataset: dataset_path,
            outputs: outputs.clone(),
            mapped: false,
        })
        .unwrap();

        let smi = fs::read_to_string(&outputs[0]).unwrap();
        assert_eq!(smi.lines().count(), 2);
        let sdf = fs::read_to_string(&outputs[1]).unwrap();
        assert_eq!(sdf.matches("$$$$").count(), 2);
        let xyz = fs::read_to_string(&outputs[2]).unwrap();
        assert!(xyz.starts_with("3\n"));
    }

    #[test]
    fn mapped_export_writes_map_numbers() {
        let dir = tempdir().unwrap();
        let mut dataset = Dataset::new("export", "t", "d", ComputeSettings::default());
        dataset.add_molecule("O", water(dir.path())).unwrap();
        let dataset_path = dir.path().join("dataset.json");
        dataset.export_dataset(&dataset_path).unwrap();

        let output = dir.path().join("mapped.smi");
        run(ExportArgs {
            dataset: dataset_path.clone(),
            outputs: vec![output.clone()],
            mapped: true,
        })
        .unwrap();
        let smi = fs::read_to_string(&output).unwrap();
        assert!(smi.trim_end().ends_with(']'));
        assert!(smi.contains(":3]"));

        let rejected = run(ExportArgs {
            dataset: dataset_path,
            outputs: vec![dir.path().join("mapped.xyz")],
            mapped: true,
        });
        assert!(rejected.is_err());
    }
}
