use super::settings::default_factory;
use crate::cli::CreateArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qcurate::core::io;
use qcurate::engine::progress::ProgressReporter;
use qcurate::workflows::factory::DatasetFactory;
use tracing::{info, warn};

pub fn run(args: CreateArgs, processors: Option<usize>) -> Result<()> {
    let factory = match &args.settings {
        Some(path) => {
            info!("Loading factory settings from {:?}", path);
            DatasetFactory::import_settings(path)?
        }
        None => {
            info!("No settings file given; using the default factory and workflow.");
            default_factory(true)?
        }
    };

    let mut molecules = Vec::new();
    for path in &args.inputs {
        let read = io::read_molecules(path).map_err(|source| CliError::MoleculeFile {
            path: path.clone(),
            source,
        })?;
        info!("Read {} molecule(s) from {:?}", read.len(), path);
        molecules.extend(read);
    }
    if molecules.is_empty() {
        return Err(CliError::Argument(
            "no molecules were read from the input files".to_string(),
        ));
    }

    println!(
        "Running {} molecule(s) through {} workflow component(s)...",
        molecules.len(),
        factory.workflow.len()
    );
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut dataset = factory.create_dataset(
        &args.name,
        molecules,
        &args.description,
        &args.tagline,
        processors,
        &reporter,
    )?;

    if let Some(submitter) = args.submitter {
        dataset.metadata.submitter = submitter;
    }
    if let Some(url) = args.url {
        dataset.metadata.long_description_url = Some(url);
    }
    if let Err(e) = dataset.validate_metadata() {
        warn!("{e}");
    }

    dataset.export_dataset(&args.output)?;
    println!(
        "✓ Dataset '{}' with {} molecule(s) and {} record(s) written to {}",
        dataset.dataset_name,
        dataset.n_molecules(),
        dataset.n_records(),
        args.output.display()
    );
    if dataset.n_filtered() > 0 {
        println!("  {} molecule(s) were filtered out.", dataset.n_filtered());
    }

    for path in &args.exports {
        dataset.molecules_to_file(path, args.mapped)?;
        println!("  Molecules written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcurate::engine::components::{Deduplication, ElementFilter};
    use qcurate::workflows::dataset::Dataset;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn args(inputs: Vec<PathBuf>, settings: Option<PathBuf>, output: PathBuf) -> CreateArgs {
        CreateArgs {
            inputs,
            settings,
            output,
            name: "cli test".to_string(),
            tagline: "tagline".to_string(),
            description: "description".to_string(),
            submitter: Some("tester".to_string()),
            url: None,
            exports: Vec::new(),
            mapped: false,
        }
    }

    #[test]
    fn creates_a_dataset_from_smiles_and_settings() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.smi");
        fs::write(&input, "CCO ethanol\nOCC\n[Na+].[Cl-] salt\n").unwrap();

        let mut factory = DatasetFactory::new();
        factory.add_workflow_component(ElementFilter::default()).unwrap();
        factory.add_workflow_component(Deduplication::default()).unwrap();
        let settings = dir.path().join("settings.toml");
        factory.export_settings(&settings).unwrap();

        let output = dir.path().join("dataset.json");
        let mut create = args(vec![input], Some(settings), output.clone());
        create.exports.push(dir.path().join("kept.smi"));
        run(create, Some(1)).unwrap();

        let dataset = Dataset::parse_file(&output).unwrap();
        assert_eq!(dataset.dataset_name, "cli test");
        assert_eq!(dataset.metadata.submitter, "tester");
        assert_eq!(dataset.n_molecules(), 1);
        assert_eq!(dataset.n_filtered(), 1);
        let kept = fs::read_to_string(dir.path().join("kept.smi")).unwrap();
        assert_eq!(kept.lines().count(), 1);
    }

    #[test]
    fn default_workflow_embeds_conformers() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.smi");
        fs::write(&input, "BrCCCO bromopropanol\nOCCCBr\n").unwrap();

        let output = dir.path().join("dataset.json");
        let mut create = args(vec![input], None, output.clone());
        create.exports.push(dir.path().join("mapped.smi"));
        create.mapped = true;
        run(create, Some(1)).unwrap();

        let dataset = Dataset::parse_file(&output).unwrap();
        assert_eq!(dataset.n_molecules(), 1);
        assert!(dataset.n_records() >= 1);
        assert_eq!(dataset.n_components(), 5);
        let mapped = fs::read_to_string(dir.path().join("mapped.smi")).unwrap();
        assert!(mapped.contains(":1]"));
    }

    #[test]
    fn empty_inputs_are_an_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.smi");
        fs::write(&input, "# nothing here\n").unwrap();
        let result = run(args(vec![input], None, dir.path().join("out.json")), None);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn unreadable_inputs_name_the_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.smi");
        let result = run(args(vec![missing.clone()], None, dir.path().join("out.json")), None);
        match result {
            Err(CliError::MoleculeFile { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
