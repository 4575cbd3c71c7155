use crate::cli::SettingsCommands;
use crate::error::{CliError, Result};
use qcurate::engine::components::{
    Deduplication, ElementFilter, MolecularWeightFilter, RotorFilter, StandardConformerGenerator,
};
use qcurate::workflows::factory::DatasetFactory;
use std::path::Path;
use tracing::info;

pub fn run(command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Init {
            output,
            with_workflow,
            force,
        } => init(&output, with_workflow, force),
        SettingsCommands::Convert { input, output } => convert(&input, &output),
    }
}

/// The factory written by `settings init`.
pub fn default_factory(with_workflow: bool) -> Result<DatasetFactory> {
    let mut factory = DatasetFactory::new();
    if with_workflow {
        factory.add_workflow_component(Deduplication::default())?;
        factory.add_workflow_component(ElementFilter::default())?;
        factory.add_workflow_component(MolecularWeightFilter::default())?;
        factory.add_workflow_component(RotorFilter::default())?;
        factory.add_workflow_component(StandardConformerGenerator::default())?;
    }
    Ok(factory)
}

fn init(output: &Path, with_workflow: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(CliError::Argument(format!(
            "'{}' already exists; use --force to overwrite it",
            output.display()
        )));
    }
    default_factory(with_workflow)?.export_settings(output)?;
    println!("✓ Default settings written to {}", output.display());
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    info!("Converting settings {:?} -> {:?}", input, output);
    DatasetFactory::import_settings(input)?.export_settings(output)?;
    println!("✓ Settings converted to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        init(&path, true, false).unwrap();
        assert!(matches!(init(&path, false, false), Err(CliError::Argument(_))));
        init(&path, false, true).unwrap();
        assert!(DatasetFactory::import_settings(&path).unwrap().workflow.is_empty());
    }

    #[test]
    fn default_workflow_ends_with_conformer_generation() {
        let factory = default_factory(true).unwrap();
        let names: Vec<&str> = factory.workflow.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            [
                "Deduplication",
                "ElementFilter",
                "MolecularWeightFilter",
                "RotorFilter",
                "StandardConformerGenerator",
            ]
        );
    }

    #[test]
    fn convert_preserves_the_factory() {
        let dir = tempdir().unwrap();
        let toml_path = dir.path().join("settings.toml");
        let json_path = dir.path().join("settings.json");
        init(&toml_path, true, false).unwrap();
        convert(&toml_path, &json_path).unwrap();
        assert_eq!(
            DatasetFactory::import_settings(&json_path).unwrap(),
            default_factory(true).unwrap()
        );
    }
}
