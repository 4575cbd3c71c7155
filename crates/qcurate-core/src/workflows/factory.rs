use super::dataset::{ComputeSettings, Dataset, DatasetError, FilterRecord};
use crate::core::models::molecule::Molecule;
use crate::core::qcspec::{QCSpec, QCSpecError};
use crate::engine::components::Component;
use crate::engine::error::WorkflowError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Invalid QC specification: {0}")]
    QCSpec(#[from] QCSpecError),
    #[error("A QC specification named '{0}' already exists")]
    QCSpecExists(String),
    #[error("The factory has no QC specifications")]
    NoQCSpecifications,
    #[error("Invalid compute settings: {0}")]
    InvalidCompute(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid TOML settings: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("Failed to encode settings as TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Settings files must end in .json or .toml, found '{0}'")]
    UnsupportedExtension(String),
}

/// The two interchangeable encodings of factory settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    pub fn from_path(path: &Path) -> Result<Self, FactoryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Ok(Self::Toml)
        } else {
            Err(FactoryError::UnsupportedExtension(ext.to_string()))
        }
    }

    fn encode<T: Serialize>(self, value: &T) -> Result<String, FactoryError> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(value)? + "\n",
            Self::Toml => toml::to_string_pretty(value)?,
        })
    }

    fn decode<T: for<'de> Deserialize<'de>>(self, text: &str) -> Result<T, FactoryError> {
        Ok(match self {
            Self::Json => serde_json::from_str(text)?,
            Self::Toml => toml::from_str(text)?,
        })
    }
}

/// A workflow on its own, as written by [`DatasetFactory::export_workflow`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkflowFile {
    #[serde(default)]
    workflow: Vec<Component>,
}

/// Builds datasets by running molecules through an ordered workflow.
///
/// The factory holds everything that is not specific to a single dataset:
/// the QC specifications every entry is computed with, the compute settings
/// and the workflow components. It can be saved to and restored from JSON or
/// TOML so that a curation run can be repeated exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetFactory {
    pub compute: ComputeSettings,
    pub qc_specifications: BTreeMap<String, QCSpec>,
    pub workflow: Vec<Component>,
}

impl Default for DatasetFactory {
    fn default() -> Self {
        let spec = QCSpec::default();
        Self {
            compute: ComputeSettings::default(),
            qc_specifications: BTreeMap::from([(spec.spec_name.clone(), spec)]),
            workflow: Vec::new(),
        }
    }
}

impl DatasetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a QC specification, replacing one of the same name only when
    /// `overwrite` is set.
    pub fn add_qc_spec(&mut self, mut spec: QCSpec, overwrite: bool) -> Result<(), FactoryError> {
        spec.normalize();
        spec.validate()?;
        if !overwrite && self.qc_specifications.contains_key(&spec.spec_name) {
            return Err(FactoryError::QCSpecExists(spec.spec_name));
        }
        self.qc_specifications.insert(spec.spec_name.clone(), spec);
        Ok(())
    }

    pub fn get_qc_spec(&self, name: &str) -> Option<&QCSpec> {
        self.qc_specifications.get(name)
    }

    pub fn remove_qc_spec(&mut self, name: &str) -> Option<QCSpec> {
        self.qc_specifications.remove(name)
    }

    pub fn clear_qc_specs(&mut self) {
        self.qc_specifications.clear();
    }

    pub fn n_qc_specs(&self) -> usize {
        self.qc_specifications.len()
    }

    /// Appends a component to the end of the workflow after checking that it
    /// can run with its settings.
    pub fn add_workflow_component(
        &mut self,
        component: impl Into<Component>,
    ) -> Result<(), FactoryError> {
        let component = component.into();
        let inner = component.as_component();
        inner.is_available()?;
        inner.validate()?;
        self.workflow.push(component);
        Ok(())
    }

    /// The first component with the given name.
    pub fn get_workflow_component(&self, name: &str) -> Option<&Component> {
        self.workflow.iter().find(|c| c.name() == name)
    }

    /// Removes every component with the given name; returns whether any was removed.
    pub fn remove_workflow_component(&mut self, name: &str) -> bool {
        let before = self.workflow.len();
        self.workflow.retain(|c| c.name() != name);
        self.workflow.len() != before
    }

    pub fn clear_workflow(&mut self) {
        self.workflow.clear();
    }

    /// Writes the full factory settings; the format follows the extension.
    pub fn export_settings(&self, path: impl AsRef<Path>) -> Result<(), FactoryError> {
        let path = path.as_ref();
        let text = SettingsFormat::from_path(path)?.encode(self)?;
        fs::write(path, text)?;
        info!(path = %path.display(), "Factory settings exported.");
        Ok(())
    }

    /// Loads factory settings written by [`export_settings`](Self::export_settings).
    pub fn import_settings(path: impl AsRef<Path>) -> Result<Self, FactoryError> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)?;
        let factory: Self = format.decode(&fs::read_to_string(path)?)?;
        factory.checked()
    }

    pub fn export_workflow(&self, path: impl AsRef<Path>) -> Result<(), FactoryError> {
        let path = path.as_ref();
        let file = WorkflowFile {
            workflow: self.workflow.clone(),
        };
        fs::write(path, SettingsFormat::from_path(path)?.encode(&file)?)?;
        Ok(())
    }

    /// Loads the components of a workflow file, appending them to the current
    /// workflow or replacing it when `clear_existing` is set.
    pub fn import_workflow(
        &mut self,
        path: impl AsRef<Path>,
        clear_existing: bool,
    ) -> Result<(), FactoryError> {
        let path = path.as_ref();
        let file: WorkflowFile =
            SettingsFormat::from_path(path)?.decode(&fs::read_to_string(path)?)?;
        for component in &file.workflow {
            component.as_component().validate()?;
        }
        if clear_existing {
            self.workflow.clear();
        }
        self.workflow.extend(file.workflow);
        Ok(())
    }

    /// Normalizes and validates settings that were read from a file.
    fn checked(mut self) -> Result<Self, FactoryError> {
        self.compute
            .validate()
            .map_err(FactoryError::InvalidCompute)?;
        let specs = std::mem::take(&mut self.qc_specifications);
        for (key, spec) in specs {
            if key != spec.spec_name {
                warn!(
                    key = %key,
                    name = %spec.spec_name,
                    "QC specification stored under a different name"
                );
            }
            self.add_qc_spec(spec, true)?;
        }
        for component in &self.workflow {
            component.as_component().validate()?;
        }
        Ok(self)
    }

    /// The identifier a molecule is stored under in the dataset.
    pub fn create_index(&self, molecule: &Molecule) -> String {
        molecule.canonical_smiles()
    }

    /// Runs `molecules` through the workflow and packages the survivors.
    ///
    /// Each component sees only the molecules retained by the previous one;
    /// the molecules it removes are recorded in the dataset's filter record for
    /// that stage. `processors` is passed to every component.
    ///
    /// # Errors
    ///
    /// Fails if the factory has no QC specification, its compute settings are
    /// inconsistent, or a component cannot run. Molecules that a component
    /// cannot process are filtered, not reported as errors.
    #[instrument(skip_all, name = "create_dataset", fields(dataset = %dataset_name))]
    pub fn create_dataset(
        &self,
        dataset_name: &str,
        molecules: Vec<Molecule>,
        description: &str,
        tagline: &str,
        processors: Option<usize>,
        reporter: &ProgressReporter,
    ) -> Result<Dataset, FactoryError> {
        if self.qc_specifications.is_empty() {
            return Err(FactoryError::NoQCSpecifications);
        }
        self.compute
            .validate()
            .map_err(FactoryError::InvalidCompute)?;

        let mut compute = self.compute.clone();
        compute.optimization_procedure = compute.procedure();
        compute.torsiondrive = compute.torsiondrive_settings();
        let mut dataset = Dataset::new(dataset_name, tagline, description, compute);
        dataset.qc_specifications = self.qc_specifications.clone();

        info!(
            n_input = molecules.len(),
            n_components = self.workflow.len(),
            "Starting workflow."
        );
        let mut survivors = molecules;
        let total = self.workflow.len();
        for (index, component) in self.workflow.iter().enumerate() {
            let inner = component.as_component();
            reporter.report(Progress::StageStart {
                name: inner.name().to_string(),
                index,
                total,
            });

            let result = inner.apply(survivors, processors, reporter)?;
            let (passed, filtered) = result.into_parts();
            reporter.report(Progress::StageFinish {
                passed: passed.len(),
                filtered: filtered.len(),
            });

            dataset.provenance.extend(inner.provenance());
            dataset.add_filter_record(FilterRecord {
                component: inner.name().to_string(),
                component_settings: component.settings(),
                component_provenance: inner.provenance(),
                molecules: filtered.iter().map(Molecule::canonical_smiles).collect(),
            });
            survivors = passed;
        }

        for molecule in survivors {
            let index = self.create_index(&molecule);
            dataset.add_molecule(index, molecule)?;
        }
        info!(
            n_molecules = dataset.n_molecules(),
            n_records = dataset.n_records(),
            n_filtered = dataset.n_filtered(),
            "Dataset created."
        );
        Ok(dataset)
    }
}
