use crate::core::chem::perception::rotatable_bonds;
use crate::core::chem::smiles::SmilesError;
use crate::core::io::{self, Format};
use crate::core::models::molecule::{Molecule, MoleculeError};
use crate::core::qcspec::QCSpec;
use crate::engine::result::merge_conformers;
use chrono::{Local, NaiveDate};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Conversion factor from Ångström to Bohr (CODATA 2018).
pub const ANGSTROM_TO_BOHR: f64 = 1.889_726_124_565_062;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    MoleculeIo(#[from] io::error::Error),
    #[error("Dataset files must have a .json extension, found '{0}'")]
    UnsupportedExtension(String),
    #[error("Dataset metadata is incomplete; missing: {}", .0.join(", "))]
    IncompleteMetadata(Vec<&'static str>),
    #[error("Entry '{index}' has an invalid mapped SMILES: {source}")]
    Smiles {
        index: String,
        #[source]
        source: SmilesError,
    },
    #[error("Entry '{index}' is inconsistent: {source}")]
    Entry {
        index: String,
        #[source]
        source: MoleculeError,
    },
}

/// The kind of calculation each dataset entry is submitted for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    #[default]
    Singlepoint,
    Optimization,
    Torsiondrive,
}

impl DatasetType {
    pub fn collection_type(self) -> &'static str {
        match self {
            DatasetType::Singlepoint => "Dataset",
            DatasetType::Optimization => "OptimizationDataset",
            DatasetType::Torsiondrive => "TorsionDriveDataset",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Energy,
    Gradient,
    Hessian,
    Properties,
}

/// Geometry optimizer settings for optimization datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationProcedure {
    pub program: String,
    pub coordsys: String,
    pub enforce: f64,
    pub epsilon: f64,
    pub reset: bool,
    pub qccnv: bool,
}

impl Default for OptimizationProcedure {
    fn default() -> Self {
        Self {
            program: "geometric".to_string(),
            coordsys: "tric".to_string(),
            enforce: 0.1,
            epsilon: 0.0,
            reset: true,
            qccnv: true,
        }
    }
}

/// Dihedral scan settings for torsion drive datasets.
///
/// A single spacing or range applies to every driven dihedral; otherwise the
/// k-th value applies to the k-th dihedral and the last one to any beyond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorsionDriveSettings {
    /// Grid spacing in degrees.
    pub grid_spacing: Vec<i32>,
    /// Inclusive scan limits in degrees; the full circle when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dihedral_ranges: Option<Vec<[i32; 2]>>,
}

impl Default for TorsionDriveSettings {
    fn default() -> Self {
        Self {
            grid_spacing: vec![15],
            dihedral_ranges: None,
        }
    }
}

impl TorsionDriveSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_spacing.is_empty() {
            return Err("torsion drives need at least one grid spacing".to_string());
        }
        if let Some(&spacing) = self
            .grid_spacing
            .iter()
            .find(|&&spacing| spacing <= 0 || 360 % spacing != 0)
        {
            return Err(format!("grid spacing must divide 360 degrees (got {spacing})"));
        }
        let ranges = self.dihedral_ranges.as_deref().unwrap_or_default();
        if let Some([low, high]) = ranges
            .iter()
            .find(|[low, high]| low >= high || *low < -180 || *high > 180)
        {
            return Err(format!(
                "dihedral ranges must lie within [-180, 180] with low < high (got [{low}, {high}])"
            ));
        }
        Ok(())
    }

    /// Scan settings for an entry driving `dihedrals`.
    fn for_dihedrals(&self, dihedrals: Vec<[usize; 4]>) -> TorsionDriveEntry {
        fn per_dihedral<T: Copy>(values: &[T], n: usize) -> Vec<T> {
            (0..n)
                .filter_map(|k| values.get(k).or(values.last()).copied())
                .collect()
        }
        let n = dihedrals.len();
        TorsionDriveEntry {
            grid_spacing: per_dihedral(&self.grid_spacing, n),
            dihedral_ranges: self
                .dihedral_ranges
                .as_deref()
                .map(|ranges| per_dihedral(ranges, n)),
            dihedrals,
        }
    }
}

/// Settings shared by every calculation of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeSettings {
    pub dataset_type: DatasetType,
    pub driver: Driver,
    pub maxiter: u32,
    pub priority: String,
    pub compute_tag: String,
    pub scf_properties: Vec<String>,
    pub dataset_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_procedure: Option<OptimizationProcedure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torsiondrive: Option<TorsionDriveSettings>,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            dataset_type: DatasetType::Singlepoint,
            driver: Driver::Energy,
            maxiter: 200,
            priority: "normal".to_string(),
            compute_tag: "openff".to_string(),
            scf_properties: ["dipole", "quadrupole", "wiberg_lowdin_indices", "mayer_indices"]
                .map(String::from)
                .to_vec(),
            dataset_tags: vec!["openff".to_string()],
            optimization_procedure: None,
            torsiondrive: None,
        }
    }
}

impl ComputeSettings {
    /// Checks the settings for consistency with the dataset type.
    pub fn validate(&self) -> Result<(), String> {
        if self.maxiter == 0 {
            return Err("maxiter must be at least 1".to_string());
        }
        if self.dataset_type != DatasetType::Singlepoint && self.driver != Driver::Gradient {
            return Err(format!(
                "{} datasets require the gradient driver, not '{:?}'",
                self.dataset_type.collection_type(),
                self.driver
            ));
        }
        if let Some(settings) = &self.torsiondrive {
            settings.validate()?;
        }
        Ok(())
    }

    /// The optimizer settings in effect; torsion drives optimize every grid point.
    pub fn procedure(&self) -> Option<OptimizationProcedure> {
        match self.dataset_type {
            DatasetType::Singlepoint => None,
            DatasetType::Optimization | DatasetType::Torsiondrive => {
                Some(self.optimization_procedure.clone().unwrap_or_default())
            }
        }
    }

    /// The scan settings in effect, if the dataset is a torsion drive dataset.
    pub fn torsiondrive_settings(&self) -> Option<TorsionDriveSettings> {
        (self.dataset_type == DatasetType::Torsiondrive)
            .then(|| self.torsiondrive.clone().unwrap_or_default())
    }
}

/// Descriptive information required before a dataset can be submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub submitter: String,
    pub creation_date: NaiveDate,
    pub collection_type: String,
    pub long_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description_url: Option<String>,
    pub elements: BTreeSet<String>,
}

impl Metadata {
    pub fn new(dataset_type: DatasetType, long_description: impl Into<String>) -> Self {
        let submitter = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        Self {
            submitter,
            creation_date: Local::now().date_naive(),
            collection_type: dataset_type.collection_type().to_string(),
            long_description: long_description.into(),
            long_description_url: None,
            elements: BTreeSet::new(),
        }
    }
}

/// Identifiers and derived properties of an entry's molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAttributes {
    pub canonical_smiles: String,
    pub canonical_explicit_hydrogen_smiles: String,
    pub canonical_isomeric_explicit_hydrogen_mapped_smiles: String,
    pub molecular_formula: String,
    pub molecular_weight: f64,
}

/// One conformer in QCSchema molecule layout; geometry is flattened and in Bohr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QCSchemaMolecule {
    pub symbols: Vec<String>,
    pub geometry: Vec<f64>,
    /// `(atom, atom, bond order)` triples.
    pub connectivity: Vec<(usize, usize, f64)>,
    pub molecular_charge: f64,
    pub molecular_multiplicity: u32,
}

impl QCSchemaMolecule {
    fn from_conformer(molecule: &Molecule, conformer: &[Point3<f64>]) -> Self {
        let electrons: i64 = molecule
            .atoms()
            .iter()
            .map(|atom| i64::from(atom.element.atomic_number()))
            .sum::<i64>()
            - i64::from(molecule.total_charge());
        Self {
            symbols: molecule
                .atoms()
                .iter()
                .map(|atom| atom.element.symbol().to_string())
                .collect(),
            geometry: conformer
                .iter()
                .flat_map(|p| [p.x, p.y, p.z])
                .map(|c| c * ANGSTROM_TO_BOHR)
                .collect(),
            connectivity: molecule
                .bonds()
                .iter()
                .map(|bond| (bond.i, bond.j, bond.order.as_f64()))
                .collect(),
            molecular_charge: f64::from(molecule.total_charge()),
            molecular_multiplicity: if electrons.rem_euclid(2) == 0 { 1 } else { 2 },
        }
    }

    /// The geometry converted back to Ångström points.
    pub fn conformer(&self) -> Vec<Point3<f64>> {
        self.geometry
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]) / ANGSTROM_TO_BOHR)
            .collect()
    }
}

/// The dihedrals a torsion drive entry scans and the grid they are scanned on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorsionDriveEntry {
    /// Atom quadruples in the entry's mapped atom order.
    pub dihedrals: Vec<[usize; 4]>,
    /// Spacing in degrees, one per dihedral.
    pub grid_spacing: Vec<i32>,
    /// Scan limits in degrees, one per dihedral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dihedral_ranges: Option<Vec<[i32; 2]>>,
}

/// One dihedral per rotatable bond, each defined by the lowest-index heavy
/// neighbor on either side of the bond.
pub fn driven_dihedrals(molecule: &Molecule) -> Vec<[usize; 4]> {
    let outer = |atom: usize, partner: usize| {
        molecule
            .neighbors(atom)
            .filter(|&n| n != partner && !molecule.atoms()[n].element.is_hydrogen())
            .min()
    };
    rotatable_bonds(molecule)
        .into_iter()
        .filter_map(|bond_idx| {
            let bond = molecule.bonds()[bond_idx];
            Some([outer(bond.i, bond.j)?, bond.i, bond.j, outer(bond.j, bond.i)?])
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub index: String,
    pub name: String,
    pub attributes: EntryAttributes,
    pub initial_molecules: Vec<QCSchemaMolecule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torsiondrive: Option<TorsionDriveEntry>,
}

impl DatasetEntry {
    pub fn from_molecule(index: impl Into<String>, molecule: &Molecule) -> Self {
        let index = index.into();
        if molecule.conformers().is_empty() {
            warn!(index = %index, "Adding an entry without any conformers");
        }
        Self {
            name: if molecule.name.is_empty() {
                index.clone()
            } else {
                molecule.name.clone()
            },
            attributes: EntryAttributes {
                canonical_smiles: molecule.canonical_smiles(),
                canonical_explicit_hydrogen_smiles: molecule.canonical_explicit_hydrogen_smiles(),
                canonical_isomeric_explicit_hydrogen_mapped_smiles: molecule.mapped_smiles(),
                molecular_formula: molecule.formula(),
                molecular_weight: molecule.molecular_weight(),
            },
            initial_molecules: molecule
                .conformers()
                .iter()
                .map(|conformer| QCSchemaMolecule::from_conformer(molecule, conformer))
                .collect(),
            properties: molecule.properties.clone(),
            torsiondrive: None,
            index,
        }
    }

    /// Rebuilds the molecule, in mapped atom order, with every stored conformer.
    pub fn to_molecule(&self) -> Result<Molecule, DatasetError> {
        let mapped = &self.attributes.canonical_isomeric_explicit_hydrogen_mapped_smiles;
        let mut molecule = Molecule::from_smiles(mapped).map_err(|source| DatasetError::Smiles {
            index: self.index.clone(),
            source,
        })?;
        molecule.name = self.name.clone();
        molecule.properties = self.properties.clone();
        for schema in &self.initial_molecules {
            molecule
                .add_conformer(schema.conformer())
                .map_err(|source| DatasetError::Entry {
                    index: self.index.clone(),
                    source,
                })?;
        }
        Ok(molecule)
    }
}

/// The molecules one workflow stage removed, with the settings it ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRecord {
    pub component: String,
    pub component_settings: serde_json::Value,
    pub component_provenance: BTreeMap<String, String>,
    /// Canonical SMILES of the removed molecules.
    pub molecules: Vec<String>,
}

/// The curated output of a workflow, ready to be submitted for computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_name: String,
    pub dataset_tagline: String,
    pub description: String,
    pub metadata: Metadata,
    pub compute: ComputeSettings,
    pub qc_specifications: BTreeMap<String, QCSpec>,
    #[serde(default)]
    pub provenance: BTreeMap<String, String>,
    #[serde(default)]
    pub dataset: BTreeMap<String, DatasetEntry>,
    #[serde(default)]
    pub filtered_molecules: Vec<FilterRecord>,
}

impl Dataset {
    pub fn new(
        dataset_name: impl Into<String>,
        dataset_tagline: impl Into<String>,
        description: impl Into<String>,
        compute: ComputeSettings,
    ) -> Self {
        let description = description.into();
        Self {
            dataset_name: dataset_name.into(),
            dataset_tagline: dataset_tagline.into(),
            metadata: Metadata::new(compute.dataset_type, description.clone()),
            description,
            compute,
            qc_specifications: BTreeMap::new(),
            provenance: BTreeMap::new(),
            dataset: BTreeMap::new(),
            filtered_molecules: Vec::new(),
        }
    }

    /// Adds a molecule under `index`. Conformers of a molecule whose index is
    /// already present are merged into the existing entry.
    pub fn add_molecule(
        &mut self,
        index: impl Into<String>,
        molecule: Molecule,
    ) -> Result<(), DatasetError> {
        let index = index.into();
        for element in molecule.elements() {
            self.metadata.elements.insert(element.symbol().to_string());
        }

        let stored = match self.dataset.get(&index) {
            Some(existing) => {
                debug!(index = %index, "Merging conformers into an existing entry");
                let mut stored = existing.to_molecule()?;
                merge_conformers(&mut stored, &molecule);
                stored
            }
            None => molecule,
        };
        let mut entry = DatasetEntry::from_molecule(index.clone(), &stored);
        if let Some(settings) = self.compute.torsiondrive_settings() {
            let dihedrals = driven_dihedrals(&stored);
            if dihedrals.is_empty() {
                warn!(index = %index, "Torsion drive entry has no rotatable bonds to drive");
            }
            entry.torsiondrive = Some(settings.for_dihedrals(dihedrals));
        }
        self.dataset.insert(index, entry);
        Ok(())
    }

    pub fn add_filter_record(&mut self, record: FilterRecord) {
        self.filtered_molecules.push(record);
    }

    pub fn n_molecules(&self) -> usize {
        self.dataset.len()
    }

    /// The number of calculations the dataset will create, one per conformer.
    pub fn n_records(&self) -> usize {
        self.dataset.values().map(|e| e.initial_molecules.len()).sum()
    }

    pub fn n_filtered(&self) -> usize {
        self.filtered_molecules.iter().map(|r| r.molecules.len()).sum()
    }

    pub fn n_components(&self) -> usize {
        self.filtered_molecules.len()
    }

    pub fn n_qc_specs(&self) -> usize {
        self.qc_specifications.len()
    }

    /// `(component name, canonical SMILES)` for every filtered molecule.
    pub fn filtered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filtered_molecules.iter().flat_map(|record| {
            record
                .molecules
                .iter()
                .map(move |smiles| (record.component.as_str(), smiles.as_str()))
        })
    }

    /// Rebuilds every entry's molecule, in index order.
    pub fn molecules(&self) -> Result<Vec<Molecule>, DatasetError> {
        self.dataset.values().map(DatasetEntry::to_molecule).collect()
    }

    /// Names the metadata fields that still need a value.
    pub fn validate_metadata(&self) -> Result<(), DatasetError> {
        let mut missing = Vec::new();
        if self.dataset_name.trim().is_empty() {
            missing.push("dataset_name");
        }
        if self.dataset_tagline.trim().is_empty() {
            missing.push("dataset_tagline");
        }
        if self.metadata.submitter.trim().is_empty() {
            missing.push("submitter");
        }
        if self.metadata.long_description.trim().is_empty() {
            missing.push("long_description");
        }
        if self
            .metadata
            .long_description_url
            .as_deref()
            .is_none_or(|url| url.trim().is_empty())
        {
            missing.push("long_description_url");
        }
        if self.metadata.elements.is_empty() {
            missing.push("elements");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::IncompleteMetadata(missing))
        }
    }

    /// Writes the dataset as pretty-printed JSON.
    #[instrument(skip_all, fields(dataset = %self.dataset_name))]
    pub fn export_dataset(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        check_json_extension(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!(n_molecules = self.n_molecules(), "Dataset exported.");
        Ok(())
    }

    /// Reads a dataset previously written by [`export_dataset`](Self::export_dataset).
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        check_json_extension(path)?;
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes every molecule to a file whose format follows the extension
    /// (`.smi`, `.sdf`, `.xyz`, `.csv`).
    ///
    /// With `mapped`, SMILES files hold the atom-mapped explicit-hydrogen
    /// SMILES of each entry instead of the canonical SMILES. Other formats
    /// cannot be written mapped.
    pub fn molecules_to_file(
        &self,
        path: impl AsRef<Path>,
        mapped: bool,
    ) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let molecules = self.molecules()?;
        if mapped {
            io::write_mapped_smiles(path, &molecules)?;
        } else {
            io::write_molecules(path, &molecules)?;
        }
        info!(
            format = %format,
            mapped,
            n_molecules = molecules.len(),
            path = %path.display(),
            "Molecules written."
        );
        Ok(())
    }
}

fn check_json_extension(path: &Path) -> Result<(), DatasetError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(()),
        other => Err(DatasetError::UnsupportedExtension(
            other.unwrap_or_default().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn water(offset: f64) -> Molecule {
        let mut mol = Molecule::from_smiles("O").unwrap();
        mol.name = "water".to_string();
        mol.add_conformer(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.96, offset, 0.0),
            Point3::new(-0.24, 0.93, 0.0),
        ])
        .unwrap();
        mol
    }

    fn dataset() -> Dataset {
        let mut dataset =
            Dataset::new("test", "A test set", "Testing.", ComputeSettings::default());
        dataset
            .qc_specifications
            .insert("default".to_string(), QCSpec::default());
        dataset
    }

    #[test]
    fn entries_hold_identifiers_and_bohr_geometry() {
        let mut ds = dataset();
        ds.add_molecule("O", water(0.0)).unwrap();

        let entry = &ds.dataset["O"];
        assert_eq!(entry.name, "water");
        assert_eq!(entry.attributes.canonical_smiles, "O");
        assert_eq!(entry.attributes.molecular_formula, "H2O");
        let schema = &entry.initial_molecules[0];
        assert_eq!(schema.symbols, vec!["O", "H", "H"]);
        assert!((schema.geometry[3] - 0.96 * ANGSTROM_TO_BOHR).abs() < 1e-12);
        assert_eq!(schema.molecular_multiplicity, 1);
        assert_eq!(schema.connectivity.len(), 2);
        assert_eq!(ds.metadata.elements, BTreeSet::from(["H".to_string(), "O".to_string()]));
    }

    #[test]
    fn radicals_are_doublets() {
        let mut mol = Molecule::from_smiles("[CH3]").unwrap();
        mol.add_conformer(vec![Point3::origin(); 4]).unwrap();
        let entry = DatasetEntry::from_molecule("[CH3]", &mol);
        assert_eq!(entry.initial_molecules[0].molecular_multiplicity, 2);
    }

    fn ethanol(shift: f64) -> Molecule {
        let mut mol = Molecule::from_smiles("CCO").unwrap();
        let conformer = (0..mol.n_atoms())
            .map(|i| Point3::new(i as f64 * 1.1, (i % 3) as f64 * shift, (i % 2) as f64))
            .collect();
        mol.add_conformer(conformer).unwrap();
        mol
    }

    #[test]
    fn adding_the_same_index_merges_conformers() {
        let mut ds = dataset();
        ds.add_molecule("CCO", ethanol(0.7)).unwrap();
        ds.add_molecule("CCO", ethanol(1.3)).unwrap();
        ds.add_molecule("CCO", ethanol(1.3)).unwrap();
        assert_eq!(ds.n_molecules(), 1);
        assert_eq!(ds.n_records(), 2);
    }

    #[test]
    fn entry_round_trips_to_molecule() {
        let mol = water(0.1);
        let entry = DatasetEntry::from_molecule("O", &mol);
        let rebuilt = entry.to_molecule().unwrap();
        assert_eq!(rebuilt.formula(), "H2O");
        assert_eq!(rebuilt.name, "water");
        let (a, b) = (&mol.conformers()[0], &rebuilt.conformers()[0]);
        for (p, q) in a.iter().zip(b) {
            assert!(nalgebra::distance(p, q) < 1e-9);
        }
    }

    #[test]
    fn filter_records_are_counted() {
        let mut ds = dataset();
        ds.add_filter_record(FilterRecord {
            component: "ElementFilter".to_string(),
            component_settings: serde_json::json!({"type": "ElementFilter"}),
            component_provenance: BTreeMap::new(),
            molecules: vec!["[Na+]".to_string(), "[Cl-]".to_string()],
        });
        assert_eq!(ds.n_components(), 1);
        assert_eq!(ds.n_filtered(), 2);
        let filtered: Vec<_> = ds.filtered().collect();
        assert_eq!(filtered[0], ("ElementFilter", "[Na+]"));
    }

    #[test]
    fn metadata_validation_lists_missing_fields() {
        let mut ds = dataset();
        ds.metadata.submitter = String::new();
        match ds.validate_metadata() {
            Err(DatasetError::IncompleteMetadata(missing)) => {
                assert!(missing.contains(&"submitter"));
                assert!(missing.contains(&"long_description_url"));
                assert!(missing.contains(&"elements"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        ds.metadata.submitter = "someone".to_string();
        ds.metadata.long_description_url = Some("https://example.org/data".to_string());
        ds.add_molecule("O", water(0.0)).unwrap();
        assert!(ds.validate_metadata().is_ok());
    }

    #[test]
    fn export_and_parse_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        let mut ds = dataset();
        ds.add_molecule("O", water(0.0)).unwrap();
        ds.export_dataset(&path).unwrap();

        let parsed = Dataset::parse_file(&path).unwrap();
        assert_eq!(parsed.dataset_name, "test");
        assert_eq!(parsed.n_molecules(), 1);
        assert_eq!(parsed.qc_specifications["default"], QCSpec::default());
        assert_eq!(parsed.dataset["O"].attributes, ds.dataset["O"].attributes);
    }

    #[test]
    fn rejects_non_json_paths() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            dataset().export_dataset(dir.path().join("dataset.yaml")),
            Err(DatasetError::UnsupportedExtension(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn molecules_export_to_smiles_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.smi");
        let mut ds = dataset();
        ds.add_molecule("O", water(0.0)).unwrap();
        ds.add_molecule("CCO", Molecule::from_smiles("CCO").unwrap()).unwrap();
        ds.molecules_to_file(&path, false).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("CCO"));
        assert!(lines[1].starts_with('O'));
    }

    #[test]
    fn mapped_smiles_export_reproduces_the_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapped.smi");
        let mut ds = dataset();
        ds.add_molecule("CCO", Molecule::from_smiles("OCC").unwrap()).unwrap();
        ds.molecules_to_file(&path, true).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mapped = written.lines().next().unwrap();
        assert_eq!(
            mapped,
            ds.dataset["CCO"].attributes.canonical_isomeric_explicit_hydrogen_mapped_smiles
        );
        assert!(mapped.contains(":1]"));
        assert_eq!(Molecule::from_smiles(mapped).unwrap().canonical_smiles(), "CCO");
    }

    #[test]
    fn mapped_export_is_limited_to_smiles_files() {
        let dir = tempdir().unwrap();
        let mut ds = dataset();
        ds.add_molecule("O", water(0.0)).unwrap();
        let result = ds.molecules_to_file(dir.path().join("mapped.sdf"), true);
        assert!(matches!(
            result,
            Err(DatasetError::MoleculeIo(io::error::Error::UnsupportedWriteFormat(Format::Sdf)))
        ));
    }

    fn torsiondrive_compute() -> ComputeSettings {
        ComputeSettings {
            dataset_type: DatasetType::Torsiondrive,
            driver: Driver::Gradient,
            ..Default::default()
        }
    }

    #[test]
    fn torsiondrive_entries_drive_each_rotatable_bond() {
        let mut ds = Dataset::new("td", "t", "d", torsiondrive_compute());
        assert_eq!(ds.metadata.collection_type, "TorsionDriveDataset");
        let butanol = Molecule::from_smiles("CCCCO").unwrap();
        ds.add_molecule("CCCCO", butanol).unwrap();

        let entry = ds.dataset["CCCCO"].torsiondrive.as_ref().unwrap();
        assert_eq!(entry.dihedrals, vec![[0, 1, 2, 3], [1, 2, 3, 4]]);
        assert_eq!(entry.grid_spacing, vec![15, 15]);
        assert!(entry.dihedral_ranges.is_none());

        let rebuilt = ds.dataset["CCCCO"].to_molecule().unwrap();
        for &[a, b, c, d] in &entry.dihedrals {
            assert!(rebuilt.bond_between(a, b).is_some());
            assert!(rebuilt.bond_between(b, c).is_some());
            assert!(rebuilt.bond_between(c, d).is_some());
        }
    }

    #[test]
    fn torsiondrive_settings_are_spread_over_the_dihedrals() {
        let settings = TorsionDriveSettings {
            grid_spacing: vec![30],
            dihedral_ranges: Some(vec![[-90, 90], [0, 180]]),
        };
        let entry = settings.for_dihedrals(vec![[0, 1, 2, 3]; 3]);
        assert_eq!(entry.grid_spacing, vec![30, 30, 30]);
        assert_eq!(entry.dihedral_ranges, Some(vec![[-90, 90], [0, 180], [0, 180]]));
    }

    #[test]
    fn rigid_molecules_get_an_empty_scan() {
        let mut ds = Dataset::new("td", "t", "d", torsiondrive_compute());
        ds.add_molecule("c1ccccc1", Molecule::from_smiles("c1ccccc1").unwrap())
            .unwrap();
        let entry = ds.dataset["c1ccccc1"].torsiondrive.as_ref().unwrap();
        assert!(entry.dihedrals.is_empty());
    }

    #[test]
    fn torsiondrive_settings_are_validated() {
        let mut compute = torsiondrive_compute();
        assert!(compute.validate().is_ok());
        compute.torsiondrive = Some(TorsionDriveSettings {
            grid_spacing: vec![7],
            dihedral_ranges: None,
        });
        assert!(compute.validate().is_err());
        compute.torsiondrive = Some(TorsionDriveSettings {
            grid_spacing: vec![15],
            dihedral_ranges: Some(vec![[-200, 0]]),
        });
        assert!(compute.validate().is_err());
        compute.torsiondrive = None;
        compute.driver = Driver::Energy;
        assert!(compute.validate().is_err());
        assert!(ComputeSettings::default().torsiondrive_settings().is_none());
    }

    #[test]
    fn optimization_requires_gradient_driver() {
        let mut compute = ComputeSettings {
            dataset_type: DatasetType::Optimization,
            ..Default::default()
        };
        assert!(compute.validate().is_err());
        compute.driver = Driver::Gradient;
        assert!(compute.validate().is_ok());
        assert_eq!(compute.procedure().unwrap().program, "geometric");
    }
}
