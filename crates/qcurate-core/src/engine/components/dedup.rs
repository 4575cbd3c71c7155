use crate::core::models::molecule::Molecule;
use crate::engine::component::{
    ComponentProperties, Processed, WorkflowComponent, report_removed,
};
use crate::engine::error::WorkflowError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::result::ComponentResult;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Collapses molecules with the same canonical SMILES into one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deduplication {
    /// Merge the conformers of duplicates into the retained molecule.
    pub include_conformers: bool,
}

impl Default for Deduplication {
    fn default() -> Self {
        Self {
            include_conformers: true,
        }
    }
}

impl WorkflowComponent for Deduplication {
    fn name(&self) -> &'static str {
        "Deduplication"
    }

    fn description(&self) -> &'static str {
        "Remove duplicate molecules, optionally merging their conformers."
    }

    fn fail_reason(&self) -> &'static str {
        "This molecule is a duplicate of another molecule in the set."
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            process_parallel: false,
            produces_duplicates: true,
        }
    }

    fn process(&self, molecule: Molecule) -> Processed {
        Processed::pass(molecule)
    }

    fn apply(
        &self,
        molecules: Vec<Molecule>,
        _processors: Option<usize>,
        reporter: &ProgressReporter,
    ) -> Result<ComponentResult, WorkflowError> {
        let n_input = molecules.len();
        let mut result = ComponentResult::new(self.name(), false);
        reporter.report(Progress::TaskStart {
            total_steps: n_input as u64,
        });
        for molecule in molecules {
            if self.include_conformers || !result.contains(&molecule) {
                result.add_molecule(molecule);
            }
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        report_removed(self, n_input - result.n_molecules(), reporter);

        info!(
            input = n_input,
            unique = result.n_molecules(),
            "Deduplication finished."
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn with_conformer(smiles: &str, offset: f64) -> Molecule {
        let mut mol = Molecule::from_smiles(smiles).unwrap();
        let conformer = (0..mol.n_atoms())
            .map(|i| Point3::new(i as f64, (i * i) as f64 * offset, 0.0))
            .collect();
        mol.add_conformer(conformer).unwrap();
        mol
    }

    #[test]
    fn collapses_spellings_of_the_same_molecule() {
        let molecules = vec![
            Molecule::from_smiles("CCO").unwrap(),
            Molecule::from_smiles("OCC").unwrap(),
            Molecule::from_smiles("C1=CC=CC=C1").unwrap(),
            Molecule::from_smiles("c1ccccc1").unwrap(),
        ];
        let result = Deduplication::default()
            .apply(molecules, None, &ProgressReporter::new())
            .unwrap();
        assert_eq!(result.n_molecules(), 2);
        assert_eq!(result.n_filtered(), 0);
    }

    #[test]
    fn stereoisomers_are_distinct_molecules() {
        let molecules = ["F[C@H](Cl)Br", "F[C@@H](Cl)Br", "C/C=C/C", "C/C=C\\C", "Br[C@@H](F)Cl"]
            .iter()
            .map(|s| Molecule::from_smiles(s).unwrap())
            .collect();
        let result = Deduplication::default()
            .apply(molecules, None, &ProgressReporter::new())
            .unwrap();
        assert_eq!(result.n_molecules(), 4);
        let smiles: Vec<String> =
            result.molecules().iter().map(Molecule::canonical_smiles).collect();
        assert!(smiles.contains(&"F[C@H](Cl)Br".to_string()));
        assert!(smiles.contains(&"F[C@@H](Cl)Br".to_string()));
        assert!(smiles.contains(&"C\\C=C\\C".to_string()));
        assert!(smiles.contains(&"C\\C=C/C".to_string()));
    }

    #[test]
    fn kekule_and_aromatic_azulene_are_duplicates() {
        let molecules = vec![
            Molecule::from_smiles("C1=CC2=CC=CC=CC2=C1").unwrap(),
            Molecule::from_smiles("c1cc2cccccc2c1").unwrap(),
        ];
        let messages = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));
        let result = Deduplication::default().apply(molecules, None, &reporter).unwrap();
        drop(reporter);
        assert_eq!(result.n_molecules(), 1);
        assert_eq!(messages.into_inner().unwrap().len(), 1);
    }

    #[test]
    fn conformers_of_duplicates_are_merged_only_when_requested() {
        let molecules = || vec![with_conformer("CCO", 0.1), with_conformer("CCO", 0.4)];

        let merged = Deduplication::default()
            .apply(molecules(), None, &ProgressReporter::new())
            .unwrap();
        assert_eq!(merged.n_conformers(), 2);

        let first_only = Deduplication {
            include_conformers: false,
        }
        .apply(molecules(), None, &ProgressReporter::new())
        .unwrap();
        assert_eq!(first_only.n_conformers(), 1);
    }
}
