use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::utils::geometry::calculate_aligned_rmsd;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Heavy-atom RMSD (Å) below which a merged conformer counts as a copy.
const DUPLICATE_CONFORMER_RMSD: f64 = 0.01;

/// The molecules that passed one workflow component and those it removed.
///
/// Unless uniqueness checks are skipped, retained molecules are unique by
/// canonical SMILES: adding a molecule that is already present merges its
/// conformers into the stored copy instead.
#[derive(Debug, Clone)]
pub struct ComponentResult {
    component_name: String,
    molecules: Vec<Molecule>,
    index: HashMap<String, usize>,
    filtered: Vec<Molecule>,
    skip_unique_check: bool,
}

impl ComponentResult {
    pub fn new(component_name: impl Into<String>, skip_unique_check: bool) -> Self {
        Self {
            component_name: component_name.into(),
            molecules: Vec::new(),
            index: HashMap::new(),
            filtered: Vec::new(),
            skip_unique_check,
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Adds a retained molecule. Returns `false` when it duplicated a stored
    /// molecule and was merged into it.
    pub fn add_molecule(&mut self, molecule: Molecule) -> bool {
        if self.skip_unique_check {
            self.molecules.push(molecule);
            return true;
        }

        let key = molecule.canonical_smiles();
        match self.index.get(&key) {
            Some(&position) => {
                debug!(smiles = %key, "Merging duplicate molecule");
                merge_conformers(&mut self.molecules[position], &molecule);
                false
            }
            None => {
                self.index.insert(key, self.molecules.len());
                self.molecules.push(molecule);
                true
            }
        }
    }

    pub fn filter_molecule(&mut self, molecule: Molecule) {
        self.filtered.push(molecule);
    }

    /// Whether a molecule with the same canonical SMILES is already retained.
    pub fn contains(&self, molecule: &Molecule) -> bool {
        self.index.contains_key(&molecule.canonical_smiles())
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn filtered(&self) -> &[Molecule] {
        &self.filtered
    }

    pub fn n_molecules(&self) -> usize {
        self.molecules.len()
    }

    pub fn n_filtered(&self) -> usize {
        self.filtered.len()
    }

    pub fn n_conformers(&self) -> usize {
        self.molecules.iter().map(Molecule::n_conformers).sum()
    }

    /// Splits the result into retained and filtered molecules.
    pub fn into_parts(self) -> (Vec<Molecule>, Vec<Molecule>) {
        (self.molecules, self.filtered)
    }
}

/// Copies the conformers of `incoming` onto `stored`, re-indexed into the
/// stored atom order, skipping those that duplicate a stored conformer.
pub(crate) fn merge_conformers(stored: &mut Molecule, incoming: &Molecule) {
    if incoming.conformers().is_empty() {
        return;
    }
    let Some(mapping) = atom_mapping(stored, incoming) else {
        warn!(
            name = %stored.name,
            "Could not map atoms of a duplicate molecule; its conformers are dropped"
        );
        return;
    };

    let heavy = stored.heavy_atom_indices();
    for conformer in incoming.conformers() {
        let remapped: Conformer = mapping.iter().map(|&j| conformer[j]).collect();
        let heavy_new: Vec<_> = heavy.iter().map(|&i| remapped[i]).collect();
        let is_copy = stored.conformers().iter().any(|existing| {
            let heavy_old: Vec<_> = heavy.iter().map(|&i| existing[i]).collect();
            calculate_aligned_rmsd(&heavy_old, &heavy_new)
                .is_some_and(|rmsd| rmsd < DUPLICATE_CONFORMER_RMSD)
        });
        if !is_copy {
            if let Err(e) = stored.add_conformer(remapped) {
                warn!(error = %e, "Dropping conformer of duplicate molecule");
            }
        }
    }
}

/// For every atom of `stored`, the corresponding atom of `incoming`.
fn atom_mapping(stored: &Molecule, incoming: &Molecule) -> Option<Vec<usize>> {
    if stored.n_atoms() != incoming.n_atoms() {
        return None;
    }
    let stored_ranks = stored.canonical_ranks();
    let incoming_ranks = incoming.canonical_ranks();

    let mut incoming_by_rank = vec![usize::MAX; incoming.n_atoms()];
    for (atom, &rank) in incoming_ranks.iter().enumerate() {
        *incoming_by_rank.get_mut(rank)? = atom;
    }
    let mapping: Vec<usize> = stored_ranks
        .iter()
        .map(|&rank| incoming_by_rank.get(rank).copied())
        .collect::<Option<_>>()?;

    let consistent = mapping.iter().enumerate().all(|(s, &i)| {
        stored.atoms()[s].element == incoming.atoms()[i].element
    });
    consistent.then_some(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn ethanol_with_conformer(order_reversed: bool, shift: f64) -> Molecule {
        let smiles = if order_reversed { "OCC" } else { "CCO" };
        let mut mol = Molecule::from_smiles(smiles).unwrap();
        let conformer: Conformer = (0..mol.n_atoms())
            .map(|i| Point3::new(i as f64 * 1.1, (i % 3) as f64 * shift, (i % 2) as f64))
            .collect();
        mol.add_conformer(conformer).unwrap();
        mol
    }

    #[test]
    fn unique_molecules_are_all_kept_in_order() {
        let mut result = ComponentResult::new("test", false);
        assert!(result.add_molecule(Molecule::from_smiles("CCO").unwrap()));
        assert!(result.add_molecule(Molecule::from_smiles("c1ccccc1").unwrap()));
        assert_eq!(result.n_molecules(), 2);
        assert_eq!(result.molecules()[0].canonical_smiles(), "CCO");
        assert_eq!(result.component_name(), "test");
    }

    #[test]
    fn duplicates_are_merged_with_their_conformers() {
        let mut result = ComponentResult::new("test", false);
        result.add_molecule(ethanol_with_conformer(false, 0.7));
        assert!(!result.add_molecule(ethanol_with_conformer(true, 1.3)));
        assert_eq!(result.n_molecules(), 1);
        assert_eq!(result.n_conformers(), 2);
    }

    #[test]
    fn identical_conformers_are_not_duplicated() {
        let mut result = ComponentResult::new("test", false);
        let first = ethanol_with_conformer(false, 0.7);
        let mut moved = first.clone();
        let shifted: Conformer = moved.conformers()[0]
            .iter()
            .map(|p| p + Vector3::new(3.0, 0.0, 0.0))
            .collect();
        moved.set_conformers(vec![shifted]).unwrap();

        result.add_molecule(first);
        result.add_molecule(moved);
        assert_eq!(result.n_conformers(), 1);
    }

    #[test]
    fn skip_unique_check_keeps_duplicates() {
        let mut result = ComponentResult::new("test", true);
        result.add_molecule(Molecule::from_smiles("CCO").unwrap());
        result.add_molecule(Molecule::from_smiles("OCC").unwrap());
        assert_eq!(result.n_molecules(), 2);
    }

    #[test]
    fn filtered_molecules_are_recorded() {
        let mut result = ComponentResult::new("test", false);
        result.filter_molecule(Molecule::from_smiles("[Na+]").unwrap());
        let (kept, filtered) = result.into_parts();
        assert!(kept.is_empty());
        assert_eq!(filtered.len(), 1);
    }
}
