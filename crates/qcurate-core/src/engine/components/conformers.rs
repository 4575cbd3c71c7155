use crate::core::chem::embed::embed;
use crate::core::chem::perception::{moving_side, rotatable_bonds, topological_distances};
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::utils::geometry::{calculate_aligned_rmsd, rotate_about_bond};
use crate::engine::component::{ComponentProperties, Processed, WorkflowComponent};
use crate::engine::error::WorkflowError;
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const DEFAULT_RMS_CUTOFF: f64 = 0.5;
const TORSION_STEP_DEGREES: f64 = 60.0;
const ATTEMPTS_PER_CONFORMER: usize = 20;
/// Atoms separated by fewer bonds than this are never checked for clashes.
const MIN_CLASH_SEPARATION: usize = 3;

/// Generates a diverse conformer set by driving the rotatable torsions of the
/// input geometry.
///
/// New conformers are built from the first input conformer by rotating every
/// rotatable bond through a random multiple of 60°. Geometries with steric
/// clashes are discarded, and a candidate is kept only if its heavy-atom RMSD
/// to every kept conformer is at least `rms_cutoff`. The input geometry is
/// always the first conformer of the result. Molecules without coordinates
/// are first embedded in 3D by distance geometry; those that cannot be
/// embedded without clashes are filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardConformerGenerator {
    pub max_conformers: usize,
    /// Minimum heavy-atom RMSD (Å) between kept conformers; 0.5 Å when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rms_cutoff: Option<f64>,
    /// Replace the input conformers instead of adding to them.
    pub clear_existing: bool,
    pub seed: u64,
}

impl Default for StandardConformerGenerator {
    fn default() -> Self {
        Self {
            max_conformers: 10,
            rms_cutoff: None,
            clear_existing: true,
            seed: 0x5eed,
        }
    }
}

/// A torsion that can be driven: rotating `moving` about `origin -> target`.
struct Rotor {
    origin: usize,
    target: usize,
    moving: Vec<usize>,
}

impl StandardConformerGenerator {
    fn rms_cutoff(&self) -> f64 {
        self.rms_cutoff.unwrap_or(DEFAULT_RMS_CUTOFF)
    }

    /// A per-molecule seed, so results do not depend on processing order.
    fn molecule_seed(&self, molecule: &Molecule) -> u64 {
        // FNV-1a
        molecule
            .canonical_smiles()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64 ^ self.seed, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            })
    }

    fn generate(
        &self,
        molecule: &Molecule,
        base: &Conformer,
        checker: &ClashChecker,
        rng: &mut StdRng,
    ) -> Vec<Conformer> {
        let rotors = find_rotors(molecule);
        let heavy = molecule.heavy_atom_indices();
        let cutoff = self.rms_cutoff();

        let mut kept: Vec<Conformer> = if self.clear_existing {
            Vec::new()
        } else {
            molecule.conformers().to_vec()
        };
        let mut generated = 0;
        let consider = |candidate: Conformer, kept: &mut Vec<Conformer>| {
            let heavy_new: Vec<Point3<f64>> = heavy.iter().map(|&i| candidate[i]).collect();
            let is_distinct = kept.iter().all(|existing| {
                let heavy_old: Vec<Point3<f64>> = heavy.iter().map(|&i| existing[i]).collect();
                calculate_aligned_rmsd(&heavy_old, &heavy_new).is_none_or(|rmsd| rmsd >= cutoff)
            });
            if is_distinct {
                kept.push(candidate);
                true
            } else {
                false
            }
        };

        if kept.is_empty() && consider(base.clone(), &mut kept) {
            generated += 1;
        }
        if rotors.is_empty() {
            return kept;
        }

        for _ in 0..self.max_conformers * ATTEMPTS_PER_CONFORMER {
            if generated >= self.max_conformers {
                break;
            }
            let mut coords = base.clone();
            for rotor in &rotors {
                let steps = rng.gen_range(0..6u32);
                if steps == 0 {
                    continue;
                }
                let (origin, target) = (coords[rotor.origin], coords[rotor.target]);
                rotate_about_bond(
                    &mut coords,
                    &origin,
                    &target,
                    &rotor.moving,
                    f64::from(steps) * TORSION_STEP_DEGREES,
                );
            }
            if checker.has_clash(&coords) {
                continue;
            }
            if consider(coords, &mut kept) {
                generated += 1;
            }
        }
        kept
    }
}

fn find_rotors(molecule: &Molecule) -> Vec<Rotor> {
    rotatable_bonds(molecule)
        .into_iter()
        .map(|bond_idx| {
            let bond = molecule.bonds()[bond_idx];
            let side_j = moving_side(molecule, bond.j, bond_idx);
            let side_i = moving_side(molecule, bond.i, bond_idx);
            if side_j.len() <= side_i.len() {
                Rotor {
                    origin: bond.i,
                    target: bond.j,
                    moving: side_j,
                }
            } else {
                Rotor {
                    origin: bond.j,
                    target: bond.i,
                    moving: side_i,
                }
            }
        })
        .collect()
}

/// Pairs of topologically distant atoms and the distance below which they clash.
struct ClashChecker {
    pairs: Vec<(usize, usize, f64)>,
}

impl ClashChecker {
    fn new(molecule: &Molecule) -> Self {
        let distances = topological_distances(molecule);
        let atoms = molecule.atoms();
        let mut pairs = Vec::new();
        for i in 0..atoms.len() {
            for j in (i + 1)..atoms.len() {
                let separation = distances[i][j];
                // disconnected fragments are checked as well
                if separation >= MIN_CLASH_SEPARATION {
                    let limit =
                        atoms[i].element.covalent_radius() + atoms[j].element.covalent_radius();
                    pairs.push((i, j, limit));
                }
            }
        }
        Self { pairs }
    }

    fn has_clash(&self, coords: &[Point3<f64>]) -> bool {
        self.pairs
            .iter()
            .any(|&(i, j, limit)| nalgebra::distance(&coords[i], &coords[j]) < limit)
    }
}

impl WorkflowComponent for StandardConformerGenerator {
    fn name(&self) -> &'static str {
        "StandardConformerGenerator"
    }

    fn description(&self) -> &'static str {
        "Generate conformers by driving the rotatable torsions of the input or embedded geometry."
    }

    fn fail_reason(&self) -> &'static str {
        "Conformers could not be generated for this molecule."
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            process_parallel: true,
            produces_duplicates: false,
        }
    }

    fn validate(&self) -> Result<(), WorkflowError> {
        if self.max_conformers == 0 {
            return Err(WorkflowError::invalid_settings(
                self.name(),
                "max_conformers must be at least 1",
            ));
        }
        if let Some(cutoff) = self.rms_cutoff {
            if !cutoff.is_finite() || cutoff < 0.0 {
                return Err(WorkflowError::invalid_settings(
                    self.name(),
                    format!("rms_cutoff must be a non-negative number (got {cutoff})"),
                ));
            }
        }
        Ok(())
    }

    fn provenance(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("qcurate".to_string(), env!("CARGO_PKG_VERSION").to_string()),
            (
                "conformer_generator".to_string(),
                "distance-geometry+torsion-drive".to_string(),
            ),
        ])
    }

    fn process(&self, mut molecule: Molecule) -> Processed {
        let mut rng = StdRng::seed_from_u64(self.molecule_seed(&molecule));
        let checker = ClashChecker::new(&molecule);
        let base = match molecule.conformers().first() {
            Some(base) => base.clone(),
            None => match embed(&molecule, &mut rng) {
                Ok(coords) if !checker.has_clash(&coords) => {
                    debug!(name = %molecule.name, "Embedded molecule without input geometry");
                    coords
                }
                Ok(_) => {
                    warn!(name = %molecule.name, "Embedded geometry has steric clashes");
                    return Processed::Filtered(molecule);
                }
                Err(e) => {
                    warn!(name = %molecule.name, error = %e, "Molecule could not be embedded");
                    return Processed::Filtered(molecule);
                }
            },
        };

        let conformers = self.generate(&molecule, &base, &checker, &mut rng);
        debug!(name = %molecule.name, n_conformers = conformers.len(), "Generated conformers");
        match molecule.set_conformers(conformers) {
            Ok(()) => Processed::pass(molecule),
            Err(e) => {
                warn!(name = %molecule.name, error = %e, "Generated conformers were rejected");
                Processed::Filtered(molecule)
            }
        }
    }
}
