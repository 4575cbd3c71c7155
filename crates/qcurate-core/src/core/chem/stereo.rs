//! Tetrahedral and double-bond stereochemistry.
//!
//! Chirality is stored relative to the atom's reference order (a lone pair
//! first when the centre has three neighbors, then the neighbors in ascending
//! index). Double-bond configuration is stored relative to the lowest-index
//! substituent on each end. Both conventions depend only on atom indices, so
//! [`Molecule::reordered`] can carry them to any other atom order.

use crate::core::models::atom::Chirality;
use crate::core::models::element::Element;
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::models::topology::{BondOrder, BondStereo};
use nalgebra::Vector3;

/// Signed volumes smaller than this (Å³) are treated as planar.
const PLANAR_VOLUME: f64 = 1e-3;

/// Whether sorting `sequence` takes an odd number of swaps.
pub fn is_odd_permutation<T: Ord>(sequence: &[T]) -> bool {
    let mut inversions = 0usize;
    for (k, a) in sequence.iter().enumerate() {
        inversions += sequence[k + 1..].iter().filter(|b| a > *b).count();
    }
    inversions % 2 == 1
}

/// Converts between a tag written for the neighbors listed in `order` and the
/// tag stored for the sorted reference order. The conversion is its own inverse.
///
/// `None` stands for an implicit lone pair and sorts before every atom.
pub fn reorient(tag: Chirality, order: &[Option<usize>]) -> Chirality {
    if is_odd_permutation(order) {
        tag.inverted()
    } else {
        tag
    }
}

/// Whether an atom has the shape of a tetrahedral stereocentre.
pub fn can_be_chiral(mol: &Molecule, atom: usize) -> bool {
    match mol.degree(atom) {
        4 => true,
        3 => matches!(
            mol.atoms()[atom].element,
            Element::S | Element::Se | Element::P | Element::As
        ),
        _ => false,
    }
}

/// The neighbor order stored chirality refers to.
pub fn reference_order(mol: &Molecule, atom: usize) -> Vec<Option<usize>> {
    let mut neighbors: Vec<usize> = mol.neighbors(atom).collect();
    neighbors.sort_unstable();
    let lone_pair = (neighbors.len() == 3).then_some(None);
    lone_pair.into_iter().chain(neighbors.into_iter().map(Some)).collect()
}

/// Neighbors of `atom` other than `partner`, ascending.
pub fn substituents(mol: &Molecule, atom: usize, partner: usize) -> Vec<usize> {
    let mut subs: Vec<usize> = mol.neighbors(atom).filter(|&n| n != partner).collect();
    subs.sort_unstable();
    subs
}

/// The end of bond `bond_idx` that `substituent` is attached to.
fn end_of(mol: &Molecule, bond_idx: usize, substituent: usize) -> Option<(usize, usize)> {
    let bond = mol.bonds().get(bond_idx)?;
    if substituent != bond.j && mol.bond_between(bond.i, substituent).is_some() {
        Some((bond.i, bond.j))
    } else if substituent != bond.i && mol.bond_between(bond.j, substituent).is_some() {
        Some((bond.j, bond.i))
    } else {
        None
    }
}

/// Number of reference substituents among `first` and `second`, modulo two.
fn reference_flips(
    mol: &Molecule,
    bond_idx: usize,
    first: usize,
    second: usize,
) -> Option<bool> {
    let (end_a, partner_a) = end_of(mol, bond_idx, first)?;
    let (end_b, partner_b) = end_of(mol, bond_idx, second)?;
    if end_a == end_b {
        return None;
    }
    let ref_a = *substituents(mol, end_a, partner_a).first()?;
    let ref_b = *substituents(mol, end_b, partner_b).first()?;
    Some((ref_a != first) ^ (ref_b != second))
}

/// Configuration of `first` and `second`, substituents on opposite ends of
/// double bond `bond_idx`.
pub fn relation(
    mol: &Molecule,
    bond_idx: usize,
    first: usize,
    second: usize,
) -> Option<BondStereo> {
    let stored = mol.bonds().get(bond_idx)?.stereo?;
    let flip = reference_flips(mol, bond_idx, first, second)?;
    Some(if flip { stored.flipped() } else { stored })
}

/// Stores the configuration of `first` and `second` on double bond `bond_idx`.
pub fn set_relation(
    mol: &mut Molecule,
    bond_idx: usize,
    first: usize,
    second: usize,
    stereo: BondStereo,
) -> bool {
    match reference_flips(mol, bond_idx, first, second) {
        Some(flip) => {
            mol.set_bond_stereo(bond_idx, Some(if flip { stereo.flipped() } else { stereo }));
            true
        }
        None => false,
    }
}

/// Signed volume `(v1 × v2) · v3` of the last three reference neighbors seen
/// from the centre.
pub fn signed_volume(
    conformer: &Conformer,
    center: usize,
    order: &[Option<usize>],
) -> Option<f64> {
    let atoms: Vec<usize> = order[order.len().saturating_sub(3)..]
        .iter()
        .filter_map(|slot| *slot)
        .collect();
    if atoms.len() != 3 {
        return None;
    }
    let origin = conformer.get(center)?;
    let v: Vec<Vector3<f64>> = atoms
        .iter()
        .map(|&a| conformer.get(a).map(|p| p - origin))
        .collect::<Option<_>>()?;
    Some(v[0].cross(&v[1]).dot(&v[2]))
}

/// Chirality of `atom` in a conformer, or `None` when the centre is flat.
pub fn chirality_in_conformer(
    mol: &Molecule,
    conformer: &Conformer,
    atom: usize,
) -> Option<Chirality> {
    let order = reference_order(mol, atom);
    let volume = signed_volume(conformer, atom, &order)?;
    if volume.abs() < PLANAR_VOLUME {
        None
    } else if volume < 0.0 {
        Some(Chirality::CounterClockwise)
    } else {
        Some(Chirality::Clockwise)
    }
}

/// Configuration of the reference substituents of a double bond in a conformer.
pub fn bond_stereo_in_conformer(
    mol: &Molecule,
    conformer: &Conformer,
    bond_idx: usize,
) -> Option<BondStereo> {
    let bond = mol.bonds().get(bond_idx)?;
    let ref_i = *substituents(mol, bond.i, bond.j).first()?;
    let ref_j = *substituents(mol, bond.j, bond.i).first()?;
    let b1 = conformer[bond.i] - conformer[ref_i];
    let b2 = conformer[bond.j] - conformer[bond.i];
    let b3 = conformer[ref_j] - conformer[bond.j];
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let denominator = n1.norm() * n2.norm();
    if denominator < 1e-8 {
        return None;
    }
    let cosine = n1.dot(&n2) / denominator;
    if cosine.abs() < 1e-3 {
        None
    } else if cosine > 0.0 {
        Some(BondStereo::Cis)
    } else {
        Some(BondStereo::Trans)
    }
}

/// Assigns chirality and double-bond configuration from the coordinates of a
/// conformer, replacing any existing marks. Marks on centres that are not
/// stereogenic are removed afterwards.
pub fn assign_from_conformer(mol: &mut Molecule, conformer: usize) {
    let Some(coords) = mol.conformers().get(conformer).cloned() else {
        return;
    };
    for atom in 0..mol.n_atoms() {
        let chirality = if can_be_chiral(mol, atom) {
            chirality_in_conformer(mol, &coords, atom)
        } else {
            None
        };
        if let Some(props) = mol.atom_mut(atom) {
            props.chirality = chirality;
        }
    }
    for bond_idx in 0..mol.n_bonds() {
        let stereo = if mol.bonds()[bond_idx].order == BondOrder::Double {
            bond_stereo_in_conformer(mol, &coords, bond_idx)
        } else {
            None
        };
        mol.set_bond_stereo(bond_idx, stereo);
    }
    super::canon::strip_non_stereogenic(mol);
}

/// Whether every stereo mark of the molecule is reproduced by `conformer`.
pub fn conformer_matches(mol: &Molecule, conformer: &Conformer) -> bool {
    let centres_match = (0..mol.n_atoms()).all(|atom| match mol.atoms()[atom].chirality {
        Some(expected) => chirality_in_conformer(mol, conformer, atom) == Some(expected),
        None => true,
    });
    let bonds_match = mol.bonds().iter().enumerate().all(|(idx, bond)| match bond.stereo {
        Some(expected) => bond_stereo_in_conformer(mol, conformer, idx) == Some(expected),
        None => true,
    });
    centres_match && bonds_match
}
