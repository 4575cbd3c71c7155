use super::perception::smallest_ring_size;
use super::stereo;
use crate::core::models::atom::Chirality;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{BondOrder, BondStereo};
use std::collections::HashMap;

/// Double bonds in rings smaller than this cannot be trans.
const MIN_STEREO_RING: usize = 8;

/// Assigns every atom a unique rank in `0..n` that depends only on the
/// molecular graph and its stereo configuration, not on the input atom order.
///
/// Atoms are first partitioned by a local invariant (heavy atoms before
/// hydrogens, then heavy degree, atomic number, isotope, charge, hydrogen
/// count, aromaticity). The partition is refined with the ranks of each atom's
/// neighbors until it is stable, then split by the configuration of
/// stereocentres and double bonds seen through those ranks. Remaining ties are
/// broken one class at a time, always splitting the smallest tied class and
/// refining again.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let n = mol.n_atoms();
    let mut ranks = symmetry_classes(mol);

    let configuration = stereo_invariants(mol, &ranks);
    if configuration.iter().any(|&c| c != 0) {
        let keyed: Vec<(usize, u8)> = ranks.iter().copied().zip(configuration).collect();
        ranks = dense_ranks(&keyed);
        refine(mol, &mut ranks);
    }

    while let Some(tied) = smallest_tied_class(&ranks) {
        let chosen = (0..n)
            .find(|&i| ranks[i] == tied)
            .unwrap_or_default();
        let split: Vec<usize> = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| 2 * r + usize::from(r == tied && i != chosen))
            .collect();
        ranks = dense_ranks(&split);
        refine(mol, &mut ranks);
    }
    ranks
}

/// Classes of topologically equivalent atoms, ignoring stereo configuration.
///
/// Atoms share a class exactly when local invariant refinement cannot tell
/// them apart.
pub fn symmetry_classes(mol: &Molecule) -> Vec<usize> {
    let invariants: Vec<_> = (0..mol.n_atoms())
        .map(|i| {
            let atom = &mol.atoms()[i];
            (
                atom.is_hydrogen(),
                mol.heavy_degree(i),
                atom.element.atomic_number(),
                atom.isotope.unwrap_or(0),
                atom.formal_charge,
                mol.hydrogen_count(i),
                atom.is_aromatic,
            )
        })
        .collect();

    let mut ranks = dense_ranks(&invariants);
    refine(mol, &mut ranks);
    ranks
}

/// Removes configuration marks that cannot describe a stereoisomer.
///
/// A centre keeps its mark when it has a tetrahedral shape and no two of its
/// neighbors are equivalent. A double bond keeps its mark when each end has one
/// or two non-equivalent substituents and the bond is not in a ring of fewer
/// than eight atoms.
pub fn strip_non_stereogenic(mol: &mut Molecule) {
    if !mol.has_stereo() {
        return;
    }
    let classes = symmetry_classes(mol);
    let distinct = |atoms: &[usize]| {
        let mut seen: Vec<usize> = atoms.iter().map(|&a| classes[a]).collect();
        seen.sort_unstable();
        seen.windows(2).all(|w| w[0] != w[1])
    };

    for atom in 0..mol.n_atoms() {
        if mol.atoms()[atom].chirality.is_none() {
            continue;
        }
        let neighbors: Vec<usize> = mol.neighbors(atom).collect();
        if !(stereo::can_be_chiral(mol, atom) && distinct(&neighbors)) {
            if let Some(props) = mol.atom_mut(atom) {
                props.chirality = None;
            }
        }
    }

    for idx in 0..mol.n_bonds() {
        let bond = mol.bonds()[idx];
        if bond.stereo.is_none() {
            continue;
        }
        let end_ok = |end: usize, partner: usize| {
            let subs = stereo::substituents(mol, end, partner);
            (1..=2).contains(&subs.len()) && distinct(&subs)
        };
        let keep = bond.order == BondOrder::Double
            && end_ok(bond.i, bond.j)
            && end_ok(bond.j, bond.i)
            && smallest_ring_size(mol, idx).is_none_or(|size| size >= MIN_STEREO_RING);
        if !keep {
            mol.set_bond_stereo(idx, None);
        }
    }
}

/// Configuration of each atom as seen through `ranks`: the tag of a
/// stereocentre with its neighbors listed by rank, or the cis/trans relation of
/// the highest-priority substituents of a double bond. Zero when unspecified or
/// when tied neighbors leave it undefined.
fn stereo_invariants(mol: &Molecule, ranks: &[usize]) -> Vec<u8> {
    let mut values = vec![0u8; mol.n_atoms()];
    let by_rank = |atoms: &mut Vec<usize>| {
        atoms.sort_by_key(|&a| ranks[a]);
        atoms.windows(2).all(|w| ranks[w[0]] != ranks[w[1]])
    };

    for (atom, value) in values.iter_mut().enumerate() {
        let Some(chirality) = mol.atoms()[atom].chirality else {
            continue;
        };
        let mut neighbors: Vec<usize> = mol.neighbors(atom).collect();
        if !by_rank(&mut neighbors) {
            continue;
        }
        let lone_pair = (neighbors.len() == 3).then_some(None);
        let order: Vec<Option<usize>> = lone_pair
            .into_iter()
            .chain(neighbors.into_iter().map(Some))
            .collect();
        *value = match stereo::reorient(chirality, &order) {
            Chirality::CounterClockwise => 1,
            Chirality::Clockwise => 2,
        };
    }

    for (idx, bond) in mol.bonds().iter().enumerate() {
        if bond.stereo.is_none() {
            continue;
        }
        let mut first = stereo::substituents(mol, bond.i, bond.j);
        let mut second = stereo::substituents(mol, bond.j, bond.i);
        if !by_rank(&mut first) || !by_rank(&mut second) {
            continue;
        }
        let (Some(&a), Some(&b)) = (first.first(), second.first()) else {
            continue;
        };
        let value = match stereo::relation(mol, idx, a, b) {
            Some(BondStereo::Cis) => 3,
            Some(BondStereo::Trans) => 4,
            None => continue,
        };
        values[bond.i] = value;
        values[bond.j] = value;
    }
    values
}

fn refine(mol: &Molecule, ranks: &mut Vec<usize>) {
    let mut classes = count_classes(ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.n_atoms())
            .map(|i| {
                let mut neighborhood: Vec<(usize, u8)> = mol
                    .bonded(i)
                    .iter()
                    .map(|&(j, bond)| (ranks[j], mol.bonds()[bond].order as u8))
                    .collect();
                neighborhood.sort_unstable();
                (ranks[i], neighborhood)
            })
            .collect();
        let refined = dense_ranks(&keys);
        let refined_classes = count_classes(&refined);
        *ranks = refined;
        if refined_classes == classes {
            break;
        }
        classes = refined_classes;
    }
}

/// Ranks values so that equal values share a rank and ranks are contiguous.
fn dense_ranks<T: Ord>(values: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].cmp(&values[b]));

    let mut ranks = vec![0; values.len()];
    let mut current = 0;
    for (position, &idx) in order.iter().enumerate() {
        if position > 0 && values[idx] != values[order[position - 1]] {
            current += 1;
        }
        ranks[idx] = current;
    }
    ranks
}

fn count_classes(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&max| max + 1)
}

/// The lowest rank shared by the fewest atoms, if any rank is shared.
fn smallest_tied_class(ranks: &[usize]) -> Option<usize> {
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for &rank in ranks {
        *sizes.entry(rank).or_default() += 1;
    }
    sizes
        .into_iter()
        .filter(|&(_, size)| size > 1)
        .min_by_key(|&(rank, size)| (size, rank))
        .map(|(rank, _)| rank)
}
