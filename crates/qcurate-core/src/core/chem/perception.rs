use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use std::collections::{BTreeSet, VecDeque};

/// Shortest path of atoms from `from` to `to` that does not use bond `excluded`.
fn shortest_path_avoiding(
    mol: &Molecule,
    from: usize,
    to: usize,
    excluded: usize,
) -> Option<Vec<usize>> {
    let mut previous = vec![usize::MAX; mol.n_atoms()];
    let mut queue = VecDeque::from([from]);
    previous[from] = from;

    while let Some(atom) = queue.pop_front() {
        if atom == to {
            let mut path = vec![to];
            let mut current = to;
            while current != from {
                current = previous[current];
                path.push(current);
            }
            path.reverse();
            return Some(path);
        }
        for &(neighbor, bond) in mol.bonded(atom) {
            if bond != excluded && previous[neighbor] == usize::MAX {
                previous[neighbor] = atom;
                queue.push_back(neighbor);
            }
        }
    }
    None
}

/// Whether each bond lies on a ring, indexed by bond.
pub fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    mol.bonds()
        .iter()
        .enumerate()
        .map(|(idx, bond)| {
            mol.degree(bond.i) > 1
                && mol.degree(bond.j) > 1
                && shortest_path_avoiding(mol, bond.i, bond.j, idx).is_some()
        })
        .collect()
}

/// The smallest ring through every ring bond, each given as atoms in ring order.
///
/// Rings found from several bonds are reported once. Fused systems yield their
/// individual rings, never the envelope.
pub fn smallest_rings(mol: &Molecule) -> Vec<Vec<usize>> {
    let mut seen: BTreeSet<Vec<usize>> = BTreeSet::new();
    let mut rings = Vec::new();
    for (idx, bond) in mol.bonds().iter().enumerate() {
        if mol.degree(bond.i) < 2 || mol.degree(bond.j) < 2 {
            continue;
        }
        if let Some(ring) = shortest_path_avoiding(mol, bond.i, bond.j, idx) {
            let mut key = ring.clone();
            key.sort_unstable();
            if seen.insert(key) {
                rings.push(ring);
            }
        }
    }
    rings
}

/// Size of the smallest ring through bond `bond_idx`, if the bond is in a ring.
pub fn smallest_ring_size(mol: &Molecule, bond_idx: usize) -> Option<usize> {
    let bond = mol.bonds().get(bond_idx)?;
    shortest_path_avoiding(mol, bond.i, bond.j, bond_idx).map(|path| path.len())
}

/// Bonds between consecutive ring atoms, closing bond included.
pub fn ring_bond_indices(mol: &Molecule, ring: &[usize]) -> Vec<usize> {
    (0..ring.len())
        .filter_map(|k| mol.bond_between(ring[k], ring[(k + 1) % ring.len()]))
        .collect()
}

/// Bonds around which a torsion can be driven.
///
/// A rotatable bond is a single, non-ring bond whose atoms both have at least
/// two heavy neighbors and neither of which takes part in a triple bond.
pub fn rotatable_bonds(mol: &Molecule) -> Vec<usize> {
    let in_ring = ring_bonds(mol);
    let has_triple = |atom: usize| {
        mol.bonded(atom)
            .iter()
            .any(|&(_, bond)| mol.bonds()[bond].order == BondOrder::Triple)
    };

    mol.bonds()
        .iter()
        .enumerate()
        .filter(|&(idx, bond)| {
            bond.order == BondOrder::Single
                && !in_ring[idx]
                && mol.heavy_degree(bond.i) >= 2
                && mol.heavy_degree(bond.j) >= 2
                && !has_triple(bond.i)
                && !has_triple(bond.j)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Atoms reachable from `start` without crossing bond `excluded`.
///
/// For a non-ring bond this is the side of the molecule that moves when the
/// torsion around the bond is rotated with `start` as the moving bond atom.
pub fn moving_side(mol: &Molecule, start: usize, excluded: usize) -> Vec<usize> {
    let mut visited = vec![false; mol.n_atoms()];
    let mut stack = vec![start];
    let mut side = Vec::new();
    visited[start] = true;
    while let Some(atom) = stack.pop() {
        side.push(atom);
        for &(neighbor, bond) in mol.bonded(atom) {
            if bond != excluded && !visited[neighbor] {
                visited[neighbor] = true;
                stack.push(neighbor);
            }
        }
    }
    side.sort_unstable();
    side
}

/// Number of bonds on the shortest path between every pair of atoms.
///
/// Disconnected pairs are `usize::MAX`.
pub fn topological_distances(mol: &Molecule) -> Vec<Vec<usize>> {
    let n = mol.n_atoms();
    (0..n)
        .map(|source| {
            let mut distances = vec![usize::MAX; n];
            let mut queue = VecDeque::from([source]);
            distances[source] = 0;
            while let Some(atom) = queue.pop_front() {
                for neighbor in mol.neighbors(atom) {
                    if distances[neighbor] == usize::MAX {
                        distances[neighbor] = distances[atom] + 1;
                        queue.push_back(neighbor);
                    }
                }
            }
            distances
        })
        .collect()
}
