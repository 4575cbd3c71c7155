use super::perception::{ring_bond_indices, smallest_rings};
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use std::collections::BTreeSet;
use tracing::trace;

/// Marks aromatic rings in place.
///
/// Candidates are the smallest rings and the envelopes of two smallest rings
/// fused through a single bond. A candidate is aromatic when each of its atoms
/// can donate electrons to it and the total is `4n + 2`; an aromatic envelope
/// marks both rings, fusion bond included. Candidates are revisited until
/// nothing changes, so a ring fused to an already aromatic ring is recognised
/// through the shared atoms. Existing aromatic flags are never removed.
pub fn perceive(mol: &mut Molecule) {
    let rings: Vec<(Vec<usize>, Vec<usize>)> = smallest_rings(mol)
        .into_iter()
        .map(|ring| {
            let bonds = ring_bond_indices(mol, &ring);
            (ring, bonds)
        })
        .collect();
    let mut candidates = rings.clone();
    candidates.extend(fused_envelopes(&rings));
    let mut done = vec![false; candidates.len()];

    loop {
        let mut changed = false;
        for (k, (atoms, bonds)) in candidates.iter().enumerate() {
            if done[k] {
                continue;
            }
            let already_aromatic = atoms.iter().all(|&a| mol.atoms()[a].is_aromatic)
                && bonds
                    .iter()
                    .all(|&b| mol.bonds()[b].order == BondOrder::Aromatic);
            let electrons: Option<u32> = atoms
                .iter()
                .map(|&a| pi_electrons(mol, a, bonds).map(u32::from))
                .sum();
            if already_aromatic || electrons.is_some_and(|e| e % 4 == 2) {
                trace!(ring = ?atoms, ?electrons, "Ring is aromatic");
                for &a in atoms {
                    if let Some(atom) = mol.atom_mut(a) {
                        atom.is_aromatic = true;
                    }
                }
                for &b in bonds {
                    mol.set_bond_order(b, BondOrder::Aromatic);
                }
                done[k] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Unions of two rings that share exactly one bond, as `(atoms, bonds)`.
fn fused_envelopes(rings: &[(Vec<usize>, Vec<usize>)]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut envelopes = Vec::new();
    for (k, (atoms_a, bonds_a)) in rings.iter().enumerate() {
        for (atoms_b, bonds_b) in &rings[k + 1..] {
            let shared = bonds_a.iter().filter(|b| bonds_b.contains(b)).count();
            if shared != 1 {
                continue;
            }
            let atoms: BTreeSet<usize> = atoms_a.iter().chain(atoms_b).copied().collect();
            let bonds: BTreeSet<usize> = bonds_a.iter().chain(bonds_b).copied().collect();
            envelopes.push((atoms.into_iter().collect(), bonds.into_iter().collect()));
        }
    }
    envelopes
}

/// Electrons an atom contributes to the ring made of `ring_bonds`, or `None`
/// when the atom cannot be part of an aromatic ring.
fn pi_electrons(mol: &Molecule, atom: usize, ring_bonds: &[usize]) -> Option<u8> {
    let mut ring_double = false;
    let mut exocyclic_double = None;
    for &(neighbor, bond) in mol.bonded(atom) {
        match mol.bonds()[bond].order {
            BondOrder::Triple => return None,
            BondOrder::Double if ring_bonds.contains(&bond) => ring_double = true,
            BondOrder::Double => exocyclic_double = Some(neighbor),
            _ => {}
        }
    }
    if ring_double {
        return Some(1);
    }

    let props = &mol.atoms()[atom];
    let element = props.element;
    let charge = props.formal_charge;
    let degree = mol.degree(atom);

    if let Some(partner) = exocyclic_double {
        let partner = mol.atoms()[partner].element;
        return matches!(partner, Element::O | Element::N | Element::S).then_some(0);
    }

    if props.is_aromatic {
        return match element {
            Element::N | Element::P if charge == 0 && degree == 3 => Some(2),
            Element::N | Element::P => Some(1),
            Element::O | Element::S | Element::Se => Some(2),
            Element::C if charge < 0 => Some(2),
            Element::C if charge > 0 => Some(0),
            Element::B => Some(0),
            _ => Some(1),
        };
    }

    match element {
        Element::N | Element::P if charge == 0 && degree == 3 => Some(2),
        Element::O | Element::S | Element::Se if charge == 0 && degree == 2 => Some(2),
        Element::C if charge == -1 && degree == 3 => Some(2),
        Element::C if charge == 1 && degree == 3 => Some(0),
        Element::B if charge == 0 && degree == 3 => Some(0),
        _ => None,
    }
}
