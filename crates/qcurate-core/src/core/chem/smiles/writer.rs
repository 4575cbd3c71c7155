use super::{SmilesOptions, implicit_hydrogens};
use crate::core::chem::canon::canonical_ranks;
use crate::core::chem::stereo;
use crate::core::models::atom::Chirality;
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{BondOrder, BondStereo};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Writes a molecule as SMILES.
///
/// Hydrogens bonded to a single heavy atom are folded into their parent unless
/// `explicit_hydrogens` or `mapped` is set, or the hydrogen is the only
/// substituent that can carry a double bond's direction. Atoms are traversed
/// depth-first, lowest rank first; with `canonical` the ranks come from
/// [`canonical_ranks`], otherwise they are the atom indices. Stereocentres get
/// `@`/`@@` for the order their neighbors are written in, and configured
/// double bonds get `/` `\` marks on one substituent bond per end.
pub fn write(mol: &Molecule, options: &SmilesOptions) -> String {
    let n = mol.n_atoms();
    if n == 0 {
        return String::new();
    }

    let keep_all = options.explicit_hydrogens || options.mapped;
    let carries_direction = direction_hydrogens(mol);
    let included = (0..n)
        .map(|i| keep_all || carries_direction[i] || !is_foldable_hydrogen(mol, i))
        .collect();
    let ranks = if options.canonical {
        canonical_ranks(mol)
    } else {
        (0..n).collect()
    };

    let mut writer = Writer {
        mol,
        options,
        included,
        ranks,
        visited: vec![false; n],
        parent: vec![None; n],
        position: vec![0; n],
        discovered: 0,
        marks: HashMap::new(),
        directions_done: vec![false; mol.n_bonds()],
        closure_seen: vec![false; mol.n_bonds()],
        children: vec![Vec::new(); n],
        ring_bonds: vec![Vec::new(); n],
        open_rings: HashMap::new(),
        digits_in_use: BTreeSet::new(),
        out: String::new(),
    };
    writer.write_components();
    writer.out
}

fn is_foldable_hydrogen(mol: &Molecule, idx: usize) -> bool {
    let atom = &mol.atoms()[idx];
    atom.is_hydrogen()
        && atom.isotope.is_none()
        && atom.formal_charge == 0
        && mol.degree(idx) == 1
        && mol.neighbors(idx).all(|n| !mol.atoms()[n].is_hydrogen())
}

/// Hydrogens that are the only substituent on an end of a configured double bond.
fn direction_hydrogens(mol: &Molecule) -> Vec<bool> {
    let mut needed = vec![false; mol.n_atoms()];
    for bond in mol.bonds().iter().filter(|b| b.stereo.is_some()) {
        for (end, partner) in [(bond.i, bond.j), (bond.j, bond.i)] {
            let subs = stereo::substituents(mol, end, partner);
            if !subs.is_empty() && subs.iter().all(|&s| is_foldable_hydrogen(mol, s)) {
                needed[subs[0]] = true;
            }
        }
    }
    needed
}

fn bare_symbol_allowed(element: Element, aromatic: bool) -> bool {
    if aromatic {
        matches!(
            element,
            Element::B | Element::C | Element::N | Element::O | Element::P | Element::S
        )
    } else {
        element.is_organic_subset()
    }
}

struct Writer<'a> {
    mol: &'a Molecule,
    options: &'a SmilesOptions,
    included: Vec<bool>,
    ranks: Vec<usize>,
    visited: Vec<bool>,
    parent: Vec<Option<usize>>,
    /// Preorder position of each atom; earlier atoms are written first.
    position: Vec<usize>,
    discovered: usize,
    /// Direction of marked single bonds, `true` for `/`, read from the atom
    /// written first to the atom written second.
    marks: HashMap<usize, bool>,
    directions_done: Vec<bool>,
    closure_seen: Vec<bool>,
    children: Vec<Vec<(usize, usize)>>,
    ring_bonds: Vec<Vec<usize>>,
    open_rings: HashMap<usize, u32>,
    digits_in_use: BTreeSet<u32>,
    out: String,
}

impl Writer<'_> {
    fn write_components(&mut self) {
        loop {
            let start = (0..self.mol.n_atoms())
                .filter(|&i| self.included[i] && !self.visited[i])
                .min_by_key(|&i| self.ranks[i]);
            let Some(start) = start else {
                break;
            };
            if !self.out.is_empty() {
                self.out.push('.');
            }
            self.discover(start, None);
            self.assign_bond_directions();
            self.emit(start);
        }
    }

    /// Included neighbors of an atom as `(neighbor, bond)`, lowest rank first.
    fn ordered_neighbors(&self, atom: usize) -> Vec<(usize, usize)> {
        let mut neighbors: Vec<(usize, usize)> = self
            .mol
            .bonded(atom)
            .iter()
            .copied()
            .filter(|&(n, _)| self.included[n])
            .collect();
        neighbors.sort_by_key(|&(n, _)| self.ranks[n]);
        neighbors
    }

    /// First pass: builds the spanning tree and collects ring-closure bonds.
    fn discover(&mut self, atom: usize, parent_bond: Option<usize>) {
        self.visited[atom] = true;
        self.position[atom] = self.discovered;
        self.discovered += 1;
        for (neighbor, bond) in self.ordered_neighbors(atom) {
            if Some(bond) == parent_bond {
                continue;
            }
            if self.visited[neighbor] {
                if !self.closure_seen[bond] {
                    self.closure_seen[bond] = true;
                    self.ring_bonds[atom].push(bond);
                    self.ring_bonds[neighbor].push(bond);
                }
            } else {
                self.children[atom].push((neighbor, bond));
                self.parent[neighbor] = Some(atom);
                self.discover(neighbor, Some(bond));
            }
        }
    }

    /// Places `/` and `\` marks for the configured double bonds of the
    /// component just discovered, in the order the bonds will be written.
    fn assign_bond_directions(&mut self) {
        let mol = self.mol;
        let mut pending: Vec<usize> = mol
            .bonds()
            .iter()
            .enumerate()
            .filter(|&(idx, bond)| {
                bond.stereo.is_some()
                    && !self.directions_done[idx]
                    && self.visited[bond.i]
                    && self.visited[bond.j]
            })
            .map(|(idx, _)| idx)
            .collect();
        pending.sort_by_key(|&idx| {
            let bond = mol.bonds()[idx];
            self.position[bond.i].min(self.position[bond.j])
        });

        for idx in pending {
            self.directions_done[idx] = true;
            let bond = mol.bonds()[idx];
            let (near, far) = if self.position[bond.i] < self.position[bond.j] {
                (bond.i, bond.j)
            } else {
                (bond.j, bond.i)
            };
            let (Some(first), Some(second)) = (
                self.direction_substituent(near, far),
                self.direction_substituent(far, near),
            ) else {
                continue;
            };
            let Some(config) = stereo::relation(mol, idx, first, second) else {
                continue;
            };
            let near_side = match self.side(near, first) {
                Some(up) => up,
                None => {
                    self.set_side(near, first, true);
                    true
                }
            };
            let far_side = match config {
                BondStereo::Cis => near_side,
                BondStereo::Trans => !near_side,
            };
            match self.side(far, second) {
                Some(existing) if existing != far_side => {
                    debug!(bond = idx, "Conflicting bond directions, configuration not written");
                }
                Some(_) => {}
                None => self.set_side(far, second, far_side),
            }
        }
    }

    /// The written single-bond substituent of `end` that carries its direction:
    /// one already marked if possible, otherwise the first written.
    fn direction_substituent(&self, end: usize, partner: usize) -> Option<usize> {
        let candidates: Vec<usize> = stereo::substituents(self.mol, end, partner)
            .into_iter()
            .filter(|&s| self.included[s])
            .filter(|&s| {
                self.mol
                    .bond_between(end, s)
                    .is_some_and(|b| self.mol.bonds()[b].order == BondOrder::Single)
            })
            .collect();
        candidates
            .iter()
            .copied()
            .find(|&s| self.side(end, s).is_some())
            .or_else(|| candidates.iter().copied().min_by_key(|&s| self.position[s]))
    }

    /// Whether `substituent` lies above `end`, if their bond is marked.
    fn side(&self, end: usize, substituent: usize) -> Option<bool> {
        let bond = self.mol.bond_between(end, substituent)?;
        let up = *self.marks.get(&bond)?;
        Some(if self.position[end] < self.position[substituent] {
            up
        } else {
            !up
        })
    }

    fn set_side(&mut self, end: usize, substituent: usize, above: bool) {
        if let Some(bond) = self.mol.bond_between(end, substituent) {
            let up = if self.position[end] < self.position[substituent] {
                above
            } else {
                !above
            };
            self.marks.insert(bond, up);
        }
    }

    /// Second pass: writes atoms, ring digits, and branches.
    fn emit(&mut self, atom: usize) {
        let (closing, mut opening): (Vec<usize>, Vec<usize>) = self.ring_bonds[atom]
            .iter()
            .copied()
            .partition(|bond| self.open_rings.contains_key(bond));

        let mut closing: Vec<(u32, usize)> = closing
            .into_iter()
            .filter_map(|bond| self.open_rings.remove(&bond).map(|digit| (digit, bond)))
            .collect();
        closing.sort_unstable();

        opening.sort_by_key(|&bond| {
            let partner = self.mol.bonds()[bond].partner(atom).unwrap_or(atom);
            self.ranks[partner]
        });
        let mut opened = Vec::with_capacity(opening.len());
        for bond in opening {
            let digit = (1..)
                .find(|d| !self.digits_in_use.contains(d))
                .unwrap_or(1);
            self.digits_in_use.insert(digit);
            self.open_rings.insert(bond, digit);
            opened.push((digit, bond));
        }

        let children = std::mem::take(&mut self.children[atom]);
        let written_after: Vec<usize> = closing
            .iter()
            .chain(&opened)
            .filter_map(|&(_, bond)| self.mol.bonds()[bond].partner(atom))
            .chain(children.iter().map(|&(child, _)| child))
            .collect();
        let token = self.atom_token(atom, &written_after);
        self.out.push_str(&token);

        for &(digit, _) in &closing {
            self.push_ring_digit(digit);
        }
        for &(digit, bond) in &opened {
            let symbol = self.bond_symbol(bond);
            self.out.push_str(symbol);
            self.push_ring_digit(digit);
        }
        for (digit, _) in closing {
            self.digits_in_use.remove(&digit);
        }

        let last = children.len().saturating_sub(1);
        for (position, &(child, bond)) in children.iter().enumerate() {
            let branch = position < last;
            if branch {
                self.out.push('(');
            }
            let symbol = self.bond_symbol(bond);
            self.out.push_str(symbol);
            self.emit(child);
            if branch {
                self.out.push(')');
            }
        }
    }

    fn push_ring_digit(&mut self, digit: u32) {
        if digit < 10 {
            self.out.push_str(&digit.to_string());
        } else {
            self.out.push_str(&format!("%{digit:02}"));
        }
    }

    fn bond_symbol(&self, bond: usize) -> &'static str {
        if let Some(&up) = self.marks.get(&bond) {
            return if up { "/" } else { "\\" };
        }
        let bond = &self.mol.bonds()[bond];
        let atoms = self.mol.atoms();
        let both_aromatic = atoms[bond.i].is_aromatic && atoms[bond.j].is_aromatic;
        match bond.order {
            BondOrder::Single if both_aromatic => "-",
            BondOrder::Single => "",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Aromatic if both_aromatic => "",
            BondOrder::Aromatic => ":",
        }
    }

    /// Chirality tag for the order the neighbors of `idx` are written in: the
    /// parent, folded hydrogens, then `written_after` (ring partners and
    /// children).
    fn written_chirality(&self, idx: usize, written_after: &[usize]) -> Option<Chirality> {
        let stored = self.mol.atoms()[idx].chirality?;
        let folded: Vec<usize> = self
            .mol
            .neighbors(idx)
            .filter(|&n| !self.included[n])
            .collect();
        if folded.len() > 1 {
            return None;
        }
        let parent = self.parent[idx];
        let mut order: Vec<Option<usize>> = parent.map(Some).into_iter().collect();
        order.extend(folded.into_iter().map(Some));
        order.extend(written_after.iter().map(|&n| Some(n)));
        if order.len() == 3 {
            order.insert(usize::from(parent.is_some()), None);
        }
        (order.len() == 4).then(|| stereo::reorient(stored, &order))
    }

    fn atom_token(&self, idx: usize, written_after: &[usize]) -> String {
        let atom = &self.mol.atoms()[idx];
        let chirality = self.written_chirality(idx, written_after);
        let element = atom.element;
        let symbol = if atom.is_aromatic {
            element.symbol().to_ascii_lowercase()
        } else {
            element.symbol().to_string()
        };

        let hydrogens = self
            .mol
            .neighbors(idx)
            .filter(|&n| !self.included[n])
            .count();
        let written_valence: u8 = self
            .mol
            .bonded(idx)
            .iter()
            .filter(|&&(n, _)| self.included[n])
            .map(|&(_, bond)| self.mol.bonds()[bond].order.valence())
            .sum::<u8>()
            + u8::from(atom.is_aromatic);

        let bare = !self.options.mapped
            && chirality.is_none()
            && atom.formal_charge == 0
            && atom.isotope.is_none()
            && bare_symbol_allowed(element, atom.is_aromatic)
            && hydrogens
                == usize::from(implicit_hydrogens(element, atom.is_aromatic, written_valence));
        if bare {
            return symbol;
        }

        let mut token = String::from("[");
        if let Some(isotope) = atom.isotope {
            token.push_str(&isotope.to_string());
        }
        token.push_str(&symbol);
        if let Some(chirality) = chirality {
            token.push_str(chirality.symbol());
        }
        match hydrogens {
            0 => {}
            1 => token.push('H'),
            count => token.push_str(&format!("H{count}")),
        }
        match atom.formal_charge {
            0 => {}
            1 => token.push('+'),
            -1 => token.push('-'),
            charge if charge > 0 => token.push_str(&format!("+{charge}")),
            charge => token.push_str(&format!("-{}", charge.unsigned_abs())),
        }
        if self.options.mapped {
            token.push_str(&format!(":{}", idx + 1));
        }
        token.push(']');
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse;

    fn canonical(smiles: &str) -> String {
        parse(smiles).unwrap().canonical_smiles()
    }

    #[test]
    fn input_order_is_kept_without_canonical_option() {
        let mol = parse("CC(=O)O").unwrap();
        assert_eq!(write(&mol, &SmilesOptions::default()), "CC(=O)O");
        let mol = parse("OCC").unwrap();
        assert_eq!(write(&mol, &SmilesOptions::default()), "OCC");
    }

    #[test]
    fn canonical_output_does_not_depend_on_atom_order() {
        assert_eq!(canonical("OC(C)=O"), canonical("CC(=O)O"));
        assert_eq!(canonical("CC(=O)O"), "CC(=O)O");
        assert_eq!(canonical("C1CCCCC1"), "C1CCCCC1");
        assert_eq!(canonical("N(C)(C)C"), canonical("CN(C)C"));
    }

    #[test]
    fn kekule_and_aromatic_inputs_agree() {
        assert_eq!(canonical("C1=CC=CC=C1"), "c1ccccc1");
        assert_eq!(canonical("c1ccccc1"), "c1ccccc1");
        assert_eq!(canonical("C1=CC=NC=C1"), canonical("c1ccncc1"));
        assert_eq!(canonical("C1=CC=C2C=CC=CC2=C1"), canonical("c1ccc2ccccc2c1"));
        assert_eq!(canonical("C1=CNC=C1"), canonical("c1cc[nH]c1"));
    }

    #[test]
    fn charges_and_isotopes_force_brackets() {
        assert_eq!(canonical("C[N+](C)(C)C"), "C[N+](C)(C)C");
        assert_eq!(canonical("[Cl-].[Na+]"), "[Na+].[Cl-]");
        assert_eq!(canonical("[13CH4]"), "[13CH4]");
        assert_eq!(canonical("[Fe+3]"), "[Fe+3]");
    }

    #[test]
    fn explicit_hydrogens_are_written_as_atoms() {
        let methane = parse("C").unwrap();
        assert_eq!(methane.canonical_smiles(), "C");
        assert_eq!(
            methane.canonical_explicit_hydrogen_smiles(),
            "C([H])([H])([H])[H]"
        );
        let hydrogen = parse("[H][H]").unwrap();
        assert_eq!(hydrogen.canonical_smiles(), "[H][H]");
    }

    #[test]
    fn mapped_smiles_numbers_every_atom_by_index() {
        let water = parse("O").unwrap();
        assert_eq!(water.mapped_smiles(), "[O:1]([H:2])[H:3]");

        let ethanol = parse("CCO").unwrap();
        let rebuilt = parse(&ethanol.mapped_smiles()).unwrap();
        assert_eq!(rebuilt.n_atoms(), ethanol.n_atoms());
        for (a, b) in rebuilt.atoms().iter().zip(ethanol.atoms()) {
            assert_eq!(a.element, b.element);
        }
        for bond in ethanol.bonds() {
            assert!(rebuilt.bond_between(bond.i, bond.j).is_some());
        }
    }

    #[test]
    fn stereocentres_are_written_for_the_output_order() {
        assert_eq!(canonical("F[C@H](Cl)Br"), "F[C@H](Cl)Br");
        assert_eq!(canonical("F[C@@H](Cl)Br"), "F[C@@H](Cl)Br");
        assert_eq!(canonical("Br[C@H](F)Cl"), canonical("F[C@H](Cl)Br"));
        assert_eq!(canonical("C[C@H](O)CC"), canonical("CC[C@H](C)O"));
        assert_ne!(canonical("C[C@H](O)CC"), canonical("C[C@@H](O)CC"));
        // Not a stereocentre: the two methyls are equivalent.
        assert_eq!(canonical("C[C@H](C)O"), "CC(C)O");
    }

    #[test]
    fn double_bond_configuration_is_written_with_directions() {
        assert_eq!(canonical("C/C=C/C"), "C\\C=C\\C");
        assert_eq!(canonical("C/C=C\\C"), "C\\C=C/C");
        assert_eq!(canonical("C\\C=C\\C"), canonical("C/C=C/C"));
        assert_eq!(canonical("F/C=C/F"), canonical("F\\C=C\\F"));
        assert_ne!(canonical("F/C=C/F"), canonical("F/C=C\\F"));
        assert_eq!(canonical("CC=CC"), "CC=CC");
        // Ring double bonds in small rings carry no configuration.
        assert_eq!(canonical("C1/C=C\\CCC1"), canonical("C1C=CCCC1"));
    }

    #[test]
    fn input_order_writing_keeps_stereo() {
        let mol = parse("N[C@@H](C)C(=O)O").unwrap();
        let written = write(&mol, &SmilesOptions::default());
        assert_eq!(written, "N[C@@H](C)C(=O)O");
        let alkene = parse("Cl/C=C/Cl").unwrap();
        let again = parse(&write(&alkene, &SmilesOptions::default())).unwrap();
        assert_eq!(again.canonical_smiles(), alkene.canonical_smiles());
    }

    #[test]
    fn stereo_survives_a_mapped_round_trip() {
        let mol = parse("C[C@@H](O)/C=C/F").unwrap();
        let rebuilt = parse(&mol.mapped_smiles()).unwrap();
        assert_eq!(rebuilt.canonical_smiles(), mol.canonical_smiles());
        assert!(mol.canonical_smiles().contains('@'));
        assert!(mol.canonical_smiles().contains('/') || mol.canonical_smiles().contains('\\'));
    }

    #[test]
    fn written_smiles_parse_back_to_the_same_formula() {
        for smiles in [
            "O=c1cccc[nH]1",
            "c1ccsc1",
            "CS(=O)(=O)N",
            "C#N",
            "OP(=O)(O)O",
            "C[C@@H]1CC[C@H](O)CC1",
            "O[C@@H]1CCCC[C@H]1N",
            "C/C=C/C=C\\C",
        ] {
            let mol = parse(smiles).unwrap();
            let again = parse(&mol.canonical_smiles()).unwrap();
            assert_eq!(again.formula(), mol.formula(), "{smiles}");
            assert_eq!(again.canonical_smiles(), mol.canonical_smiles(), "{smiles}");
        }
    }
}
