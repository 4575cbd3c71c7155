use super::SmilesError;
use crate::core::chem::stereo;
use crate::core::models::atom::{Atom, Chirality};
use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{BondOrder, BondStereo};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Default, Clone, Copy)]
struct AtomAnnotations {
    /// Hydrogen count stated in a bracket atom; `None` for organic-subset atoms.
    hydrogens: Option<u8>,
    map: Option<u32>,
    /// `@`/`@@` as written, relative to the order neighbors appear in the string.
    chirality: Option<Chirality>,
    /// Whether the atom was bonded to a preceding atom when it was read.
    preceded: bool,
}

/// A neighbor position of an atom, in the order the string mentions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Atom(usize),
    /// The hydrogens written inside the atom's brackets.
    Hydrogens,
    /// A ring bond whose partner has not been read yet.
    Pending,
}

/// A bond symbol waiting for the atom or ring digit it applies to.
#[derive(Debug, Clone, Copy)]
struct PendingBond {
    token: BondToken,
    position: usize,
    /// `Some(true)` for `/`, `Some(false)` for `\`.
    up: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    token: Option<BondToken>,
    up: Option<bool>,
    slot: usize,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    annotations: Vec<AtomAnnotations>,
    slots: Vec<Vec<Slot>>,
    /// Directional single bonds `(from, to, up)`: `to` lies above `from` when `up`.
    directional: Vec<(usize, usize, bool)>,
    prev: Option<usize>,
    pending_bond: Option<PendingBond>,
    branches: Vec<(usize, usize)>,
    rings: BTreeMap<u32, RingOpening>,
}

/// Hydrogens needed to bring an atom to its lowest default valence that is not
/// below the valence already used by bonds.
///
/// `bonded_valence` includes the extra unit carried by aromatic atoms. An
/// aromatic atom already saturated without that unit (furan oxygen, thiophene
/// sulfur, N-substituted pyrrole nitrogen) takes no hydrogens.
pub(crate) fn implicit_hydrogens(element: Element, is_aromatic: bool, bonded_valence: u8) -> u8 {
    let lowest_at_least = |valence: u8| {
        element
            .default_valences()
            .iter()
            .copied()
            .find(|&v| v >= valence)
    };
    if is_aromatic {
        let sigma = bonded_valence.saturating_sub(1);
        if lowest_at_least(sigma) == Some(sigma) {
            return 0;
        }
    }
    lowest_at_least(bonded_valence).map_or(0, |v| v - bonded_valence)
}

/// Parses a SMILES string into a molecule with explicit hydrogens.
///
/// Hydrogens are appended after the heavy atoms in the order of their parent
/// atoms. Tetrahedral `@`/`@@` marks and `/` `\` bond directions are kept as
/// atom chirality and double-bond configuration. When every atom of the
/// string carries an atom-map number and the numbers form the sequence
/// `1..=n`, the atoms are reordered so that the atom mapped `k` gets index
/// `k - 1`.
pub fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    if let Some((position, character)) = trimmed.char_indices().find(|(_, c)| !c.is_ascii()) {
        return Err(SmilesError::UnexpectedCharacter {
            character,
            position,
        });
    }

    let mut parser = Parser {
        bytes: trimmed.as_bytes(),
        pos: 0,
        mol: Molecule::new(),
        annotations: Vec::new(),
        slots: Vec::new(),
        directional: Vec::new(),
        prev: None,
        pending_bond: None,
        branches: Vec::new(),
        rings: BTreeMap::new(),
    };
    parser.run()?;
    parser.finish()
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), SmilesError> {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(self.unexpected());
                    };
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.branches.push((prev, self.pos));
                    self.pos += 1;
                }
                b')' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    let (prev, _) = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnbalancedParenthesis(self.pos))?;
                    self.prev = Some(prev);
                    self.pos += 1;
                }
                b'-' => self.bond_symbol(BondToken::Single, None)?,
                b'/' => self.bond_symbol(BondToken::Single, Some(true))?,
                b'\\' => self.bond_symbol(BondToken::Single, Some(false))?,
                b'=' => self.bond_symbol(BondToken::Double, None)?,
                b'#' => self.bond_symbol(BondToken::Triple, None)?,
                b':' => self.bond_symbol(BondToken::Aromatic, None)?,
                b'$' => return Err(SmilesError::UnsupportedBond(self.pos)),
                b'.' => {
                    if self.pending_bond.is_some() || self.prev.is_none() {
                        return Err(self.unexpected());
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    let digit = u32::from(c - b'0');
                    self.pos += 1;
                    self.ring_closure(digit)?;
                }
                b'%' => {
                    let start = self.pos;
                    let digits = self.bytes.get(start + 1..start + 3);
                    let digit = digits
                        .filter(|d| d.iter().all(u8::is_ascii_digit))
                        .map(|d| u32::from(d[0] - b'0') * 10 + u32::from(d[1] - b'0'))
                        .ok_or_else(|| self.unexpected())?;
                    self.pos += 3;
                    self.ring_closure(digit)?;
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }
        Ok(())
    }

    fn unexpected(&self) -> SmilesError {
        SmilesError::UnexpectedCharacter {
            character: char::from(self.bytes[self.pos.min(self.bytes.len() - 1)]),
            position: self.pos,
        }
    }

    fn bond_symbol(&mut self, token: BondToken, up: Option<bool>) -> Result<(), SmilesError> {
        if self.prev.is_none() || self.pending_bond.is_some() {
            return Err(self.unexpected());
        }
        self.pending_bond = Some(PendingBond {
            token,
            position: self.pos,
            up,
        });
        self.pos += 1;
        Ok(())
    }

    fn resolve_order(&self, token: Option<BondToken>, a: usize, b: usize) -> BondOrder {
        match token {
            Some(BondToken::Single) => BondOrder::Single,
            Some(BondToken::Double) => BondOrder::Double,
            Some(BondToken::Triple) => BondOrder::Triple,
            Some(BondToken::Aromatic) => BondOrder::Aromatic,
            None => {
                let atoms = self.mol.atoms();
                if atoms[a].is_aromatic && atoms[b].is_aromatic {
                    BondOrder::Aromatic
                } else {
                    BondOrder::Single
                }
            }
        }
    }

    fn ring_closure(&mut self, digit: u32) -> Result<(), SmilesError> {
        let position = self.pos - 1;
        let Some(current) = self.prev else {
            return Err(SmilesError::UnexpectedCharacter {
                character: char::from(self.bytes[position]),
                position,
            });
        };
        let closing = self.pending_bond.take();
        let closing_token = closing.map(|bond| bond.token);
        let closing_up = closing.and_then(|bond| bond.up);

        match self.rings.remove(&digit) {
            Some(opening) => {
                let opener = opening.atom;
                let token = match (opening.token, closing_token) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::ConflictingRingBond { digit, position });
                    }
                    (a, b) => a.or(b),
                };
                let order = self.resolve_order(token, opener, current);
                self.mol.add_bond(opener, current, order)?;
                self.slots[opener][opening.slot] = Slot::Atom(current);
                self.slots[current].push(Slot::Atom(opener));
                if let Some(up) = opening.up {
                    self.directional.push((opener, current, up));
                }
                if let Some(up) = closing_up {
                    self.directional.push((current, opener, up));
                }
            }
            None => {
                let slot = self.slots[current].len();
                self.slots[current].push(Slot::Pending);
                self.rings.insert(
                    digit,
                    RingOpening {
                        atom: current,
                        token: closing_token,
                        up: closing_up,
                        slot,
                    },
                );
            }
        }
        Ok(())
    }

    fn attach(&mut self, atom: Atom, mut annotations: AtomAnnotations) -> Result<(), SmilesError> {
        let idx = self.mol.add_atom(atom);
        let pending = self.pending_bond.take();
        let mut slots = Vec::new();
        if let Some(prev) = self.prev {
            let order = self.resolve_order(pending.map(|bond| bond.token), prev, idx);
            self.mol.add_bond(prev, idx, order)?;
            self.slots[prev].push(Slot::Atom(idx));
            slots.push(Slot::Atom(prev));
            if let Some(up) = pending.and_then(|bond| bond.up) {
                self.directional.push((prev, idx, up));
            }
        }
        if annotations.hydrogens.is_some_and(|count| count > 0) {
            slots.push(Slot::Hydrogens);
        }
        annotations.preceded = self.prev.is_some();
        self.annotations.push(annotations);
        self.slots.push(slots);
        self.prev = Some(idx);
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), SmilesError> {
        let rest = &self.bytes[self.pos..];
        let (element, aromatic, width) = match rest {
            [b'C', b'l', ..] => (Element::Cl, false, 2),
            [b'B', b'r', ..] => (Element::Br, false, 2),
            [b'B', ..] => (Element::B, false, 1),
            [b'C', ..] => (Element::C, false, 1),
            [b'N', ..] => (Element::N, false, 1),
            [b'O', ..] => (Element::O, false, 1),
            [b'P', ..] => (Element::P, false, 1),
            [b'S', ..] => (Element::S, false, 1),
            [b'F', ..] => (Element::F, false, 1),
            [b'I', ..] => (Element::I, false, 1),
            [b'b', ..] => (Element::B, true, 1),
            [b'c', ..] => (Element::C, true, 1),
            [b'n', ..] => (Element::N, true, 1),
            [b'o', ..] => (Element::O, true, 1),
            [b'p', ..] => (Element::P, true, 1),
            [b's', ..] => (Element::S, true, 1),
            _ => return Err(self.unexpected()),
        };
        self.pos += width;
        let mut atom = Atom::new(element);
        atom.is_aromatic = aromatic;
        self.attach(atom, AtomAnnotations::default())
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bracket_atom(&mut self) -> Result<(), SmilesError> {
        let start = self.pos;
        self.pos += 1;

        let isotope = self.read_number();

        let symbol_start = self.pos;
        let (element, aromatic) = self.bracket_symbol().ok_or_else(|| {
            let end = (symbol_start + 2).min(self.bytes.len());
            SmilesError::UnknownElement {
                symbol: String::from_utf8_lossy(&self.bytes[symbol_start..end]).into_owned(),
                position: symbol_start,
            }
        })?;

        let mut at_signs = 0;
        while self.peek() == Some(b'@') {
            self.pos += 1;
            at_signs += 1;
        }
        let mut chirality = match at_signs {
            0 => None,
            1 => Some(Chirality::CounterClockwise),
            _ => Some(Chirality::Clockwise),
        };
        let chiral_class = match self.bytes.get(self.pos..self.pos + 2) {
            Some(&[a, b]) => Some([a, b]),
            _ => None,
        };
        if at_signs > 0
            && matches!(
                chiral_class,
                Some([b'T', b'H'] | [b'A', b'L'] | [b'S', b'P'] | [b'T', b'B'] | [b'O', b'H'])
            )
        {
            self.pos += 2;
            let number = self.read_number();
            // Only the tetrahedral class is represented.
            chirality = match (chiral_class, number) {
                (Some([b'T', b'H']), Some(1)) => Some(Chirality::CounterClockwise),
                (Some([b'T', b'H']), Some(2)) => Some(Chirality::Clockwise),
                _ => None,
            };
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.read_number().map_or(1, |n| n.min(u32::from(u8::MAX)) as u8);
        }

        let mut charge: i32 = 0;
        if let Some(sign_byte @ (b'+' | b'-')) = self.peek() {
            let sign = if sign_byte == b'+' { 1 } else { -1 };
            self.pos += 1;
            let magnitude = match self.read_number() {
                Some(n) => n as i32,
                None => {
                    let mut count = 1;
                    while self.peek() == Some(sign_byte) {
                        self.pos += 1;
                        count += 1;
                    }
                    count
                }
            };
            charge = sign * magnitude;
        }

        let mut map = None;
        if self.peek() == Some(b':') {
            self.pos += 1;
            map = self.read_number();
        }

        if self.peek() != Some(b']') {
            return Err(SmilesError::UnterminatedBracket(start));
        }
        self.pos += 1;

        let mut atom = Atom::new(element).with_charge(charge.clamp(-128, 127) as i8);
        atom.isotope = isotope.map(|n| n.min(u32::from(u16::MAX)) as u16);
        atom.is_aromatic = aromatic;
        self.attach(
            atom,
            AtomAnnotations {
                hydrogens: Some(hydrogens),
                map,
                chirality,
                preceded: false,
            },
        )
    }

    fn bracket_symbol(&mut self) -> Option<(Element, bool)> {
        let rest = &self.bytes[self.pos..];
        let first = *rest.first()?;

        if first.is_ascii_lowercase() {
            let (element, width) = match rest {
                [b's', b'e', ..] => (Element::Se, 2),
                [b'a', b's', ..] => (Element::As, 2),
                [b'b', ..] => (Element::B, 1),
                [b'c', ..] => (Element::C, 1),
                [b'n', ..] => (Element::N, 1),
                [b'o', ..] => (Element::O, 1),
                [b'p', ..] => (Element::P, 1),
                [b's', ..] => (Element::S, 1),
                _ => return None,
            };
            self.pos += width;
            return Some((element, true));
        }

        if !first.is_ascii_uppercase() {
            return None;
        }
        if let Some(&second) = rest.get(1) {
            if second.is_ascii_lowercase() {
                let two = [first, second];
                let symbol = std::str::from_utf8(&two).ok()?;
                if let Ok(element) = symbol.parse::<Element>() {
                    self.pos += 2;
                    return Some((element, false));
                }
            }
        }
        let one = [first];
        let element = std::str::from_utf8(&one).ok()?.parse::<Element>().ok()?;
        self.pos += 1;
        Some((element, false))
    }

    fn finish(mut self) -> Result<Molecule, SmilesError> {
        if let Some(bond) = self.pending_bond {
            return Err(SmilesError::DanglingBond(bond.position));
        }
        if let Some(&(_, position)) = self.branches.last() {
            return Err(SmilesError::UnbalancedParenthesis(position));
        }
        if let Some((&digit, _)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing(digit));
        }
        if self.mol.n_atoms() == 0 {
            return Err(SmilesError::Empty);
        }

        let n_graph_atoms = self.mol.n_atoms();
        let mut added_hydrogens = 0usize;
        let mut first_hydrogen = vec![None; n_graph_atoms];
        for idx in 0..n_graph_atoms {
            let count = match self.annotations[idx].hydrogens {
                Some(explicit) => explicit,
                None => {
                    let atom = &self.mol.atoms()[idx];
                    implicit_hydrogens(atom.element, atom.is_aromatic, self.mol.bonded_valence(idx))
                }
            };
            for _ in 0..count {
                let h = self.mol.add_atom(Atom::new(Element::H));
                self.mol.add_bond(idx, h, BondOrder::Single)?;
                first_hydrogen[idx].get_or_insert(h);
                added_hydrogens += 1;
            }
        }

        self.assign_chirality(&first_hydrogen);
        self.assign_double_bond_stereo();

        if added_hydrogens == 0 {
            if let Some(order) = map_order(&self.annotations) {
                return Ok(self.mol.reordered(&order)?);
            }
        }
        Ok(self.mol)
    }
}

impl Parser<'_> {
    /// Converts written `@`/`@@` marks into chirality relative to the reference
    /// neighbor order. Marks on atoms that are not tetrahedral centres, or
    /// whose bracket holds more than one hydrogen, are dropped.
    fn assign_chirality(&mut self, first_hydrogen: &[Option<usize>]) {
        for (idx, annotation) in self.annotations.iter().enumerate() {
            let Some(tag) = annotation.chirality else {
                continue;
            };
            let mut order = Vec::with_capacity(4);
            let mut resolved = true;
            for slot in &self.slots[idx] {
                match slot {
                    Slot::Atom(neighbor) => order.push(Some(*neighbor)),
                    Slot::Hydrogens if annotation.hydrogens == Some(1) => {
                        order.push(first_hydrogen[idx]);
                    }
                    Slot::Hydrogens | Slot::Pending => resolved = false,
                }
            }
            if order.len() == 3 {
                order.insert(usize::from(annotation.preceded), None);
            }
            if !resolved || order.len() != 4 || !stereo::can_be_chiral(&self.mol, idx) {
                continue;
            }
            if let Some(atom) = self.mol.atom_mut(idx) {
                atom.chirality = Some(stereo::reorient(tag, &order));
            }
        }
    }

    /// Configures double bonds that have a directional single bond on each end.
    fn assign_double_bond_stereo(&mut self) {
        for bond_idx in 0..self.mol.n_bonds() {
            let bond = self.mol.bonds()[bond_idx];
            if bond.order != BondOrder::Double {
                continue;
            }
            let first = self.marked_substituent(bond.i, bond.j);
            let second = self.marked_substituent(bond.j, bond.i);
            if let (Some((a, up_a)), Some((b, up_b))) = (first, second) {
                let config = if up_a == up_b {
                    BondStereo::Cis
                } else {
                    BondStereo::Trans
                };
                stereo::set_relation(&mut self.mol, bond_idx, a, b, config);
            }
        }
    }

    /// A substituent of `end` joined by a directional bond, and whether it lies
    /// above `end`.
    fn marked_substituent(&self, end: usize, partner: usize) -> Option<(usize, bool)> {
        self.directional.iter().find_map(|&(from, to, up)| {
            if from == end && to != partner {
                Some((to, up))
            } else if to == end && from != partner {
                Some((from, !up))
            } else {
                None
            }
        })
    }
}

/// Atom order implied by map numbers, when they cover exactly `1..=n`.
fn map_order(annotations: &[AtomAnnotations]) -> Option<Vec<usize>> {
    let n = annotations.len();
    let mut order = vec![usize::MAX; n];
    for (idx, annotation) in annotations.iter().enumerate() {
        let map = annotation.map? as usize;
        if map == 0 || map > n || order[map - 1] != usize::MAX {
            return None;
        }
        order[map - 1] = idx;
    }
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heavy_symbols(mol: &Molecule) -> Vec<&'static str> {
        mol.atoms()
            .iter()
            .filter(|a| !a.is_hydrogen())
            .map(|a| a.element.symbol())
            .collect()
    }

    #[test]
    fn parses_simple_chain_with_implicit_hydrogens() {
        let mol = parse("CCO").unwrap();
        assert_eq!(heavy_symbols(&mol), vec!["C", "C", "O"]);
        assert_eq!(mol.n_atoms(), 9);
        assert_eq!(mol.hydrogen_count(0), 3);
        assert_eq!(mol.hydrogen_count(1), 2);
        assert_eq!(mol.hydrogen_count(2), 1);
    }

    #[test]
    fn parses_branches_and_double_bonds() {
        let mol = parse("CC(=O)O").unwrap();
        let carbonyl = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds()[carbonyl].order, BondOrder::Double);
        assert_eq!(mol.hydrogen_count(1), 0);
        assert_eq!(mol.hydrogen_count(3), 1);
        assert_eq!(mol.formula(), "C2H4O2");
    }

    #[test]
    fn parses_aromatic_rings() {
        let mol = parse("c1ccccc1").unwrap();
        assert_eq!(mol.n_heavy_atoms(), 6);
        assert!(mol.atoms()[0].is_aromatic);
        let closure = mol.bond_between(0, 5).unwrap();
        assert_eq!(mol.bonds()[closure].order, BondOrder::Aromatic);
        assert_eq!(mol.formula(), "C6H6");
    }

    #[test]
    fn parses_pyrrole_nitrogen_with_bracket_hydrogen() {
        let mol = parse("c1cc[nH]c1").unwrap();
        assert_eq!(mol.formula(), "C4H5N");
        assert_eq!(mol.hydrogen_count(3), 1);
    }

    #[test]
    fn parses_bracket_atom_details() {
        let mol = parse("[13CH3][N+](C)(C)C").unwrap();
        assert_eq!(mol.atoms()[0].isotope, Some(13));
        assert_eq!(mol.atoms()[1].formal_charge, 1);
        assert_eq!(mol.hydrogen_count(1), 0);
        assert_eq!(mol.total_charge(), 1);

        let sulfate = parse("[O-]S(=O)(=O)[O-]").unwrap();
        assert_eq!(sulfate.total_charge(), -2);
        assert_eq!(parse("[Fe+++]").unwrap().total_charge(), 3);
        assert_eq!(parse("[Cu+2]").unwrap().total_charge(), 2);
    }

    #[test]
    fn parses_two_letter_elements_and_chirality() {
        let mol = parse("ClC(Br)[C@@H](F)I").unwrap();
        assert_eq!(heavy_symbols(&mol), vec!["Cl", "C", "Br", "C", "F", "I"]);
        assert_eq!(mol.hydrogen_count(3), 1);
        // Written order C1, H, F, I is an even permutation of the sorted order.
        assert_eq!(mol.atoms()[3].chirality, Some(Chirality::Clockwise));
        assert_eq!(mol.atoms()[1].chirality, None);
    }

    #[test]
    fn chirality_is_stored_independently_of_the_spelling() {
        let written_first = parse("[C@@H](F)(Cl)Br").unwrap();
        let written_last = parse("F[C@H](Cl)Br").unwrap();
        // Both describe the same centre; the reference orders differ only by
        // where the atoms sit in the index order.
        assert!(written_first.atoms()[0].chirality.is_some());
        assert_eq!(written_first.canonical_smiles(), written_last.canonical_smiles());
        assert_ne!(
            parse("F[C@@H](Cl)Br").unwrap().canonical_smiles(),
            written_last.canonical_smiles()
        );
        assert_eq!(
            parse("F[C@TH1H](Cl)Br").unwrap().canonical_smiles(),
            written_last.canonical_smiles()
        );
    }

    #[test]
    fn ring_closures_take_their_place_in_the_neighbor_order() {
        let a = parse("C[C@H]1CCCN1").unwrap();
        let b = parse("C[C@H](N1)CCC1").unwrap();
        assert_eq!(a.canonical_smiles(), b.canonical_smiles());
    }

    #[test]
    fn parses_percent_ring_closures_and_dots() {
        let mol = parse("C%10CC%10").unwrap();
        assert!(mol.bond_between(0, 2).is_some());
        let salt = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(salt.n_bonds(), 0);
        assert_eq!(salt.total_charge(), 0);
    }

    #[test]
    fn aromatic_heteroatoms_take_no_implicit_hydrogens() {
        assert_eq!(parse("c1ccsc1").unwrap().formula(), "C4H4S");
        assert_eq!(parse("c1ccoc1").unwrap().formula(), "C4H4O");
        assert_eq!(parse("c1ccncc1").unwrap().formula(), "C5H5N");
        assert_eq!(parse("Cn1cccc1").unwrap().formula(), "C5H7N");
    }

    #[test]
    fn stereo_bond_marks_are_single_bonds() {
        let mol = parse("F/C=C/F").unwrap();
        assert_eq!(mol.formula(), "C2H2F2");
        let double = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds()[double].stereo, Some(BondStereo::Trans));
        assert_eq!(mol.bonds()[mol.bond_between(0, 1).unwrap()].order, BondOrder::Single);
    }

    #[test]
    fn bond_directions_give_cis_and_trans() {
        let relation = |smiles: &str| {
            let mol = parse(smiles).unwrap();
            let double = mol.bond_between(1, 2).unwrap();
            stereo::relation(&mol, double, 0, 3)
        };
        assert_eq!(relation("C/C=C/C"), Some(BondStereo::Trans));
        assert_eq!(relation("C/C=C\\C"), Some(BondStereo::Cis));
        assert_eq!(relation("C\\C=C\\C"), Some(BondStereo::Trans));
        assert_eq!(relation("C\\C=C/C"), Some(BondStereo::Cis));
        assert_eq!(relation("CC=CC"), None);
        assert_eq!(relation("C/C=CC"), None);
    }

    #[test]
    fn hypervalent_atoms_use_next_default_valence() {
        let dmso = parse("CS(=O)C").unwrap();
        assert_eq!(dmso.hydrogen_count(1), 0);
        let phosphate = parse("OP(=O)(O)O").unwrap();
        assert_eq!(phosphate.hydrogen_count(1), 0);
        assert_eq!(phosphate.formula(), "H3O4P");
    }

    #[test]
    fn fully_mapped_smiles_reorders_atoms() {
        let mol = parse("[O:2]([C:1]([H:3])([H:4])[H:5])[H:6]").unwrap();
        assert_eq!(mol.atoms()[0].element, Element::C);
        assert_eq!(mol.atoms()[1].element, Element::O);
        assert_eq!(mol.atoms()[5].element, Element::H);
        assert!(mol.bond_between(1, 5).is_some());
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse(""), Err(SmilesError::Empty));
        assert_eq!(parse("C1CC"), Err(SmilesError::UnclosedRing(1)));
        assert!(matches!(parse("CC("), Err(SmilesError::UnbalancedParenthesis(_))));
        assert!(matches!(parse("CC)"), Err(SmilesError::UnbalancedParenthesis(_))));
        assert!(matches!(parse("CC="), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(parse("[Xx]"), Err(SmilesError::UnknownElement { .. })));
        assert!(matches!(parse("[CH4"), Err(SmilesError::UnterminatedBracket(0))));
        assert!(matches!(parse("C$C"), Err(SmilesError::UnsupportedBond(1))));
        assert!(matches!(parse("Cx"), Err(SmilesError::UnexpectedCharacter { .. })));
        assert!(matches!(parse("C=1CC-1"), Err(SmilesError::ConflictingRingBond { .. })));
    }
}
