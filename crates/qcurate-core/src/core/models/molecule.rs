use super::atom::Atom;
use super::element::Element;
use super::topology::{Bond, BondOrder, BondStereo};
use crate::core::chem::smiles::{self, SmilesError, SmilesOptions};
use crate::core::chem::stereo;
use nalgebra::Point3;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// One set of 3D coordinates in Ångström, one point per atom.
pub type Conformer = Vec<Point3<f64>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoleculeError {
    #[error("Atom index {index} is out of range for a molecule with {n_atoms} atoms")]
    AtomOutOfRange { index: usize, n_atoms: usize },
    #[error("An atom cannot be bonded to itself (atom {0})")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("Conformer has {found} positions but the molecule has {expected} atoms")]
    ConformerSize { expected: usize, found: usize },
    #[error("Atom order is not a permutation of the {0} atoms of the molecule")]
    InvalidPermutation(usize),
}

/// A molecular graph with explicit hydrogens and any number of conformers.
///
/// The molecule is the unit of work passed between workflow components. Its
/// identity is its canonical SMILES; the atom order is the order in which atoms
/// were added and is preserved by every component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// A human readable name, usually taken from the input file.
    pub name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    conformers: Vec<Conformer>,
    /// Free-form string properties (SDF data items, CSV columns).
    pub properties: BTreeMap<String, String>,
    /// Cached adjacency list of `(neighbor, bond index)` pairs, indexed by atom.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a SMILES string, adding explicit hydrogens.
    pub fn from_smiles(smiles: &str) -> Result<Self, SmilesError> {
        smiles::parse(smiles)
    }

    /// Adds an atom and returns its index.
    ///
    /// Existing conformers no longer describe the molecule and are discarded.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.conformers.clear();
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds a bond between two existing atoms and returns its index.
    pub fn add_bond(
        &mut self,
        i: usize,
        j: usize,
        order: BondOrder,
    ) -> Result<usize, MoleculeError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(MoleculeError::SelfBond(i));
        }
        if self.bond_between(i, j).is_some() {
            return Err(MoleculeError::DuplicateBond(i.min(j), i.max(j)));
        }
        let bond_idx = self.bonds.len();
        self.bonds.push(Bond::new(i, j, order));
        self.adjacency[i].push((j, bond_idx));
        self.adjacency[j].push((i, bond_idx));
        Ok(bond_idx)
    }

    fn check_index(&self, index: usize) -> Result<(), MoleculeError> {
        if index < self.atoms.len() {
            Ok(())
        } else {
            Err(MoleculeError::AtomOutOfRange {
                index,
                n_atoms: self.atoms.len(),
            })
        }
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[inline]
    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub(crate) fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    #[inline]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    #[inline]
    pub fn bond(&self, index: usize) -> Option<&Bond> {
        self.bonds.get(index)
    }

    /// Sets a bond order; configuration marks only survive on double bonds.
    pub(crate) fn set_bond_order(&mut self, bond_idx: usize, order: BondOrder) {
        if let Some(bond) = self.bonds.get_mut(bond_idx) {
            bond.order = order;
            if order != BondOrder::Double {
                bond.stereo = None;
            }
        }
    }

    pub(crate) fn set_bond_stereo(&mut self, bond_idx: usize, stereo: Option<BondStereo>) {
        if let Some(bond) = self.bonds.get_mut(bond_idx) {
            bond.stereo = stereo;
        }
    }

    /// Whether any atom or bond carries a configuration mark.
    pub fn has_stereo(&self) -> bool {
        self.atoms.iter().any(|a| a.chirality.is_some())
            || self.bonds.iter().any(|b| b.stereo.is_some())
    }

    /// Returns the index of the bond between `i` and `j`, if any.
    pub fn bond_between(&self, i: usize, j: usize) -> Option<usize> {
        self.adjacency
            .get(i)?
            .iter()
            .find(|(neighbor, _)| *neighbor == j)
            .map(|&(_, bond_idx)| bond_idx)
    }

    /// Returns the `(neighbor, bond index)` pairs of an atom.
    pub fn bonded(&self, atom: usize) -> &[(usize, usize)] {
        self.adjacency.get(atom).map_or(&[], Vec::as_slice)
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonded(atom).iter().map(|&(neighbor, _)| neighbor)
    }

    #[inline]
    pub fn degree(&self, atom: usize) -> usize {
        self.bonded(atom).len()
    }

    /// Number of non-hydrogen neighbors.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.neighbors(atom)
            .filter(|&n| !self.atoms[n].is_hydrogen())
            .count()
    }

    /// Number of hydrogen neighbors.
    pub fn hydrogen_count(&self, atom: usize) -> usize {
        self.neighbors(atom)
            .filter(|&n| self.atoms[n].is_hydrogen())
            .count()
    }

    /// Sum of bond valences at an atom, with one extra unit for aromatic atoms.
    pub fn bonded_valence(&self, atom: usize) -> u8 {
        let sum: u8 = self
            .bonded(atom)
            .iter()
            .map(|&(_, bond_idx)| self.bonds[bond_idx].order.valence())
            .sum();
        let aromatic_bonus = self.atoms.get(atom).is_some_and(|a| a.is_aromatic) as u8;
        sum + aromatic_bonus
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn n_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn n_heavy_atoms(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    pub fn heavy_atom_indices(&self) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_hydrogen())
            .map(|(i, _)| i)
            .collect()
    }

    #[inline]
    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    #[inline]
    pub fn n_conformers(&self) -> usize {
        self.conformers.len()
    }

    pub fn add_conformer(&mut self, conformer: Conformer) -> Result<(), MoleculeError> {
        if conformer.len() != self.atoms.len() {
            return Err(MoleculeError::ConformerSize {
                expected: self.atoms.len(),
                found: conformer.len(),
            });
        }
        self.conformers.push(conformer);
        Ok(())
    }

    pub fn clear_conformers(&mut self) {
        self.conformers.clear();
    }

    /// Replaces every conformer, validating their sizes first.
    pub fn set_conformers(&mut self, conformers: Vec<Conformer>) -> Result<(), MoleculeError> {
        if let Some(bad) = conformers.iter().find(|c| c.len() != self.atoms.len()) {
            return Err(MoleculeError::ConformerSize {
                expected: self.atoms.len(),
                found: bad.len(),
            });
        }
        self.conformers = conformers;
        Ok(())
    }

    pub fn total_charge(&self) -> i32 {
        self.atoms.iter().map(|a| i32::from(a.formal_charge)).sum()
    }

    pub fn elements(&self) -> BTreeSet<Element> {
        self.atoms.iter().map(|a| a.element).collect()
    }

    /// Average molecular weight in daltons, counting every explicit atom.
    pub fn molecular_weight(&self) -> f64 {
        self.atoms.iter().map(|a| a.element.mass()).sum()
    }

    /// Molecular formula in Hill order.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.symbol()).or_default() += 1;
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(carbon) = counts.remove("C") {
            push("C", carbon);
            if let Some(hydrogen) = counts.remove("H") {
                push("H", hydrogen);
            }
        }
        for (symbol, count) in counts {
            push(symbol, count);
        }
        formula
    }

    /// Returns a copy whose atom `k` is atom `order[k]` of this molecule.
    ///
    /// Bonds, conformers, properties, and stereo configuration follow the atoms.
    pub fn reordered(&self, order: &[usize]) -> Result<Self, MoleculeError> {
        let n = self.atoms.len();
        let mut new_index = vec![usize::MAX; n];
        if order.len() != n {
            return Err(MoleculeError::InvalidPermutation(n));
        }
        for (k, &old) in order.iter().enumerate() {
            if old >= n || new_index[old] != usize::MAX {
                return Err(MoleculeError::InvalidPermutation(n));
            }
            new_index[old] = k;
        }

        let mut reordered = Molecule::with_name(self.name.clone());
        reordered.properties = self.properties.clone();
        for &old in order {
            reordered.add_atom(self.atoms[old].clone());
        }
        for bond in &self.bonds {
            reordered.add_bond(new_index[bond.i], new_index[bond.j], bond.order)?;
        }
        for (k, &old) in order.iter().enumerate() {
            if let Some(chirality) = self.atoms[old].chirality {
                let mapped: Vec<Option<usize>> = stereo::reference_order(self, old)
                    .into_iter()
                    .map(|slot| slot.map(|n| new_index[n]))
                    .collect();
                reordered.atoms[k].chirality = Some(stereo::reorient(chirality, &mapped));
            }
        }
        for (idx, bond) in self.bonds.iter().enumerate() {
            let Some(config) = bond.stereo else {
                continue;
            };
            let first = stereo::substituents(self, bond.i, bond.j).first().copied();
            let second = stereo::substituents(self, bond.j, bond.i).first().copied();
            if let (Some(first), Some(second)) = (first, second) {
                let (first, second) = (new_index[first], new_index[second]);
                stereo::set_relation(&mut reordered, idx, first, second, config);
            }
        }
        for conformer in &self.conformers {
            reordered.add_conformer(order.iter().map(|&old| conformer[old]).collect())?;
        }
        Ok(reordered)
    }

    /// SMILES in input atom order, hydrogens implicit where possible.
    pub fn to_smiles(&self) -> String {
        smiles::write(self, &SmilesOptions::default())
    }

    /// Canonical isomeric SMILES used as the molecule's identity.
    ///
    /// Written from an aromaticity-perceived copy so that Kekulé and aromatic
    /// spellings of the same structure produce the same string.
    pub fn canonical_smiles(&self) -> String {
        smiles::write(&self.perceived(), &SmilesOptions::canonical())
    }

    /// Canonical SMILES with every hydrogen written as an explicit atom.
    pub fn canonical_explicit_hydrogen_smiles(&self) -> String {
        smiles::write(
            &self.perceived(),
            &SmilesOptions {
                explicit_hydrogens: true,
                ..SmilesOptions::canonical()
            },
        )
    }

    /// Canonical explicit-hydrogen SMILES where every atom carries its index + 1
    /// as map number, so the atom order can be rebuilt from the string.
    pub fn mapped_smiles(&self) -> String {
        smiles::write(&self.perceived(), &SmilesOptions::mapped())
    }

    /// Canonical rank of every atom, computed on the aromaticity-perceived graph.
    ///
    /// Two molecules with the same canonical SMILES have the same ranks on
    /// corresponding atoms, which gives an atom mapping between them.
    pub fn canonical_ranks(&self) -> Vec<usize> {
        crate::core::chem::canon::canonical_ranks(&self.perceived())
    }

    fn perceived(&self) -> Self {
        let mut copy = self.clone();
        crate::core::chem::aromaticity::perceive(&mut copy);
        crate::core::chem::canon::strip_non_stereogenic(&mut copy);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Molecule {
        let mut mol = Molecule::with_name("water");
        let o = mol.add_atom(Atom::new(Element::O));
        let h1 = mol.add_atom(Atom::new(Element::H));
        let h2 = mol.add_atom(Atom::new(Element::H));
        mol.add_bond(o, h1, BondOrder::Single).unwrap();
        mol.add_bond(o, h2, BondOrder::Single).unwrap();
        mol
    }

    #[test]
    fn add_bond_rejects_invalid_bonds() {
        let mut mol = water();
        assert_eq!(
            mol.add_bond(0, 0, BondOrder::Single),
            Err(MoleculeError::SelfBond(0))
        );
        assert_eq!(
            mol.add_bond(1, 0, BondOrder::Single),
            Err(MoleculeError::DuplicateBond(0, 1))
        );
        assert_eq!(
            mol.add_bond(0, 9, BondOrder::Single),
            Err(MoleculeError::AtomOutOfRange { index: 9, n_atoms: 3 })
        );
    }

    #[test]
    fn degree_queries_distinguish_hydrogens() {
        let mol = water();
        assert_eq!(mol.degree(0), 2);
        assert_eq!(mol.heavy_degree(0), 0);
        assert_eq!(mol.hydrogen_count(0), 2);
        assert_eq!(mol.heavy_degree(1), 1);
        assert_eq!(mol.n_heavy_atoms(), 1);
        assert_eq!(mol.bond_between(2, 0), Some(1));
        assert_eq!(mol.bond_between(1, 2), None);
    }

    #[test]
    fn formula_weight_and_charge_are_derived_from_atoms() {
        let mol = water();
        assert_eq!(mol.formula(), "H2O");
        assert!((mol.molecular_weight() - 18.015).abs() < 1e-3);
        assert_eq!(mol.total_charge(), 0);
        assert_eq!(
            mol.elements().into_iter().collect::<Vec<_>>(),
            vec![Element::H, Element::O]
        );
    }

    #[test]
    fn formula_uses_hill_order_for_organic_molecules() {
        let mol = Molecule::from_smiles("ClCC(=O)N").unwrap();
        assert_eq!(mol.formula(), "C2H4ClNO");
    }

    #[test]
    fn add_conformer_checks_size() {
        let mut mol = water();
        let good = vec![Point3::origin(); 3];
        assert!(mol.add_conformer(good).is_ok());
        assert_eq!(mol.n_conformers(), 1);
        let bad = vec![Point3::origin(); 2];
        assert_eq!(
            mol.add_conformer(bad),
            Err(MoleculeError::ConformerSize { expected: 3, found: 2 })
        );
    }

    #[test]
    fn adding_an_atom_discards_conformers() {
        let mut mol = water();
        mol.add_conformer(vec![Point3::origin(); 3]).unwrap();
        mol.add_atom(Atom::new(Element::Na).with_charge(1));
        assert_eq!(mol.n_conformers(), 0);
    }

    #[test]
    fn reordered_moves_bonds_and_coordinates() {
        let mut mol = water();
        mol.add_conformer(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();

        let reordered = mol.reordered(&[1, 0, 2]).unwrap();
        assert_eq!(reordered.atoms()[1].element, Element::O);
        assert_eq!(reordered.degree(1), 2);
        assert_eq!(reordered.conformers()[0][0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(reordered.name, "water");
        assert_eq!(
            mol.reordered(&[0, 0, 1]),
            Err(MoleculeError::InvalidPermutation(3))
        );
    }

    #[test]
    fn reordered_keeps_the_configuration_of_stereocentres() {
        let mol = Molecule::from_smiles("F[C@H](Cl)Br").unwrap();
        let reversed: Vec<usize> = (0..mol.n_atoms()).rev().collect();
        let reordered = mol.reordered(&reversed).unwrap();
        assert!(reordered.has_stereo());
        assert_eq!(reordered.canonical_smiles(), mol.canonical_smiles());

        let alkene = Molecule::from_smiles("C/C=C\\C").unwrap();
        let rotated: Vec<usize> = (1..alkene.n_atoms()).chain([0]).collect();
        let reordered = alkene.reordered(&rotated).unwrap();
        assert_eq!(reordered.canonical_smiles(), alkene.canonical_smiles());
        assert_ne!(
            reordered.canonical_smiles(),
            Molecule::from_smiles("C/C=C/C").unwrap().canonical_smiles()
        );
    }

    #[test]
    fn bonded_valence_adds_one_for_aromatic_atoms() {
        let benzene = Molecule::from_smiles("c1ccccc1").unwrap();
        assert_eq!(benzene.bonded_valence(0), 4);
        let ethene = Molecule::from_smiles("C=C").unwrap();
        assert_eq!(ethene.bonded_valence(0), 4);
    }

    #[test]
    fn canonical_smiles_is_independent_of_input_order() {
        let a = Molecule::from_smiles("OCC").unwrap();
        let b = Molecule::from_smiles("C(O)C").unwrap();
        assert_eq!(a.canonical_smiles(), b.canonical_smiles());
        assert_eq!(a.canonical_smiles(), "CCO");
    }
}
