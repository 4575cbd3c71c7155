use super::element::Element;

/// Handedness of a tetrahedral centre.
///
/// Looking from the first reference neighbor, the remaining three are arranged
/// counter-clockwise (`@` in SMILES) or clockwise (`@@`). The reference order is
/// a lone pair first, when the centre has three neighbors, followed by the
/// neighbors in ascending atom index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chirality {
    CounterClockwise,
    Clockwise,
}

impl Chirality {
    pub fn inverted(self) -> Self {
        match self {
            Self::CounterClockwise => Self::Clockwise,
            Self::Clockwise => Self::CounterClockwise,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::CounterClockwise => "@",
            Self::Clockwise => "@@",
        }
    }
}

/// An atom of a molecular graph.
///
/// Atoms carry only the information needed to reproduce a molecule's identity:
/// hydrogens are always explicit atoms of the graph, so no implicit hydrogen
/// count is stored here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// The chemical element of the atom.
    pub element: Element,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number, when the atom is a specific isotope.
    pub isotope: Option<u16>,
    /// Whether the atom belongs to an aromatic system.
    pub is_aromatic: bool,
    /// Tetrahedral configuration, when the atom is a specified stereocentre.
    pub chirality: Option<Chirality>,
}

impl Atom {
    /// Creates a neutral, non-aromatic atom of the natural isotope mixture.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            isotope: None,
            is_aromatic: false,
            chirality: None,
        }
    }

    pub fn with_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    pub fn with_isotope(mut self, isotope: u16) -> Self {
        self.isotope = Some(isotope);
        self
    }

    pub fn aromatic(mut self) -> Self {
        self.is_aromatic = true;
        self
    }

    pub fn with_chirality(mut self, chirality: Chirality) -> Self {
        self.chirality = Some(chirality);
        self
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}
