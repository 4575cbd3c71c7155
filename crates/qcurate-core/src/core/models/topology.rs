use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = 4,
}

impl BondOrder {
    /// Number of valence units the bond consumes on each of its atoms.
    ///
    /// Aromatic bonds count as one unit; the extra half unit per aromatic atom is
    /// accounted for once per atom, not per bond.
    pub fn valence(self) -> u8 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Bond order as a floating point number, aromatic bonds counting 1.5.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::Double => 2.0,
            Self::Triple => 3.0,
            Self::Aromatic => 1.5,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// Configuration of a double bond.
///
/// Relative to the lowest-index substituent on each end of the bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondStereo {
    Cis,
    Trans,
}

impl BondStereo {
    pub fn flipped(self) -> Self {
        match self {
            Self::Cis => Self::Trans,
            Self::Trans => Self::Cis,
        }
    }
}

/// An undirected bond; the atom indices are stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
    /// Cis/trans configuration of a stereogenic double bond.
    pub stereo: Option<BondStereo>,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        let (i, j) = if idx1 <= idx2 { (idx1, idx2) } else { (idx2, idx1) };
        Self {
            i,
            j,
            order,
            stereo: None,
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.i == atom || self.j == atom
    }

    /// Returns the atom on the other end of the bond, if `atom` belongs to it.
    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.i == atom {
            Some(self.j)
        } else if self.j == atom {
            Some(self.i)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("S".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("2".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("4".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert_eq!("ar".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("0".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_valence_counts_aromatic_as_one() {
        assert_eq!(BondOrder::Single.valence(), 1);
        assert_eq!(BondOrder::Double.valence(), 2);
        assert_eq!(BondOrder::Triple.valence(), 3);
        assert_eq!(BondOrder::Aromatic.valence(), 1);
        assert_eq!(BondOrder::Aromatic.as_f64(), 1.5);
    }

    #[test]
    fn bond_new_normalizes_atom_order() {
        let bond = Bond::new(5, 2, BondOrder::Double);
        assert_eq!(bond.i, 2);
        assert_eq!(bond.j, 5);
        assert_eq!(bond.order, BondOrder::Double);
        assert_eq!(bond.stereo, None);
    }

    #[test]
    fn bond_stereo_flips_between_cis_and_trans() {
        assert_eq!(BondStereo::Cis.flipped(), BondStereo::Trans);
        assert_eq!(BondStereo::Trans.flipped(), BondStereo::Cis);
    }

    #[test]
    fn bond_partner_and_contains() {
        let bond = Bond::new(1, 3, BondOrder::Single);
        assert!(bond.contains(1));
        assert!(bond.contains(3));
        assert!(!bond.contains(2));
        assert_eq!(bond.partner(1), Some(3));
        assert_eq!(bond.partner(3), Some(1));
        assert_eq!(bond.partner(7), None);
    }
}
