use phf::phf_map;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub String);

/// Chemical elements from hydrogen to radon, indexed by atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Sc,
    Ti,
    V,
    Cr,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Ga,
    Ge,
    As,
    Se,
    Br,
    Kr,
    Rb,
    Sr,
    Y,
    Zr,
    Nb,
    Mo,
    Tc,
    Ru,
    Rh,
    Pd,
    Ag,
    Cd,
    In,
    Sn,
    Sb,
    Te,
    I,
    Xe,
    Cs,
    Ba,
    La,
    Ce,
    Pr,
    Nd,
    Pm,
    Sm,
    Eu,
    Gd,
    Tb,
    Dy,
    Ho,
    Er,
    Tm,
    Yb,
    Lu,
    Hf,
    Ta,
    W,
    Re,
    Os,
    Ir,
    Pt,
    Au,
    Hg,
    Tl,
    Pb,
    Bi,
    Po,
    At,
    Rn,
}

const ELEMENTS: [Element; 86] = [
    Element::H, Element::He, Element::Li, Element::Be, Element::B, Element::C, Element::N,
    Element::O, Element::F, Element::Ne, Element::Na, Element::Mg, Element::Al, Element::Si,
    Element::P, Element::S, Element::Cl, Element::Ar, Element::K, Element::Ca, Element::Sc,
    Element::Ti, Element::V, Element::Cr, Element::Mn, Element::Fe, Element::Co, Element::Ni,
    Element::Cu, Element::Zn, Element::Ga, Element::Ge, Element::As, Element::Se, Element::Br,
    Element::Kr, Element::Rb, Element::Sr, Element::Y, Element::Zr, Element::Nb, Element::Mo,
    Element::Tc, Element::Ru, Element::Rh, Element::Pd, Element::Ag, Element::Cd, Element::In,
    Element::Sn, Element::Sb, Element::Te, Element::I, Element::Xe, Element::Cs, Element::Ba,
    Element::La, Element::Ce, Element::Pr, Element::Nd, Element::Pm, Element::Sm, Element::Eu,
    Element::Gd, Element::Tb, Element::Dy, Element::Ho, Element::Er, Element::Tm, Element::Yb,
    Element::Lu, Element::Hf, Element::Ta, Element::W, Element::Re, Element::Os, Element::Ir,
    Element::Pt, Element::Au, Element::Hg, Element::Tl, Element::Pb, Element::Bi, Element::Po,
    Element::At, Element::Rn,
];

static SYMBOL_MAP: phf::Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "He" => Element::He,
    "Li" => Element::Li,
    "Be" => Element::Be,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "Ne" => Element::Ne,
    "Na" => Element::Na,
    "Mg" => Element::Mg,
    "Al" => Element::Al,
    "Si" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "Ar" => Element::Ar,
    "K" => Element::K,
    "Ca" => Element::Ca,
    "Sc" => Element::Sc,
    "Ti" => Element::Ti,
    "V" => Element::V,
    "Cr" => Element::Cr,
    "Mn" => Element::Mn,
    "Fe" => Element::Fe,
    "Co" => Element::Co,
    "Ni" => Element::Ni,
    "Cu" => Element::Cu,
    "Zn" => Element::Zn,
    "Ga" => Element::Ga,
    "Ge" => Element::Ge,
    "As" => Element::As,
    "Se" => Element::Se,
    "Br" => Element::Br,
    "Kr" => Element::Kr,
    "Rb" => Element::Rb,
    "Sr" => Element::Sr,
    "Y" => Element::Y,
    "Zr" => Element::Zr,
    "Nb" => Element::Nb,
    "Mo" => Element::Mo,
    "Tc" => Element::Tc,
    "Ru" => Element::Ru,
    "Rh" => Element::Rh,
    "Pd" => Element::Pd,
    "Ag" => Element::Ag,
    "Cd" => Element::Cd,
    "In" => Element::In,
    "Sn" => Element::Sn,
    "Sb" => Element::Sb,
    "Te" => Element::Te,
    "I" => Element::I,
    "Xe" => Element::Xe,
    "Cs" => Element::Cs,
    "Ba" => Element::Ba,
    "La" => Element::La,
    "Ce" => Element::Ce,
    "Pr" => Element::Pr,
    "Nd" => Element::Nd,
    "Pm" => Element::Pm,
    "Sm" => Element::Sm,
    "Eu" => Element::Eu,
    "Gd" => Element::Gd,
    "Tb" => Element::Tb,
    "Dy" => Element::Dy,
    "Ho" => Element::Ho,
    "Er" => Element::Er,
    "Tm" => Element::Tm,
    "Yb" => Element::Yb,
    "Lu" => Element::Lu,
    "Hf" => Element::Hf,
    "Ta" => Element::Ta,
    "W" => Element::W,
    "Re" => Element::Re,
    "Os" => Element::Os,
    "Ir" => Element::Ir,
    "Pt" => Element::Pt,
    "Au" => Element::Au,
    "Hg" => Element::Hg,
    "Tl" => Element::Tl,
    "Pb" => Element::Pb,
    "Bi" => Element::Bi,
    "Po" => Element::Po,
    "At" => Element::At,
    "Rn" => Element::Rn,
};

impl Element {
    /// Returns the element with the given atomic number, if it is supported.
    pub fn from_atomic_number(number: u8) -> Option<Self> {
        ELEMENTS.get(usize::from(number).checked_sub(1)?).copied()
    }

    #[inline]
    pub fn atomic_number(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::He => "He",
            Element::Li => "Li",
            Element::Be => "Be",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Ne => "Ne",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Al => "Al",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Ar => "Ar",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Sc => "Sc",
            Element::Ti => "Ti",
            Element::V => "V",
            Element::Cr => "Cr",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Ga => "Ga",
            Element::Ge => "Ge",
            Element::As => "As",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Kr => "Kr",
            Element::Rb => "Rb",
            Element::Sr => "Sr",
            Element::Y => "Y",
            Element::Zr => "Zr",
            Element::Nb => "Nb",
            Element::Mo => "Mo",
            Element::Tc => "Tc",
            Element::Ru => "Ru",
            Element::Rh => "Rh",
            Element::Pd => "Pd",
            Element::Ag => "Ag",
            Element::Cd => "Cd",
            Element::In => "In",
            Element::Sn => "Sn",
            Element::Sb => "Sb",
            Element::Te => "Te",
            Element::I => "I",
            Element::Xe => "Xe",
            Element::Cs => "Cs",
            Element::Ba => "Ba",
            Element::La => "La",
            Element::Ce => "Ce",
            Element::Pr => "Pr",
            Element::Nd => "Nd",
            Element::Pm => "Pm",
            Element::Sm => "Sm",
            Element::Eu => "Eu",
            Element::Gd => "Gd",
            Element::Tb => "Tb",
            Element::Dy => "Dy",
            Element::Ho => "Ho",
            Element::Er => "Er",
            Element::Tm => "Tm",
            Element::Yb => "Yb",
            Element::Lu => "Lu",
            Element::Hf => "Hf",
            Element::Ta => "Ta",
            Element::W => "W",
            Element::Re => "Re",
            Element::Os => "Os",
            Element::Ir => "Ir",
            Element::Pt => "Pt",
            Element::Au => "Au",
            Element::Hg => "Hg",
            Element::Tl => "Tl",
            Element::Pb => "Pb",
            Element::Bi => "Bi",
            Element::Po => "Po",
            Element::At => "At",
            Element::Rn => "Rn",
        }
    }

    /// Standard atomic weight in daltons.
    pub fn mass(self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::He => 4.0026,
            Element::Li => 6.94,
            Element::Be => 9.0122,
            Element::B => 10.81,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Ne => 20.180,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::Al => 26.982,
            Element::Si => 28.085,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::Ar => 39.948,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Sc => 44.956,
            Element::Ti => 47.867,
            Element::V => 50.942,
            Element::Cr => 51.996,
            Element::Mn => 54.938,
            Element::Fe => 55.845,
            Element::Co => 58.933,
            Element::Ni => 58.693,
            Element::Cu => 63.546,
            Element::Zn => 65.38,
            Element::Ga => 69.723,
            Element::Ge => 72.630,
            Element::As => 74.922,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::Kr => 83.798,
            Element::Rb => 85.468,
            Element::Sr => 87.62,
            Element::Y => 88.906,
            Element::Zr => 91.224,
            Element::Nb => 92.906,
            Element::Mo => 95.95,
            Element::Tc => 98.0,
            Element::Ru => 101.07,
            Element::Rh => 102.91,
            Element::Pd => 106.42,
            Element::Ag => 107.87,
            Element::Cd => 112.41,
            Element::In => 114.82,
            Element::Sn => 118.71,
            Element::Sb => 121.76,
            Element::Te => 127.60,
            Element::I => 126.90,
            Element::Xe => 131.29,
            Element::Cs => 132.91,
            Element::Ba => 137.33,
            Element::La => 138.91,
            Element::Ce => 140.12,
            Element::Pr => 140.91,
            Element::Nd => 144.24,
            Element::Pm => 145.0,
            Element::Sm => 150.36,
            Element::Eu => 151.96,
            Element::Gd => 157.25,
            Element::Tb => 158.93,
            Element::Dy => 162.50,
            Element::Ho => 164.93,
            Element::Er => 167.26,
            Element::Tm => 168.93,
            Element::Yb => 173.05,
            Element::Lu => 174.97,
            Element::Hf => 178.49,
            Element::Ta => 180.95,
            Element::W => 183.84,
            Element::Re => 186.21,
            Element::Os => 190.23,
            Element::Ir => 192.22,
            Element::Pt => 195.08,
            Element::Au => 196.97,
            Element::Hg => 200.59,
            Element::Tl => 204.38,
            Element::Pb => 207.2,
            Element::Bi => 208.98,
            Element::Po => 209.0,
            Element::At => 210.0,
            Element::Rn => 222.0,
        }
    }

    /// Allowed neutral valences used to derive implicit hydrogen counts.
    ///
    /// Only the SMILES organic subset carries default valences; every other
    /// element must state its hydrogens explicitly.
    pub fn default_valences(self) -> &'static [u8] {
        match self {
            Element::B => &[3],
            Element::C => &[4],
            Element::N => &[3, 5],
            Element::O => &[2],
            Element::P => &[3, 5],
            Element::S => &[2, 4, 6],
            Element::F | Element::Cl | Element::Br | Element::I => &[1],
            _ => &[],
        }
    }

    /// Whether the element may appear outside brackets in SMILES.
    pub fn is_organic_subset(self) -> bool {
        !self.default_valences().is_empty()
    }

    /// Whether the element may be written in lower case as an aromatic SMILES atom.
    pub fn can_be_aromatic(self) -> bool {
        matches!(
            self,
            Element::B
                | Element::C
                | Element::N
                | Element::O
                | Element::P
                | Element::S
                | Element::Se
                | Element::As
        )
    }

    /// Approximate covalent radius in Ångström, used for clash detection.
    pub fn covalent_radius(self) -> f64 {
        match self {
            Element::H => 0.31,
            Element::B => 0.84,
            Element::C => 0.76,
            Element::N => 0.71,
            Element::O => 0.66,
            Element::F => 0.57,
            Element::Si => 1.11,
            Element::P => 1.07,
            Element::S => 1.05,
            Element::Cl => 1.02,
            Element::Br => 1.20,
            Element::I => 1.39,
            _ => 1.50,
        }
    }

    #[inline]
    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses a symbol case-insensitively ("cl", "CL" and "Cl" all give chlorine).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let normalized: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => return Err(ParseElementError(s.to_string())),
        };
        SYMBOL_MAP
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_numbers_round_trip_through_lookup_table() {
        for number in 1..=86u8 {
            let element = Element::from_atomic_number(number).unwrap();
            assert_eq!(element.atomic_number(), number);
        }
        assert_eq!(Element::from_atomic_number(0), None);
        assert_eq!(Element::from_atomic_number(87), None);
    }

    #[test]
    fn symbols_parse_case_insensitively() {
        assert_eq!("C".parse::<Element>(), Ok(Element::C));
        assert_eq!("cl".parse::<Element>(), Ok(Element::Cl));
        assert_eq!("BR".parse::<Element>(), Ok(Element::Br));
        assert_eq!(" Na ".parse::<Element>(), Ok(Element::Na));
        assert!("Xx".parse::<Element>().is_err());
        assert!("".parse::<Element>().is_err());
    }

    #[test]
    fn masses_match_reference_values() {
        assert!((Element::H.mass() - 1.008).abs() < 1e-9);
        assert!((Element::C.mass() - 12.011).abs() < 1e-9);
        assert!((Element::Cl.mass() - 35.45).abs() < 1e-9);
    }

    #[test]
    fn organic_subset_is_limited_to_elements_with_default_valences() {
        assert!(Element::C.is_organic_subset());
        assert!(Element::Br.is_organic_subset());
        assert!(!Element::Na.is_organic_subset());
        assert!(!Element::H.is_organic_subset());
        assert_eq!(Element::S.default_valences(), &[2, 4, 6]);
    }

    #[test]
    fn serializes_as_symbol() {
        let json = serde_json::to_string(&Element::Cl).unwrap();
        assert_eq!(json, "\"Cl\"");
        let back: Element = serde_json::from_str("\"Br\"").unwrap();
        assert_eq!(back, Element::Br);
    }
}
