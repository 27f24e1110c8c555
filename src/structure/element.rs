//! Chemical elements and their radii.

/// Chemical element of an atom.
///
/// Covers biologically-relevant elements found in proteins, nucleic acids,
/// ligands, ions, and waters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Element {
    H,
    C,
    N,
    O,
    S,
    P,
    Se,
    Fe,
    Zn,
    Mg,
    Ca,
    Na,
    Cl,
    K,
    Mn,
    Co,
    Ni,
    Cu,
    Br,
    I,
    F,
    Li,
    Al,
    Rb,
    Cs,
    Sr,
    Ba,
    Sn,
    Pb,
    Hg,
    Cd,
    V,
    Cr,
    Mo,
    W,
    Pt,
    Au,
    Ag,
    #[default]
    Unknown,
}

impl Element {
    /// Parse element from a 1-2 character symbol string (case-insensitive).
    pub fn from_symbol(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "H" | "D" => Element::H,
            "C" => Element::C,
            "N" => Element::N,
            "O" => Element::O,
            "S" => Element::S,
            "P" => Element::P,
            "SE" => Element::Se,
            "FE" => Element::Fe,
            "ZN" => Element::Zn,
            "MG" => Element::Mg,
            "CA" => Element::Ca,
            "NA" => Element::Na,
            "CL" => Element::Cl,
            "K" => Element::K,
            "MN" => Element::Mn,
            "CO" => Element::Co,
            "NI" => Element::Ni,
            "CU" => Element::Cu,
            "BR" => Element::Br,
            "I" => Element::I,
            "F" => Element::F,
            "LI" => Element::Li,
            "AL" => Element::Al,
            "RB" => Element::Rb,
            "CS" => Element::Cs,
            "SR" => Element::Sr,
            "BA" => Element::Ba,
            "SN" => Element::Sn,
            "PB" => Element::Pb,
            "HG" => Element::Hg,
            "CD" => Element::Cd,
            "V" => Element::V,
            "CR" => Element::Cr,
            "MO" => Element::Mo,
            "W" => Element::W,
            "PT" => Element::Pt,
            "AU" => Element::Au,
            "AG" => Element::Ag,
            _ => Element::Unknown,
        }
    }

    /// Guess the element from a standard atom name (e.g. "CA" -> C, "OG" -> O).
    ///
    /// Used when `type_symbol` is missing; the first letter is taken as
    /// the element.
    pub fn from_atom_name(name: &str) -> Self {
        match name
            .trim()
            .chars()
            .find(|c| c.is_alphabetic())
            .map(|c| c.to_ascii_uppercase())
        {
            Some('C') => Element::C,
            Some('N') => Element::N,
            Some('O') => Element::O,
            Some('S') => Element::S,
            Some('H') => Element::H,
            Some('P') => Element::P,
            _ => Element::Unknown,
        }
    }

    /// Covalent radius in angstroms (Cambridge CSD values).
    pub fn covalent_radius(&self) -> f32 {
        match self {
            Element::H => 0.31,
            Element::C => 0.76,
            Element::N => 0.71,
            Element::O => 0.66,
            Element::S => 1.05,
            Element::P => 1.07,
            Element::Se => 1.20,
            Element::Fe => 1.32,
            Element::Zn => 1.22,
            Element::Mg => 1.41,
            Element::Ca => 1.76,
            Element::Na => 1.66,
            Element::Cl => 1.02,
            Element::K => 2.03,
            Element::Mn => 1.39,
            Element::Co => 1.26,
            Element::Ni => 1.24,
            Element::Cu => 1.32,
            Element::Br => 1.20,
            Element::I => 1.39,
            Element::F => 0.57,
            Element::Li => 1.28,
            Element::Al => 1.21,
            Element::Rb => 2.20,
            Element::Cs => 2.44,
            Element::Sr => 1.95,
            Element::Ba => 2.15,
            Element::Sn => 1.39,
            Element::Pb => 1.46,
            Element::Hg => 1.32,
            Element::Cd => 1.44,
            Element::V => 1.53,
            Element::Cr => 1.39,
            Element::Mo => 1.54,
            Element::W => 1.62,
            Element::Pt => 1.36,
            Element::Au => 1.36,
            Element::Ag => 1.45,
            Element::Unknown => 0.77,
        }
    }

    /// Van der Waals radius in angstroms.
    pub fn vdw_radius(&self) -> f32 {
        match self {
            Element::H => 1.20,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::S => 1.80,
            Element::P => 1.80,
            Element::Se => 1.90,
            Element::Fe => 2.00,
            Element::Zn => 1.39,
            Element::Mg => 1.73,
            Element::Ca => 2.31,
            Element::Na => 2.27,
            Element::Cl => 1.75,
            Element::K => 2.75,
            Element::Mn => 2.00,
            Element::Co => 2.00,
            Element::Ni => 1.63,
            Element::Cu => 1.40,
            Element::Br => 1.85,
            Element::I => 1.98,
            Element::F => 1.47,
            Element::Li => 1.82,
            Element::Al => 1.84,
            Element::Rb => 3.03,
            Element::Cs => 3.43,
            Element::Sr => 2.49,
            Element::Ba => 2.68,
            Element::Sn => 2.17,
            Element::Pb => 2.02,
            Element::Hg => 1.55,
            Element::Cd => 1.58,
            Element::V => 2.00,
            Element::Cr => 2.00,
            Element::Mo => 2.00,
            Element::W => 2.00,
            Element::Pt => 1.75,
            Element::Au => 1.66,
            Element::Ag => 1.72,
            Element::Unknown => 1.70,
        }
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self, Element::F | Element::Cl | Element::Br | Element::I)
    }

    pub fn is_alkali_metal(&self) -> bool {
        matches!(self, Element::Li | Element::Na | Element::K | Element::Rb | Element::Cs)
    }

    pub fn is_alkaline_earth_metal(&self) -> bool {
        matches!(self, Element::Mg | Element::Ca | Element::Sr | Element::Ba)
    }

    pub fn is_transition_metal(&self) -> bool {
        matches!(
            self,
            Element::V
                | Element::Cr
                | Element::Mn
                | Element::Fe
                | Element::Co
                | Element::Ni
                | Element::Cu
                | Element::Mo
                | Element::Ag
                | Element::W
                | Element::Pt
                | Element::Au
        )
    }

    /// Metals that coordinate through mostly electrostatic contacts.
    pub fn is_ionic_type_metal(&self) -> bool {
        self.is_alkali_metal()
            || self.is_alkaline_earth_metal()
            || matches!(self, Element::Al | Element::Sn | Element::Pb | Element::Hg)
    }

    pub fn is_metal(&self) -> bool {
        self.is_ionic_type_metal()
            || self.is_transition_metal()
            || matches!(self, Element::Zn | Element::Cd)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::S => "S",
            Element::P => "P",
            Element::Se => "Se",
            Element::Fe => "Fe",
            Element::Zn => "Zn",
            Element::Mg => "Mg",
            Element::Ca => "Ca",
            Element::Na => "Na",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Mn => "Mn",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Br => "Br",
            Element::I => "I",
            Element::F => "F",
            Element::Li => "Li",
            Element::Al => "Al",
            Element::Rb => "Rb",
            Element::Cs => "Cs",
            Element::Sr => "Sr",
            Element::Ba => "Ba",
            Element::Sn => "Sn",
            Element::Pb => "Pb",
            Element::Hg => "Hg",
            Element::Cd => "Cd",
            Element::V => "V",
            Element::Cr => "Cr",
            Element::Mo => "Mo",
            Element::W => "W",
            Element::Pt => "Pt",
            Element::Au => "Au",
            Element::Ag => "Ag",
            Element::Unknown => "X",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols() {
        assert_eq!(Element::from_symbol(" fe "), Element::Fe);
        assert_eq!(Element::from_symbol("D"), Element::H);
        assert_eq!(Element::from_symbol("Xx"), Element::Unknown);
        assert_eq!(Element::Cl.symbol(), "Cl");
    }

    #[test]
    fn metal_classes() {
        assert!(Element::from_symbol("ZN").is_metal());
        assert!(!Element::Zn.is_transition_metal() && !Element::Zn.is_ionic_type_metal());
        assert!(Element::Hg.is_ionic_type_metal());
        assert!(Element::Fe.is_transition_metal());
        assert!(Element::Ba.is_alkaline_earth_metal() && Element::Cs.is_alkali_metal());
        assert!(!Element::C.is_metal() && !Element::Se.is_metal());
    }

    #[test]
    fn atom_names() {
        assert_eq!(Element::from_atom_name("CA"), Element::C);
        assert_eq!(Element::from_atom_name("1HG2"), Element::H);
        assert_eq!(Element::from_atom_name("OXT"), Element::O);
    }
}
