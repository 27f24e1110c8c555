//! Residue and atom classification used by the feature providers, and the
//! bond geometry of the contact testers.

use glam::Vec3;

use crate::structure::{Element, Structure, Unit};

pub const PROTEIN_BACKBONE_ATOMS: &[&str] = &[
    "CA", "C", "N", "O", "O1", "O2", "OC1", "OC2", "OT1", "OT2", "OX1", "OXT", "H", "H1", "H2",
    "H3", "HA", "HN", "HXT", "BB",
];

pub const NUCLEIC_BACKBONE_ATOMS: &[&str] = &[
    "P", "OP1", "OP2", "HOP2", "HOP3", "O2'", "O3'", "O4'", "O5'", "C1'", "C2'", "C3'", "C4'",
    "C5'", "H1'", "H2'", "H2''", "HO2'", "H3'", "H4'", "H5'", "H5''", "HO3'", "HO5'", "O2*",
    "O3*", "O4*", "O5*", "C1*", "C2*", "C3*", "C4*", "C5*",
];

const WATER_NAMES: &[&str] = &[
    "SOL", "WAT", "HOH", "H2O", "W", "DOD", "D3O", "TIP", "TIP3", "TIP4", "SPC",
];

const AMINO_ACIDS: &[&str] = &[
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU", "LYS", "MET",
    "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL", "MSE", "SEC", "PYL", "UNK",
];

const NUCLEOTIDES: &[&str] = &[
    "A", "C", "G", "U", "I", "N", "DA", "DC", "DG", "DT", "DU", "DI", "DN",
];

pub fn is_backbone_atom(atom_id: &str) -> bool {
    PROTEIN_BACKBONE_ATOMS.contains(&atom_id)
}

pub fn is_nucleic_backbone_atom(atom_id: &str) -> bool {
    NUCLEIC_BACKBONE_ATOMS.contains(&atom_id)
}

pub fn is_water(comp_id: &str) -> bool {
    WATER_NAMES.contains(&comp_id)
}

pub fn is_amino_acid(comp_id: &str) -> bool {
    AMINO_ACIDS.contains(&comp_id)
}

pub fn is_nucleotide(comp_id: &str) -> bool {
    NUCLEOTIDES.contains(&comp_id)
}

pub fn is_polymer_residue(comp_id: &str) -> bool {
    is_amino_acid(comp_id) || is_nucleotide(comp_id)
}

/// Ring nitrogen of histidine.
pub fn is_histidine_nitrogen(unit: &Unit, i: usize) -> bool {
    unit.comp_id(i) == "HIS" && unit.element(i) == Element::N && unit.rings().is_ring_atom(i)
}

fn element_at(structure: &Structure, unit: usize, index: usize) -> Element {
    structure.unit(unit).element(index)
}

/// Bonds to atoms other than hydrogen.
fn heavy_degree(structure: &Structure, unit: usize, index: usize) -> usize {
    structure.bond_count(unit, index) - structure.bond_to_element_count(unit, index, Element::H)
}

/// Bonded atoms of `element` that have no other heavy partner.
fn terminal_partner_count(structure: &Structure, unit: &Unit, i: usize, element: Element) -> usize {
    structure
        .bonded_atoms(unit.id, i)
        .filter(|&(u, j, _)| element_at(structure, u, j) == element && heavy_degree(structure, u, j) == 1)
        .count()
}

/// Carbon with three nitrogens, two of them terminal.
pub fn is_guanidine(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::C
        && structure.bond_count(unit.id, i) == 3
        && structure.bond_to_element_count(unit.id, i, Element::N) == 3
        && terminal_partner_count(structure, unit, i, Element::N) == 2
}

/// Carbon with two terminal nitrogens and one carbon.
pub fn is_acetamidine(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::C
        && structure.bond_count(unit.id, i) == 3
        && structure.bond_to_element_count(unit.id, i, Element::N) == 2
        && structure.bond_to_element_count(unit.id, i, Element::C) == 1
        && terminal_partner_count(structure, unit, i, Element::N) == 2
}

/// Carbon with two terminal oxygens and one carbon.
pub fn is_carboxylate(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::C
        && structure.bond_to_element_count(unit.id, i, Element::O) == 2
        && structure.bond_to_element_count(unit.id, i, Element::C) == 1
        && terminal_partner_count(structure, unit, i, Element::O) == 2
}

/// Phosphorus bonded only to oxygens.
pub fn is_phosphate(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::P
        && structure.bond_to_element_count(unit.id, i, Element::O) == structure.bond_count(unit.id, i)
}

pub fn is_sulfonic_acid(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::S && structure.bond_to_element_count(unit.id, i, Element::O) == 3
}

pub fn is_sulfate(structure: &Structure, unit: &Unit, i: usize) -> bool {
    unit.element(i) == Element::S && structure.bond_to_element_count(unit.id, i, Element::O) == 4
}

fn heavy_partners<'a>(structure: &'a Structure, unit: usize, index: usize) -> impl Iterator<Item = (usize, usize)> + 'a {
    structure
        .bonded_atoms(unit, index)
        .filter(move |&(u, j, _)| element_at(structure, u, j) != Element::H)
        .map(|(u, j, _)| (u, j))
}

/// Angles at atom A between each heavy bond partner of A and atom B, in
/// radians.
pub fn calc_angles(structure: &Structure, unit_a: &Unit, a: usize, unit_b: &Unit, b: usize) -> Vec<f32> {
    let pa = unit_a.position(a);
    let to_b = unit_b.position(b) - pa;
    heavy_partners(structure, unit_a.id, a)
        .map(|(u, x)| (structure.unit(u).position(x) - pa).angle_between(to_b))
        .collect()
}

/// Deviation of the A to B direction from the plane of A's bonds, in
/// radians. With a single heavy partner its own partner spans the plane;
/// `None` when no plane can be formed.
pub fn calc_plane_angle(structure: &Structure, unit_a: &Unit, a: usize, unit_b: &Unit, b: usize) -> Option<f32> {
    let mut partners = heavy_partners(structure, unit_a.id, a).take(2);
    let first = partners.next()?;
    let second = match partners.next() {
        Some(second) => second,
        None => heavy_partners(structure, first.0, first.1).find(|&(u, j)| !(u == unit_a.id && j == a))?,
    };
    let pa = unit_a.position(a);
    let position = |(u, j): (usize, usize)| structure.unit(u).position(j);
    let normal: Vec3 = (position(first) - pa).cross(position(second) - pa);
    if normal.length_squared() == 0.0 {
        return None;
    }
    let to_b = unit_b.position(b) - pa;
    Some((std::f32::consts::FRAC_PI_2 - normal.angle_between(to_b)).abs())
}
