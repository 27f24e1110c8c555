//! Formal charges, implicit hydrogens and ideal geometry of atoms.
//!
//! Values the model leaves open are inferred from the bond graph: a zero
//! formal charge lets the charge be assigned, and an atom without bonded
//! hydrogens gets its hydrogens assigned. Bonds to other units count.

use std::f32::consts::{FRAC_PI_2, PI};

use super::bonds::BondOrder;
use super::element::Element;
use super::structure::Structure;

/// Arrangement of bonds and lone pairs around an atom.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomGeometry {
    Spherical = 0,
    Terminal = 1,
    Linear = 2,
    Trigonal = 3,
    Tetrahedral = 4,
    Octahedral = 5,
    SquarePlanar = 6,
    #[default]
    Unknown = 7,
}

impl AtomGeometry {
    /// Geometry for a total of `coordination` bonded atoms and lone pairs.
    pub fn from_coordination(coordination: i32) -> Self {
        match coordination {
            0 => AtomGeometry::Spherical,
            1 => AtomGeometry::Terminal,
            2 => AtomGeometry::Linear,
            3 => AtomGeometry::Trigonal,
            4 => AtomGeometry::Tetrahedral,
            _ => AtomGeometry::Unknown,
        }
    }

    /// Ideal angle between two bonds, in radians.
    pub fn ideal_angle(self) -> Option<f32> {
        match self {
            AtomGeometry::Linear => Some(PI),
            AtomGeometry::Trigonal => Some(120f32.to_radians()),
            AtomGeometry::Tetrahedral => Some(109.4721f32.to_radians()),
            AtomGeometry::Octahedral => Some(FRAC_PI_2),
            _ => None,
        }
    }
}

/// Valence state of one atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomValence {
    pub charge: i32,
    pub implicit_h: i32,
    /// Implicit plus bonded hydrogens.
    pub total_h: i32,
    pub geometry: AtomGeometry,
}

/// Valence states of every atom of a unit, by unit index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValenceModel {
    pub charge: Vec<i8>,
    pub implicit_h: Vec<u8>,
    pub total_h: Vec<u8>,
    pub ideal_geometry: Vec<AtomGeometry>,
}

impl ValenceModel {
    pub fn len(&self) -> usize {
        self.charge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge.is_empty()
    }

    fn push(&mut self, v: AtomValence) {
        self.charge.push(v.charge.clamp(i8::MIN.into(), i8::MAX.into()) as i8);
        self.implicit_h.push(v.implicit_h.clamp(0, u8::MAX.into()) as u8);
        self.total_h.push(v.total_h.clamp(0, u8::MAX.into()) as u8);
        self.ideal_geometry.push(v.geometry);
    }
}

pub fn compute_valence_model(structure: &Structure, unit: usize) -> ValenceModel {
    let mut model = ValenceModel::default();
    for i in 0..structure.unit(unit).len() {
        model.push(atom_valence(structure, unit, i));
    }
    model
}

fn element_of(structure: &Structure, unit: usize, index: usize) -> Element {
    structure.unit(unit).element(index)
}

/// Part of a pi system: a multiple bond, or N/O next to one. N/O with four
/// bonds never are, and a P=O or S=O neighbour does not count.
fn is_conjugated(structure: &Structure, unit: usize, index: usize) -> bool {
    let hetero = matches!(element_of(structure, unit, index), Element::N | Element::O);
    if hetero && structure.bond_count(unit, index) == 4 {
        return false;
    }
    for (unit_b, index_b, order) in structure.bonded_atoms(unit, index) {
        if order != BondOrder::Single {
            return true;
        }
        if !hetero {
            continue;
        }
        let element_b = element_of(structure, unit_b, index_b);
        for (unit_c, index_c, order_c) in structure.bonded_atoms(unit_b, index_b) {
            if order_c == BondOrder::Single {
                continue;
            }
            if matches!(element_b, Element::P | Element::S)
                && element_of(structure, unit_c, index_c) == Element::O
            {
                continue;
            }
            return true;
        }
    }
    false
}

/// Single-bonded oxygen whose partner double bonds another oxygen.
fn is_carboxylate_like_oxygen(structure: &Structure, unit: usize, index: usize) -> bool {
    structure.bonded_atoms(unit, index).any(|(unit_b, index_b, _)| {
        structure
            .bonded_atoms(unit_b, index_b)
            .any(|(unit_c, index_c, order)| {
                !(unit_c == unit && index_c == index)
                    && order == BondOrder::Double
                    && element_of(structure, unit_c, index_c) == Element::O
            })
    })
}

pub fn atom_valence(structure: &Structure, unit: usize, index: usize) -> AtomValence {
    let element = element_of(structure, unit, index);
    let hydrogen_count = structure.bond_to_element_count(unit, index, Element::H) as i32;
    let mut charge = i32::from(structure.unit(unit).formal_charge(index));
    let assign_charge = charge == 0;
    let assign_h = hydrogen_count == 0;
    let degree = structure.bond_count(unit, index) as i32;
    let valence: i32 = structure
        .bonded_atoms(unit, index)
        .map(|(_, _, order)| order.valence())
        .sum();
    let conjugated = is_conjugated(structure, unit, index);
    let multi_bond = valence - degree > 0;

    let mut implicit_h = 0;
    let mut geometry = AtomGeometry::Unknown;
    match element {
        Element::H => {
            if assign_charge {
                if degree == 0 {
                    charge = 1;
                    geometry = AtomGeometry::Spherical;
                } else if degree == 1 {
                    charge = 0;
                    geometry = AtomGeometry::Terminal;
                }
            }
        }
        Element::C => {
            if assign_charge {
                charge = 0;
            }
            if assign_h {
                implicit_h = (4 - valence - charge.abs()).max(0);
            }
            geometry = AtomGeometry::from_coordination(degree + implicit_h + (-charge).max(0));
        }
        Element::N => {
            if assign_charge {
                if !assign_h {
                    charge = valence - 3;
                } else if conjugated && valence < 4 {
                    charge = i32::from(degree - hydrogen_count == 1 && valence - hydrogen_count == 2);
                } else {
                    for (unit_b, index_b, _) in structure.bonded_atoms(unit, index) {
                        let element_b = element_of(structure, unit_b, index_b);
                        if element_b == Element::S || element_b.is_metal() {
                            charge = 0;
                            break;
                        }
                        charge = 1;
                    }
                }
            }
            if assign_h {
                implicit_h = (3 - valence + charge).max(0);
            }
            geometry = if conjugated && !multi_bond {
                AtomGeometry::from_coordination(degree + implicit_h - charge)
            } else {
                AtomGeometry::from_coordination(degree + implicit_h + 1 - charge)
            };
        }
        Element::O => {
            if assign_charge {
                if !assign_h {
                    charge = valence - 2;
                }
                if valence == 1 && is_carboxylate_like_oxygen(structure, unit, index) {
                    charge = -1;
                }
            }
            if assign_h {
                implicit_h = (2 - valence + charge).max(0);
            }
            geometry = if conjugated && !multi_bond {
                AtomGeometry::from_coordination(degree + implicit_h - charge + 1)
            } else {
                AtomGeometry::from_coordination(degree + implicit_h - charge + 2)
            };
        }
        Element::S => {
            if assign_charge && !assign_h {
                let oxygens = structure.bond_to_element_count(unit, index, Element::O);
                charge = if valence <= 3 && oxygens == 0 { valence - 2 } else { 0 };
            }
            if assign_h && valence < 2 {
                implicit_h = (2 - valence + charge).max(0);
            }
            if valence <= 3 {
                geometry = AtomGeometry::from_coordination(degree + implicit_h - charge + 2);
            }
        }
        e if e.is_halogen() => {
            if assign_charge {
                charge = valence - 1;
            }
        }
        e if e.is_alkali_metal() => {
            if assign_charge {
                charge = 1 - valence;
            }
        }
        e if e.is_alkaline_earth_metal() => {
            if assign_charge {
                charge = 2 - valence;
            }
        }
        _ => log::trace!("no valence rules for {}", element.symbol()),
    }

    AtomValence {
        charge,
        implicit_h,
        total_h: implicit_h + hydrogen_count,
        geometry,
    }
}
