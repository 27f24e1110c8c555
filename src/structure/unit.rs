//! A set of atoms from one model placed by one symmetry operator.

use std::cell::OnceCell;
use std::rc::Rc;

use glam::Vec3;

use super::bonds::{compute_intra_unit_bonds, BondComputationParams, IntraUnitBonds};
use super::element::Element;
use super::model::AtomicModel;
use super::rings::{compute_rings, UnitRings};
use crate::geometry::{Boundary, GridLookup3D, PositionData, Sphere3D, SymmetryOperator};

/// Atoms are addressed by their position in [`Unit::elements`] ("unit
/// index"); `elements[i]` is the atom index in the model.
#[derive(Debug)]
pub struct Unit {
    pub id: usize,
    pub elements: Vec<usize>,
    pub operator: SymmetryOperator,
    pub model: Rc<AtomicModel>,
    lookup: OnceCell<GridLookup3D>,
    bonds: OnceCell<IntraUnitBonds>,
    rings: OnceCell<UnitRings>,
}

impl Unit {
    pub fn new(
        id: usize,
        model: Rc<AtomicModel>,
        elements: Vec<usize>,
        operator: SymmetryOperator,
    ) -> Self {
        Self {
            id,
            elements,
            operator,
            model,
            lookup: OnceCell::new(),
            bonds: OnceCell::new(),
            rings: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Model coordinates, before the operator.
    pub fn invariant_position(&self, i: usize) -> Vec3 {
        self.model.position(self.elements[i])
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.operator.apply(self.invariant_position(i))
    }

    pub fn element(&self, i: usize) -> Element {
        self.model.type_symbol[self.elements[i]]
    }

    pub fn atom_id(&self, i: usize) -> &str {
        &self.model.label_atom_id[self.elements[i]]
    }

    pub fn comp_id(&self, i: usize) -> &str {
        &self.model.label_comp_id[self.elements[i]]
    }

    /// Alternate location id, `None` when the atom has none.
    pub fn alt_loc(&self, i: usize) -> Option<&str> {
        let alt = self.model.label_alt_id[self.elements[i]].as_str();
        (!alt.is_empty()).then_some(alt)
    }

    pub fn formal_charge(&self, i: usize) -> i8 {
        self.model.formal_charge[self.elements[i]]
    }

    pub fn residue_index(&self, i: usize) -> usize {
        self.model.residue_index[self.elements[i]]
    }

    /// Unit index ranges of the residues in this unit, in order.
    pub fn residue_segments(&self) -> Vec<std::ops::Range<usize>> {
        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..=self.len() {
            if i == self.len() || self.residue_index(i) != self.residue_index(start) {
                segments.push(start..i);
                start = i;
            }
        }
        segments
    }

    /// Grid over the model coordinates of the unit's atoms. Query results
    /// are unit indices.
    pub fn lookup(&self) -> &GridLookup3D {
        self.lookup.get_or_init(|| {
            let positions = (0..self.len()).map(|i| self.invariant_position(i)).collect();
            GridLookup3D::new(PositionData::new(positions))
        })
    }

    /// Boundary in model coordinates.
    pub fn invariant_boundary(&self) -> &Boundary {
        self.lookup().boundary()
    }

    /// Bounding sphere after applying the operator.
    pub fn boundary_sphere(&self) -> Sphere3D {
        let sphere = self.invariant_boundary().sphere;
        Sphere3D::new(self.operator.apply(sphere.center), sphere.radius)
    }

    pub fn bonds(&self) -> &IntraUnitBonds {
        self.bonds
            .get_or_init(|| compute_intra_unit_bonds(self, &BondComputationParams::default()))
    }

    /// Rings within residues, from the intra-unit bonds.
    pub fn rings(&self) -> &UnitRings {
        self.rings.get_or_init(|| compute_rings(self))
    }
}
