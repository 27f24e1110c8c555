//! Units placed in space, with a two-level spatial index.

use std::cell::OnceCell;
use std::rc::Rc;

use glam::Vec3;

use super::bonds::{compute_inter_unit_bonds, BondComputationParams, BondOrder, InterUnitBonds};
use super::element::Element;
use super::model::AtomicModel;
use super::unit::Unit;
use super::valence::{compute_valence_model, ValenceModel};
use crate::geometry::{GridLookup3D, LookupResult, PositionData, SymmetryOperator};

/// Hits of a structure-wide query: `units[r]` is the unit index and
/// `indices[r]` the unit index of the atom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureLookupResult {
    pub count: usize,
    pub units: Vec<usize>,
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f32>,
}

impl StructureLookupResult {
    fn push(&mut self, unit: usize, index: usize, squared_distance: f32) {
        self.units.push(unit);
        self.indices.push(index);
        self.squared_distances.push(squared_distance);
        self.count += 1;
    }
}

/// Grid over the units' bounding spheres.
#[derive(Debug, Clone)]
pub struct StructureLookup3D {
    unit_lookup: GridLookup3D,
}

impl StructureLookup3D {
    fn new(units: &[Unit]) -> Self {
        let spheres: Vec<_> = units.iter().map(Unit::boundary_sphere).collect();
        let data = PositionData::new(spheres.iter().map(|s| s.center).collect())
            .with_radius(spheres.iter().map(|s| s.radius).collect());
        Self {
            unit_lookup: GridLookup3D::new(data),
        }
    }

    pub fn unit_lookup(&self) -> &GridLookup3D {
        &self.unit_lookup
    }
}

#[derive(Debug)]
pub struct Structure {
    units: Vec<Unit>,
    lookup: OnceCell<StructureLookup3D>,
    inter_unit_bonds: OnceCell<InterUnitBonds>,
    valence: OnceCell<Vec<ValenceModel>>,
}

impl Structure {
    /// Unit ids are reassigned to match their position in `units`.
    pub fn new(mut units: Vec<Unit>) -> Self {
        for (id, unit) in units.iter_mut().enumerate() {
            unit.id = id;
        }
        Self {
            units,
            lookup: OnceCell::new(),
            inter_unit_bonds: OnceCell::new(),
            valence: OnceCell::new(),
        }
    }

    /// One unit per chain of `model`.
    pub fn from_model(model: AtomicModel) -> Self {
        Self::with_operators(model, &[SymmetryOperator::identity()])
    }

    /// One unit per chain and operator, operators outermost.
    pub fn with_operators(model: AtomicModel, operators: &[SymmetryOperator]) -> Self {
        let model = Rc::new(model);
        let mut chains: Vec<Vec<usize>> = vec![Vec::new(); model.chain_count];
        for (atom, &chain) in model.chain_index.iter().enumerate() {
            chains[chain].push(atom);
        }
        let units = operators
            .iter()
            .flat_map(|op| {
                let model = &model;
                chains
                    .iter()
                    .map(move |elements| Unit::new(0, model.clone(), elements.clone(), op.clone()))
            })
            .collect();
        Self::new(units)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: usize) -> &Unit {
        &self.units[id]
    }

    pub fn lookup(&self) -> &StructureLookup3D {
        self.lookup.get_or_init(|| StructureLookup3D::new(&self.units))
    }

    /// Units whose bounding sphere comes within `radius` of the point.
    pub fn find_unit_indices(&self, x: f32, y: f32, z: f32, radius: f32) -> LookupResult {
        self.lookup().unit_lookup.find(x, y, z, radius)
    }

    /// All atoms within `radius` of the point.
    pub fn find(&self, x: f32, y: f32, z: f32, radius: f32) -> StructureLookupResult {
        let mut result = StructureLookupResult::default();
        let close = self.find_unit_indices(x, y, z, radius);
        for &u in &close.indices {
            let unit = &self.units[u];
            let p = unit.operator.apply_inverse(Vec3::new(x, y, z));
            let found = unit.lookup().find(p.x, p.y, p.z, radius);
            for (&i, &d2) in found.indices.iter().zip(&found.squared_distances) {
                result.push(u, i, d2);
            }
        }
        result
    }

    /// The `k` atoms closest to the point, nearest first.
    pub fn nearest(&self, x: f32, y: f32, z: f32, k: usize) -> StructureLookupResult {
        let mut result = StructureLookupResult::default();
        if k == 0 || self.units.is_empty() {
            return result;
        }
        let point = Vec3::new(x, y, z);
        let close = self
            .lookup()
            .unit_lookup
            .nearest(x, y, z, self.units.len());

        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        let mut worst = f32::MIN;
        for &u in &close.indices {
            let unit = &self.units[u];
            let sphere = unit.boundary_sphere();
            let gap = (point.distance(sphere.center) - sphere.radius).max(0.0);
            if candidates.len() >= k && gap * gap > worst {
                continue;
            }
            let p = unit.operator.apply_inverse(point);
            let found = unit.lookup().nearest(p.x, p.y, p.z, k);
            for (&i, &d2) in found.indices.iter().zip(&found.squared_distances) {
                candidates.push((d2, u, i));
            }
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
            candidates.truncate(k);
            if let Some(last) = candidates.last() {
                worst = last.0;
            }
        }
        for (d2, u, i) in candidates {
            result.push(u, i, d2);
        }
        result
    }

    pub fn inter_unit_bonds(&self) -> &InterUnitBonds {
        self.inter_unit_bonds
            .get_or_init(|| compute_inter_unit_bonds(&self.units, &BondComputationParams::default()))
    }

    /// Bond partners `(unit, index, order)` of an atom, within its unit
    /// first and then in other units.
    pub fn bonded_atoms(&self, unit: usize, index: usize) -> impl Iterator<Item = (usize, usize, BondOrder)> + '_ {
        self.units[unit]
            .bonds()
            .bonds(index)
            .map(move |(j, order)| (unit, j, order))
            .chain(self.inter_unit_bonds().partners(unit, index))
    }

    pub fn bond_count(&self, unit: usize, index: usize) -> usize {
        self.bonded_atoms(unit, index).count()
    }

    /// Number of bond partners of the given element.
    pub fn bond_to_element_count(&self, unit: usize, index: usize, element: Element) -> usize {
        self.bonded_atoms(unit, index)
            .filter(|&(u, i, _)| self.units[u].element(i) == element)
            .count()
    }

    /// Charges, hydrogen counts and ideal geometries of the atoms of a unit.
    pub fn valence_model(&self, unit: usize) -> &ValenceModel {
        let models = self.valence.get_or_init(|| {
            let models: Vec<ValenceModel> = (0..self.units.len())
                .map(|u| compute_valence_model(self, u))
                .collect();
            log::debug!("valence model for {} units", models.len());
            models
        });
        &models[unit]
    }

    /// Whether two atoms are directly bonded, within or across units.
    pub fn connected_to(&self, unit_a: usize, index_a: usize, unit_b: usize, index_b: usize) -> bool {
        if unit_a == unit_b {
            self.units[unit_a].bonds().has(index_a, index_b)
        } else {
            self.inter_unit_bonds().has(unit_a, index_a, unit_b, index_b)
        }
    }
}
