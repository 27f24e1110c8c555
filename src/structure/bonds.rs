//! Distance-based covalent bond inference.
//!
//! Two atoms are bonded when their distance is at most the sum of their
//! covalent radii plus a tolerance. Candidate partners come from the grid
//! lookups, so the cost stays near-linear in the atom count.

use std::collections::HashMap;

use super::element::Element;
use super::unit::Unit;

/// Closest distance accepted as a bond; shorter contacts are clashes or
/// duplicated coordinates.
const MIN_BOND_DISTANCE: f32 = 0.4;

/// Default tolerance for bond inference (0.4 angstroms).
pub const DEFAULT_TOLERANCE: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondComputationParams {
    /// Added to the covalent radius sum.
    pub tolerance: f32,
}

impl Default for BondComputationParams {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
}

impl BondOrder {
    pub fn valence(self) -> i32 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
        }
    }
}

fn incompatible_alt_locs(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

/// Bond between elements `a` and `b` at distance `dist`, if any. Metals
/// never bond by distance; their partners are found as coordination
/// contacts instead.
fn bond_order(a: Element, b: Element, dist: f32, tolerance: f32) -> Option<BondOrder> {
    if (a == Element::H && b == Element::H) || a.is_metal() || b.is_metal() {
        return None;
    }
    let sum_cov = a.covalent_radius() + b.covalent_radius();
    if dist <= MIN_BOND_DISTANCE || dist > sum_cov + tolerance {
        return None;
    }
    Some(if dist < sum_cov * 0.9 {
        BondOrder::Double
    } else {
        BondOrder::Single
    })
}

fn max_covalent_radius(unit: &Unit) -> f32 {
    (0..unit.len())
        .map(|i| unit.element(i).covalent_radius())
        .fold(0.0, f32::max)
}

/// Bonds within one unit as symmetric adjacency lists (CSR layout).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntraUnitBonds {
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
    orders: Vec<BondOrder>,
}

impl IntraUnitBonds {
    /// Build from unordered pairs `(a, b, order)` over `count` atoms.
    pub fn from_pairs(count: usize, pairs: &[(usize, usize, BondOrder)]) -> Self {
        let mut offsets = vec![0usize; count + 1];
        for &(a, b, _) in pairs {
            offsets[a + 1] += 1;
            offsets[b + 1] += 1;
        }
        for i in 0..count {
            offsets[i + 1] += offsets[i];
        }
        let mut fill = offsets.clone();
        let mut neighbors = vec![0usize; pairs.len() * 2];
        let mut orders = vec![BondOrder::Single; pairs.len() * 2];
        for &(a, b, order) in pairs {
            for (from, to) in [(a, b), (b, a)] {
                neighbors[fill[from]] = to;
                orders[fill[from]] = order;
                fill[from] += 1;
            }
        }
        Self {
            offsets,
            neighbors,
            orders,
        }
    }

    /// Number of bonds (each counted once).
    pub fn edge_count(&self) -> usize {
        self.neighbors.len() / 2
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[self.offsets[i]..self.offsets[i + 1]]
    }

    pub fn bonds(&self, i: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
        let range = self.offsets[i]..self.offsets[i + 1];
        self.neighbors[range.clone()]
            .iter()
            .copied()
            .zip(self.orders[range].iter().copied())
    }

    pub fn has(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b)
    }
}

/// A bond between atoms of two different units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterUnitEdge {
    pub unit_a: usize,
    pub index_a: usize,
    pub unit_b: usize,
    pub index_b: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone, Default)]
pub struct InterUnitBonds {
    edges: Vec<InterUnitEdge>,
    /// `(unit, index)` to the edges touching it.
    by_element: HashMap<(usize, usize), Vec<usize>>,
}

impl InterUnitBonds {
    pub fn new(edges: Vec<InterUnitEdge>) -> Self {
        let mut by_element: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (e, edge) in edges.iter().enumerate() {
            by_element.entry((edge.unit_a, edge.index_a)).or_default().push(e);
            by_element.entry((edge.unit_b, edge.index_b)).or_default().push(e);
        }
        Self { edges, by_element }
    }

    pub fn edges(&self) -> &[InterUnitEdge] {
        &self.edges
    }

    /// Partners `(unit, index, order)` of an atom in other units.
    pub fn partners(&self, unit: usize, index: usize) -> impl Iterator<Item = (usize, usize, BondOrder)> + '_ {
        self.by_element
            .get(&(unit, index))
            .into_iter()
            .flatten()
            .map(move |&e| {
                let edge = &self.edges[e];
                if edge.unit_a == unit && edge.index_a == index {
                    (edge.unit_b, edge.index_b, edge.order)
                } else {
                    (edge.unit_a, edge.index_a, edge.order)
                }
            })
    }

    pub fn has(&self, unit_a: usize, index_a: usize, unit_b: usize, index_b: usize) -> bool {
        self.partners(unit_a, index_a)
            .any(|(u, i, _)| u == unit_b && i == index_b)
    }
}

pub fn compute_intra_unit_bonds(unit: &Unit, params: &BondComputationParams) -> IntraUnitBonds {
    let n = unit.len();
    let lookup = unit.lookup();
    let max_cov = max_covalent_radius(unit);

    let mut pairs = Vec::new();
    for i in 0..n {
        let element_i = unit.element(i);
        let p = unit.invariant_position(i);
        let radius = element_i.covalent_radius() + max_cov + params.tolerance;
        let found = lookup.find(p.x, p.y, p.z, radius);
        for (&j, &d2) in found.indices.iter().zip(&found.squared_distances) {
            if j <= i || incompatible_alt_locs(unit.alt_loc(i), unit.alt_loc(j)) {
                continue;
            }
            if let Some(order) = bond_order(element_i, unit.element(j), d2.sqrt(), params.tolerance) {
                pairs.push((i, j, order));
            }
        }
    }
    log::debug!("unit {}: {} intra-unit bonds", unit.id, pairs.len());
    IntraUnitBonds::from_pairs(n, &pairs)
}

/// Bonds between atoms of different units, for unit pairs whose bounding
/// spheres come within bonding distance.
pub fn compute_inter_unit_bonds(units: &[Unit], params: &BondComputationParams) -> InterUnitBonds {
    let max_cov: Vec<f32> = units.iter().map(max_covalent_radius).collect();
    let mut edges = Vec::new();

    for (a, unit_a) in units.iter().enumerate() {
        let sphere_a = unit_a.boundary_sphere();
        for (b, unit_b) in units.iter().enumerate().skip(a + 1) {
            let margin = max_cov[a] + max_cov[b] + params.tolerance;
            if unit_a.is_empty() || unit_b.is_empty() || !sphere_a.overlaps(&unit_b.boundary_sphere(), margin) {
                continue;
            }
            let lookup = unit_b.lookup();
            for i in 0..unit_a.len() {
                let element_i = unit_a.element(i);
                let p = unit_b.operator.apply_inverse(unit_a.position(i));
                let radius = element_i.covalent_radius() + max_cov[b] + params.tolerance;
                let found = lookup.find(p.x, p.y, p.z, radius);
                for (&j, &d2) in found.indices.iter().zip(&found.squared_distances) {
                    if incompatible_alt_locs(unit_a.alt_loc(i), unit_b.alt_loc(j)) {
                        continue;
                    }
                    if let Some(order) = bond_order(element_i, unit_b.element(j), d2.sqrt(), params.tolerance) {
                        edges.push(InterUnitEdge {
                            unit_a: unit_a.id,
                            index_a: i,
                            unit_b: unit_b.id,
                            index_b: j,
                            order,
                        });
                    }
                }
            }
        }
    }
    log::debug!("{} inter-unit bonds", edges.len());
    InterUnitBonds::new(edges)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::geometry::SymmetryOperator;
    use crate::structure::model::{AtomRecord, AtomicModel};

    fn unit_of(atoms: &[(Element, Vec3, &str)]) -> Unit {
        let records: Vec<AtomRecord> = atoms
            .iter()
            .map(|&(element, position, alt)| AtomRecord {
                position,
                element,
                alt_id: alt.into(),
                comp_id: "LIG".into(),
                asym_id: "A".into(),
                ..Default::default()
            })
            .collect();
        let model = Rc::new(AtomicModel::from_atoms(&records));
        Unit::new(0, model, (0..atoms.len()).collect(), SymmetryOperator::identity())
    }

    #[test]
    fn simple_bond() {
        let unit = unit_of(&[
            (Element::C, Vec3::ZERO, ""),
            (Element::C, Vec3::new(1.5, 0.0, 0.0), ""),
        ]);
        let bonds = unit.bonds();
        assert_eq!(bonds.edge_count(), 1);
        assert!(bonds.has(0, 1) && bonds.has(1, 0));
        assert_eq!(bonds.bonds(0).next(), Some((1, BondOrder::Single)));
    }

    #[test]
    fn double_bond() {
        let unit = unit_of(&[
            (Element::C, Vec3::ZERO, ""),
            (Element::O, Vec3::new(1.23, 0.0, 0.0), ""),
        ]);
        assert_eq!(unit.bonds().bonds(1).next(), Some((0, BondOrder::Double)));
    }

    #[test]
    fn no_bond_far_apart() {
        let unit = unit_of(&[
            (Element::C, Vec3::ZERO, ""),
            (Element::C, Vec3::new(5.0, 0.0, 0.0), ""),
        ]);
        assert_eq!(unit.bonds().edge_count(), 0);
    }

    #[test]
    fn water_bonds() {
        let unit = unit_of(&[
            (Element::H, Vec3::new(0.757, 0.586, 0.0), ""),
            (Element::O, Vec3::ZERO, ""),
            (Element::H, Vec3::new(-0.757, 0.586, 0.0), ""),
        ]);
        let bonds = unit.bonds();
        assert_eq!(bonds.edge_count(), 2);
        assert_eq!(bonds.neighbors(1), &[0, 2]);
        assert!(!bonds.has(0, 2));
    }

    #[test]
    fn metals_are_not_bonded_by_distance() {
        let unit = unit_of(&[
            (Element::Zn, Vec3::ZERO, ""),
            (Element::N, Vec3::new(2.05, 0.0, 0.0), ""),
            (Element::C, Vec3::new(3.4, 0.0, 0.0), ""),
        ]);
        let bonds = unit.bonds();
        assert_eq!(bonds.edge_count(), 1);
        assert!(bonds.neighbors(0).is_empty());
        assert!(bonds.has(1, 2));
    }

    #[test]
    fn alternate_locations_do_not_bond() {
        let unit = unit_of(&[
            (Element::C, Vec3::ZERO, "A"),
            (Element::C, Vec3::new(1.5, 0.0, 0.0), "B"),
            (Element::C, Vec3::new(0.75, 1.3, 0.0), ""),
        ]);
        let bonds = unit.bonds();
        assert!(!bonds.has(0, 1));
        assert!(bonds.has(0, 2) && bonds.has(1, 2));
    }

    #[test]
    fn bonds_between_units() {
        let model = Rc::new(AtomicModel::from_atoms(&[
            AtomRecord {
                element: Element::S,
                asym_id: "A".into(),
                ..Default::default()
            },
            AtomRecord {
                element: Element::S,
                position: Vec3::new(2.05, 0.0, 0.0),
                asym_id: "B".into(),
                ..Default::default()
            },
        ]));
        let units = vec![
            Unit::new(0, model.clone(), vec![0], SymmetryOperator::identity()),
            Unit::new(1, model, vec![1], SymmetryOperator::identity()),
        ];
        let bonds = compute_inter_unit_bonds(&units, &BondComputationParams::default());
        assert_eq!(bonds.edges().len(), 1);
        assert!(bonds.has(0, 0, 1, 0));
        assert!(bonds.has(1, 0, 0, 0));
        assert!(!bonds.has(0, 0, 0, 0));
    }
}
