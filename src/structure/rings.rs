//! Ring perception within residues.
//!
//! Rings are the shortest cycles through each intra-residue bond, so every
//! ring found is chordless. Fused systems yield one ring per face.

use std::collections::{HashSet, VecDeque};

use glam::Vec3;

use super::element::Element;
use super::unit::Unit;

/// Largest ring considered, in atoms.
pub const MAX_RING_SIZE: usize = 10;

/// Mean distance from the ring plane above which a ring is not flat.
pub const AROMATIC_PLANARITY_THRESHOLD: f32 = 0.05;

/// Rings of one unit. Members are unit indices in cyclic order, starting
/// at the smallest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitRings {
    all: Vec<Vec<usize>>,
    aromatic: Vec<usize>,
    element_rings: Vec<Vec<usize>>,
}

impl UnitRings {
    pub fn all(&self) -> &[Vec<usize>] {
        &self.all
    }

    /// Indices into [`UnitRings::all`] of the aromatic rings.
    pub fn aromatic(&self) -> &[usize] {
        &self.aromatic
    }

    pub fn ring(&self, index: usize) -> &[usize] {
        &self.all[index]
    }

    /// Rings containing the atom.
    pub fn rings_of(&self, element: usize) -> &[usize] {
        self.element_rings.get(element).map_or(&[], Vec::as_slice)
    }

    pub fn aromatic_rings_of(&self, element: usize) -> impl Iterator<Item = usize> + '_ {
        self.rings_of(element)
            .iter()
            .copied()
            .filter(|r| self.aromatic.binary_search(r).is_ok())
    }

    pub fn is_ring_atom(&self, element: usize) -> bool {
        !self.rings_of(element).is_empty()
    }
}

pub fn compute_rings(unit: &Unit) -> UnitRings {
    let bonds = unit.bonds();
    let mut all: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for residue in unit.residue_segments() {
        for a in residue.clone() {
            for &b in bonds.neighbors(a) {
                if b <= a || !residue.contains(&b) {
                    continue;
                }
                let Some(path) = shortest_path_avoiding(unit, &residue, a, b) else {
                    continue;
                };
                let ring = canonical_order(path);
                let mut key = ring.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    all.push(ring);
                }
            }
        }
    }

    let aromatic: Vec<usize> = all
        .iter()
        .enumerate()
        .filter(|(_, ring)| is_aromatic(unit, ring))
        .map(|(i, _)| i)
        .collect();

    let mut element_rings = vec![Vec::new(); unit.len()];
    for (r, ring) in all.iter().enumerate() {
        for &e in ring {
            element_rings[e].push(r);
        }
    }

    log::trace!("unit {}: {} rings, {} aromatic", unit.id, all.len(), aromatic.len());
    UnitRings {
        all,
        aromatic,
        element_rings,
    }
}

/// Shortest path from `a` to `b` inside the residue that skips the direct
/// bond between them, `a` first.
fn shortest_path_avoiding(
    unit: &Unit,
    residue: &std::ops::Range<usize>,
    a: usize,
    b: usize,
) -> Option<Vec<usize>> {
    let bonds = unit.bonds();
    let offset = residue.start;
    let mut previous: Vec<Option<usize>> = vec![None; residue.len()];
    let mut depth = vec![usize::MAX; residue.len()];
    depth[a - offset] = 0;
    let mut queue = VecDeque::from([a]);

    while let Some(x) = queue.pop_front() {
        if depth[x - offset] + 1 >= MAX_RING_SIZE {
            continue;
        }
        for &y in bonds.neighbors(x) {
            if !residue.contains(&y) || (x == a && y == b) || depth[y - offset] != usize::MAX {
                continue;
            }
            depth[y - offset] = depth[x - offset] + 1;
            previous[y - offset] = Some(x);
            if y == b {
                let mut path = vec![b];
                let mut at = b;
                while let Some(p) = previous[at - offset] {
                    path.push(p);
                    at = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(y);
        }
    }
    None
}

/// Rotate to start at the smallest member, walking toward its smaller
/// neighbour.
fn canonical_order(mut ring: Vec<usize>) -> Vec<usize> {
    let Some(start) = ring.iter().enumerate().min_by_key(|(_, &e)| e).map(|(i, _)| i) else {
        return ring;
    };
    ring.rotate_left(start);
    if ring.len() > 2 && ring[ring.len() - 1] < ring[1] {
        ring[1..].reverse();
    }
    ring
}

fn is_aromatic_ring_element(element: Element) -> bool {
    matches!(
        element,
        Element::C | Element::N | Element::O | Element::P | Element::S | Element::Sn
    )
}

fn is_aromatic(unit: &Unit, ring: &[usize]) -> bool {
    if unit.comp_id(ring[0]) == "PRO" {
        return false;
    }
    if !ring.iter().any(|&e| is_aromatic_ring_element(unit.element(e))) {
        return false;
    }
    if ring.len() < 5 {
        return false;
    }
    let positions: Vec<Vec3> = ring.iter().map(|&e| unit.invariant_position(e)).collect();
    plane_deviation(&positions) < AROMATIC_PLANARITY_THRESHOLD
}

/// Root mean square distance of the points from the plane through their
/// centroid with the Newell normal.
fn plane_deviation(points: &[Vec3]) -> f32 {
    let n = points.len() as f32;
    let centroid = points.iter().copied().sum::<Vec3>() / n;
    let mut normal = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        normal += (*p - centroid).cross(q - centroid);
    }
    let Some(normal) = normal.try_normalize() else {
        return f32::INFINITY;
    };
    let sum_sq: f32 = points.iter().map(|p| (*p - centroid).dot(normal).powi(2)).sum();
    (sum_sq / n).sqrt()
}

/// Regular polygon in the xy plane at height `z`, for ring tests.
#[cfg(test)]
pub(crate) fn polygon(count: usize, radius: f32, center: Vec3) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 * std::f32::consts::TAU / count as f32;
            center + Vec3::new(radius * t.cos(), radius * t.sin(), 0.0)
        })
        .collect()
}
