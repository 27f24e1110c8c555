//! Charged groups and aromatic rings, and the contacts between them:
//! ionic, pi-stacking and cation-pi.

use std::collections::HashSet;

use glam::Vec3;

use super::chemistry::{
    is_acetamidine, is_backbone_atom, is_carboxylate, is_guanidine, is_nucleotide, is_phosphate,
    is_polymer_residue, is_sulfate, is_sulfonic_acid,
};
use super::common::{FeatureGroup, FeatureType, InteractionType};
use super::contacts::ContactTester;
use super::features::{FeatureInfo, FeatureProvider, FeaturesBuilder};
use crate::structure::{Element, Structure, Unit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonicParams {
    pub distance_max: f32,
}

impl Default for IonicParams {
    fn default() -> Self {
        Self { distance_max: 5.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiStackingParams {
    pub distance_max: f32,
    /// Largest in-plane offset between the ring centres.
    pub offset_max: f32,
    /// Largest deviation from parallel or perpendicular rings, in degrees.
    pub angle_dev_max: f32,
}

impl Default for PiStackingParams {
    fn default() -> Self {
        Self {
            distance_max: 5.5,
            offset_max: 2.0,
            angle_dev_max: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CationPiParams {
    pub distance_max: f32,
    /// Largest offset of the cation from the ring axis.
    pub offset_max: f32,
}

impl Default for CationPiParams {
    fn default() -> Self {
        Self {
            distance_max: 6.0,
            offset_max: 2.0,
        }
    }
}

/// One feature from the atoms of `residue` passing `select`; nothing when
/// none pass.
fn add_group(
    unit: &Unit,
    builder: &mut FeaturesBuilder,
    residue: std::ops::Range<usize>,
    select: impl Fn(usize) -> bool,
    kind: FeatureType,
    group: FeatureGroup,
) {
    builder.start_state();
    for i in residue {
        if select(i) {
            builder.push_member(unit.invariant_position(i), i);
        }
    }
    builder.finish_state(kind, group);
}

/// One feature from the bond partners of `center` with `element`. Partners
/// in other units are left out.
#[allow(clippy::too_many_arguments)]
fn add_partner_group(
    structure: &Structure,
    unit: &Unit,
    builder: &mut FeaturesBuilder,
    center: usize,
    element: Element,
    kind: FeatureType,
    group: FeatureGroup,
    added: &mut HashSet<usize>,
) {
    builder.start_state();
    for (u, j, _) in structure.bonded_atoms(unit.id, center) {
        if u == unit.id && unit.element(j) == element {
            added.insert(j);
            builder.push_member(unit.invariant_position(j), j);
        }
    }
    builder.finish_state(kind, group);
}

fn add_positive_charges(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let charge = &structure.valence_model(unit.id).charge;
    let mut added = HashSet::new();
    for residue in unit.residue_segments() {
        let comp = unit.comp_id(residue.start);
        let side_chain_nitrogen = |i: usize| unit.element(i) == Element::N && !is_backbone_atom(unit.atom_id(i));
        let group = match comp {
            "ARG" => Some(FeatureGroup::Guanidine),
            "LYS" => Some(FeatureGroup::QuaternaryAmine),
            "HIS" => Some(FeatureGroup::Imidazole),
            _ => None,
        };
        if let Some(group) = group {
            add_group(unit, builder, residue, side_chain_nitrogen, FeatureType::PositiveCharge, group);
            continue;
        }
        if is_polymer_residue(comp) {
            continue;
        }
        added.clear();
        for i in residue.clone() {
            let group = if is_guanidine(structure, unit, i) {
                FeatureGroup::Guanidine
            } else if is_acetamidine(structure, unit, i) {
                FeatureGroup::Acetamidine
            } else {
                continue;
            };
            add_partner_group(
                structure,
                unit,
                builder,
                i,
                Element::N,
                FeatureType::PositiveCharge,
                group,
                &mut added,
            );
        }
        for i in residue {
            if charge[i] > 0 && !added.contains(&i) {
                builder.add(FeatureType::PositiveCharge, FeatureGroup::None, unit.invariant_position(i), i);
            }
        }
    }
}

fn add_negative_charges(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let charge = &structure.valence_model(unit.id).charge;
    let mut added = HashSet::new();
    for residue in unit.residue_segments() {
        let comp = unit.comp_id(residue.start);
        if matches!(comp, "GLU" | "ASP") {
            let side_chain_oxygen = |i: usize| unit.element(i) == Element::O && !is_backbone_atom(unit.atom_id(i));
            add_group(
                unit,
                builder,
                residue,
                side_chain_oxygen,
                FeatureType::NegativeCharge,
                FeatureGroup::Carboxylate,
            );
        } else if is_nucleotide(comp) {
            for i in residue {
                if is_phosphate(structure, unit, i) {
                    add_partner_group(
                        structure,
                        unit,
                        builder,
                        i,
                        Element::O,
                        FeatureType::NegativeCharge,
                        FeatureGroup::Phosphate,
                        &mut added,
                    );
                }
            }
        } else if !is_polymer_residue(comp) {
            added.clear();
            for i in residue.clone() {
                let group = if is_sulfonic_acid(structure, unit, i) {
                    FeatureGroup::SulfonicAcid
                } else if is_phosphate(structure, unit, i) {
                    FeatureGroup::Phosphate
                } else if is_sulfate(structure, unit, i) {
                    FeatureGroup::Sulfate
                } else if is_carboxylate(structure, unit, i) {
                    FeatureGroup::Carboxylate
                } else {
                    continue;
                };
                add_partner_group(
                    structure,
                    unit,
                    builder,
                    i,
                    Element::O,
                    FeatureType::NegativeCharge,
                    group,
                    &mut added,
                );
            }
            for i in residue {
                if charge[i] < 0 && !added.contains(&i) {
                    builder.add(FeatureType::NegativeCharge, FeatureGroup::None, unit.invariant_position(i), i);
                }
            }
        }
    }
}

fn add_aromatic_rings(_structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let rings = unit.rings();
    for &r in rings.aromatic() {
        builder.start_state();
        for &i in rings.ring(r) {
            builder.push_member(unit.invariant_position(i), i);
        }
        builder.finish_state(FeatureType::AromaticRing, FeatureGroup::None);
    }
}

pub const POSITIVE_CHARGE_PROVIDER: FeatureProvider = FeatureProvider {
    name: "positive-charge",
    types: &[FeatureType::PositiveCharge],
    add: add_positive_charges,
};

pub const NEGATIVE_CHARGE_PROVIDER: FeatureProvider = FeatureProvider {
    name: "negative-charge",
    types: &[FeatureType::NegativeCharge],
    add: add_negative_charges,
};

pub const AROMATIC_RING_PROVIDER: FeatureProvider = FeatureProvider {
    name: "aromatic-ring",
    types: &[FeatureType::AromaticRing],
    add: add_aromatic_rings,
};

/// Whether any member atom of `a` lies closer than `max` to a member of `b`.
fn members_within(a: &FeatureInfo<'_>, b: &FeatureInfo<'_>, max: f32) -> bool {
    let max_sq = max * max;
    a.members().iter().any(|&i| {
        let p = a.unit.position(i);
        b.members()
            .iter()
            .any(|&j| p.distance_squared(b.unit.position(j)) < max_sq)
    })
}

/// Normal of the plane through the first three ring members, after the
/// unit operator.
fn ring_normal(ring: &FeatureInfo<'_>) -> Vec3 {
    let members = ring.members();
    let p = |k: usize| ring.unit.position(members[k]);
    (p(1) - p(0)).cross(p(2) - p(0)).normalize_or_zero()
}

/// Distance of `a`'s centre from `b`'s centre within the plane of normal
/// `normal`.
fn in_plane_offset(a: &FeatureInfo<'_>, b: &FeatureInfo<'_>, normal: Vec3) -> f32 {
    let d = a.position() - b.position();
    (d - normal * d.dot(normal)).length()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IonicTester {
    pub params: IonicParams,
}

impl IonicTester {
    pub fn new(params: IonicParams) -> Self {
        Self { params }
    }
}

impl ContactTester for IonicTester {
    fn name(&self) -> &'static str {
        "ionic"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::PositiveCharge, FeatureType::NegativeCharge]
    }

    fn get_type(
        &self,
        _structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        let opposite = matches!(
            (a.kind(), b.kind()),
            (FeatureType::PositiveCharge, FeatureType::NegativeCharge)
                | (FeatureType::NegativeCharge, FeatureType::PositiveCharge)
        );
        (opposite && members_within(a, b, self.params.distance_max)).then_some(InteractionType::Ionic)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PiStackingTester {
    pub params: PiStackingParams,
}

impl PiStackingTester {
    pub fn new(params: PiStackingParams) -> Self {
        Self { params }
    }
}

impl ContactTester for PiStackingTester {
    fn name(&self) -> &'static str {
        "pi-stacking"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::AromaticRing]
    }

    fn get_type(
        &self,
        _structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        if a.kind() != FeatureType::AromaticRing || b.kind() != FeatureType::AromaticRing {
            return None;
        }
        let (normal_a, normal_b) = (ring_normal(a), ring_normal(b));
        let angle = normal_a.angle_between(normal_b);
        let offset = in_plane_offset(a, b, normal_b).min(in_plane_offset(b, a, normal_a));
        if offset > self.params.offset_max {
            return None;
        }
        let dev = self.params.angle_dev_max.to_radians();
        let right = std::f32::consts::FRAC_PI_2;
        let parallel = angle <= dev || angle >= std::f32::consts::PI - dev;
        let t_shaped = angle >= right - dev && angle <= right + dev;
        (parallel || t_shaped).then_some(InteractionType::PiStacking)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CationPiTester {
    pub params: CationPiParams,
}

impl CationPiTester {
    pub fn new(params: CationPiParams) -> Self {
        Self { params }
    }
}

impl ContactTester for CationPiTester {
    fn name(&self) -> &'static str {
        "cation-pi"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::AromaticRing, FeatureType::PositiveCharge]
    }

    fn get_type(
        &self,
        _structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        let (ring, cation) = match (a.kind(), b.kind()) {
            (FeatureType::AromaticRing, FeatureType::PositiveCharge) => (a, b),
            (FeatureType::PositiveCharge, FeatureType::AromaticRing) => (b, a),
            _ => return None,
        };
        let offset = in_plane_offset(cation, ring, ring_normal(ring));
        (offset <= self.params.offset_max).then_some(InteractionType::CationPi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::features::{compute_features, Features};
    use crate::structure::rings::polygon;
    use crate::structure::{AtomRecord, AtomicModel};

    fn structure_of(atoms: &[(Element, &str, &str, i32, Vec3, i8)]) -> Structure {
        let records: Vec<AtomRecord> = atoms
            .iter()
            .map(|&(element, name, comp, seq_id, position, formal_charge)| AtomRecord {
                position,
                element,
                atom_id: name.into(),
                comp_id: comp.into(),
                asym_id: "A".into(),
                seq_id,
                formal_charge,
                ..Default::default()
            })
            .collect();
        Structure::from_model(AtomicModel::from_atoms(&records))
    }

    fn charged_features(structure: &Structure) -> Features {
        compute_features(
            structure,
            structure.unit(0),
            &[POSITIVE_CHARGE_PROVIDER, NEGATIVE_CHARGE_PROVIDER, AROMATIC_RING_PROVIDER],
        )
    }

    fn summary(features: &Features) -> Vec<(FeatureType, FeatureGroup, Vec<usize>)> {
        (0..features.count)
            .map(|f| {
                let mut members = features.members(f).to_vec();
                members.sort_unstable();
                (features.types[f], features.groups[f], members)
            })
            .collect()
    }

    /// Benzene carbons in residue `seq_id`, centred at `center` in a plane
    /// parallel to xy.
    fn benzene(seq_id: i32, center: Vec3) -> Vec<(Element, &'static str, &'static str, i32, Vec3, i8)> {
        polygon(6, 1.39, center)
            .into_iter()
            .map(|p| (Element::C, "C", "BNZ", seq_id, p, 0))
            .collect()
    }

    #[test]
    fn charged_groups() {
        let structure = structure_of(&[
            (Element::N, "N", "ARG", 1, Vec3::new(0.0, 0.0, 0.0), 0),
            (Element::N, "NE", "ARG", 1, Vec3::new(2.0, 0.0, 0.0), 0),
            (Element::N, "NH1", "ARG", 1, Vec3::new(3.0, 1.0, 0.0), 0),
            (Element::N, "NH2", "ARG", 1, Vec3::new(3.0, -1.0, 0.0), 0),
            (Element::O, "O", "ASP", 2, Vec3::new(10.0, 0.0, 0.0), 0),
            (Element::O, "OD1", "ASP", 2, Vec3::new(12.0, 1.0, 0.0), 0),
            (Element::O, "OD2", "ASP", 2, Vec3::new(12.0, -1.0, 0.0), 0),
            (Element::Mg, "MG", "MG", 3, Vec3::new(20.0, 0.0, 0.0), 2),
            (Element::Cl, "CL", "CL", 4, Vec3::new(30.0, 0.0, 0.0), -1),
            (Element::P, "P", "DA", 5, Vec3::new(40.0, 0.0, 0.0), 0),
            (Element::O, "OP1", "DA", 5, Vec3::new(41.5, 0.0, 0.0), 0),
            (Element::O, "OP2", "DA", 5, Vec3::new(38.5, 0.0, 0.0), 0),
            (Element::O, "O5'", "DA", 5, Vec3::new(40.0, 1.5, 0.0), 0),
        ]);
        let features = charged_features(&structure);
        use FeatureType::{NegativeCharge as Neg, PositiveCharge as Pos};
        assert_eq!(
            summary(&features),
            vec![
                (Pos, FeatureGroup::Guanidine, vec![1, 2, 3]),
                (Pos, FeatureGroup::None, vec![7]),
                (Neg, FeatureGroup::Carboxylate, vec![5, 6]),
                (Neg, FeatureGroup::None, vec![8]),
                (Neg, FeatureGroup::Phosphate, vec![10, 11, 12]),
            ]
        );
        assert_eq!(features.position(0), Vec3::new(8.0 / 3.0, 0.0, 0.0));
    }

    #[test]
    fn ligand_groups_absorb_charged_atoms() {
        let cz = Vec3::ZERO;
        let toward = |origin: Vec3, degrees: f32, length: f32| {
            let t = degrees.to_radians();
            origin + Vec3::new(t.cos(), t.sin(), 0.0) * length
        };
        let ne = toward(cz, 0.0, 1.33);
        let c = Vec3::new(20.0, 0.0, 0.0);
        let structure = structure_of(&[
            (Element::C, "CZ", "MGU", 1, cz, 0),
            (Element::N, "NE", "MGU", 1, ne, 0),
            (Element::N, "NH1", "MGU", 1, toward(cz, 120.0, 1.33), 0),
            (Element::N, "NH2", "MGU", 1, toward(cz, 240.0, 1.33), 0),
            (Element::C, "CD", "MGU", 1, toward(ne, 60.0, 1.46), 0),
            (Element::C, "C", "ACT", 2, c, 0),
            (Element::O, "O", "ACT", 2, toward(c, 120.0, 1.25), 0),
            (Element::O, "OXT", "ACT", 2, toward(c, 240.0, 1.3), 0),
            (Element::C, "CH3", "ACT", 2, toward(c, 0.0, 1.52), 0),
        ]);
        assert_eq!(structure.valence_model(0).charge[7], -1);
        let features = charged_features(&structure);
        assert_eq!(
            summary(&features),
            vec![
                (FeatureType::PositiveCharge, FeatureGroup::Guanidine, vec![1, 2, 3]),
                (FeatureType::NegativeCharge, FeatureGroup::Carboxylate, vec![6, 7]),
            ]
        );
    }

    #[test]
    fn ionic_needs_close_members() {
        let structure = structure_of(&[
            (Element::N, "NZ", "LYS", 1, Vec3::ZERO, 0),
            (Element::O, "OD1", "ASP", 2, Vec3::new(4.5, 1.0, 0.0), 0),
            (Element::O, "OD2", "ASP", 2, Vec3::new(6.5, -1.0, 0.0), 0),
            (Element::O, "OE1", "GLU", 3, Vec3::new(0.0, 20.0, 0.0), 0),
            (Element::O, "OE2", "GLU", 4, Vec3::new(5.0, 0.0, 30.0), 0),
            (Element::N, "NZ", "LYS", 5, Vec3::new(0.0, 0.0, 30.0), 0),
        ]);
        let features = charged_features(&structure);
        let unit = structure.unit(0);
        let tester = IonicTester::default();
        let info = |f| FeatureInfo::new(unit, &features, f);
        // features: LYS 1, LYS 5, ASP 2, GLU 3, GLU 4
        assert_eq!(tester.get_type(&structure, &info(0), &info(2), 0.0), Some(InteractionType::Ionic));
        assert_eq!(tester.get_type(&structure, &info(0), &info(3), 0.0), None);
        assert_eq!(tester.get_type(&structure, &info(2), &info(3), 0.0), None);
        // members exactly at the limit are too far
        assert_eq!(tester.get_type(&structure, &info(1), &info(4), 0.0), None);
    }

    #[test]
    fn aromatic_rings_sit_at_their_centre() {
        let structure = structure_of(&benzene(1, Vec3::new(1.0, 2.0, 3.0)));
        let features = charged_features(&structure);
        assert_eq!(features.count, 1);
        assert_eq!(features.types[0], FeatureType::AromaticRing);
        assert_eq!(features.members(0).len(), 6);
        assert!(features.position(0).distance(Vec3::new(1.0, 2.0, 3.0)) < 1e-5);
    }

    fn ring_pair(shift: Vec3, tilt_degrees: f32) -> Structure {
        let mut atoms = benzene(1, Vec3::ZERO);
        let t = tilt_degrees.to_radians();
        for (i, p) in polygon(6, 1.39, Vec3::ZERO).into_iter().enumerate() {
            // rotate about the x axis, then move
            let rotated = Vec3::new(p.x, p.y * t.cos(), p.y * t.sin());
            atoms.push((Element::C, ["C1", "C2", "C3", "C4", "C5", "C6"][i], "BNZ", 2, rotated + shift, 0));
        }
        structure_of(&atoms)
    }

    fn stacking(structure: &Structure) -> Option<InteractionType> {
        let features = charged_features(structure);
        assert_eq!(features.count, 2);
        let unit = structure.unit(0);
        let (a, b) = (FeatureInfo::new(unit, &features, 0), FeatureInfo::new(unit, &features, 1));
        PiStackingTester::default().get_type(structure, &a, &b, a.distance(&b).powi(2))
    }

    #[test]
    fn pi_stacking_parallel_and_t_shaped() {
        assert_eq!(stacking(&ring_pair(Vec3::new(0.0, 0.0, 3.5), 0.0)), Some(InteractionType::PiStacking));
        // sideways shift beyond the offset limit
        assert_eq!(stacking(&ring_pair(Vec3::new(3.0, 0.0, 3.5), 0.0)), None);
        // edge-on ring above the other
        assert_eq!(stacking(&ring_pair(Vec3::new(0.0, 0.0, 5.0), 90.0)), Some(InteractionType::PiStacking));
        // 45 degrees is neither
        assert_eq!(stacking(&ring_pair(Vec3::new(0.0, 0.0, 4.0), 45.0)), None);
    }

    #[test]
    fn cation_over_ring() {
        let mut atoms = benzene(1, Vec3::ZERO);
        atoms.push((Element::C, "CE", "LYS", 2, Vec3::new(0.0, 0.0, 5.27), 0));
        atoms.push((Element::N, "NZ", "LYS", 2, Vec3::new(0.0, 0.0, 3.8), 0));
        atoms.push((Element::C, "CE", "LYS", 3, Vec3::new(3.0, 0.0, 5.27), 0));
        atoms.push((Element::N, "NZ", "LYS", 3, Vec3::new(3.0, 0.0, 3.8), 0));
        let structure = structure_of(&atoms);
        let features = charged_features(&structure);
        let unit = structure.unit(0);
        // positive charges come first, then the ring
        let info = |f| FeatureInfo::new(unit, &features, f);
        assert_eq!(features.types[2], FeatureType::AromaticRing);
        let tester = CationPiTester::default();
        assert_eq!(tester.get_type(&structure, &info(0), &info(2), 14.44), Some(InteractionType::CationPi));
        assert_eq!(tester.get_type(&structure, &info(2), &info(1), 23.44), None);
    }
}
