//! Hydrogen bond donors, acceptors and the bond testers.
//!
//! Hydrogen counts, charges and ideal geometries come from the structure's
//! valence model, so models without hydrogens still get donors. A pair
//! within reach must also match the ideal bond angles at both atoms.

use super::chemistry::{calc_angles, calc_plane_angle, is_backbone_atom, is_histidine_nitrogen, is_water};
use super::common::{FeatureGroup, FeatureType, InteractionType};
use super::contacts::ContactTester;
use super::features::{FeatureInfo, FeatureProvider, FeaturesBuilder};
use crate::structure::{AtomGeometry, Element, Structure, Unit};

/// Angle limits shared by strong and weak hydrogen bonds, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrogenBondGeometryParams {
    pub distance_max: f32,
    /// Include backbone-backbone bonds.
    pub backbone: bool,
    /// Largest deviation from the ideal acceptor angle.
    pub acc_angle_dev_max: f32,
    /// Largest deviation from the ideal donor angle.
    pub don_angle_dev_max: f32,
    pub acc_out_of_plane_angle_max: f32,
    pub don_out_of_plane_angle_max: f32,
}

impl Default for HydrogenBondGeometryParams {
    fn default() -> Self {
        Self {
            distance_max: 3.5,
            backbone: true,
            acc_angle_dev_max: 45.0,
            don_angle_dev_max: 45.0,
            acc_out_of_plane_angle_max: 90.0,
            don_out_of_plane_angle_max: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrogenBondsParams {
    pub geometry: HydrogenBondGeometryParams,
    /// Longer limit when either partner is a sulfur.
    pub sulfur_distance_max: f32,
    /// Include water-water bonds.
    pub water: bool,
}

impl Default for HydrogenBondsParams {
    fn default() -> Self {
        Self {
            geometry: HydrogenBondGeometryParams::default(),
            sulfur_distance_max: 4.1,
            water: false,
        }
    }
}

/// Weak (C-H) hydrogen bonds use the angle limits alone.
pub type WeakHydrogenBondsParams = HydrogenBondGeometryParams;

fn add_donors(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let total_h = &structure.valence_model(unit.id).total_h;
    for i in 0..unit.len() {
        let with_hydrogen = total_h[i] > 0 && matches!(unit.element(i), Element::N | Element::O | Element::S);
        if is_histidine_nitrogen(unit, i) || with_hydrogen {
            builder.add(
                FeatureType::HydrogenDonor,
                FeatureGroup::None,
                unit.invariant_position(i),
                i,
            );
        }
    }
}

/// Member of an aromatic ring that holds a nitrogen or oxygen.
fn in_polar_aromatic_ring(unit: &Unit, i: usize) -> bool {
    let rings = unit.rings();
    rings.aromatic_rings_of(i).any(|r| {
        rings
            .ring(r)
            .iter()
            .any(|&j| matches!(unit.element(j), Element::N | Element::O))
    })
}

fn add_weak_donors(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let total_h = &structure.valence_model(unit.id).total_h;
    for i in 0..unit.len() {
        if unit.element(i) != Element::C || total_h[i] == 0 {
            continue;
        }
        let polar = structure.bond_to_element_count(unit.id, i, Element::N) > 0
            || structure.bond_to_element_count(unit.id, i, Element::O) > 0
            || in_polar_aromatic_ring(unit, i);
        if polar {
            builder.add(
                FeatureType::WeakHydrogenDonor,
                FeatureGroup::None,
                unit.invariant_position(i),
                i,
            );
        }
    }
}

/// Neutral nitrogen keeps a free lone pair when it has fewer bonds than
/// its geometry allows.
fn has_lone_pair(geometry: AtomGeometry, total_bonds: usize) -> bool {
    match geometry {
        AtomGeometry::Tetrahedral => total_bonds < 4,
        AtomGeometry::Trigonal => total_bonds < 3,
        AtomGeometry::Linear => total_bonds < 2,
        _ => false,
    }
}

fn add_acceptors(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    let valence = structure.valence_model(unit.id);
    for i in 0..unit.len() {
        let acceptor = match unit.element(i) {
            Element::O => true,
            Element::N => {
                is_histidine_nitrogen(unit, i)
                    || (valence.charge[i] < 1
                        && has_lone_pair(
                            valence.ideal_geometry[i],
                            structure.bond_count(unit.id, i) + usize::from(valence.implicit_h[i]),
                        ))
            }
            Element::S => matches!(unit.comp_id(i), "CYS" | "MET") || unit.formal_charge(i) == -1,
            _ => false,
        };
        if acceptor {
            builder.add(
                FeatureType::HydrogenAcceptor,
                FeatureGroup::None,
                unit.invariant_position(i),
                i,
            );
        }
    }
}

pub const HYDROGEN_DONOR_PROVIDER: FeatureProvider = FeatureProvider {
    name: "hydrogen-donor",
    types: &[FeatureType::HydrogenDonor],
    add: add_donors,
};

pub const WEAK_HYDROGEN_DONOR_PROVIDER: FeatureProvider = FeatureProvider {
    name: "weak-hydrogen-donor",
    types: &[FeatureType::WeakHydrogenDonor],
    add: add_weak_donors,
};

pub const HYDROGEN_ACCEPTOR_PROVIDER: FeatureProvider = FeatureProvider {
    name: "hydrogen-acceptor",
    types: &[FeatureType::HydrogenAcceptor],
    add: add_acceptors,
};

fn ideal_angle(geometry: AtomGeometry) -> f32 {
    geometry.ideal_angle().unwrap_or(120f32.to_radians())
}

/// Whether donor and acceptor are oriented for a hydrogen bond.
///
/// Donor angles may deviate either way from the ideal; acceptor angles are
/// only limited from below. Trigonal atoms also bound the out-of-plane
/// angle.
pub fn check_geometry(
    structure: &Structure,
    don: &FeatureInfo<'_>,
    acc: &FeatureInfo<'_>,
    params: &HydrogenBondGeometryParams,
) -> bool {
    let (don_index, acc_index) = (don.first_member(), acc.first_member());
    if !params.backbone
        && is_backbone_atom(don.unit.atom_id(don_index))
        && is_backbone_atom(acc.unit.atom_id(acc_index))
    {
        return false;
    }

    let don_geometry = don.ideal_geometry(structure);
    let ideal_don = ideal_angle(don_geometry);
    let don_dev = params.don_angle_dev_max.to_radians();
    let don_angles = calc_angles(structure, don.unit, don_index, acc.unit, acc_index);
    if don_angles.iter().any(|&angle| (ideal_don - angle).abs() > don_dev) {
        return false;
    }
    if don_geometry == AtomGeometry::Trigonal {
        let out_of_plane = calc_plane_angle(structure, don.unit, don_index, acc.unit, acc_index);
        if out_of_plane.is_some_and(|angle| angle > params.don_out_of_plane_angle_max.to_radians()) {
            return false;
        }
    }

    let acc_geometry = acc.ideal_geometry(structure);
    let ideal_acc = ideal_angle(acc_geometry);
    let acc_dev = params.acc_angle_dev_max.to_radians();
    let acc_angles = calc_angles(structure, acc.unit, acc_index, don.unit, don_index);
    if acc_angles.iter().any(|&angle| ideal_acc - angle > acc_dev) {
        return false;
    }
    if acc_geometry == AtomGeometry::Trigonal {
        let out_of_plane = calc_plane_angle(structure, acc.unit, acc_index, don.unit, don_index);
        if out_of_plane.is_some_and(|angle| angle > params.acc_out_of_plane_angle_max.to_radians()) {
            return false;
        }
    }
    true
}

/// Donor and acceptor of a pair, if it is one.
fn donor_acceptor<'a, 'b>(
    a: &'b FeatureInfo<'a>,
    b: &'b FeatureInfo<'a>,
    donor: FeatureType,
) -> Option<(&'b FeatureInfo<'a>, &'b FeatureInfo<'a>)> {
    match (a.kind(), b.kind()) {
        (d, FeatureType::HydrogenAcceptor) if d == donor => Some((a, b)),
        (FeatureType::HydrogenAcceptor, d) if d == donor => Some((b, a)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HydrogenBondTester {
    pub params: HydrogenBondsParams,
}

impl HydrogenBondTester {
    pub fn new(params: HydrogenBondsParams) -> Self {
        Self { params }
    }
}

impl ContactTester for HydrogenBondTester {
    fn name(&self) -> &'static str {
        "hydrogen-bonds"
    }

    fn max_distance(&self) -> f32 {
        self.params.geometry.distance_max.max(self.params.sulfur_distance_max)
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::HydrogenDonor, FeatureType::HydrogenAcceptor]
    }

    fn get_type(
        &self,
        structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        distance_sq: f32,
    ) -> Option<InteractionType> {
        let (don, acc) = donor_acceptor(a, b, FeatureType::HydrogenDonor)?;
        let (don_index, acc_index) = (don.first_member(), acc.first_member());
        let sulfur = don.unit.element(don_index) == Element::S || acc.unit.element(acc_index) == Element::S;
        let max = if sulfur {
            self.params.sulfur_distance_max
        } else {
            self.params.geometry.distance_max
        };
        if distance_sq > max * max {
            return None;
        }
        if !self.params.water && is_water(don.unit.comp_id(don_index)) && is_water(acc.unit.comp_id(acc_index)) {
            return None;
        }
        check_geometry(structure, don, acc, &self.params.geometry).then_some(InteractionType::HydrogenBond)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeakHydrogenBondTester {
    pub params: WeakHydrogenBondsParams,
}

impl WeakHydrogenBondTester {
    pub fn new(params: WeakHydrogenBondsParams) -> Self {
        Self { params }
    }
}

impl ContactTester for WeakHydrogenBondTester {
    fn name(&self) -> &'static str {
        "weak-hydrogen-bonds"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::WeakHydrogenDonor, FeatureType::HydrogenAcceptor]
    }

    fn get_type(
        &self,
        structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        let (don, acc) = donor_acceptor(a, b, FeatureType::WeakHydrogenDonor)?;
        check_geometry(structure, don, acc, &self.params).then_some(InteractionType::WeakHydrogenBond)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::interactions::features::{compute_features, Features};
    use crate::structure::{AtomRecord, AtomicModel};

    const PROVIDERS: [FeatureProvider; 3] = [
        HYDROGEN_DONOR_PROVIDER,
        WEAK_HYDROGEN_DONOR_PROVIDER,
        HYDROGEN_ACCEPTOR_PROVIDER,
    ];

    /// One residue per atom unless `seq_id` repeats.
    fn structure_of(atoms: &[(Element, &str, &str, i32, Vec3)]) -> Structure {
        let records: Vec<AtomRecord> = atoms
            .iter()
            .map(|&(element, name, comp, seq_id, position)| AtomRecord {
                position,
                element,
                atom_id: name.into(),
                comp_id: comp.into(),
                asym_id: "A".into(),
                seq_id,
                ..Default::default()
            })
            .collect();
        Structure::from_model(AtomicModel::from_atoms(&records))
    }

    fn features_of(structure: &Structure) -> Features {
        compute_features(structure, structure.unit(0), &PROVIDERS)
    }

    fn kinds_of(features: &Features, i: usize) -> Vec<FeatureType> {
        features
            .elements_index()
            .features_of(i)
            .iter()
            .map(|&f| features.types[f])
            .collect()
    }

    fn find<'a>(structure: &'a Structure, features: &'a Features, kind: FeatureType, member: usize) -> Option<FeatureInfo<'a>> {
        (0..features.count)
            .find(|&f| features.types[f] == kind && features.members(f) == [member])
            .map(|f| FeatureInfo::new(structure.unit(0), features, f))
    }

    fn toward(origin: Vec3, degrees: f32, length: f32) -> Vec3 {
        let t = degrees.to_radians();
        origin + Vec3::new(t.cos(), t.sin(), 0.0) * length
    }

    #[test]
    fn donors_and_acceptors() {
        let structure = structure_of(&[
            // carbonyl: acceptor only, its carbon a weak donor
            (Element::C, "C", "ALA", 1, Vec3::ZERO),
            (Element::O, "O", "ALA", 1, Vec3::new(1.23, 0.0, 0.0)),
            // isolated ammonia: donor with a free lone pair
            (Element::N, "N1", "NH3", 2, Vec3::new(10.0, 0.0, 0.0)),
            // methionine sulfur bonded to two carbons: acceptor only
            (Element::C, "CG", "MET", 3, Vec3::new(30.0, 0.0, 0.0)),
            (Element::S, "SD", "MET", 3, Vec3::new(31.8, 0.0, 0.0)),
            (Element::C, "CE", "MET", 3, Vec3::new(32.4, 1.7, 0.0)),
            // ammonium: charged, so no acceptor
            (Element::N, "N1", "NH4", 4, Vec3::new(40.0, 0.0, 0.0)),
            (Element::C, "C1", "NH4", 4, Vec3::new(41.47, 0.0, 0.0)),
        ]);
        let features = features_of(&structure);
        use FeatureType::{HydrogenAcceptor as Acc, HydrogenDonor as Don, WeakHydrogenDonor as Weak};
        assert_eq!(kinds_of(&features, 0), vec![Weak]);
        assert_eq!(kinds_of(&features, 1), vec![Acc]);
        assert_eq!(kinds_of(&features, 2), vec![Don, Acc]);
        assert_eq!(kinds_of(&features, 4), vec![Acc]);
        assert!(kinds_of(&features, 3).is_empty());
        assert_eq!(kinds_of(&features, 6), vec![Don]);
        assert_eq!(kinds_of(&features, 7), vec![Weak]);
    }

    #[test]
    fn sulfur_reaches_further() {
        let structure = structure_of(&[
            (Element::S, "SG", "CYS", 1, Vec3::ZERO),
            (Element::N, "N", "LIG", 2, Vec3::new(4.0, 0.0, 0.0)),
            (Element::O, "O", "LIG", 3, Vec3::new(0.0, 4.0, 0.0)),
        ]);
        let features = features_of(&structure);
        let tester = HydrogenBondTester::default();
        let (Some(sulfur), Some(nitrogen), Some(oxygen_acceptor), Some(oxygen_donor)) = (
            find(&structure, &features, FeatureType::HydrogenAcceptor, 0),
            find(&structure, &features, FeatureType::HydrogenDonor, 1),
            find(&structure, &features, FeatureType::HydrogenAcceptor, 2),
            find(&structure, &features, FeatureType::HydrogenDonor, 2),
        ) else {
            panic!("missing features");
        };
        assert_eq!(
            tester.get_type(&structure, &sulfur, &nitrogen, 16.0),
            Some(InteractionType::HydrogenBond)
        );
        assert_eq!(tester.get_type(&structure, &nitrogen, &oxygen_acceptor, 16.0), None);
        // two donors never pair
        assert_eq!(tester.get_type(&structure, &oxygen_donor, &nitrogen, 1.0), None);
    }

    #[test]
    fn water_and_backbone_switches() {
        let structure = structure_of(&[
            (Element::O, "O", "HOH", 1, Vec3::ZERO),
            (Element::O, "O", "HOH", 2, Vec3::new(2.8, 0.0, 0.0)),
        ]);
        let features = features_of(&structure);
        let (Some(donor), Some(acceptor)) = (
            find(&structure, &features, FeatureType::HydrogenDonor, 0),
            find(&structure, &features, FeatureType::HydrogenAcceptor, 1),
        ) else {
            panic!("missing features");
        };

        let default = HydrogenBondTester::default();
        assert_eq!(default.get_type(&structure, &donor, &acceptor, 7.84), None);
        let with_water = HydrogenBondTester::new(HydrogenBondsParams {
            water: true,
            ..Default::default()
        });
        assert_eq!(
            with_water.get_type(&structure, &donor, &acceptor, 7.84),
            Some(InteractionType::HydrogenBond)
        );
        // both atoms are named O, a backbone name
        let no_backbone = HydrogenBondTester::new(HydrogenBondsParams {
            water: true,
            geometry: HydrogenBondGeometryParams {
                backbone: false,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(no_backbone.get_type(&structure, &donor, &acceptor, 7.84), None);
    }

    /// Amine nitrogen bonded to a carbon at `degrees` from the line to an
    /// ether-like oxygen 2.9 away.
    fn amine_facing_oxygen(degrees: f32) -> Structure {
        let nitrogen = Vec3::ZERO;
        let oxygen = Vec3::new(2.9, 0.0, 0.0);
        structure_of(&[
            (Element::N, "N1", "AMN", 1, nitrogen),
            (Element::C, "C1", "AMN", 1, toward(nitrogen, degrees, 1.47)),
            (Element::O, "O1", "ALC", 2, oxygen),
            (Element::C, "C2", "ALC", 2, toward(oxygen, 0.0, 1.43)),
        ])
    }

    #[test]
    fn donor_angle_limits_bonds() {
        let tester = HydrogenBondTester::default();
        for (degrees, expected) in [(110.0, Some(InteractionType::HydrogenBond)), (50.0, None)] {
            let structure = amine_facing_oxygen(degrees);
            let features = features_of(&structure);
            let (Some(donor), Some(acceptor)) = (
                find(&structure, &features, FeatureType::HydrogenDonor, 0),
                find(&structure, &features, FeatureType::HydrogenAcceptor, 2),
            ) else {
                panic!("missing features");
            };
            assert_eq!(structure.valence_model(0).ideal_geometry[0], AtomGeometry::Tetrahedral);
            // the distance is fine either way
            assert_eq!(tester.get_type(&structure, &donor, &acceptor, 8.41), expected, "{degrees}");
        }
    }

    #[test]
    fn trigonal_donor_out_of_plane() {
        // amide-like N in the xy plane, the acceptor 60 degrees above it
        // at the ideal in-plane angle
        let nitrogen = Vec3::ZERO;
        let carbon = toward(nitrogen, 180.0, 1.33);
        let up = Vec3::new(0.5, 0.0, 3f32.sqrt() / 2.0);
        let oxygen = up * 2.9;
        let structure = structure_of(&[
            (Element::N, "N1", "AMD", 1, nitrogen),
            (Element::C, "C1", "AMD", 1, carbon),
            (Element::O, "O1", "AMD", 1, toward(carbon, 120.0, 1.23)),
            (Element::C, "C2", "AMD", 1, toward(carbon, 240.0, 1.5)),
            (Element::O, "O2", "ALC", 2, oxygen),
            (Element::C, "C3", "ALC", 2, oxygen + up * 1.43),
        ]);
        let features = features_of(&structure);
        let (Some(donor), Some(acceptor)) = (
            find(&structure, &features, FeatureType::HydrogenDonor, 0),
            find(&structure, &features, FeatureType::HydrogenAcceptor, 4),
        ) else {
            panic!("missing features");
        };
        assert_eq!(donor.ideal_geometry(&structure), AtomGeometry::Trigonal);
        let tester = HydrogenBondTester::default();
        assert_eq!(tester.get_type(&structure, &donor, &acceptor, 8.41), None);
        let lenient = HydrogenBondTester::new(HydrogenBondsParams {
            geometry: HydrogenBondGeometryParams {
                don_out_of_plane_angle_max: 90.0,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(
            lenient.get_type(&structure, &donor, &acceptor, 8.41),
            Some(InteractionType::HydrogenBond)
        );
    }

    #[test]
    fn weak_bonds_from_polar_carbons() {
        let carbon = Vec3::ZERO;
        let oxygen = Vec3::new(3.3, 0.0, 0.0);
        let structure = structure_of(&[
            (Element::C, "C1", "MOH", 1, carbon),
            (Element::O, "O1", "MOH", 1, toward(carbon, 110.0, 1.43)),
            (Element::O, "O2", "ALC", 2, oxygen),
            (Element::C, "C2", "ALC", 2, toward(oxygen, 0.0, 1.43)),
        ]);
        let features = features_of(&structure);
        let (Some(weak), Some(acceptor), Some(strong)) = (
            find(&structure, &features, FeatureType::WeakHydrogenDonor, 0),
            find(&structure, &features, FeatureType::HydrogenAcceptor, 2),
            find(&structure, &features, FeatureType::HydrogenDonor, 1),
        ) else {
            panic!("missing features");
        };
        let tester = WeakHydrogenBondTester::default();
        assert_eq!(
            tester.get_type(&structure, &acceptor, &weak, 10.89),
            Some(InteractionType::WeakHydrogenBond)
        );
        // strong donors are left to the hydrogen bond tester
        assert_eq!(tester.get_type(&structure, &strong, &acceptor, 10.89), None);
    }
}
