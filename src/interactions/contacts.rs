//! Contact search between features, within a unit and across unit pairs.

use super::common::{FeatureType, InterContactsBuilder, IntraContactsBuilder, InteractionType};
use super::features::{FeatureInfo, Features};
use crate::geometry::symmetry::image_transform;
use crate::structure::{Element, Structure, Unit};

/// Radius around the midpoint of a contact searched for occluding atoms,
/// before scaling by the distance factor.
const MAX_LINE_OF_SIGHT_DISTANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactsParams {
    /// Scales the van der Waals radii used by the line-of-sight check.
    pub line_of_sight_dist_factor: f32,
}

impl Default for ContactsParams {
    fn default() -> Self {
        Self {
            line_of_sight_dist_factor: 1.0,
        }
    }
}

/// Classifies a pair of features into an interaction.
pub trait ContactTester {
    fn name(&self) -> &'static str;

    fn max_distance(&self) -> f32;

    /// Feature types this tester looks at.
    fn required_features(&self) -> &[FeatureType];

    fn get_type(
        &self,
        structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        distance_sq: f32,
    ) -> Option<InteractionType>;
}

fn incompatible_alt_locs(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

/// Whether two features may form a contact at all.
pub fn valid_pair(structure: &Structure, a: &FeatureInfo<'_>, b: &FeatureInfo<'_>) -> bool {
    let (unit_a, unit_b) = (a.unit, b.unit);
    let (index_a, index_b) = (a.first_member(), b.first_member());
    let same_unit = unit_a.id == unit_b.id;
    if same_unit && index_a == index_b {
        return false;
    }
    if incompatible_alt_locs(unit_a.alt_loc(index_a), unit_b.alt_loc(index_b)) {
        return false;
    }
    if same_unit
        && unit_a.model.residue_count() > 1
        && unit_a.residue_index(index_a) == unit_a.residue_index(index_b)
    {
        return false;
    }
    !structure.connected_to(unit_a.id, index_a, unit_b.id, index_b)
}

/// False when a heavy atom other than the features' own sits between them.
pub fn check_line_of_sight(
    structure: &Structure,
    a: &FeatureInfo<'_>,
    b: &FeatureInfo<'_>,
    dist_factor: f32,
) -> bool {
    let pa = a.position();
    let pb = b.position();
    let mid = (pa + pb) * 0.5;
    let alt_a = a.unit.alt_loc(a.first_member());
    let alt_b = b.unit.alt_loc(b.first_member());

    let found = structure.find(
        mid.x,
        mid.y,
        mid.z,
        dist_factor * MAX_LINE_OF_SIGHT_DISTANCE,
    );
    for r in 0..found.count {
        let unit = structure.unit(found.units[r]);
        let index = found.indices[r];
        let element = unit.element(index);
        if element == Element::H {
            continue;
        }
        let vdw = element.vdw_radius() * dist_factor;
        if vdw * vdw <= found.squared_distances[r] {
            continue;
        }
        let alt = unit.alt_loc(index);
        if incompatible_alt_locs(alt, alt_a) || incompatible_alt_locs(alt, alt_b) {
            continue;
        }
        if a.is_member(unit.id, index) || b.is_member(unit.id, index) {
            continue;
        }
        let p = unit.position(index);
        if p.distance_squared(pa) < 1.0 || p.distance_squared(pb) < 1.0 {
            continue;
        }
        return false;
    }
    true
}

/// Contacts between features of one unit, one tester at a time.
pub fn add_unit_contacts(
    structure: &Structure,
    unit: &Unit,
    features: &Features,
    builder: &mut IntraContactsBuilder,
    testers: &[&dyn ContactTester],
    params: &ContactsParams,
) {
    for tester in testers {
        let subset = features.subset(tester.required_features());
        let max_distance = tester.max_distance();
        for &i in &subset.indices {
            let p = features.position(i);
            let found = subset.lookup.find(p.x, p.y, p.z, max_distance);
            let info_a = FeatureInfo::new(unit, features, i);
            for r in 0..found.count {
                let j = subset.indices[found.indices[r]];
                if j <= i {
                    continue;
                }
                let info_b = FeatureInfo::new(unit, features, j);
                if !valid_pair(structure, &info_a, &info_b) {
                    continue;
                }
                let Some(kind) = tester.get_type(structure, &info_a, &info_b, found.squared_distances[r]) else {
                    continue;
                };
                if check_line_of_sight(structure, &info_a, &info_b, params.line_of_sight_dist_factor) {
                    builder.add(i, j, kind);
                }
            }
        }
    }
}

/// Contacts between features of two units. Testers are tried in order and
/// the first accepted type wins.
#[allow(clippy::too_many_arguments)]
pub fn add_structure_contacts(
    structure: &Structure,
    unit_a: &Unit,
    features_a: &Features,
    unit_b: &Unit,
    features_b: &Features,
    builder: &mut InterContactsBuilder,
    testers: &[&dyn ContactTester],
    params: &ContactsParams,
) {
    let max_distance = testers
        .iter()
        .map(|t| t.max_distance())
        .fold(0.0f32, f32::max);
    let transform = image_transform(&unit_a.operator, &unit_b.operator);
    let lookup_b = features_b.lookup();
    let sphere_b = lookup_b.boundary().sphere;

    builder.start_unit_pair(unit_a.id, unit_b.id);
    for i in 0..features_a.count {
        let p = transform.transform_point3(features_a.position(i));
        if p.distance(sphere_b.center) > sphere_b.radius + max_distance {
            continue;
        }
        let info_a = FeatureInfo::new(unit_a, features_a, i);
        let found = lookup_b.find(p.x, p.y, p.z, max_distance);
        for r in 0..found.count {
            let j = found.indices[r];
            let distance_sq = found.squared_distances[r];
            let info_b = FeatureInfo::new(unit_b, features_b, j);
            if !valid_pair(structure, &info_a, &info_b) {
                continue;
            }
            for tester in testers {
                let max = tester.max_distance();
                if distance_sq >= max * max {
                    continue;
                }
                let Some(kind) = tester.get_type(structure, &info_a, &info_b, distance_sq) else {
                    continue;
                };
                if check_line_of_sight(structure, &info_a, &info_b, params.line_of_sight_dist_factor) {
                    builder.add(i, j, kind);
                    break;
                }
            }
        }
    }
    builder.finish_unit_pair();
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::interactions::common::FeatureGroup;
    use crate::interactions::features::FeaturesBuilder;
    use crate::structure::{AtomRecord, AtomicModel};

    struct AnyPair;

    impl ContactTester for AnyPair {
        fn name(&self) -> &'static str {
            "any"
        }

        fn max_distance(&self) -> f32 {
            4.0
        }

        fn required_features(&self) -> &[FeatureType] {
            &[FeatureType::HydrogenDonor]
        }

        fn get_type(
            &self,
            _structure: &Structure,
            _a: &FeatureInfo<'_>,
            _b: &FeatureInfo<'_>,
            _distance_sq: f32,
        ) -> Option<InteractionType> {
            Some(InteractionType::Unknown)
        }
    }

    fn atom(element: Element, position: Vec3, seq_id: i32) -> AtomRecord {
        AtomRecord {
            position,
            element,
            comp_id: "LIG".into(),
            asym_id: "A".into(),
            seq_id,
            ..Default::default()
        }
    }

    /// Every atom of every unit as a donor feature.
    fn atom_features(unit: &Unit) -> Features {
        let mut builder = FeaturesBuilder::new();
        for i in 0..unit.len() {
            builder.add(
                FeatureType::HydrogenDonor,
                FeatureGroup::None,
                unit.invariant_position(i),
                i,
            );
        }
        builder.finish(unit.len())
    }

    fn pair_with(blocker: Option<Element>) -> Structure {
        let mut atoms = vec![
            atom(Element::N, Vec3::ZERO, 1),
            atom(Element::O, Vec3::new(3.4, 0.0, 0.0), 2),
        ];
        if let Some(element) = blocker {
            atoms.push(atom(element, Vec3::new(1.7, 0.5, 0.0), 3));
        }
        Structure::from_model(AtomicModel::from_atoms(&atoms))
    }

    fn sight(structure: &Structure) -> bool {
        let unit = structure.unit(0);
        let features = atom_features(unit);
        let a = FeatureInfo::new(unit, &features, 0);
        let b = FeatureInfo::new(unit, &features, 1);
        check_line_of_sight(structure, &a, &b, 1.0)
    }

    #[test]
    fn heavy_atom_blocks_line_of_sight() {
        assert!(sight(&pair_with(None)));
        assert!(!sight(&pair_with(Some(Element::C))));
    }

    #[test]
    fn hydrogen_does_not_block() {
        assert!(sight(&pair_with(Some(Element::H))));
    }

    #[test]
    fn pairs_are_valid() {
        // residue 1 holds two unbonded atoms, residue 2 a bonded pair
        let structure = Structure::from_model(AtomicModel::from_atoms(&[
            atom(Element::N, Vec3::ZERO, 1),
            atom(Element::N, Vec3::new(2.0, 0.0, 0.0), 1),
            atom(Element::O, Vec3::new(0.0, 3.0, 0.0), 2),
            atom(Element::C, Vec3::new(0.0, 4.4, 0.0), 2),
        ]));
        let unit = structure.unit(0);
        let features = atom_features(unit);
        let mut builder = IntraContactsBuilder::new();
        add_unit_contacts(
            &structure,
            unit,
            &features,
            &mut builder,
            &[&AnyPair],
            &ContactsParams::default(),
        );
        let contacts = builder.finish(features.count);
        let pairs: Vec<(usize, usize)> = contacts.pairs().map(|(a, b, _)| (a, b)).collect();
        // 0-1 share a residue and 2-3 are bonded
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
        for (a, b) in pairs {
            assert_ne!(a, b);
            assert_ne!(unit.residue_index(a), unit.residue_index(b));
        }
    }

    #[test]
    fn alternate_locations_never_pair() {
        let mut first = atom(Element::N, Vec3::ZERO, 1);
        first.alt_id = "A".into();
        let mut second = atom(Element::O, Vec3::new(3.0, 0.0, 0.0), 2);
        second.alt_id = "B".into();
        let structure = Structure::from_model(AtomicModel::from_atoms(&[first, second]));
        let unit = structure.unit(0);
        let features = atom_features(unit);
        let a = FeatureInfo::new(unit, &features, 0);
        let b = FeatureInfo::new(unit, &features, 1);
        assert!(!valid_pair(&structure, &a, &b));
    }

    #[test]
    fn contacts_across_symmetry_copies() {
        let model = AtomicModel::from_atoms(&[atom(Element::N, Vec3::ZERO, 1)]);
        let ops = [
            crate::geometry::SymmetryOperator::identity(),
            crate::geometry::SymmetryOperator::translation("2", Vec3::new(0.0, 0.0, 3.5)),
        ];
        let structure = Structure::with_operators(model, &ops);
        let (unit_a, unit_b) = (structure.unit(0), structure.unit(1));
        let (features_a, features_b) = (atom_features(unit_a), atom_features(unit_b));
        let mut builder = InterContactsBuilder::new();
        add_structure_contacts(
            &structure,
            unit_a,
            &features_a,
            unit_b,
            &features_b,
            &mut builder,
            &[&AnyPair],
            &ContactsParams::default(),
        );
        let contacts = builder.finish();
        assert_eq!(contacts.edge_count(), 1);
        let edge = contacts.edges()[0];
        assert_eq!((edge.unit_a, edge.unit_b), (0, 1));
        assert_eq!((edge.feature_a, edge.feature_b), (0, 0));
    }

    #[test]
    fn tester_maximum_is_exclusive() {
        let model = AtomicModel::from_atoms(&[atom(Element::N, Vec3::ZERO, 1)]);
        let ops = [
            crate::geometry::SymmetryOperator::identity(),
            crate::geometry::SymmetryOperator::translation("2", Vec3::new(0.0, 0.0, 4.0)),
        ];
        let structure = Structure::with_operators(model, &ops);
        let (unit_a, unit_b) = (structure.unit(0), structure.unit(1));
        let (features_a, features_b) = (atom_features(unit_a), atom_features(unit_b));
        let mut builder = InterContactsBuilder::new();
        add_structure_contacts(
            &structure,
            unit_a,
            &features_a,
            unit_b,
            &features_b,
            &mut builder,
            &[&AnyPair],
            &ContactsParams::default(),
        );
        assert_eq!(builder.finish().edge_count(), 0);
    }
}
