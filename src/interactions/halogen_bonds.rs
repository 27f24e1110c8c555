//! Halogen bonds from carbon-bound halogens to N, O and S acceptors.

use super::chemistry::calc_angles;
use super::common::{FeatureGroup, FeatureType, InteractionType};
use super::contacts::ContactTester;
use super::features::{FeatureInfo, FeatureProvider, FeaturesBuilder};
use crate::structure::{Element, Structure, Unit};

/// Ideal angle at the halogen, between its bond and the acceptor.
const OPTIMAL_HALOGEN_ANGLE: f32 = 180.0;
/// Ideal angle at the acceptor, between its bonds and the halogen.
const OPTIMAL_ACCEPTOR_ANGLE: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalogenBondsParams {
    pub distance_max: f32,
    /// Largest deviation from the ideal angles, in degrees.
    pub angle_max: f32,
}

impl Default for HalogenBondsParams {
    fn default() -> Self {
        Self {
            distance_max: 4.0,
            angle_max: 30.0,
        }
    }
}

fn add_halogen_donors(_structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    for i in 0..unit.len() {
        if matches!(unit.element(i), Element::Cl | Element::Br | Element::I) {
            builder.add(FeatureType::HalogenDonor, FeatureGroup::None, unit.invariant_position(i), i);
        }
    }
}

fn add_halogen_acceptors(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    for i in 0..unit.len() {
        if !matches!(unit.element(i), Element::N | Element::O | Element::S) {
            continue;
        }
        let bonded_to_heavy = structure.bonded_atoms(unit.id, i).any(|(u, j, _)| {
            matches!(
                structure.unit(u).element(j),
                Element::C | Element::N | Element::P | Element::S
            )
        });
        if bonded_to_heavy {
            builder.add(FeatureType::HalogenAcceptor, FeatureGroup::None, unit.invariant_position(i), i);
        }
    }
}

pub const HALOGEN_DONOR_PROVIDER: FeatureProvider = FeatureProvider {
    name: "halogen-donor",
    types: &[FeatureType::HalogenDonor],
    add: add_halogen_donors,
};

pub const HALOGEN_ACCEPTOR_PROVIDER: FeatureProvider = FeatureProvider {
    name: "halogen-acceptor",
    types: &[FeatureType::HalogenAcceptor],
    add: add_halogen_acceptors,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct HalogenBondTester {
    pub params: HalogenBondsParams,
}

impl HalogenBondTester {
    pub fn new(params: HalogenBondsParams) -> Self {
        Self { params }
    }
}

impl ContactTester for HalogenBondTester {
    fn name(&self) -> &'static str {
        "halogen-bonds"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::HalogenDonor, FeatureType::HalogenAcceptor]
    }

    fn get_type(
        &self,
        structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        let (donor, acceptor) = match (a.kind(), b.kind()) {
            (FeatureType::HalogenDonor, FeatureType::HalogenAcceptor) => (a, b),
            (FeatureType::HalogenAcceptor, FeatureType::HalogenDonor) => (b, a),
            _ => return None,
        };
        let (d, acc) = (donor.first_member(), acceptor.first_member());
        let angle_max = self.params.angle_max.to_radians();

        // a single bond, so no halide ions
        let halogen_angles = calc_angles(structure, donor.unit, d, acceptor.unit, acc);
        let &[halogen_angle] = halogen_angles.as_slice() else {
            return None;
        };
        if OPTIMAL_HALOGEN_ANGLE.to_radians() - halogen_angle > angle_max {
            return None;
        }

        let acceptor_angles = calc_angles(structure, acceptor.unit, acc, donor.unit, d);
        if acceptor_angles.is_empty()
            || acceptor_angles
                .iter()
                .any(|&angle| OPTIMAL_ACCEPTOR_ANGLE.to_radians() - angle > angle_max)
        {
            return None;
        }
        Some(InteractionType::HalogenBond)
    }
}
