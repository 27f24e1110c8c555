//! Hydrophobic atoms and contacts.

use super::common::{FeatureGroup, FeatureType, InteractionType};
use super::contacts::ContactTester;
use super::features::{FeatureInfo, FeatureProvider, FeaturesBuilder};
use crate::structure::{Element, Structure, Unit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrophobicParams {
    pub distance_max: f32,
}

impl Default for HydrophobicParams {
    fn default() -> Self {
        Self { distance_max: 4.0 }
    }
}

/// Carbon bonded only to carbon or hydrogen, sulfur not bonded to nitrogen
/// or oxygen, and fluorine.
fn is_hydrophobic(structure: &Structure, unit: &Unit, i: usize) -> bool {
    let partners = || {
        structure
            .bonded_atoms(unit.id, i)
            .map(|(u, j, _)| structure.unit(u).element(j))
    };
    match unit.element(i) {
        Element::C => partners().all(|e| matches!(e, Element::C | Element::H)),
        Element::S => !partners().any(|e| matches!(e, Element::N | Element::O)),
        Element::F => true,
        _ => false,
    }
}

fn add_hydrophobic_atoms(structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    for i in 0..unit.len() {
        if is_hydrophobic(structure, unit, i) {
            let group = if unit.element(i) == Element::F {
                FeatureGroup::Halocarbon
            } else {
                FeatureGroup::None
            };
            builder.add(FeatureType::HydrophobicAtom, group, unit.invariant_position(i), i);
        }
    }
}

pub const HYDROPHOBIC_ATOM_PROVIDER: FeatureProvider = FeatureProvider {
    name: "hydrophobic-atom",
    types: &[FeatureType::HydrophobicAtom],
    add: add_hydrophobic_atoms,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct HydrophobicTester {
    pub params: HydrophobicParams,
}

impl HydrophobicTester {
    pub fn new(params: HydrophobicParams) -> Self {
        Self { params }
    }
}

impl ContactTester for HydrophobicTester {
    fn name(&self) -> &'static str {
        "hydrophobic"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[FeatureType::HydrophobicAtom]
    }

    fn get_type(
        &self,
        _structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        distance_sq: f32,
    ) -> Option<InteractionType> {
        if a.kind() != FeatureType::HydrophobicAtom || b.kind() != FeatureType::HydrophobicAtom {
            return None;
        }
        let max = self.params.distance_max;
        if distance_sq > max * max {
            return None;
        }
        let fluorines = a.unit.element(a.first_member()) == Element::F
            && b.unit.element(b.first_member()) == Element::F;
        (!fluorines).then_some(InteractionType::Hydrophobic)
    }
}
