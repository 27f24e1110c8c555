//! Metal ions and the atoms that coordinate them.

use super::chemistry::{is_amino_acid, is_backbone_atom, is_nucleic_backbone_atom, is_nucleotide};
use super::common::{FeatureGroup, FeatureType, InteractionType};
use super::contacts::ContactTester;
use super::features::{FeatureInfo, FeatureProvider, FeaturesBuilder};
use crate::structure::{Element, Structure, Unit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetalCoordinationParams {
    pub distance_max: f32,
}

impl Default for MetalCoordinationParams {
    fn default() -> Self {
        Self { distance_max: 3.0 }
    }
}

fn add_metals(_structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    for i in 0..unit.len() {
        let element = unit.element(i);
        let kind = if element.is_ionic_type_metal() {
            FeatureType::IonicTypeMetal
        } else if element.is_transition_metal() || matches!(element, Element::Zn | Element::Cd) {
            FeatureType::TransitionMetal
        } else {
            continue;
        };
        builder.add(kind, FeatureGroup::None, unit.invariant_position(i), i);
    }
}

/// Side chain oxygens that bind metals.
fn is_protein_side_chain_oxygen(comp_id: &str, atom_id: &str) -> bool {
    matches!(
        (comp_id, atom_id),
        ("ASP", "OD1" | "OD2")
            | ("GLU", "OE1" | "OE2")
            | ("SER", "OG")
            | ("THR", "OG1")
            | ("TYR", "OH")
            | ("ASN", "OD1")
            | ("GLN", "OE1")
    )
}

/// Partner kinds of a metal binding atom: dative, ionic.
fn binding_kinds(unit: &Unit, i: usize) -> (bool, bool) {
    let element = unit.element(i);
    let (comp_id, atom_id) = (unit.comp_id(i), unit.atom_id(i));
    if is_amino_acid(comp_id) {
        return match element {
            Element::O if is_protein_side_chain_oxygen(comp_id, atom_id) || is_backbone_atom(atom_id) => {
                (true, true)
            }
            Element::S if matches!(comp_id, "CYS" | "MET") => (true, true),
            Element::N if comp_id == "HIS" && !is_backbone_atom(atom_id) => (true, false),
            _ => (false, false),
        };
    }
    if is_nucleotide(comp_id) {
        return match element {
            Element::O if is_nucleic_backbone_atom(atom_id) => (true, true),
            _ if matches!(atom_id, "N3" | "N4" | "N7") => (true, false),
            _ if matches!(atom_id, "O2" | "O4" | "O6") => (true, true),
            _ => (false, false),
        };
    }
    match element {
        Element::O | Element::S => (true, true),
        e if e.is_halogen() => (true, true),
        Element::N => (true, false),
        _ => (false, false),
    }
}

fn add_metal_binding(_structure: &Structure, unit: &Unit, builder: &mut FeaturesBuilder) {
    for i in 0..unit.len() {
        let (dative, ionic) = binding_kinds(unit, i);
        let position = unit.invariant_position(i);
        if dative {
            builder.add(FeatureType::DativeBondPartner, FeatureGroup::None, position, i);
        }
        if ionic {
            builder.add(FeatureType::IonicTypePartner, FeatureGroup::None, position, i);
        }
    }
}

pub const METAL_PROVIDER: FeatureProvider = FeatureProvider {
    name: "metal",
    types: &[FeatureType::TransitionMetal, FeatureType::IonicTypeMetal],
    add: add_metals,
};

pub const METAL_BINDING_PROVIDER: FeatureProvider = FeatureProvider {
    name: "metal-binding",
    types: &[FeatureType::IonicTypePartner, FeatureType::DativeBondPartner],
    add: add_metal_binding,
};

fn coordinates(metal: FeatureType, partner: FeatureType) -> bool {
    match metal {
        FeatureType::TransitionMetal => {
            matches!(partner, FeatureType::DativeBondPartner | FeatureType::TransitionMetal)
        }
        FeatureType::IonicTypeMetal => partner == FeatureType::IonicTypePartner,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetalCoordinationTester {
    pub params: MetalCoordinationParams,
}

impl MetalCoordinationTester {
    pub fn new(params: MetalCoordinationParams) -> Self {
        Self { params }
    }
}

impl ContactTester for MetalCoordinationTester {
    fn name(&self) -> &'static str {
        "metal-coordination"
    }

    fn max_distance(&self) -> f32 {
        self.params.distance_max
    }

    fn required_features(&self) -> &[FeatureType] {
        &[
            FeatureType::TransitionMetal,
            FeatureType::IonicTypeMetal,
            FeatureType::DativeBondPartner,
            FeatureType::IonicTypePartner,
        ]
    }

    fn get_type(
        &self,
        _structure: &Structure,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        _distance_sq: f32,
    ) -> Option<InteractionType> {
        let (ka, kb) = (a.kind(), b.kind());
        (coordinates(ka, kb) || coordinates(kb, ka)).then_some(InteractionType::MetalCoordination)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::interactions::features::{compute_features, Features};
    use crate::structure::{AtomRecord, AtomicModel};

    fn structure_of(atoms: &[(Element, &str, &str, i32)]) -> Structure {
        let records: Vec<AtomRecord> = atoms
            .iter()
            .enumerate()
            .map(|(i, &(element, name, comp, seq_id))| AtomRecord {
                // far apart, so nothing bonds
                position: Vec3::new(i as f32 * 10.0, 0.0, 0.0),
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
        compute_features(structure, structure.unit(0), &[METAL_PROVIDER, METAL_BINDING_PROVIDER])
    }

    fn kinds_of(features: &Features, i: usize) -> Vec<FeatureType> {
        features
            .elements_index()
            .features_of(i)
            .iter()
            .map(|&f| features.types[f])
            .collect()
    }

    #[test]
    fn metals_and_binding_atoms() {
        let structure = structure_of(&[
            (Element::Zn, "ZN", "ZN", 1),
            (Element::Mg, "MG", "MG", 2),
            (Element::O, "OD1", "ASP", 3),
            (Element::C, "CB", "ASP", 3),
            (Element::O, "OG", "ALA", 4),
            (Element::N, "ND1", "HIS", 5),
            (Element::N, "N", "HIS", 5),
            (Element::S, "SG", "CYS", 6),
            (Element::N, "N7", "DG", 7),
            (Element::O, "O6", "DG", 7),
            (Element::O, "OP1", "DG", 7),
            (Element::N, "N1", "LIG", 8),
            (Element::Cl, "CL1", "LIG", 8),
            (Element::Fe, "FE", "HEM", 9),
        ]);
        let features = features_of(&structure);
        use FeatureType::{DativeBondPartner as Dative, IonicTypePartner as Ionic};
        assert_eq!(kinds_of(&features, 0), vec![FeatureType::TransitionMetal]);
        assert_eq!(kinds_of(&features, 1), vec![FeatureType::IonicTypeMetal]);
        assert_eq!(kinds_of(&features, 2), vec![Dative, Ionic]);
        assert!(kinds_of(&features, 3).is_empty());
        // not a side chain oxygen of alanine
        assert!(kinds_of(&features, 4).is_empty());
        assert_eq!(kinds_of(&features, 5), vec![Dative]);
        assert!(kinds_of(&features, 6).is_empty());
        assert_eq!(kinds_of(&features, 7), vec![Dative, Ionic]);
        assert_eq!(kinds_of(&features, 8), vec![Dative]);
        assert_eq!(kinds_of(&features, 9), vec![Dative, Ionic]);
        assert_eq!(kinds_of(&features, 10), vec![Dative, Ionic]);
        assert_eq!(kinds_of(&features, 11), vec![Dative]);
        assert_eq!(kinds_of(&features, 12), vec![Dative, Ionic]);
        assert_eq!(kinds_of(&features, 13), vec![FeatureType::TransitionMetal]);
    }

    #[test]
    fn metal_partner_kinds() {
        let structure = structure_of(&[
            (Element::Zn, "ZN", "ZN", 1),
            (Element::Mg, "MG", "MG", 2),
            (Element::N, "NE2", "HIS", 3),
            (Element::O, "OD1", "ASP", 4),
            (Element::Cu, "CU", "CU", 5),
        ]);
        let features = features_of(&structure);
        let unit = structure.unit(0);
        let find = |kind: FeatureType, member: usize| {
            (0..features.count)
                .find(|&f| features.types[f] == kind && features.members(f) == [member])
                .map(|f| FeatureInfo::new(unit, &features, f))
        };
        let (Some(zinc), Some(magnesium), Some(nitrogen), Some(oxygen_ionic), Some(copper)) = (
            find(FeatureType::TransitionMetal, 0),
            find(FeatureType::IonicTypeMetal, 1),
            find(FeatureType::DativeBondPartner, 2),
            find(FeatureType::IonicTypePartner, 3),
            find(FeatureType::TransitionMetal, 4),
        ) else {
            panic!("missing features");
        };
        let tester = MetalCoordinationTester::default();
        let metal = Some(InteractionType::MetalCoordination);
        assert_eq!(tester.get_type(&structure, &zinc, &nitrogen, 4.0), metal);
        assert_eq!(tester.get_type(&structure, &nitrogen, &zinc, 4.0), metal);
        assert_eq!(tester.get_type(&structure, &zinc, &copper, 4.0), metal);
        assert_eq!(tester.get_type(&structure, &magnesium, &oxygen_ionic, 4.0), metal);
        assert_eq!(tester.get_type(&structure, &magnesium, &nitrogen, 4.0), None);
        assert_eq!(tester.get_type(&structure, &zinc, &oxygen_ionic, 4.0), None);
        assert_eq!(tester.get_type(&structure, &magnesium, &zinc, 4.0), None);
    }
}
