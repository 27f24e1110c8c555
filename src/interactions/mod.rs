//! Non-covalent contacts between atoms of a [`Structure`].
//!
//! Each unit gets a set of [`Features`] (donors, acceptors, charged groups,
//! aromatic rings, halogens, metals, hydrophobic atoms). Contact testers
//! then classify nearby feature pairs, first within every unit and then
//! across unit pairs found through the structure lookup. A final
//! [`refine_interactions`] pass flags contacts that a stronger one between
//! the same atoms supersedes.
//!
//! ```ignore
//! let structure = Structure::from_model(AtomicModel::from_block(&doc.blocks[0])?);
//! let interactions = compute_interactions(&structure, &InteractionsParams::default());
//! for edge in interactions.contacts.unfiltered() {
//!     println!("{} {} {}", edge.unit_a, edge.unit_b, edge.kind.label());
//! }
//! ```

pub mod charged;
pub mod chemistry;
pub mod common;
pub mod contacts;
pub mod features;
pub mod halogen_bonds;
pub mod hydrogen_bonds;
pub mod hydrophobic;
pub mod metal;
pub mod refine;

pub use charged::{CationPiParams, CationPiTester, IonicParams, IonicTester, PiStackingParams, PiStackingTester};
pub use common::{
    FeatureGroup, FeatureType, InterContactEdge, InterContacts, InterContactsBuilder,
    InteractionFlag, InteractionType, IntraContactEdge, IntraContacts, IntraContactsBuilder,
};
pub use contacts::{
    add_structure_contacts, add_unit_contacts, check_line_of_sight, valid_pair, ContactTester,
    ContactsParams,
};
pub use features::{compute_features, FeatureInfo, FeatureProvider, Features, FeaturesBuilder};
pub use halogen_bonds::{HalogenBondTester, HalogenBondsParams};
pub use hydrogen_bonds::{
    check_geometry, HydrogenBondGeometryParams, HydrogenBondTester, HydrogenBondsParams,
    WeakHydrogenBondTester, WeakHydrogenBondsParams,
};
pub use hydrophobic::{HydrophobicParams, HydrophobicTester};
pub use metal::{MetalCoordinationParams, MetalCoordinationTester};
pub use refine::refine_interactions;

use crate::structure::Structure;

/// Every feature provider, in the order features are added to a unit.
pub const FEATURE_PROVIDERS: &[FeatureProvider] = &[
    hydrogen_bonds::HYDROGEN_DONOR_PROVIDER,
    hydrogen_bonds::WEAK_HYDROGEN_DONOR_PROVIDER,
    hydrogen_bonds::HYDROGEN_ACCEPTOR_PROVIDER,
    charged::NEGATIVE_CHARGE_PROVIDER,
    charged::POSITIVE_CHARGE_PROVIDER,
    charged::AROMATIC_RING_PROVIDER,
    halogen_bonds::HALOGEN_DONOR_PROVIDER,
    halogen_bonds::HALOGEN_ACCEPTOR_PROVIDER,
    hydrophobic::HYDROPHOBIC_ATOM_PROVIDER,
    metal::METAL_PROVIDER,
    metal::METAL_BINDING_PROVIDER,
];

/// Testers left as `None` are skipped. Across units, testers are tried in
/// field order after `contacts` and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionsParams {
    pub contacts: ContactsParams,
    pub ionic: Option<IonicParams>,
    pub pi_stacking: Option<PiStackingParams>,
    pub cation_pi: Option<CationPiParams>,
    pub halogen_bonds: Option<HalogenBondsParams>,
    pub hydrogen_bonds: Option<HydrogenBondsParams>,
    pub weak_hydrogen_bonds: Option<WeakHydrogenBondsParams>,
    pub hydrophobic: Option<HydrophobicParams>,
    pub metal_coordination: Option<MetalCoordinationParams>,
}

impl Default for InteractionsParams {
    /// Ionic, weak hydrogen bond and hydrophobic contacts are off.
    fn default() -> Self {
        Self {
            contacts: ContactsParams::default(),
            ionic: None,
            pi_stacking: Some(PiStackingParams::default()),
            cation_pi: Some(CationPiParams::default()),
            halogen_bonds: Some(HalogenBondsParams::default()),
            hydrogen_bonds: Some(HydrogenBondsParams::default()),
            weak_hydrogen_bonds: None,
            hydrophobic: None,
            metal_coordination: Some(MetalCoordinationParams::default()),
        }
    }
}

#[derive(Debug)]
pub struct Interactions {
    /// Features of each unit, indexed by unit id.
    pub unit_features: Vec<Features>,
    pub unit_contacts: Vec<IntraContacts>,
    pub contacts: InterContacts,
}

impl Interactions {
    pub fn feature_info<'a>(&'a self, structure: &'a Structure, unit: usize, feature: usize) -> FeatureInfo<'a> {
        FeatureInfo::new(structure.unit(unit), &self.unit_features[unit], feature)
    }
}

pub fn compute_interactions(structure: &Structure, params: &InteractionsParams) -> Interactions {
    let ionic = params.ionic.map(IonicTester::new);
    let pi_stacking = params.pi_stacking.map(PiStackingTester::new);
    let cation_pi = params.cation_pi.map(CationPiTester::new);
    let halogen_bonds = params.halogen_bonds.map(HalogenBondTester::new);
    let hydrogen_bonds = params.hydrogen_bonds.map(HydrogenBondTester::new);
    let weak_hydrogen_bonds = params.weak_hydrogen_bonds.map(WeakHydrogenBondTester::new);
    let hydrophobic = params.hydrophobic.map(HydrophobicTester::new);
    let metal_coordination = params.metal_coordination.map(MetalCoordinationTester::new);
    let testers: Vec<&dyn ContactTester> = [
        ionic.as_ref().map(|t| t as &dyn ContactTester),
        pi_stacking.as_ref().map(|t| t as &dyn ContactTester),
        cation_pi.as_ref().map(|t| t as &dyn ContactTester),
        halogen_bonds.as_ref().map(|t| t as &dyn ContactTester),
        hydrogen_bonds.as_ref().map(|t| t as &dyn ContactTester),
        weak_hydrogen_bonds.as_ref().map(|t| t as &dyn ContactTester),
        hydrophobic.as_ref().map(|t| t as &dyn ContactTester),
        metal_coordination.as_ref().map(|t| t as &dyn ContactTester),
    ]
    .into_iter()
    .flatten()
    .collect();
    log::debug!(
        "testers: {}",
        testers.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
    );

    let required: Vec<FeatureType> = testers
        .iter()
        .flat_map(|t| t.required_features().iter().copied())
        .collect();
    let providers: Vec<FeatureProvider> = FEATURE_PROVIDERS
        .iter()
        .filter(|p| p.provides_any(&required))
        .copied()
        .collect();

    let unit_features: Vec<Features> = structure
        .units()
        .iter()
        .map(|unit| compute_features(structure, unit, &providers))
        .collect();

    let unit_contacts: Vec<IntraContacts> = structure
        .units()
        .iter()
        .zip(&unit_features)
        .map(|(unit, features)| {
            let mut builder = IntraContactsBuilder::new();
            add_unit_contacts(structure, unit, features, &mut builder, &testers, &params.contacts);
            builder.finish(features.count)
        })
        .collect();

    let max_distance = testers
        .iter()
        .map(|t| t.max_distance())
        .fold(0.0f32, f32::max);
    let mut builder = InterContactsBuilder::new();
    for unit_a in structure.units() {
        let features_a = &unit_features[unit_a.id];
        if features_a.is_empty() {
            continue;
        }
        let sphere = unit_a.boundary_sphere();
        let close = structure.find_unit_indices(
            sphere.center.x,
            sphere.center.y,
            sphere.center.z,
            sphere.radius + max_distance,
        );
        for &b in &close.indices {
            let unit_b = structure.unit(b);
            if unit_b.id <= unit_a.id || unit_features[b].is_empty() {
                continue;
            }
            add_structure_contacts(
                structure,
                unit_a,
                features_a,
                unit_b,
                &unit_features[b],
                &mut builder,
                &testers,
                &params.contacts,
            );
        }
    }
    let contacts = builder.finish();

    let mut interactions = Interactions {
        unit_features,
        unit_contacts,
        contacts,
    };
    refine_interactions(structure, &mut interactions);

    log::info!(
        "{} intra-unit and {} inter-unit contacts over {} units",
        interactions
            .unit_contacts
            .iter()
            .map(IntraContacts::unfiltered_count)
            .sum::<usize>(),
        interactions.contacts.unfiltered_count(),
        structure.units().len()
    );
    interactions
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::geometry::SymmetryOperator;
    use crate::structure::rings::polygon;
    use crate::structure::{AtomRecord, AtomicModel, Element};

    fn atom(element: Element, name: &str, comp: &str, seq_id: i32, position: Vec3) -> AtomRecord {
        AtomRecord {
            position,
            element,
            atom_id: name.into(),
            comp_id: comp.into(),
            asym_id: "A".into(),
            seq_id,
            ..Default::default()
        }
    }

    fn methanol() -> Vec<AtomRecord> {
        vec![
            atom(Element::C, "C1", "MOH", 1, Vec3::new(-1.43, 0.0, 0.0)),
            atom(Element::O, "O1", "MOH", 1, Vec3::ZERO),
        ]
    }

    fn benzene(seq_id: i32, center: Vec3) -> Vec<AtomRecord> {
        polygon(6, 1.39, center)
            .into_iter()
            .enumerate()
            .map(|(i, p)| atom(Element::C, &format!("C{}", i + 1), "BNZ", seq_id, p))
            .collect()
    }

    fn all_intra(interactions: &Interactions) -> Vec<(usize, usize, InteractionType)> {
        interactions.unit_contacts[0].pairs().collect()
    }

    fn intra_kinds(interactions: &Interactions) -> Vec<InteractionType> {
        all_intra(interactions).iter().map(|c| c.2).collect()
    }

    /// Flags of the unit's contacts of one kind.
    fn flags_of(interactions: &Interactions, kind: InteractionType) -> Vec<InteractionFlag> {
        interactions.unit_contacts[0]
            .edges()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.flag)
            .collect()
    }

    fn compute(atoms: &[AtomRecord], params: &InteractionsParams) -> (Structure, Interactions) {
        let structure = Structure::from_model(AtomicModel::from_atoms(atoms));
        let interactions = compute_interactions(&structure, params);
        (structure, interactions)
    }

    #[test]
    fn default_testers() {
        let params = InteractionsParams::default();
        assert_eq!(params.ionic, None);
        assert_eq!(params.hydrophobic, None);
        assert_eq!(params.weak_hydrogen_bonds, None);
        assert_eq!(params.hydrogen_bonds, Some(HydrogenBondsParams::default()));
        assert_eq!(params.cation_pi, Some(CationPiParams::default()));
        assert_eq!(params.pi_stacking, Some(PiStackingParams::default()));
        assert_eq!(params.halogen_bonds, Some(HalogenBondsParams::default()));
        assert_eq!(params.metal_coordination, Some(MetalCoordinationParams::default()));
    }

    #[test]
    fn hydrogen_bond_between_residues() {
        let mut atoms = methanol();
        atoms.push(atom(Element::N, "N1", "NH3", 2, Vec3::new(2.9, 0.0, 0.0)));
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());

        // the hydroxyl donates at the wrong angle, so only the amine does
        let contacts = all_intra(&interactions);
        assert_eq!(contacts.len(), 1);
        let (a, b, kind) = contacts[0];
        assert_eq!(kind, InteractionType::HydrogenBond);
        let features = &interactions.unit_features[0];
        let mut roles = [
            (features.types[a], features.members(a)[0]),
            (features.types[b], features.members(b)[0]),
        ];
        roles.sort_by_key(|&(_, member)| member);
        assert_eq!(
            roles,
            [(FeatureType::HydrogenAcceptor, 1), (FeatureType::HydrogenDonor, 2)]
        );
        assert_eq!(interactions.contacts.edge_count(), 0);
    }

    #[test]
    fn same_residue_has_no_contacts() {
        let atoms = vec![
            atom(Element::C, "C1", "LIG", 1, Vec3::new(-1.43, 0.0, 0.0)),
            atom(Element::O, "O1", "LIG", 1, Vec3::ZERO),
            atom(Element::N, "N1", "LIG", 1, Vec3::new(2.9, 0.0, 0.0)),
            atom(Element::O, "O", "HOH", 2, Vec3::new(50.0, 0.0, 0.0)),
        ];
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert!(interactions.unit_contacts[0].is_empty());
    }

    #[test]
    fn salt_bridge_yields_to_its_hydrogen_bond() {
        let atoms = vec![
            atom(Element::C, "CE", "LYS", 1, Vec3::new(-0.5, -1.38, 0.0)),
            atom(Element::N, "NZ", "LYS", 1, Vec3::ZERO),
            atom(Element::O, "OD1", "ASP", 2, Vec3::new(2.8, 0.0, 0.0)),
            atom(Element::C, "CG", "ASP", 2, Vec3::new(4.05, 0.0, 0.0)),
            atom(Element::O, "OD2", "ASP", 2, Vec3::new(4.7, 1.126, 0.0)),
        ];
        let params = InteractionsParams {
            ionic: Some(IonicParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &params);
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::HydrogenBond]);
        assert_eq!(flags_of(&interactions, InteractionType::Ionic), vec![InteractionFlag::Filtered]);
        assert_eq!(interactions.unit_contacts[0].unfiltered_count(), 1);

        // off by default
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert!(flags_of(&interactions, InteractionType::Ionic).is_empty());
    }

    #[test]
    fn metal_coordination_supersedes_ionic() {
        let mut magnesium = atom(Element::Mg, "MG", "MG", 1, Vec3::ZERO);
        magnesium.formal_charge = 2;
        let atoms = vec![
            magnesium,
            atom(Element::O, "OD1", "ASP", 2, Vec3::new(2.1, 0.0, 0.0)),
            atom(Element::C, "CG", "ASP", 2, Vec3::new(3.35, 0.0, 0.0)),
            atom(Element::O, "OD2", "ASP", 2, Vec3::new(4.0, 1.126, 0.0)),
        ];
        let params = InteractionsParams {
            ionic: Some(IonicParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &params);
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::MetalCoordination]);
        assert_eq!(flags_of(&interactions, InteractionType::Ionic), vec![InteractionFlag::Filtered]);
    }

    #[test]
    fn zinc_bound_by_histidine() {
        // imidazole ring with NE2 facing the zinc
        let names = ["NE2", "CD2", "CG", "ND1", "CE1"];
        let elements = [Element::N, Element::C, Element::C, Element::N, Element::C];
        let ring = polygon(5, 1.148, Vec3::new(2.1 + 1.148, 0.0, 0.0));
        let mut atoms = vec![atom(Element::Zn, "ZN", "ZN", 1, Vec3::ZERO)];
        for (i, p) in ring.iter().enumerate() {
            // mirror so the first vertex points at the zinc
            let p = Vec3::new(2.0 * (2.1 + 1.148) - p.x, p.y, p.z);
            atoms.push(atom(elements[i], names[i], "HIS", 2, p));
        }
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::MetalCoordination]);
        let (a, b, _) = all_intra(&interactions)[0];
        let features = &interactions.unit_features[0];
        let mut members = [features.members(a)[0], features.members(b)[0]];
        members.sort_unstable();
        assert_eq!(members, [0, 1]);
    }

    #[test]
    fn only_the_closest_hydrophobic_contact_per_residue() {
        let atoms = vec![
            atom(Element::C, "C1", "LIG", 1, Vec3::ZERO),
            atom(Element::C, "C1", "LIG", 2, Vec3::new(3.6, 0.0, 0.0)),
            atom(Element::C, "C2", "LIG", 2, Vec3::new(0.0, 3.9, 0.0)),
            atom(Element::C, "C1", "LIG", 3, Vec3::new(0.0, -3.7, 0.0)),
        ];
        let params = InteractionsParams {
            hydrophobic: Some(HydrophobicParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &params);
        let features = &interactions.unit_features[0];
        let member = |f: usize| features.members(f)[0];
        let mut kept: Vec<(usize, usize)> = all_intra(&interactions)
            .iter()
            .map(|&(a, b, _)| (member(a), member(b)))
            .collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![(0, 1), (0, 3)]);
        let filtered: Vec<(usize, usize)> = interactions.unit_contacts[0]
            .edges()
            .iter()
            .filter(|e| e.flag == InteractionFlag::Filtered)
            .map(|e| (member(e.a), member(e.b)))
            .collect();
        assert_eq!(filtered, vec![(0, 2)]);
    }

    #[test]
    fn hydrophobic_contact() {
        let atoms = vec![
            atom(Element::C, "C1", "LIG", 1, Vec3::ZERO),
            atom(Element::C, "C1", "LIG", 2, Vec3::new(3.8, 0.0, 0.0)),
            atom(Element::F, "F1", "LIG", 3, Vec3::new(0.0, 30.0, 0.0)),
            atom(Element::F, "F1", "LIG", 4, Vec3::new(3.0, 30.0, 0.0)),
        ];
        let enabled = InteractionsParams {
            hydrophobic: Some(HydrophobicParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &enabled);
        assert_eq!(all_intra(&interactions), vec![(0, 1, InteractionType::Hydrophobic)]);

        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert!(!interactions.unit_features[0]
            .types
            .contains(&FeatureType::HydrophobicAtom));
        assert!(interactions.unit_contacts[0].is_empty());
    }

    #[test]
    fn stacked_rings() {
        let mut atoms = benzene(1, Vec3::ZERO);
        atoms.extend(benzene(2, Vec3::new(0.0, 0.0, 3.5)));
        let params = InteractionsParams {
            hydrophobic: Some(HydrophobicParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &params);
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::PiStacking]);
        let hydrophobic = flags_of(&interactions, InteractionType::Hydrophobic);
        assert!(!hydrophobic.is_empty());
        assert!(hydrophobic.iter().all(|&f| f == InteractionFlag::Filtered));

        // slid too far sideways
        let mut atoms = benzene(1, Vec3::ZERO);
        atoms.extend(benzene(2, Vec3::new(3.0, 0.0, 3.5)));
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert!(flags_of(&interactions, InteractionType::PiStacking).is_empty());
    }

    #[test]
    fn cation_over_ring() {
        let mut atoms = benzene(1, Vec3::ZERO);
        atoms.push(atom(Element::C, "CE", "LYS", 2, Vec3::new(0.0, 0.0, 5.27)));
        atoms.push(atom(Element::N, "NZ", "LYS", 2, Vec3::new(0.0, 0.0, 3.8)));
        let (_, interactions) = compute(&atoms, &InteractionsParams::default());
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::CationPi]);
    }

    #[test]
    fn weak_hydrogen_bond_to_a_bonded_acceptor() {
        let toward = |origin: Vec3, degrees: f32, length: f32| {
            let t = degrees.to_radians();
            origin + Vec3::new(t.cos(), t.sin(), 0.0) * length
        };
        let oxygen = Vec3::new(3.3, 0.0, 0.0);
        let mut atoms = vec![
            atom(Element::C, "C1", "MOH", 1, Vec3::ZERO),
            atom(Element::O, "O1", "MOH", 1, toward(Vec3::ZERO, 110.0, 1.43)),
            atom(Element::O, "O2", "ALC", 2, oxygen),
            atom(Element::C, "C2", "ALC", 2, toward(oxygen, 0.0, 1.43)),
        ];
        let params = InteractionsParams {
            weak_hydrogen_bonds: Some(WeakHydrogenBondsParams::default()),
            ..Default::default()
        };
        let (_, interactions) = compute(&atoms, &params);
        assert_eq!(intra_kinds(&interactions), vec![InteractionType::WeakHydrogenBond]);

        atoms.push(atom(Element::N, "N1", "NH3", 3, toward(oxygen, 100.0, 2.9)));
        let (_, interactions) = compute(&atoms, &params);
        assert_eq!(flags_of(&interactions, InteractionType::WeakHydrogenBond), vec![InteractionFlag::Filtered]);
        assert!(!flags_of(&interactions, InteractionType::HydrogenBond).is_empty());
        assert!(!intra_kinds(&interactions).contains(&InteractionType::WeakHydrogenBond));
    }

    #[test]
    fn hydrogen_bonds_across_symmetry_copies() {
        let ops = [
            SymmetryOperator::identity(),
            SymmetryOperator::translation("2", Vec3::new(0.0, 2.8, 0.0)),
        ];
        let structure = Structure::with_operators(AtomicModel::from_atoms(&methanol()), &ops);
        let interactions = compute_interactions(&structure, &InteractionsParams::default());

        assert!(interactions.unit_contacts.iter().all(IntraContacts::is_empty));
        let edges = interactions.contacts.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(interactions.contacts.unfiltered_count(), 2);
        for edge in edges {
            assert_eq!((edge.unit_a, edge.unit_b), (0, 1));
            assert_eq!(edge.kind, InteractionType::HydrogenBond);
            let a = interactions.feature_info(&structure, edge.unit_a, edge.feature_a);
            let b = interactions.feature_info(&structure, edge.unit_b, edge.feature_b);
            assert_ne!(a.kind(), b.kind());
            assert!((a.position().distance(b.position()) - 2.8).abs() < 1e-4);
        }
    }

    #[test]
    fn contacts_never_pair_an_atom_with_itself() {
        // a small cluster of waters and ligands packed close together
        let mut atoms = Vec::new();
        let mut seed = 7u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 8) as f32 / (1u32 << 24) as f32 * 12.0
        };
        for i in 0..40 {
            let element = match i % 4 {
                0 => Element::O,
                1 => Element::N,
                2 => Element::C,
                _ => Element::S,
            };
            atoms.push(atom(element, "X", "LIG", i, Vec3::new(next(), next(), next())));
        }
        let params = InteractionsParams {
            ionic: Some(IonicParams::default()),
            weak_hydrogen_bonds: Some(WeakHydrogenBondsParams::default()),
            hydrophobic: Some(HydrophobicParams::default()),
            ..Default::default()
        };
        let (structure, interactions) = compute(&atoms, &params);
        let unit = structure.unit(0);
        let features = &interactions.unit_features[0];
        for edge in interactions.unit_contacts[0].edges() {
            let (ma, mb) = (features.members(edge.a)[0], features.members(edge.b)[0]);
            assert_ne!(ma, mb);
            assert_ne!(unit.residue_index(ma), unit.residue_index(mb));
            assert!(!structure.connected_to(0, ma, 0, mb));
        }
    }
}
