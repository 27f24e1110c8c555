//! Marks contacts that a stronger or closer contact between the same atoms
//! supersedes.
//!
//! Refiners see every inter-unit contact first and then the contacts of
//! each unit in turn. They only ever set [`InteractionFlag::Filtered`];
//! contacts are never removed.

use std::collections::HashMap;

use super::common::{FeatureType, InteractionFlag, InteractionType};
use super::features::FeatureInfo;
use super::Interactions;
use crate::structure::Structure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope {
    Inter,
    Intra(usize),
}

/// A contact: inter-unit edge id, or edge id within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeId {
    scope: Scope,
    edge: usize,
}

/// Contacts touching each atom, for looking up contacts shared by atoms.
struct RefineContext<'a> {
    interactions: &'a Interactions,
    /// Per unit, per atom: intra-unit edge ids.
    intra_index: Vec<Vec<Vec<usize>>>,
    /// By `(unit, atom)`: inter-unit edge ids.
    inter_index: HashMap<(usize, usize), Vec<usize>>,
}

impl<'a> RefineContext<'a> {
    fn new(structure: &Structure, interactions: &'a Interactions) -> Self {
        let intra_index = structure
            .units()
            .iter()
            .map(|unit| {
                let features = &interactions.unit_features[unit.id];
                let mut index = vec![Vec::new(); unit.len()];
                for (e, edge) in interactions.unit_contacts[unit.id].edges().iter().enumerate() {
                    for feature in [edge.a, edge.b] {
                        for &m in features.members(feature) {
                            index[m].push(e);
                        }
                    }
                }
                index
            })
            .collect();

        let mut inter_index: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (e, edge) in interactions.contacts.edges().iter().enumerate() {
            for (unit, feature) in [(edge.unit_a, edge.feature_a), (edge.unit_b, edge.feature_b)] {
                for &m in interactions.unit_features[unit].members(feature) {
                    inter_index.entry((unit, m)).or_default().push(e);
                }
            }
        }

        Self {
            interactions,
            intra_index,
            inter_index,
        }
    }

    fn atom_edges(&self, scope: Scope, unit: usize, atom: usize) -> &[usize] {
        match scope {
            Scope::Inter => self.inter_index.get(&(unit, atom)).map_or(&[], Vec::as_slice),
            Scope::Intra(_) => self
                .intra_index
                .get(unit)
                .and_then(|index| index.get(atom))
                .map_or(&[], Vec::as_slice),
        }
    }

    fn kind(&self, id: EdgeId) -> InteractionType {
        match id.scope {
            Scope::Inter => self.interactions.contacts.edges()[id.edge].kind,
            Scope::Intra(unit) => self.interactions.unit_contacts[unit].edges()[id.edge].kind,
        }
    }

    /// Whether either feature of the contact holds the atom.
    fn touches(&self, id: EdgeId, unit: usize, atom: usize) -> bool {
        let holds = |u: usize, feature: usize| {
            u == unit && self.interactions.unit_features[u].members(feature).contains(&atom)
        };
        match id.scope {
            Scope::Inter => {
                let edge = &self.interactions.contacts.edges()[id.edge];
                holds(edge.unit_a, edge.feature_a) || holds(edge.unit_b, edge.feature_b)
            }
            Scope::Intra(u) => {
                let edge = &self.interactions.unit_contacts[u].edges()[id.edge];
                holds(u, edge.a) || holds(u, edge.b)
            }
        }
    }

    /// Whether another contact of one of `kinds` joins a member of `a` to a
    /// member of `b`, within the same scope as `id`.
    fn shares_contact(&self, id: EdgeId, a: &FeatureInfo<'_>, b: &FeatureInfo<'_>, kinds: &[InteractionType]) -> bool {
        a.members().iter().any(|&ma| {
            self.atom_edges(id.scope, a.unit.id, ma).iter().any(|&other| {
                let other = EdgeId {
                    scope: id.scope,
                    edge: other,
                };
                other != id
                    && kinds.contains(&self.kind(other))
                    && b.members().iter().any(|&mb| self.touches(other, b.unit.id, mb))
            })
        })
    }

    /// Whether the atom takes part in any contact of `kind`, within or
    /// across units.
    fn atom_has_contact(&self, unit: usize, atom: usize, kind: InteractionType) -> bool {
        let intra = self.atom_edges(Scope::Intra(unit), unit, atom).iter().any(|&e| {
            self.kind(EdgeId {
                scope: Scope::Intra(unit),
                edge: e,
            }) == kind
        });
        intra
            || self.atom_edges(Scope::Inter, unit, atom).iter().any(|&e| {
                self.kind(EdgeId {
                    scope: Scope::Inter,
                    edge: e,
                }) == kind
            })
    }
}

trait ContactRefiner {
    fn is_applicable(&self, kind: InteractionType) -> bool;

    /// Called before the contacts of each unit.
    fn start_unit(&mut self, _unit: usize) {}

    fn handle(
        &mut self,
        context: &RefineContext<'_>,
        id: EdgeId,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        filtered: &mut Vec<EdgeId>,
    );
}

/// Atom, unit, partner residue, partner unit and side of a contact.
type ResidueKey = (usize, usize, usize, usize, bool);

/// Keeps only the closest hydrophobic contact from an atom to each other
/// residue.
#[derive(Default)]
struct HydrophobicRefiner {
    closest: HashMap<ResidueKey, (f32, EdgeId)>,
}

impl HydrophobicRefiner {
    fn keep_closest(&mut self, key: ResidueKey, distance: f32, id: EdgeId, filtered: &mut Vec<EdgeId>) {
        match self.closest.get(&key).copied() {
            Some((min, _)) if distance >= min => filtered.push(id),
            previous => {
                if let Some((_, previous)) = previous {
                    filtered.push(previous);
                }
                self.closest.insert(key, (distance, id));
            }
        }
    }
}

impl ContactRefiner for HydrophobicRefiner {
    fn is_applicable(&self, kind: InteractionType) -> bool {
        kind == InteractionType::Hydrophobic
    }

    fn start_unit(&mut self, _unit: usize) {
        self.closest.clear();
    }

    fn handle(
        &mut self,
        _context: &RefineContext<'_>,
        id: EdgeId,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        filtered: &mut Vec<EdgeId>,
    ) {
        let distance = a.distance(b);
        let (atom_a, atom_b) = (a.first_member(), b.first_member());
        let key_a = (
            atom_a,
            a.unit.id,
            b.unit.residue_index(atom_b),
            b.unit.id,
            true,
        );
        let key_b = (
            atom_b,
            b.unit.id,
            a.unit.residue_index(atom_a),
            a.unit.id,
            false,
        );
        self.keep_closest(key_a, distance, id, filtered);
        self.keep_closest(key_b, distance, id, filtered);
    }
}

/// Drops weak hydrogen bonds to acceptors that already take a strong one.
struct WeakHydrogenBondRefiner;

impl ContactRefiner for WeakHydrogenBondRefiner {
    fn is_applicable(&self, kind: InteractionType) -> bool {
        kind == InteractionType::WeakHydrogenBond
    }

    fn handle(
        &mut self,
        context: &RefineContext<'_>,
        id: EdgeId,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        filtered: &mut Vec<EdgeId>,
    ) {
        let acceptor = if a.kind() == FeatureType::WeakHydrogenDonor { b } else { a };
        if context.atom_has_contact(acceptor.unit.id, acceptor.first_member(), InteractionType::HydrogenBond) {
            filtered.push(id);
        }
    }
}

/// Drops contacts of the `applies_to` kinds when the same atoms already
/// share a contact of one of the `shared` kinds.
struct SharedContactRefiner {
    applies_to: &'static [InteractionType],
    shared: &'static [InteractionType],
}

impl ContactRefiner for SharedContactRefiner {
    fn is_applicable(&self, kind: InteractionType) -> bool {
        self.applies_to.contains(&kind)
    }

    fn handle(
        &mut self,
        context: &RefineContext<'_>,
        id: EdgeId,
        a: &FeatureInfo<'_>,
        b: &FeatureInfo<'_>,
        filtered: &mut Vec<EdgeId>,
    ) {
        if context.shares_contact(id, a, b, self.shared) {
            filtered.push(id);
        }
    }
}

/// Ionic contacts between atoms that also hydrogen bond.
const SALT_BRIDGE_REFINER: SharedContactRefiner = SharedContactRefiner {
    applies_to: &[InteractionType::Ionic],
    shared: &[InteractionType::HydrogenBond, InteractionType::WeakHydrogenBond],
};

/// Hydrophobic and cation-pi contacts within stacked rings.
const PI_STACKING_REFINER: SharedContactRefiner = SharedContactRefiner {
    applies_to: &[InteractionType::Hydrophobic, InteractionType::CationPi],
    shared: &[InteractionType::PiStacking],
};

/// Ionic contacts to a coordinated metal.
const METAL_COORDINATION_REFINER: SharedContactRefiner = SharedContactRefiner {
    applies_to: &[InteractionType::Ionic],
    shared: &[InteractionType::MetalCoordination],
};

/// Flag superseded contacts of `interactions`.
pub fn refine_interactions(structure: &Structure, interactions: &mut Interactions) {
    let filtered = {
        let context = RefineContext::new(structure, interactions);
        let mut refiners: Vec<Box<dyn ContactRefiner>> = vec![
            Box::new(HydrophobicRefiner::default()),
            Box::new(WeakHydrogenBondRefiner),
            Box::new(SALT_BRIDGE_REFINER),
            Box::new(PI_STACKING_REFINER),
            Box::new(METAL_COORDINATION_REFINER),
        ];
        let mut filtered = Vec::new();

        for (e, edge) in interactions.contacts.edges().iter().enumerate() {
            let a = interactions.feature_info(structure, edge.unit_a, edge.feature_a);
            let b = interactions.feature_info(structure, edge.unit_b, edge.feature_b);
            let id = EdgeId {
                scope: Scope::Inter,
                edge: e,
            };
            for refiner in refiners.iter_mut().filter(|r| r.is_applicable(edge.kind)) {
                refiner.handle(&context, id, &a, &b, &mut filtered);
            }
        }

        for unit in structure.units() {
            for refiner in refiners.iter_mut() {
                refiner.start_unit(unit.id);
            }
            for (e, edge) in interactions.unit_contacts[unit.id].edges().iter().enumerate() {
                let a = interactions.feature_info(structure, unit.id, edge.a);
                let b = interactions.feature_info(structure, unit.id, edge.b);
                let id = EdgeId {
                    scope: Scope::Intra(unit.id),
                    edge: e,
                };
                for refiner in refiners.iter_mut().filter(|r| r.is_applicable(edge.kind)) {
                    refiner.handle(&context, id, &a, &b, &mut filtered);
                }
            }
        }
        filtered
    };

    for id in &filtered {
        match id.scope {
            Scope::Inter => interactions.contacts.set_filtered(id.edge),
            Scope::Intra(unit) => interactions.unit_contacts[unit].set_filtered(id.edge),
        }
    }
    log::debug!("refinement flagged {} contacts", filtered.len());
}
