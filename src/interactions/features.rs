//! Interaction features of a unit.
//!
//! A feature is a typed point (an atom, or the centroid of a charged group)
//! with its member atoms. Positions are in model coordinates of the unit;
//! [`FeatureInfo::position`] applies the unit operator.

use std::cell::OnceCell;

use glam::Vec3;

use super::common::{FeatureGroup, FeatureType};
use crate::geometry::{GridLookup3D, PositionData};
use crate::structure::{AtomGeometry, Structure, Unit};

#[derive(Debug)]
pub struct Features {
    pub count: usize,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub types: Vec<FeatureType>,
    pub groups: Vec<FeatureGroup>,
    /// Member offsets, `count + 1` entries.
    pub offsets: Vec<usize>,
    /// Unit indices of member atoms.
    pub members: Vec<usize>,
    element_count: usize,
    lookup: OnceCell<GridLookup3D>,
    elements_index: OnceCell<ElementsIndex>,
}

/// Features containing each atom of the unit.
#[derive(Debug, Clone, Default)]
pub struct ElementsIndex {
    offsets: Vec<usize>,
    features: Vec<usize>,
}

impl ElementsIndex {
    pub fn features_of(&self, element: usize) -> &[usize] {
        &self.features[self.offsets[element]..self.offsets[element + 1]]
    }
}

/// Features of selected types with a lookup over just those.
///
/// Lookup hits are positions in `indices`.
#[derive(Debug, Clone)]
pub struct FeatureSubset {
    pub indices: Vec<usize>,
    pub lookup: GridLookup3D,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn position(&self, feature: usize) -> Vec3 {
        Vec3::new(self.x[feature], self.y[feature], self.z[feature])
    }

    pub fn members(&self, feature: usize) -> &[usize] {
        &self.members[self.offsets[feature]..self.offsets[feature + 1]]
    }

    fn positions(&self) -> Vec<Vec3> {
        (0..self.count).map(|i| self.position(i)).collect()
    }

    /// Lookup over all features; hits are feature indices.
    pub fn lookup(&self) -> &GridLookup3D {
        self.lookup
            .get_or_init(|| GridLookup3D::new(PositionData::new(self.positions())))
    }

    pub fn subset(&self, types: &[FeatureType]) -> FeatureSubset {
        let indices: Vec<usize> = (0..self.count)
            .filter(|&i| types.contains(&self.types[i]))
            .collect();
        let data = PositionData::new(self.positions()).with_indices(indices.clone());
        FeatureSubset {
            indices,
            lookup: GridLookup3D::new(data),
        }
    }

    pub fn elements_index(&self) -> &ElementsIndex {
        self.elements_index.get_or_init(|| {
            let mut offsets = vec![0usize; self.element_count + 1];
            for &m in &self.members {
                offsets[m + 1] += 1;
            }
            for i in 0..self.element_count {
                offsets[i + 1] += offsets[i];
            }
            let mut fill = offsets.clone();
            let mut features = vec![0usize; self.members.len()];
            for f in 0..self.count {
                for &m in self.members(f) {
                    features[fill[m]] = f;
                    fill[m] += 1;
                }
            }
            ElementsIndex { offsets, features }
        })
    }
}

#[derive(Debug, Default)]
struct GroupState {
    sum: Vec3,
    start: usize,
}

#[derive(Debug, Default)]
pub struct FeaturesBuilder {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    types: Vec<FeatureType>,
    groups: Vec<FeatureGroup>,
    offsets: Vec<usize>,
    members: Vec<usize>,
    state: Option<GroupState>,
}

impl FeaturesBuilder {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            ..Default::default()
        }
    }

    fn push(&mut self, kind: FeatureType, group: FeatureGroup, position: Vec3) {
        self.x.push(position.x);
        self.y.push(position.y);
        self.z.push(position.z);
        self.types.push(kind);
        self.groups.push(group);
        self.offsets.push(self.members.len());
    }

    /// Single-atom feature.
    pub fn add(&mut self, kind: FeatureType, group: FeatureGroup, position: Vec3, member: usize) {
        self.members.push(member);
        self.push(kind, group, position);
    }

    /// Begin a multi-atom feature placed at the centroid of its members.
    pub fn start_state(&mut self) {
        self.state = Some(GroupState {
            sum: Vec3::ZERO,
            start: self.members.len(),
        });
    }

    pub fn push_member(&mut self, position: Vec3, member: usize) {
        if let Some(state) = self.state.as_mut() {
            state.sum += position;
            self.members.push(member);
        }
    }

    /// Close the open group; a group without members adds nothing.
    pub fn finish_state(&mut self, kind: FeatureType, group: FeatureGroup) {
        let Some(state) = self.state.take() else {
            return;
        };
        let n = self.members.len() - state.start;
        if n == 0 {
            return;
        }
        self.push(kind, group, state.sum / n as f32);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Freeze the features of a unit with `element_count` atoms.
    pub fn finish(mut self, element_count: usize) -> Features {
        if let Some(state) = self.state.take() {
            self.members.truncate(state.start);
        }
        Features {
            count: self.types.len(),
            x: self.x,
            y: self.y,
            z: self.z,
            types: self.types,
            groups: self.groups,
            offsets: self.offsets,
            members: self.members,
            element_count,
            lookup: OnceCell::new(),
            elements_index: OnceCell::new(),
        }
    }
}

/// One feature of one unit.
#[derive(Debug, Clone, Copy)]
pub struct FeatureInfo<'a> {
    pub unit: &'a Unit,
    pub features: &'a Features,
    pub feature: usize,
}

impl<'a> FeatureInfo<'a> {
    pub fn new(unit: &'a Unit, features: &'a Features, feature: usize) -> Self {
        Self {
            unit,
            features,
            feature,
        }
    }

    pub fn kind(&self) -> FeatureType {
        self.features.types[self.feature]
    }

    pub fn group(&self) -> FeatureGroup {
        self.features.groups[self.feature]
    }

    pub fn members(&self) -> &'a [usize] {
        self.features.members(self.feature)
    }

    /// Representative atom of the feature.
    pub fn first_member(&self) -> usize {
        self.features.members[self.features.offsets[self.feature]]
    }

    /// Centre after the unit operator.
    pub fn position(&self) -> Vec3 {
        self.unit.operator.apply(self.features.position(self.feature))
    }

    pub fn is_member(&self, unit_id: usize, element: usize) -> bool {
        self.unit.id == unit_id && self.members().contains(&element)
    }

    /// Distance between the feature centres.
    pub fn distance(&self, other: &FeatureInfo<'_>) -> f32 {
        self.position().distance(other.position())
    }

    /// Ideal geometry of the representative atom.
    pub fn ideal_geometry(&self, structure: &Structure) -> AtomGeometry {
        structure.valence_model(self.unit.id).ideal_geometry[self.first_member()]
    }
}

/// Adds the features of one family for a unit.
#[derive(Clone, Copy)]
pub struct FeatureProvider {
    pub name: &'static str,
    pub types: &'static [FeatureType],
    pub add: fn(&Structure, &Unit, &mut FeaturesBuilder),
}

impl std::fmt::Debug for FeatureProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureProvider")
            .field("name", &self.name)
            .field("types", &self.types)
            .finish()
    }
}

impl FeatureProvider {
    pub fn provides_any(&self, types: &[FeatureType]) -> bool {
        self.types.iter().any(|t| types.contains(t))
    }
}

/// Run `providers` over a unit of `structure`.
pub fn compute_features(structure: &Structure, unit: &Unit, providers: &[FeatureProvider]) -> Features {
    let mut builder = FeaturesBuilder::new();
    for provider in providers {
        let before = builder.len();
        (provider.add)(structure, unit, &mut builder);
        log::trace!(
            "unit {}: {} {} features",
            unit.id,
            builder.len() - before,
            provider.name
        );
    }
    builder.finish(unit.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_sit_at_centroid() {
        let mut builder = FeaturesBuilder::new();
        builder.add(FeatureType::HydrogenDonor, FeatureGroup::None, Vec3::ZERO, 0);
        builder.start_state();
        builder.push_member(Vec3::new(2.0, 0.0, 0.0), 1);
        builder.push_member(Vec3::new(4.0, 2.0, 0.0), 2);
        builder.finish_state(FeatureType::NegativeCharge, FeatureGroup::Carboxylate);
        builder.start_state();
        builder.finish_state(FeatureType::PositiveCharge, FeatureGroup::None);
        let features = builder.finish(3);

        assert_eq!(features.count, 2);
        assert_eq!(features.position(1), Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(features.members(1), &[1, 2]);
        assert_eq!(features.groups[1], FeatureGroup::Carboxylate);
        assert_eq!(features.elements_index().features_of(0), &[0]);
        assert_eq!(features.elements_index().features_of(2), &[1]);
    }

    #[test]
    fn subset_lookup_hits_are_offsets() {
        let mut builder = FeaturesBuilder::new();
        for i in 0..4 {
            let kind = if i % 2 == 0 {
                FeatureType::HydrogenDonor
            } else {
                FeatureType::HydrogenAcceptor
            };
            builder.add(kind, FeatureGroup::None, Vec3::new(i as f32, 0.0, 0.0), i);
        }
        let features = builder.finish(4);
        let subset = features.subset(&[FeatureType::HydrogenAcceptor]);
        assert_eq!(subset.indices, vec![1, 3]);
        let found = subset.lookup.find(3.0, 0.0, 0.0, 0.5);
        assert_eq!(found.indices, vec![1]);
        assert_eq!(subset.indices[found.indices[0]], 3);
        assert_eq!(features.lookup().find(3.0, 0.0, 0.0, 0.5).indices, vec![3]);
    }
}
