//! Feature and interaction kinds, and the contact edge stores.

use std::collections::HashMap;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    None = 0,
    PositiveCharge = 1,
    NegativeCharge = 2,
    AromaticRing = 3,
    HydrogenDonor = 4,
    HydrogenAcceptor = 5,
    HalogenDonor = 6,
    HalogenAcceptor = 7,
    HydrophobicAtom = 8,
    WeakHydrogenDonor = 9,
    IonicTypePartner = 10,
    DativeBondPartner = 11,
    TransitionMetal = 12,
    IonicTypeMetal = 13,
}

impl FeatureType {
    pub fn label(self) -> &'static str {
        match self {
            FeatureType::None => "None",
            FeatureType::PositiveCharge => "Positive Charge",
            FeatureType::NegativeCharge => "Negative Charge",
            FeatureType::AromaticRing => "Aromatic Ring",
            FeatureType::HydrogenDonor => "Hydrogen Donor",
            FeatureType::HydrogenAcceptor => "Hydrogen Acceptor",
            FeatureType::HalogenDonor => "Halogen Donor",
            FeatureType::HalogenAcceptor => "Halogen Acceptor",
            FeatureType::HydrophobicAtom => "HydrophobicAtom",
            FeatureType::WeakHydrogenDonor => "Weak Hydrogen Donor",
            FeatureType::IonicTypePartner => "Ionic Type Partner",
            FeatureType::DativeBondPartner => "Dative Bond Partner",
            FeatureType::TransitionMetal => "Transition Metal",
            FeatureType::IonicTypeMetal => "Ionic Type Metal",
        }
    }
}

/// Chemical group a feature was derived from.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureGroup {
    #[default]
    None = 0,
    QuaternaryAmine = 1,
    TertiaryAmine = 2,
    Sulfonium = 3,
    SulfonicAcid = 4,
    Sulfate = 5,
    Phosphate = 6,
    Halocarbon = 7,
    Guanidine = 8,
    Acetamidine = 9,
    Carboxylate = 10,
    Imidazole = 11,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionType {
    Unknown = 0,
    Ionic = 1,
    CationPi = 2,
    PiStacking = 3,
    HydrogenBond = 4,
    HalogenBond = 5,
    Hydrophobic = 6,
    MetalCoordination = 7,
    WeakHydrogenBond = 8,
}

impl InteractionType {
    pub fn label(self) -> &'static str {
        match self {
            InteractionType::Unknown => "Unknown Interaction",
            InteractionType::Ionic => "Ionic Interaction",
            InteractionType::CationPi => "Cation-Pi Interaction",
            InteractionType::PiStacking => "Pi Stacking",
            InteractionType::HydrogenBond => "Hydrogen Bond",
            InteractionType::HalogenBond => "Halogen Bond",
            InteractionType::Hydrophobic => "Hydrophobic Contact",
            InteractionType::MetalCoordination => "Metal Coordination",
            InteractionType::WeakHydrogenBond => "Weak Hydrogen Bond",
        }
    }
}

/// Whether a contact survived refinement.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionFlag {
    #[default]
    None = 0,
    /// Superseded by a stronger or closer contact between the same atoms.
    Filtered = 1,
}

/// A contact between two features of one unit, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntraContactEdge {
    pub a: usize,
    pub b: usize,
    pub kind: InteractionType,
    pub flag: InteractionFlag,
}

/// Contacts between features of one unit, with adjacency in both
/// directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntraContacts {
    edges: Vec<IntraContactEdge>,
    offsets: Vec<usize>,
    /// Edge ids per feature, `offsets` delimited.
    slots: Vec<usize>,
}

impl IntraContacts {
    /// Number of contacts, filtered ones included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[IntraContactEdge] {
        &self.edges
    }

    /// Ids of the contacts touching `feature`.
    pub fn edges_of(&self, feature: usize) -> &[usize] {
        match (self.offsets.get(feature), self.offsets.get(feature + 1)) {
            (Some(&start), Some(&end)) => &self.slots[start..end],
            _ => &[],
        }
    }

    /// Unfiltered partners of `feature` with the contact type.
    pub fn neighbors(&self, feature: usize) -> impl Iterator<Item = (usize, InteractionType)> + '_ {
        self.edges_of(feature).iter().filter_map(move |&e| {
            let edge = &self.edges[e];
            let other = if edge.a == feature { edge.b } else { edge.a };
            (edge.flag == InteractionFlag::None).then_some((other, edge.kind))
        })
    }

    /// Every unfiltered contact once, as `(a, b, type)` with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, InteractionType)> + '_ {
        (0..self.offsets.len().saturating_sub(1)).flat_map(move |a| {
            self.neighbors(a)
                .filter(move |&(b, _)| a < b)
                .map(move |(b, t)| (a, b, t))
        })
    }

    pub fn unfiltered_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.flag == InteractionFlag::None)
            .count()
    }

    pub(crate) fn set_filtered(&mut self, edge: usize) {
        self.edges[edge].flag = InteractionFlag::Filtered;
    }
}

#[derive(Debug, Default)]
pub struct IntraContactsBuilder {
    edges: Vec<IntraContactEdge>,
}

impl IntraContactsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, a: usize, b: usize, kind: InteractionType) {
        self.edges.push(IntraContactEdge {
            a: a.min(b),
            b: a.max(b),
            kind,
            flag: InteractionFlag::None,
        });
    }

    /// Freeze into adjacency lists over `feature_count` features.
    pub fn finish(self, feature_count: usize) -> IntraContacts {
        let mut offsets = vec![0usize; feature_count + 1];
        for edge in &self.edges {
            offsets[edge.a + 1] += 1;
            offsets[edge.b + 1] += 1;
        }
        for i in 0..feature_count {
            offsets[i + 1] += offsets[i];
        }
        let mut fill = offsets.clone();
        let mut slots = vec![0usize; self.edges.len() * 2];
        for (e, edge) in self.edges.iter().enumerate() {
            for from in [edge.a, edge.b] {
                slots[fill[from]] = e;
                fill[from] += 1;
            }
        }
        IntraContacts {
            edges: self.edges,
            offsets,
            slots,
        }
    }
}

/// A contact between features of two units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterContactEdge {
    pub unit_a: usize,
    pub feature_a: usize,
    pub unit_b: usize,
    pub feature_b: usize,
    pub kind: InteractionType,
    pub flag: InteractionFlag,
}

#[derive(Debug, Clone, Default)]
pub struct InterContacts {
    edges: Vec<InterContactEdge>,
    by_unit_pair: HashMap<(usize, usize), Vec<usize>>,
    by_feature: HashMap<(usize, usize), Vec<usize>>,
}

impl InterContacts {
    fn new(edges: Vec<InterContactEdge>) -> Self {
        let mut by_unit_pair: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        let mut by_feature: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (e, edge) in edges.iter().enumerate() {
            by_unit_pair.entry((edge.unit_a, edge.unit_b)).or_default().push(e);
            by_feature.entry((edge.unit_a, edge.feature_a)).or_default().push(e);
            by_feature.entry((edge.unit_b, edge.feature_b)).or_default().push(e);
        }
        Self {
            edges,
            by_unit_pair,
            by_feature,
        }
    }

    /// All contacts, filtered ones included.
    pub fn edges(&self) -> &[InterContactEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn unfiltered(&self) -> impl Iterator<Item = &InterContactEdge> + '_ {
        self.edges.iter().filter(|e| e.flag == InteractionFlag::None)
    }

    pub fn unfiltered_count(&self) -> usize {
        self.unfiltered().count()
    }

    /// Contacts between two units, in either order.
    pub fn unit_pair(&self, unit_a: usize, unit_b: usize) -> impl Iterator<Item = &InterContactEdge> + '_ {
        let forward = self.by_unit_pair.get(&(unit_a, unit_b));
        let backward = if unit_a == unit_b {
            None
        } else {
            self.by_unit_pair.get(&(unit_b, unit_a))
        };
        forward
            .into_iter()
            .chain(backward)
            .flatten()
            .map(move |&e| &self.edges[e])
    }

    /// Ids of the contacts touching a feature of a unit.
    pub fn edges_of(&self, unit: usize, feature: usize) -> &[usize] {
        self.by_feature.get(&(unit, feature)).map_or(&[], Vec::as_slice)
    }

    /// Contacts touching a feature of a unit.
    pub fn of_feature(&self, unit: usize, feature: usize) -> impl Iterator<Item = &InterContactEdge> + '_ {
        self.edges_of(unit, feature).iter().map(move |&e| &self.edges[e])
    }

    pub(crate) fn set_filtered(&mut self, edge: usize) {
        self.edges[edge].flag = InteractionFlag::Filtered;
    }
}

#[derive(Debug, Default)]
pub struct InterContactsBuilder {
    edges: Vec<InterContactEdge>,
    current: Option<(usize, usize)>,
}

impl InterContactsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_unit_pair(&mut self, unit_a: usize, unit_b: usize) {
        self.current = Some((unit_a, unit_b));
    }

    /// Record a contact for the open unit pair; ignored when none is open.
    pub fn add(&mut self, feature_a: usize, feature_b: usize, kind: InteractionType) {
        if let Some((unit_a, unit_b)) = self.current {
            self.edges.push(InterContactEdge {
                unit_a,
                feature_a,
                unit_b,
                feature_b,
                kind,
                flag: InteractionFlag::None,
            });
        }
    }

    pub fn finish_unit_pair(&mut self) {
        self.current = None;
    }

    pub fn finish(self) -> InterContacts {
        InterContacts::new(self.edges)
    }
}
