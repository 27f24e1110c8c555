//! Atomic structures as the contacts engine sees them.
//!
//! An [`AtomicModel`] holds the atom table of one model. A [`Unit`] selects
//! atoms of a model (one chain) and places them with a symmetry operator;
//! a [`Structure`] is a list of units sharing lazily built spatial indices,
//! bonds, rings and valence states.

pub mod bonds;
pub mod element;
pub mod model;
pub mod rings;
#[allow(clippy::module_inception)]
pub mod structure;
pub mod unit;
pub mod valence;

pub use bonds::{
    compute_inter_unit_bonds, compute_intra_unit_bonds, BondComputationParams, BondOrder,
    InterUnitBonds, InterUnitEdge, IntraUnitBonds,
};
pub use element::Element;
pub use model::{AtomRecord, AtomicModel};
pub use rings::UnitRings;
pub use structure::{Structure, StructureLookup3D, StructureLookupResult};
pub use unit::Unit;
pub use valence::{AtomGeometry, AtomValence, ValenceModel};

#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("missing category {0}")]
    MissingCategory(&'static str),
    #[error("missing field {0}")]
    MissingField(&'static str),
}
