//! Spatial primitives: bounding volumes, symmetry operators and a bucketed
//! grid for radius and nearest-neighbour queries.

pub mod boundary;
pub mod lookup3d;
pub mod symmetry;

pub use boundary::{get_boundary, Boundary, Box3D, PositionData, Sphere3D};
pub use lookup3d::{GridLookup3D, LookupResult};
pub use symmetry::SymmetryOperator;
