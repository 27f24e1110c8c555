//! BinaryCIF encoding and structural contact analysis.
//!
//! - [`binary_cif`]: typed column arrays, encoding chains, the classifier
//!   that picks a compact chain per column, and the decoder.
//! - [`cif`]: text CIF/STAR parsing.
//! - [`writer`]: category/field model and the binary and text writers.
//! - [`convert`]: file-level CIF ↔ BinaryCIF conversion used by `cif2bcif`.
//! - [`geometry`], [`structure`], [`interactions`]: spatial lookups over
//!   atomic structures and non-covalent contact detection.

pub mod binary_cif;
pub mod cif;
pub mod convert;
pub mod geometry;
pub mod interactions;
pub mod structure;
pub mod util;
pub mod writer;
