//! Text CIF/STAR input.
//!
//! [`parse`] reads any CIF or STAR file into a [`Document`] whose blocks hold
//! named categories of string-valued columns.
//!
//! ```ignore
//! let doc = molpack::cif::parse(input)?;
//! let atoms = doc.blocks[0].category("atom_site").unwrap();
//! let x = atoms.field("Cartn_x").unwrap().to_float_array();
//! ```

pub mod dom;
pub mod parse;

pub use dom::{Block, CifCategory, CifField, Document, Value};
pub use parse::{parse, CifParseError};
