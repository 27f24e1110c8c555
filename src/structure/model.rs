//! Atom table of one model with residue and chain segmentation.

use glam::Vec3;

use super::element::Element;
use super::StructureError;
use crate::cif::{Block, CifCategory};

/// One atom as read from a coordinate file.
#[derive(Debug, Clone, Default)]
pub struct AtomRecord {
    pub position: Vec3,
    pub element: Element,
    pub atom_id: String,
    pub comp_id: String,
    /// Alternate location; empty when the atom has none.
    pub alt_id: String,
    pub asym_id: String,
    pub seq_id: i32,
    pub formal_charge: i8,
}

/// Column-oriented atoms of a single model.
///
/// Residues are runs of consecutive atoms sharing chain, sequence number
/// and component; chains are runs sharing `asym_id`.
#[derive(Debug, Clone, Default)]
pub struct AtomicModel {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub type_symbol: Vec<Element>,
    pub label_atom_id: Vec<String>,
    pub label_comp_id: Vec<String>,
    pub label_alt_id: Vec<String>,
    pub label_asym_id: Vec<String>,
    pub label_seq_id: Vec<i32>,
    pub formal_charge: Vec<i8>,
    pub residue_index: Vec<usize>,
    pub chain_index: Vec<usize>,
    /// Atom offsets of residues, `residue_count + 1` entries.
    pub residue_offsets: Vec<usize>,
    pub chain_count: usize,
}

impl AtomicModel {
    pub fn from_atoms(atoms: &[AtomRecord]) -> Self {
        let mut model = Self {
            residue_offsets: vec![0],
            ..Default::default()
        };
        for (i, atom) in atoms.iter().enumerate() {
            let new_chain = i == 0 || atom.asym_id != atoms[i - 1].asym_id;
            let new_residue = new_chain
                || atom.seq_id != atoms[i - 1].seq_id
                || atom.comp_id != atoms[i - 1].comp_id;
            if new_chain {
                model.chain_count += 1;
            }
            if new_residue && i > 0 {
                model.residue_offsets.push(i);
            }

            model.x.push(atom.position.x);
            model.y.push(atom.position.y);
            model.z.push(atom.position.z);
            model.type_symbol.push(atom.element);
            model.label_atom_id.push(atom.atom_id.clone());
            model.label_comp_id.push(atom.comp_id.clone());
            model.label_alt_id.push(atom.alt_id.clone());
            model.label_asym_id.push(atom.asym_id.clone());
            model.label_seq_id.push(atom.seq_id);
            model.formal_charge.push(atom.formal_charge);
            model.residue_index.push(model.residue_offsets.len() - 1);
            model.chain_index.push(model.chain_count.saturating_sub(1));
        }
        if !atoms.is_empty() {
            model.residue_offsets.push(atoms.len());
        }
        model
    }

    /// Read the first model of `_atom_site`.
    pub fn from_block(block: &Block) -> Result<Self, StructureError> {
        let atom_site = block
            .category("atom_site")
            .ok_or(StructureError::MissingCategory("atom_site"))?;
        let atoms = atom_records(atom_site)?;
        log::debug!("read {} atoms from block {}", atoms.len(), block.header);
        Ok(Self::from_atoms(&atoms))
    }

    pub fn atom_count(&self) -> usize {
        self.x.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residue_offsets.len() - 1
    }

    pub fn position(&self, atom: usize) -> Vec3 {
        Vec3::new(self.x[atom], self.y[atom], self.z[atom])
    }
}

fn atom_records(atom_site: &CifCategory) -> Result<Vec<AtomRecord>, StructureError> {
    let required = |name: &'static str| {
        atom_site
            .field(name)
            .ok_or(StructureError::MissingField(name))
    };
    let x = required("Cartn_x")?;
    let y = required("Cartn_y")?;
    let z = required("Cartn_z")?;
    let atom_id = required("label_atom_id")?;
    let type_symbol = atom_site.field("type_symbol");
    let comp_id = atom_site.field("label_comp_id");
    let alt_id = atom_site.field("label_alt_id");
    let asym_id = atom_site.field("label_asym_id");
    let seq_id = atom_site.field("label_seq_id");
    let charge = atom_site.field("pdbx_formal_charge");
    let model_num = atom_site.field("pdbx_PDB_model_num");

    let first_model = model_num.map(|m| m.int(0));
    let mut atoms = Vec::with_capacity(atom_site.row_count);
    for row in 0..atom_site.row_count {
        if let (Some(m), Some(first)) = (model_num, first_model) {
            if m.int(row) != first {
                continue;
            }
        }
        let name = atom_id.str(row);
        let element = match type_symbol.map(|f| f.str(row)) {
            Some(s) if !s.is_empty() => Element::from_symbol(s),
            _ => Element::from_atom_name(name),
        };
        atoms.push(AtomRecord {
            position: Vec3::new(x.float(row) as f32, y.float(row) as f32, z.float(row) as f32),
            element,
            atom_id: name.to_string(),
            comp_id: comp_id.map(|f| f.str(row).to_string()).unwrap_or_default(),
            alt_id: alt_id.map(|f| f.str(row).to_string()).unwrap_or_default(),
            asym_id: asym_id.map(|f| f.str(row).to_string()).unwrap_or_default(),
            seq_id: seq_id.map_or(0, |f| f.int(row) as i32),
            formal_charge: charge.map_or(0, |f| f.int(row) as i8),
        });
    }
    Ok(atoms)
}
