//! STAR/CIF document model.
//!
//! Blocks hold categories in file order. Key-value pairs and loops that share
//! a category prefix (`_atom_site.` etc.) are merged into one category; tags
//! without a dot form a single-field category of their own.

use crate::binary_cif::ValueKind;
use crate::util::number::{parse_float_lenient, parse_int_prefix};

/// A parsed CIF/STAR document containing one or more data blocks.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A data block (`data_NAME`) or save frame.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub header: String,
    categories: Vec<CifCategory>,
    pub save_frames: Vec<Block>,
}

/// A CIF data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string value (unquoted, single-quoted, double-quoted, or semicolon text).
    Str(String),
    /// The inapplicable marker `.`.
    Inapplicable,
    /// The unknown marker `?`.
    Unknown,
}

impl Value {
    /// Returns the string content, or `None` for `.` / `?`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Tries to parse the value as `f64`, ignoring a trailing uncertainty
    /// like `50.123(4)`.
    pub fn as_f64(&self) -> Option<f64> {
        let s = self.as_str()?;
        let s = match s.find('(') {
            Some(idx) => &s[..idx],
            None => s,
        };
        s.parse().ok()
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_str()?.parse().ok()
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(s) if s.is_empty() => ValueKind::NotPresent,
            Value::Str(_) => ValueKind::Present,
            Value::Inapplicable => ValueKind::NotPresent,
            Value::Unknown => ValueKind::Unknown,
        }
    }
}

/// A named table of equally long columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CifCategory {
    /// Name without the leading underscore.
    pub name: String,
    pub row_count: usize,
    field_names: Vec<String>,
    columns: Vec<Vec<Value>>,
}

impl CifCategory {
    pub fn new(name: impl Into<String>, row_count: usize) -> Self {
        Self {
            name: name.into(),
            row_count,
            field_names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn field(&self, name: &str) -> Option<CifField<'_>> {
        let idx = self.field_names.iter().position(|f| f == name)?;
        Some(CifField {
            values: &self.columns[idx],
        })
    }

    /// Field by position in [`field_names`](Self::field_names).
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn field_at(&self, index: usize) -> CifField<'_> {
        CifField {
            values: &self.columns[index],
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, CifField<'_>)> {
        self.field_names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.as_str(), CifField { values: c }))
    }

    /// Append a column. Values beyond `row_count` are ignored and missing
    /// rows are filled with `?`.
    pub fn push_field(&mut self, name: impl Into<String>, mut values: Vec<Value>) {
        values.resize(self.row_count, Value::Unknown);
        self.field_names.push(name.into());
        self.columns.push(values);
    }
}

/// Read access to one column of a category.
#[derive(Debug, Clone, Copy)]
pub struct CifField<'a> {
    values: &'a [Value],
}

impl<'a> CifField<'a> {
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, row: usize) -> &'a Value {
        &self.values[row]
    }

    pub fn value_kind(&self, row: usize) -> ValueKind {
        self.values[row].kind()
    }

    /// String content, empty for `.` and `?`.
    pub fn str(&self, row: usize) -> &'a str {
        self.values[row].as_str().unwrap_or("")
    }

    /// Leading integer of the value, 0 when absent or unparseable.
    pub fn int(&self, row: usize) -> i64 {
        parse_int_prefix(self.str(row))
    }

    /// Float value, 0 when absent or unparseable.
    pub fn float(&self, row: usize) -> f64 {
        parse_float_lenient(self.str(row))
    }

    pub fn to_int_array(&self) -> Vec<i32> {
        (0..self.row_count()).map(|i| self.int(i) as i32).collect()
    }

    pub fn to_float_array(&self) -> Vec<f64> {
        (0..self.row_count()).map(|i| self.float(i)).collect()
    }
}

impl Block {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Default::default()
        }
    }

    /// Categories in the order they first appear.
    pub fn categories(&self) -> &[CifCategory] {
        &self.categories
    }

    /// Look up a category by name, with or without the leading underscore
    /// (case-insensitive).
    pub fn category(&self, name: &str) -> Option<&CifCategory> {
        let name = name.strip_prefix('_').unwrap_or(name);
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Look up `_category.field` or `category.field`.
    pub fn field(&self, tag: &str) -> Option<CifField<'_>> {
        let (cat, field) = tag.split_once('.').unwrap_or((tag, ""));
        self.category(cat)?.field(field)
    }

    /// Add columns to the named category, creating it if needed. Repeated
    /// category names extend the existing category.
    pub fn add_fields(&mut self, name: &str, row_count: usize, fields: Vec<(String, Vec<Value>)>) {
        let idx = match self.categories.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.categories.push(CifCategory::new(name, row_count));
                self.categories.len() - 1
            }
        };
        let category = &mut self.categories[idx];
        for (field, values) in fields {
            category.push_field(field, values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kinds() {
        assert_eq!(Value::Str("x".into()).kind(), ValueKind::Present);
        assert_eq!(Value::Str(String::new()).kind(), ValueKind::NotPresent);
        assert_eq!(Value::Inapplicable.kind(), ValueKind::NotPresent);
        assert_eq!(Value::Unknown.kind(), ValueKind::Unknown);
    }

    #[test]
    fn field_accessors() {
        let mut block = Block::new("test");
        block.add_fields(
            "cell",
            2,
            vec![
                ("length_a".into(), vec![Value::Str("50.5(2)".into()), Value::Unknown]),
                ("id".into(), vec![Value::Str("7".into()), Value::Inapplicable]),
            ],
        );
        let a = block.field("_cell.length_a").unwrap();
        assert_eq!(a.float(0), 50.5);
        assert_eq!(a.float(1), 0.0);
        assert_eq!(a.str(1), "");
        let id = block.field("cell.id").unwrap();
        assert_eq!(id.to_int_array(), vec![7, 0]);
        assert_eq!(id.value_kind(1), ValueKind::NotPresent);
    }

    #[test]
    fn repeated_category_is_extended() {
        let mut block = Block::new("b");
        block.add_fields("entry", 1, vec![("id".into(), vec![Value::Str("1ABC".into())])]);
        block.add_fields("exptl", 1, vec![("method".into(), vec![Value::Str("X".into())])]);
        block.add_fields("entry", 1, vec![("title".into(), vec![Value::Str("T".into())])]);
        let names: Vec<&str> = block.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "exptl"]);
        assert_eq!(block.category("_entry").unwrap().field_names(), ["id", "title"]);
    }
}
