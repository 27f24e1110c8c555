//! CIF text writer.

use std::fmt::Write as _;

use crate::binary_cif::ValueKind;

use super::category::{Category, CategoryFilter, CategoryFormatter, DefaultFilter, DefaultFormatter};
use super::field::{FieldType, FieldValue};
use super::{normalize_header, Encoder, WriteOptions, WriterError};

const DEFAULT_FLOAT_DIGITS: usize = 6;

pub struct TextEncoder {
    builder: String,
    has_block: bool,
    encoded: bool,
    filter: Box<dyn CategoryFilter>,
    formatter: Box<dyn CategoryFormatter>,
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEncoder {
    pub fn new() -> Self {
        Self {
            builder: String::new(),
            has_block: false,
            encoded: false,
            filter: Box::new(DefaultFilter),
            formatter: Box::new(DefaultFormatter),
        }
    }
}

/// Round to `digits` decimal places and print without trailing zeros.
fn format_float(v: f64, digits: usize) -> String {
    if !v.is_finite() {
        return "?".to_string();
    }
    let s = format!("{v:.digits$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    match s {
        "-0" => "0".to_string(),
        s => s.to_string(),
    }
}

fn needs_quotes(s: &str) -> bool {
    let first = s.as_bytes()[0];
    if matches!(first, b'_' | b'#' | b'$' | b'\'' | b'"' | b'[' | b']' | b';') {
        return true;
    }
    if s == "." || s == "?" {
        return true;
    }
    let lower = s.to_ascii_lowercase();
    if ["data_", "save_", "loop_", "global_", "stop_"]
        .iter()
        .any(|p| lower.starts_with(p))
    {
        return true;
    }
    s.bytes().any(|b| b.is_ascii_whitespace())
}

/// A single CIF token, quoted or turned into a text field as needed.
fn escape(s: &str) -> String {
    if s.is_empty() {
        return ".".to_string();
    }
    if s.contains('\n') {
        return format!("\n;{s}\n;\n");
    }
    if !needs_quotes(s) {
        return s.to_string();
    }
    // a quote is only closed by quote + whitespace
    let closes = |q: char| {
        s.char_indices()
            .any(|(i, c)| c == q && s[i + 1..].starts_with(|n: char| n.is_whitespace()))
    };
    if !closes('\'') {
        format!("'{s}'")
    } else if !closes('"') {
        format!("\"{s}\"")
    } else {
        format!("\n;{s}\n;\n")
    }
}

fn format_value(value: FieldValue, digits: usize) -> String {
    match value {
        FieldValue::Str(s) => escape(&s),
        FieldValue::Int(v) => v.to_string(),
        FieldValue::Float(v) => format_float(v, digits),
    }
}

impl Encoder for TextEncoder {
    fn set_filter(&mut self, filter: Option<Box<dyn CategoryFilter>>) {
        self.filter = filter.unwrap_or_else(|| Box::new(DefaultFilter));
    }

    fn set_formatter(&mut self, formatter: Option<Box<dyn CategoryFormatter>>) {
        self.formatter = formatter.unwrap_or_else(|| Box::new(DefaultFormatter));
    }

    fn is_category_included(&self, name: &str) -> bool {
        self.filter.include_category(name)
    }

    fn start_data_block(&mut self, header: &str) {
        if self.encoded {
            return;
        }
        self.has_block = true;
        let _ = write!(self.builder, "data_{}\n#\n", normalize_header(header));
    }

    fn write_category_with<C: Category>(
        &mut self,
        category: &C,
        ctx: &C::Context,
        options: WriteOptions,
    ) -> Result<(), WriterError> {
        if self.encoded {
            return Err(WriterError::AlreadyEncoded);
        }
        if !self.has_block {
            return Err(WriterError::NoDataBlock);
        }

        let name = category.name();
        if !options.ignore_filter && !self.filter.include_category(name) {
            return Ok(());
        }
        let instance = category.instance(ctx);
        let row_count = instance.row_count();
        if row_count == 0 {
            return Ok(());
        }

        let fields: Vec<_> = instance
            .included_fields()
            .into_iter()
            .filter(|f| self.filter.include_field(name, &f.name))
            .collect();
        if fields.is_empty() {
            return Ok(());
        }

        let digits: Vec<usize> = fields
            .iter()
            .map(|f| {
                self.formatter
                    .get_format(name, &f.name)
                    .and_then(|fmt| fmt.digit_count)
                    .or_else(|| f.default_format.as_ref().and_then(|fmt| fmt.digit_count))
                    .unwrap_or(DEFAULT_FLOAT_DIGITS)
            })
            .collect();
        // row-major
        let mut cells = Vec::with_capacity(row_count * fields.len());
        for (offset, (key, data)) in instance.rows().enumerate() {
            for (field, &places) in fields.iter().zip(&digits) {
                let kind = field
                    .value_kind
                    .as_ref()
                    .map_or(ValueKind::Present, |f| f(key, data));
                let cell = match kind {
                    ValueKind::NotPresent => ".".to_string(),
                    ValueKind::Unknown => "?".to_string(),
                    ValueKind::Present => {
                        let value = (field.value)(key, data, offset);
                        match (&value, field.field_type) {
                            (FieldValue::Str(s), FieldType::Str) if s.is_empty() => ".".to_string(),
                            _ => format_value(value, places),
                        }
                    }
                };
                cells.push(cell);
            }
        }

        let out = &mut self.builder;
        if row_count == 1 {
            let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0) + name.len() + 3;
            for (field, cell) in fields.iter().zip(&cells) {
                let tag = format!("_{name}.{}", field.name);
                if cell.starts_with('\n') {
                    let _ = write!(out, "{tag}{cell}");
                } else {
                    let _ = writeln!(out, "{tag:<width$}{cell}");
                }
            }
        } else {
            out.push_str("loop_\n");
            for field in &fields {
                let _ = writeln!(out, "_{name}.{}", field.name);
            }
            for row in cells.chunks(fields.len()) {
                let mut line = String::new();
                for cell in row {
                    if cell.starts_with('\n') {
                        line.push_str(cell);
                    } else {
                        if !line.is_empty() && !line.ends_with('\n') {
                            line.push(' ');
                        }
                        line.push_str(cell);
                    }
                }
                out.push_str(&line);
                if !line.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out.push_str("#\n");
        Ok(())
    }

    fn get_data(&mut self) -> Result<&[u8], WriterError> {
        self.encoded = true;
        Ok(self.builder.as_bytes())
    }
}
