//! CIF to BinaryCIF conversion.
//!
//! Reads text CIF or BinaryCIF (optionally gzipped), infers a type for every
//! column and re-encodes the whole document, choosing an encoding chain per
//! column with the classifier.

use std::io::Read;
use std::ops::ControlFlow;
use std::path::Path;

use thiserror::Error;

use crate::binary_cif::{
    classify_float_array, classify_int_array, parse_binary, ArrayKind, BinaryFile, DecodeError,
    TypedArray, ValueKind,
};
use crate::cif::{self, Block, CifCategory, CifField, CifParseError, Document, Value};
use crate::util::number::{number_type, NumberType};
use crate::writer::{
    BinaryEncoder, BinaryEncoderOptions, Category, CategoryInstance, DirectiveFilter, Encoder,
    EncodingProvider, Field, FieldParams, FieldType, HintsEncodingProvider, TextEncoder, WriterError,
};

const ENCODER_NAME: &str = concat!("molpack cif2bcif ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CIF: {0}")]
    Parse(#[from] CifParseError),
    #[error("failed to read BinaryCIF: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid encoding hints: {0}")]
    Hints(#[from] serde_json::Error),
    #[error(transparent)]
    Writer(#[from] WriterError),
    #[error("conversion cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Write CIF text instead of BinaryCIF.
    pub as_text: bool,
    /// JSON array of encoding hints.
    pub hints: Option<String>,
    /// Newline separated category/field directives.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub message: &'static str,
    pub current: usize,
    pub max: usize,
}

/// Column type inferred from the values' text.
///
/// Any value that is neither an integer nor a plain decimal makes the column
/// a string, as does a column with no present values. Integers outside the
/// Int32 range are treated as floats.
pub fn get_cif_field_type(field: &CifField<'_>) -> FieldType {
    let mut float_count = 0;
    let mut undefined_count = 0;
    for row in 0..field.row_count() {
        if field.value_kind(row) != ValueKind::Present {
            undefined_count += 1;
            continue;
        }
        match number_type(field.str(row)) {
            NumberType::Int if i32::try_from(field.int(row)).is_ok() => {}
            NumberType::Int | NumberType::Float => float_count += 1,
            NumberType::Scientific | NumberType::NaN => return FieldType::Str,
        }
    }
    if undefined_count == field.row_count() {
        FieldType::Str
    } else if float_count > 0 {
        FieldType::Float
    } else {
        FieldType::Int
    }
}

/// Field definition for one parsed column. Numeric columns take their
/// encoder from `hints` when present, otherwise from the classifier.
fn classify_field(
    category: &str,
    name: &str,
    index: usize,
    field: &CifField<'_>,
    hints: Option<&dyn EncodingProvider>,
) -> Field<CifCategory> {
    let value_kind = move |row: usize, cat: &CifCategory| cat.field_at(index).value_kind(row);
    let hint = || hints.and_then(|h| h.get(category, name));
    match get_cif_field_type(field) {
        FieldType::Str => Field::str(
            name,
            move |row, cat: &CifCategory, _| cat.field_at(index).str(row).to_string(),
            FieldParams::new().value_kind(value_kind),
        ),
        FieldType::Float => {
            let encoder = hint().unwrap_or_else(|| {
                classify_float_array(&TypedArray::Float64(field.to_float_array()))
            });
            Field::float(
                name,
                move |row, cat: &CifCategory, _| cat.field_at(index).float(row),
                FieldParams::new()
                    .value_kind(value_kind)
                    .encoder(encoder)
                    .array_kind(ArrayKind::Float64),
            )
        }
        FieldType::Int => {
            let encoder = hint().unwrap_or_else(|| {
                classify_int_array(&TypedArray::Int32(field.to_int_array()))
            });
            Field::int(
                name,
                move |row, cat: &CifCategory, _| cat.field_at(index).int(row),
                FieldParams::new()
                    .value_kind(value_kind)
                    .encoder(encoder)
                    .array_kind(ArrayKind::Int32),
            )
        }
    }
}

/// A parsed category with its classified fields.
struct ConvertedCategory<'c> {
    category: &'c CifCategory,
    fields: Vec<Field<CifCategory>>,
}

impl Category for ConvertedCategory<'_> {
    type Data = CifCategory;
    type Context = ();

    fn name(&self) -> &str {
        &self.category.name
    }

    fn instance<'a>(&'a self, _ctx: &'a ()) -> CategoryInstance<'a, CifCategory> {
        CategoryInstance::single(self.fields.clone(), self.category, self.category.row_count)
    }
}

fn max_progress(doc: &Document) -> usize {
    doc.blocks
        .iter()
        .flat_map(Block::categories)
        .map(|c| 1 + c.field_names().len())
        .sum()
}

/// Write every block and category of `doc` through `encoder`.
///
/// `progress` is called after each field and each category; returning
/// [`ControlFlow::Break`] stops with [`ConvertError::Cancelled`].
pub fn encode_document<E: Encoder>(
    encoder: &mut E,
    doc: &Document,
    hints: Option<&dyn EncodingProvider>,
    progress: &mut dyn FnMut(&Progress) -> ControlFlow<()>,
) -> Result<(), ConvertError> {
    let max = max_progress(doc);
    let mut current = 0;
    let mut step = |current: usize| match progress(&Progress {
        message: "Encoding...",
        current,
        max,
    }) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(ConvertError::Cancelled),
    };

    for block in &doc.blocks {
        encoder.start_data_block(&block.header);
        for category in block.categories() {
            let mut fields = Vec::with_capacity(category.field_names().len());
            for (index, (name, field)) in category.fields().enumerate() {
                fields.push(classify_field(&category.name, name, index, &field, hints));
                current += 1;
                step(current)?;
            }
            encoder.write_category(&ConvertedCategory { category, fields }, &())?;
            current += 1;
            step(current)?;
        }
    }
    Ok(())
}

/// Convert a parsed document to BinaryCIF, or to CIF text when
/// `options.as_text` is set.
pub fn convert_document(
    doc: &Document,
    options: &ConvertOptions,
    progress: &mut dyn FnMut(&Progress) -> ControlFlow<()>,
) -> Result<Vec<u8>, ConvertError> {
    let filter = options.filter.as_deref().map(DirectiveFilter::parse);

    if options.as_text {
        let mut encoder = TextEncoder::new();
        if let Some(filter) = filter {
            encoder.set_filter(Some(Box::new(filter)));
        }
        encode_document(&mut encoder, doc, None, progress)?;
        return Ok(encoder.get_data()?.to_vec());
    }

    let hints = options
        .hints
        .as_deref()
        .map(HintsEncodingProvider::from_json)
        .transpose()?;
    let mut encoder = BinaryEncoder::new(BinaryEncoderOptions {
        encoder_name: ENCODER_NAME.to_string(),
        auto_classify: true,
        encoding_provider: None,
    });
    if let Some(filter) = filter {
        encoder.set_filter(Some(Box::new(filter)));
    }
    let hints = hints.as_ref().map(|h| h as &dyn EncodingProvider);
    encode_document(&mut encoder, doc, hints, progress)?;
    log::info!("exporting...");
    Ok(encoder.get_data()?.to_vec())
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn is_binary(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().contains(".bcif"))
}

/// Read `.cif`, `.bcif` and their `.gz` variants into a [`Document`].
pub fn read_document(path: &Path) -> Result<Document, ConvertError> {
    let raw = std::fs::read(path)?;
    let bytes = if is_gzip(path) {
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(raw.as_slice()).read_to_end(&mut out)?;
        out
    } else {
        raw
    };

    if is_binary(path) {
        let file = parse_binary(&bytes)?;
        return Ok(binary_to_document(&file)?);
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(cif::parse(&text)?)
}

/// Convert the file at `path`.
pub fn convert(
    path: &Path,
    options: &ConvertOptions,
    progress: &mut dyn FnMut(&Progress) -> ControlFlow<()>,
) -> Result<Vec<u8>, ConvertError> {
    log::info!("converting {}", path.display());
    let doc = read_document(path)?;
    let out = convert_document(&doc, options, progress)?;
    log::info!("wrote {} bytes", out.len());
    Ok(out)
}

fn cell_text(array: &TypedArray, row: usize) -> Option<String> {
    match array {
        TypedArray::Str(v) => v.get(row).cloned().flatten(),
        TypedArray::Float32(v) => v.get(row).map(f32::to_string),
        TypedArray::Float64(v) => v.get(row).map(f64::to_string),
        other => other.get_f64(row).map(|x| (x as i64).to_string()),
    }
}

/// Decode every column of a BinaryCIF file back into text values.
pub fn binary_to_document(file: &BinaryFile) -> Result<Document, DecodeError> {
    let mut blocks = Vec::with_capacity(file.data_blocks.len());
    for data_block in &file.data_blocks {
        let mut block = Block::new(data_block.header.clone());
        for category in &data_block.categories {
            let name = category.name.strip_prefix('_').unwrap_or(&category.name);
            let mut fields = Vec::with_capacity(category.columns.len());
            for column in &category.columns {
                let array = column.decode()?;
                let mask = column.decode_mask()?;
                let values = (0..category.row_count)
                    .map(|row| {
                        let kind = mask
                            .as_ref()
                            .and_then(|m| m.get(row).copied())
                            .unwrap_or(ValueKind::Present);
                        match (kind, cell_text(&array, row)) {
                            (ValueKind::NotPresent, _) => Value::Inapplicable,
                            (ValueKind::Unknown, _) => Value::Unknown,
                            (ValueKind::Present, Some(s)) => Value::Str(s),
                            (ValueKind::Present, None) => Value::Unknown,
                        }
                    })
                    .collect();
                fields.push((column.name.clone(), values));
            }
            block.add_fields(name, category.row_count, fields);
        }
        blocks.push(block);
    }
    Ok(Document { blocks })
}
