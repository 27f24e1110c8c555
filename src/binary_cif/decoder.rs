//! BinaryCIF container and column decoder.
//!
//! Inverts the transforms of [`super::array_encoder`], and reads the
//! MessagePack container produced by the binary writer (or any other
//! BinaryCIF producer) into a plain category/column tree.

use std::io::Read;
use std::path::Path;

use super::array::{ArrayKind, TypedArray};
use super::encoding::{DataType, EncodedData, Encoding, ValueKind};
use super::error::DecodeError;
use super::msgpack::{decode_msgpack, encodings_from_val, MsgVal};

/// Decode a column payload back into its source array.
pub fn decode(data: &EncodedData) -> Result<TypedArray, DecodeError> {
    decode_bytes(&data.data, &data.encoding)
}

/// Apply `encoding` in reverse to `bytes`.
pub fn decode_bytes(bytes: &[u8], encoding: &[Encoding]) -> Result<TypedArray, DecodeError> {
    let mut current = TypedArray::Uint8(bytes.to_vec());
    for enc in encoding.iter().rev() {
        current = match enc {
            Encoding::ByteArray { data_type } => decode_byte_array(current, *data_type)?,
            Encoding::FixedPoint { factor, src_type } => decode_fixed_point(current, *factor, *src_type)?,
            Encoding::IntervalQuantization {
                min,
                max,
                num_steps,
                src_type,
            } => decode_interval_quantization(current, *min, *max, *num_steps, *src_type)?,
            Encoding::RunLength { src_type, src_size } => decode_run_length(current, *src_type, *src_size)?,
            Encoding::Delta { origin, src_type } => decode_delta(current, *origin, *src_type)?,
            Encoding::IntegerPacking {
                byte_count,
                is_unsigned,
                src_size,
            } => decode_integer_packing(current, *byte_count, *is_unsigned, *src_size)?,
            Encoding::StringArray {
                data_encoding,
                string_data,
                offset_encoding,
                offsets,
            } => decode_string_array(current, data_encoding, string_data, offset_encoding, offsets)?,
        };
    }
    Ok(current)
}

fn expect_bytes(input: TypedArray, kind: &'static str) -> Result<Vec<u8>, DecodeError> {
    match input {
        TypedArray::Uint8(b) => Ok(b),
        _ => Err(DecodeError::UnexpectedInput {
            kind,
            expected: "bytes",
        }),
    }
}

fn expect_ints(input: &TypedArray, kind: &'static str) -> Result<Vec<i64>, DecodeError> {
    match input.data_type() {
        Some(t) if !t.is_float() => Ok(input.to_i64_vec().unwrap_or_default()),
        _ => Err(DecodeError::UnexpectedInput {
            kind,
            expected: "int array",
        }),
    }
}

fn decode_byte_array(input: TypedArray, data_type: DataType) -> Result<TypedArray, DecodeError> {
    let bytes = expect_bytes(input, "ByteArray")?;
    if bytes.len() % data_type.byte_size() != 0 {
        return Err(DecodeError::InvalidFormat(format!(
            "ByteArray length {} is not a multiple of {}",
            bytes.len(),
            data_type.byte_size()
        )));
    }

    Ok(match data_type {
        DataType::Int8 => TypedArray::Int8(bytes.iter().map(|&b| b as i8).collect()),
        DataType::Uint8 => TypedArray::Uint8(bytes),
        DataType::Int16 => TypedArray::Int16(bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect()),
        DataType::Uint16 => TypedArray::Uint16(bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect()),
        DataType::Int32 => TypedArray::Int32(bytes.chunks_exact(4).map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()),
        DataType::Uint32 => TypedArray::Uint32(bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()),
        DataType::Float32 => TypedArray::Float32(bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()),
        DataType::Float64 => TypedArray::Float64(
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
    })
}

fn float_output(values: impl Iterator<Item = f64>, src_type: DataType) -> TypedArray {
    match src_type {
        DataType::Float32 => TypedArray::Float32(values.map(|v| v as f32).collect()),
        _ => TypedArray::Float64(values.collect()),
    }
}

fn decode_fixed_point(input: TypedArray, factor: f64, src_type: DataType) -> Result<TypedArray, DecodeError> {
    let ints = expect_ints(&input, "FixedPoint")?;
    let inv = 1.0 / factor;
    Ok(float_output(ints.into_iter().map(|v| v as f64 * inv), src_type))
}

fn decode_interval_quantization(
    input: TypedArray,
    min: f64,
    max: f64,
    num_steps: i32,
    src_type: DataType,
) -> Result<TypedArray, DecodeError> {
    let ints = expect_ints(&input, "IntervalQuantization")?;
    let delta = (max - min) / (num_steps as f64 - 1.0);
    Ok(float_output(ints.into_iter().map(|v| min + v as f64 * delta), src_type))
}

fn decode_run_length(input: TypedArray, src_type: DataType, src_size: usize) -> Result<TypedArray, DecodeError> {
    let ints = expect_ints(&input, "RunLength")?;
    if ints.len() % 2 != 0 {
        return Err(DecodeError::InvalidFormat("RunLength array length must be even".into()));
    }

    let mut output = ArrayKind::from_data_type(src_type).zeroed(src_size);
    let mut offset = 0;
    for pair in ints.chunks_exact(2) {
        let (value, count) = (pair[0], pair[1].max(0) as usize);
        if offset + count > src_size {
            return Err(DecodeError::InvalidFormat("RunLength runs exceed srcSize".into()));
        }
        for i in offset..offset + count {
            output.set_i64(i, value);
        }
        offset += count;
    }
    Ok(output)
}

fn decode_delta(input: TypedArray, origin: i64, src_type: DataType) -> Result<TypedArray, DecodeError> {
    let ints = expect_ints(&input, "Delta")?;
    let mut output = ArrayKind::from_data_type(src_type).zeroed(ints.len());
    let mut acc = origin;
    for (i, d) in ints.into_iter().enumerate() {
        if i > 0 {
            acc += d;
        }
        output.set_i64(i, acc);
    }
    Ok(output)
}

fn decode_integer_packing(
    input: TypedArray,
    byte_count: u8,
    is_unsigned: bool,
    src_size: usize,
) -> Result<TypedArray, DecodeError> {
    let packed = expect_ints(&input, "IntegerPacking")?;

    let upper_limit: i64 = match (is_unsigned, byte_count) {
        (true, 1) => 0xFF,
        (true, _) => 0xFFFF,
        (false, 1) => 0x7F,
        (false, _) => 0x7FFF,
    };
    let lower_limit = if is_unsigned { 0 } else { -upper_limit - 1 };

    let mut result = Vec::with_capacity(src_size);
    let mut i = 0;
    while i < packed.len() && result.len() < src_size {
        let mut value = 0;
        let mut t = packed[i];
        while t == upper_limit || (!is_unsigned && t == lower_limit) {
            value += t;
            i += 1;
            if i >= packed.len() {
                break;
            }
            t = packed[i];
        }
        if i < packed.len() {
            value += t;
        }
        i += 1;
        result.push(value as i32);
    }

    Ok(TypedArray::Int32(result))
}

/// Byte index of every UTF-16 unit boundary in `s`, plus `s.len()`.
fn utf16_boundaries(s: &str) -> Vec<usize> {
    let mut out = Vec::with_capacity(s.len() + 1);
    for (byte, ch) in s.char_indices() {
        for _ in 0..ch.len_utf16() {
            out.push(byte);
        }
    }
    out.push(s.len());
    out
}

fn decode_string_array(
    input: TypedArray,
    data_encoding: &[Encoding],
    string_data: &str,
    offset_encoding: &[Encoding],
    offset_bytes: &[u8],
) -> Result<TypedArray, DecodeError> {
    let index_bytes = expect_bytes(input, "StringArray")?;

    let offsets = decode_bytes(offset_bytes, offset_encoding)?;
    let offsets = expect_ints(&offsets, "StringArray offsets")?;

    let boundaries = (!string_data.is_ascii()).then(|| utf16_boundaries(string_data));
    let byte_at = |unit: i64| -> Result<usize, DecodeError> {
        let unit = usize::try_from(unit)
            .map_err(|_| DecodeError::InvalidFormat("StringArray offset out of bounds".into()))?;
        let byte = match &boundaries {
            Some(b) => b.get(unit).copied(),
            None => Some(unit),
        };
        byte.filter(|&b| b <= string_data.len())
            .ok_or_else(|| DecodeError::InvalidFormat("StringArray offset out of bounds".into()))
    };

    let mut strings: Vec<&str> = Vec::with_capacity(offsets.len().saturating_sub(1));
    for w in offsets.windows(2) {
        let (start, end) = (byte_at(w[0])?, byte_at(w[1])?);
        let s = string_data
            .get(start..end)
            .ok_or_else(|| DecodeError::InvalidFormat("StringArray offset out of bounds".into()))?;
        strings.push(s);
    }

    let indices = decode_bytes(&index_bytes, data_encoding)?;
    let indices = expect_ints(&indices, "StringArray indices")?;
    let result = indices
        .iter()
        .map(|&idx| {
            usize::try_from(idx)
                .ok()
                .and_then(|i| strings.get(i))
                .map(|s| s.to_string())
        })
        .collect();

    Ok(TypedArray::Str(result))
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryColumn {
    pub name: String,
    pub data: EncodedData,
    pub mask: Option<EncodedData>,
}

impl BinaryColumn {
    pub fn decode(&self) -> Result<TypedArray, DecodeError> {
        decode(&self.data)
    }

    /// Per-row presence, `None` when every value is present.
    pub fn decode_mask(&self) -> Result<Option<Vec<ValueKind>>, DecodeError> {
        let Some(mask) = &self.mask else {
            return Ok(None);
        };
        let values = decode(mask)?;
        Ok(Some(
            values
                .to_i64_vec()
                .unwrap_or_default()
                .into_iter()
                .map(|v| ValueKind::from_code(v as u8))
                .collect(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCategory {
    /// Name including the leading underscore.
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<BinaryColumn>,
}

impl BinaryCategory {
    pub fn column(&self, name: &str) -> Option<&BinaryColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryDataBlock {
    pub header: String,
    pub categories: Vec<BinaryCategory>,
}

impl BinaryDataBlock {
    pub fn category(&self, name: &str) -> Option<&BinaryCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryFile {
    pub encoder: String,
    pub version: String,
    pub data_blocks: Vec<BinaryDataBlock>,
}

fn decompress_if_gzip(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| DecodeError::InvalidFormat(format!("Gzip decompression failed: {e}")))?;
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}

fn required<'a>(node: &'a MsgVal, key: &str, what: &str) -> Result<&'a MsgVal, DecodeError> {
    node.get(key)
        .ok_or_else(|| DecodeError::InvalidFormat(format!("Missing '{key}' in {what}")))
}

fn str_of(node: &MsgVal, key: &str, what: &str) -> Result<String, DecodeError> {
    required(node, key, what)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::InvalidFormat(format!("'{key}' in {what} is not a string")))
}

fn array_of<'a>(node: &'a MsgVal, key: &str, what: &str) -> Result<&'a [MsgVal], DecodeError> {
    required(node, key, what)?
        .as_array()
        .ok_or_else(|| DecodeError::InvalidFormat(format!("'{key}' in {what} is not an array")))
}

fn encoded_data(node: &MsgVal) -> Result<EncodedData, DecodeError> {
    let data = required(node, "data", "encoded data")?
        .as_bin()
        .ok_or_else(|| DecodeError::InvalidFormat("Column missing 'data' bytes".into()))?
        .to_vec();
    let encoding = encodings_from_val(required(node, "encoding", "encoded data")?)?;
    Ok(EncodedData { encoding, data })
}

fn parse_column(node: &MsgVal) -> Result<BinaryColumn, DecodeError> {
    let mask = match node.get("mask") {
        None | Some(MsgVal::Nil) => None,
        Some(m) => Some(encoded_data(m)?),
    };
    Ok(BinaryColumn {
        name: str_of(node, "name", "column")?,
        data: encoded_data(required(node, "data", "column")?)?,
        mask,
    })
}

fn parse_category(node: &MsgVal) -> Result<BinaryCategory, DecodeError> {
    let row_count = required(node, "rowCount", "category")?
        .as_i64()
        .ok_or_else(|| DecodeError::InvalidFormat("'rowCount' is not an integer".into()))?;
    Ok(BinaryCategory {
        name: str_of(node, "name", "category")?,
        row_count: row_count.max(0) as usize,
        columns: array_of(node, "columns", "category")?
            .iter()
            .map(parse_column)
            .collect::<Result<_, _>>()?,
    })
}

/// Parse a BinaryCIF container, gunzipping first if needed.
pub fn parse_binary(bytes: &[u8]) -> Result<BinaryFile, DecodeError> {
    let data = decompress_if_gzip(bytes)?;
    let root = decode_msgpack(&data)?;

    let data_blocks = array_of(&root, "dataBlocks", "file")?
        .iter()
        .map(|block| {
            Ok(BinaryDataBlock {
                header: str_of(block, "header", "data block")?,
                categories: array_of(block, "categories", "data block")?
                    .iter()
                    .map(parse_category)
                    .collect::<Result<_, DecodeError>>()?,
            })
        })
        .collect::<Result<_, DecodeError>>()?;

    Ok(BinaryFile {
        encoder: root.get("encoder").and_then(MsgVal::as_str).unwrap_or_default().to_string(),
        version: root.get("version").and_then(MsgVal::as_str).unwrap_or_default().to_string(),
        data_blocks,
    })
}

pub fn read_binary_file(path: &Path) -> Result<BinaryFile, DecodeError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DecodeError::InvalidFormat(format!("Failed to read file: {e}")))?;
    parse_binary(&bytes)
}
