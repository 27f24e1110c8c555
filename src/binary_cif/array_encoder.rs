//! Composable array encoders.
//!
//! An [`ArrayEncoder`] is an ordered chain of [`Provider`]s. Each provider
//! maps a typed array to a new typed array plus the encoding descriptors
//! needed to invert it. The chain must end in a byte array.
//!
//! Adapted from CIFTools.js and the MMTF integer packing scheme.

use std::collections::HashMap;

use super::array::{ArrayKind, TypedArray};
use super::classifier::classify_int_array;
use super::encoding::{DataType, EncodedData, Encoding};
use super::error::EncodingError;

/// Output of a single transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub encodings: Vec<Encoding>,
    pub data: TypedArray,
}

/// One transform of an encoding chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    ByteArray,
    FixedPoint(f64),
    IntervalQuantization {
        min: f64,
        max: f64,
        num_steps: i32,
        kind: ArrayKind,
    },
    RunLength,
    Delta,
    IntegerPacking,
    StringArray,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::ByteArray => "ByteArray",
            Provider::FixedPoint(_) => "FixedPoint",
            Provider::IntervalQuantization { .. } => "IntervalQuantization",
            Provider::RunLength => "RunLength",
            Provider::Delta => "Delta",
            Provider::IntegerPacking => "IntegerPacking",
            Provider::StringArray => "StringArray",
        }
    }

    pub fn apply(&self, data: TypedArray) -> Result<Step, EncodingError> {
        match self {
            Provider::ByteArray => byte_array(data),
            Provider::FixedPoint(factor) => fixed_point(data, *factor),
            Provider::IntervalQuantization {
                min,
                max,
                num_steps,
                kind,
            } => interval_quantization(data, *min, *max, *num_steps, *kind),
            Provider::RunLength => run_length(data),
            Provider::Delta => delta(data),
            Provider::IntegerPacking => integer_packing(data),
            Provider::StringArray => string_array(data),
        }
    }

    /// Provider that re-applies a recorded encoding step.
    pub fn from_encoding(e: &Encoding) -> Self {
        match e {
            Encoding::ByteArray { .. } => Provider::ByteArray,
            Encoding::FixedPoint { factor, .. } => Provider::FixedPoint(*factor),
            Encoding::IntervalQuantization {
                min, max, num_steps, ..
            } => Provider::IntervalQuantization {
                min: *min,
                max: *max,
                num_steps: *num_steps,
                kind: ArrayKind::Int32,
            },
            Encoding::RunLength { .. } => Provider::RunLength,
            Encoding::Delta { .. } => Provider::Delta,
            Encoding::IntegerPacking { .. } => Provider::IntegerPacking,
            Encoding::StringArray { .. } => Provider::StringArray,
        }
    }
}

/// An ordered chain of transforms terminating in a byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEncoder {
    providers: Vec<Provider>,
}

impl ArrayEncoder {
    pub fn by(provider: Provider) -> Self {
        Self {
            providers: vec![provider],
        }
    }

    /// Append a transform to the chain.
    pub fn and(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Rebuild a chain from recorded descriptors.
    ///
    /// `IntegerPacking` chooses its own trailing `ByteArray`, so the descriptor
    /// that follows it is not turned into a second provider.
    pub fn from_encoding(encoding: &[Encoding]) -> Self {
        let mut providers = Vec::with_capacity(encoding.len());
        let mut i = 0;
        while i < encoding.len() {
            let p = Provider::from_encoding(&encoding[i]);
            if p == Provider::IntegerPacking
                && matches!(encoding.get(i + 1), Some(Encoding::ByteArray { .. }))
            {
                i += 1;
            }
            providers.push(p);
            i += 1;
        }
        Self { providers }
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Run the chain, threading the output of each step into the next.
    pub fn encode(&self, data: TypedArray) -> Result<EncodedData, EncodingError> {
        if self.providers.is_empty() {
            return Err(EncodingError::EmptyChain);
        }

        let mut encoding = Vec::new();
        let mut data = data;
        for p in &self.providers {
            let step = p.apply(data)?;
            if step.encodings.is_empty() {
                return Err(EncodingError::EmptyEncoding(p.name()));
            }
            encoding.extend(step.encodings);
            data = step.data;
        }

        match data {
            TypedArray::Uint8(bytes) => Ok(EncodedData {
                encoding,
                data: bytes,
            }),
            other => Err(EncodingError::NonByteOutput(other.data_type())),
        }
    }
}

// ---------------------------------------------------------------------------
// ByteArray
// ---------------------------------------------------------------------------

/// Reinterpret a numeric array as little-endian bytes.
pub fn byte_array(data: TypedArray) -> Result<Step, EncodingError> {
    let (data_type, bytes) = match data {
        TypedArray::Uint8(v) => (DataType::Uint8, v),
        TypedArray::Int8(v) => (DataType::Int8, v.into_iter().map(|x| x as u8).collect()),
        TypedArray::Int16(v) => (DataType::Int16, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Uint16(v) => (DataType::Uint16, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Int32(v) => (DataType::Int32, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Uint32(v) => (DataType::Uint32, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Float32(v) => (DataType::Float32, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Float64(v) => (DataType::Float64, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        TypedArray::Str(_) => {
            return Err(EncodingError::UnsupportedType {
                provider: "ByteArray",
                found: "string array",
            })
        }
    };
    Ok(Step {
        encodings: vec![Encoding::ByteArray { data_type }],
        data: TypedArray::Uint8(bytes),
    })
}

// ---------------------------------------------------------------------------
// FixedPoint / IntervalQuantization
// ---------------------------------------------------------------------------

/// Round half towards positive infinity, matching the reference encoder.
pub(crate) fn round_half_up(x: f64) -> f64 {
    let f = x.floor();
    if x - f >= 0.5 {
        f + 1.0
    } else {
        f
    }
}

fn numeric_source(data: &TypedArray, provider: &'static str) -> Result<DataType, EncodingError> {
    data.data_type().ok_or(EncodingError::UnsupportedType {
        provider,
        found: data.type_name(),
    })
}

/// Scale by `factor` and round to Int32.
pub fn fixed_point(data: TypedArray, factor: f64) -> Result<Step, EncodingError> {
    let src_type = numeric_source(&data, "FixedPoint")?;
    let result: Vec<i32> = (0..data.len())
        .map(|i| round_half_up(data.get_f64(i).unwrap_or(0.0) * factor) as i32)
        .collect();
    Ok(Step {
        encodings: vec![Encoding::FixedPoint { factor, src_type }],
        data: TypedArray::Int32(result),
    })
}

/// Map values linearly onto `0..num_steps`, clamping at the bounds.
pub fn interval_quantization(
    data: TypedArray,
    min: f64,
    max: f64,
    num_steps: i32,
    kind: ArrayKind,
) -> Result<Step, EncodingError> {
    let src_type = numeric_source(&data, "IntervalQuantization")?;
    if data.is_empty() {
        return Ok(Step {
            encodings: vec![Encoding::IntervalQuantization {
                min,
                max,
                num_steps,
                src_type,
            }],
            data: TypedArray::Int32(Vec::new()),
        });
    }

    let (min, max) = if max < min { (max, min) } else { (min, max) };
    let delta = (max - min) / (num_steps - 1) as f64;
    let mut output = kind.zeroed(data.len());
    for i in 0..data.len() {
        let v = data.get_f64(i).unwrap_or(0.0);
        let q = if v <= min {
            0
        } else if v >= max {
            (num_steps - 1) as i64
        } else {
            round_half_up((v - min) / delta) as i64
        };
        output.set_i64(i, q);
    }

    Ok(Step {
        encodings: vec![Encoding::IntervalQuantization {
            min,
            max,
            num_steps,
            src_type,
        }],
        data: output,
    })
}

// ---------------------------------------------------------------------------
// RunLength / Delta
// ---------------------------------------------------------------------------

/// Emit `(value, count)` pairs for every maximal run of equal values.
pub fn run_length(data: TypedArray) -> Result<Step, EncodingError> {
    let src_type = numeric_source(&data, "RunLength")?;
    let n = data.len();
    if n == 0 {
        return Ok(Step {
            encodings: vec![Encoding::RunLength {
                src_type,
                src_size: 0,
            }],
            data: TypedArray::Int32(Vec::new()),
        });
    }

    let values = data.to_f64_vec().unwrap_or_default();
    let mut output = Vec::with_capacity(2 * (1 + values.windows(2).filter(|w| w[0] != w[1]).count()));
    let mut run = 1;
    for i in 1..n {
        if values[i - 1] != values[i] {
            output.push(round_half_up(values[i - 1]) as i32);
            output.push(run);
            run = 1;
        } else {
            run += 1;
        }
    }
    output.push(round_half_up(values[n - 1]) as i32);
    output.push(run);

    Ok(Step {
        encodings: vec![Encoding::RunLength {
            src_type,
            src_size: n,
        }],
        data: TypedArray::Int32(output),
    })
}

fn deltas(values: &[i64]) -> (i64, Vec<i64>) {
    let Some(&origin) = values.first() else {
        return (0, Vec::new());
    };
    let mut out = Vec::with_capacity(values.len());
    out.push(0);
    out.extend(values.windows(2).map(|w| w[1] - w[0]));
    (origin, out)
}

/// Integral float columns are rounded into Int32 before integer-only steps.
fn floats_as_int32(data: TypedArray) -> TypedArray {
    match data {
        TypedArray::Float32(v) => {
            TypedArray::Int32(v.into_iter().map(|x| round_half_up(x as f64) as i32).collect())
        }
        TypedArray::Float64(v) => {
            TypedArray::Int32(v.into_iter().map(|x| round_half_up(x) as i32).collect())
        }
        other => other,
    }
}

/// Replace each element by its difference to the predecessor. The first
/// element is stored as the origin and zeroed. Float input is rounded into
/// Int32 first.
pub fn delta(data: TypedArray) -> Result<Step, EncodingError> {
    let (src_type, origin, data) = match floats_as_int32(data) {
        TypedArray::Int8(v) => {
            let (o, d) = deltas(&v.iter().map(|&x| x as i64).collect::<Vec<_>>());
            (DataType::Int8, o, TypedArray::Int8(d.into_iter().map(|x| x as i8).collect()))
        }
        TypedArray::Int16(v) => {
            let (o, d) = deltas(&v.iter().map(|&x| x as i64).collect::<Vec<_>>());
            (DataType::Int16, o, TypedArray::Int16(d.into_iter().map(|x| x as i16).collect()))
        }
        TypedArray::Int32(v) => {
            let (o, d) = deltas(&v.iter().map(|&x| x as i64).collect::<Vec<_>>());
            (DataType::Int32, o, TypedArray::Int32(d.into_iter().map(|x| x as i32).collect()))
        }
        other => return Err(EncodingError::DeltaRequiresSignedInt(other.data_type())),
    };
    Ok(Step {
        encodings: vec![Encoding::Delta { origin, src_type }],
        data,
    })
}

// ---------------------------------------------------------------------------
// IntegerPacking
// ---------------------------------------------------------------------------

/// Chosen token width for integer packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packing {
    pub is_signed: bool,
    /// Number of packed tokens.
    pub size: usize,
    pub bytes_per_element: u8,
}

fn is_signed(data: &[i64]) -> bool {
    data.iter().any(|&v| v < 0)
}

fn packing_size_unsigned(data: &[i64], upper_limit: i64) -> usize {
    let extra: i64 = data.iter().map(|&v| v / upper_limit).sum();
    extra as usize + data.len()
}

fn packing_size_signed(data: &[i64], upper_limit: i64) -> usize {
    let lower_limit = -upper_limit - 1;
    let extra: i64 = data
        .iter()
        .map(|&v| if v >= 0 { v / upper_limit } else { v / lower_limit })
        .sum();
    extra as usize + data.len()
}

/// Pick 1-, 2- or 4-byte tokens, whichever gives the fewest bytes.
pub fn determine_packing(data: &[i64]) -> Packing {
    let signed = is_signed(data);
    let (size8, size16) = if signed {
        (packing_size_signed(data, 0x7F), packing_size_signed(data, 0x7FFF))
    } else {
        (packing_size_unsigned(data, 0xFF), packing_size_unsigned(data, 0xFFFF))
    };

    if data.len() * 4 < size16 * 2 {
        Packing {
            is_signed: signed,
            size: data.len(),
            bytes_per_element: 4,
        }
    } else if size16 * 2 < size8 {
        Packing {
            is_signed: signed,
            size: size16,
            bytes_per_element: 2,
        }
    } else {
        Packing {
            is_signed: signed,
            size: size8,
            bytes_per_element: 1,
        }
    }
}

fn pack_tokens(data: &[i64], packing: Packing) -> Vec<i64> {
    let upper_limit: i64 = match (packing.is_signed, packing.bytes_per_element) {
        (true, 1) => 0x7F,
        (true, _) => 0x7FFF,
        (false, 1) => 0xFF,
        (false, _) => 0xFFFF,
    };
    let lower_limit = -upper_limit - 1;

    let mut packed = Vec::with_capacity(packing.size);
    for &v in data {
        let mut value = v;
        if value >= 0 {
            while value >= upper_limit {
                packed.push(upper_limit);
                value -= upper_limit;
            }
        } else {
            while value <= lower_limit {
                packed.push(lower_limit);
                value -= lower_limit;
            }
        }
        packed.push(value);
    }
    packed
}

/// Split integers into 1- or 2-byte tokens using sentinel overflow. Falls
/// back to plain ByteArray when 4-byte words are the most compact.
pub fn integer_packing(data: TypedArray) -> Result<Step, EncodingError> {
    let data = floats_as_int32(data);
    if data.data_type().map_or(true, DataType::is_float) {
        return Err(EncodingError::UnsupportedType {
            provider: "IntegerPacking",
            found: data.type_name(),
        });
    }
    let values = data.to_i64_vec().unwrap_or_default();
    let packing = determine_packing(&values);
    if packing.bytes_per_element == 4 {
        return byte_array(data);
    }

    let tokens = pack_tokens(&values, packing);
    let packed = match (packing.is_signed, packing.bytes_per_element) {
        (true, 1) => TypedArray::Int8(tokens.into_iter().map(|t| t as i8).collect()),
        (true, _) => TypedArray::Int16(tokens.into_iter().map(|t| t as i16).collect()),
        (false, 1) => TypedArray::Uint8(tokens.into_iter().map(|t| t as u8).collect()),
        (false, _) => TypedArray::Uint16(tokens.into_iter().map(|t| t as u16).collect()),
    };
    let bytes = byte_array(packed)?;

    let mut encodings = vec![Encoding::IntegerPacking {
        byte_count: packing.bytes_per_element,
        is_unsigned: !packing.is_signed,
        src_size: values.len(),
    }];
    encodings.extend(bytes.encodings);
    Ok(Step {
        encodings,
        data: bytes.data,
    })
}

// ---------------------------------------------------------------------------
// StringArray
// ---------------------------------------------------------------------------

/// Length of a string in UTF-16 code units, the unit used for string table
/// offsets by existing readers.
pub(crate) fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Deduplicate strings into a table and encode the per-row indices.
pub fn string_array(data: TypedArray) -> Result<Step, EncodingError> {
    let TypedArray::Str(values) = data else {
        return Err(EncodingError::UnsupportedType {
            provider: "StringArray",
            found: data.type_name(),
        });
    };

    let mut map: HashMap<&str, i32> = HashMap::new();
    let mut string_data = String::new();
    let mut offsets = vec![0i32];
    let mut output = Vec::with_capacity(values.len());
    let mut acc_length = 0usize;

    for s in &values {
        let Some(s) = s.as_deref() else {
            output.push(-1);
            continue;
        };
        let index = match map.get(s) {
            Some(&index) => index,
            None => {
                acc_length += utf16_len(s);
                let index = (offsets.len() - 1) as i32;
                string_data.push_str(s);
                map.insert(s, index);
                offsets.push(acc_length as i32);
                index
            }
        };
        output.push(index);
    }

    let offsets = TypedArray::Int32(offsets);
    let encoded_offsets = classify_int_array(&offsets).encode(offsets)?;
    let output = TypedArray::Int32(output);
    let encoded_data = classify_int_array(&output).encode(output)?;

    Ok(Step {
        encodings: vec![Encoding::StringArray {
            data_encoding: encoded_data.encoding,
            string_data,
            offset_encoding: encoded_offsets.encoding,
            offsets: encoded_offsets.data,
        }],
        data: TypedArray::Uint8(encoded_data.data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(step: &Step) -> Vec<i32> {
        step.data.to_i32_vec().unwrap()
    }

    #[test]
    fn run_length_pairs() {
        let step = run_length(TypedArray::Int32(vec![5, 5, 5, 7, 7, 2])).unwrap();
        assert_eq!(ints(&step), vec![5, 3, 7, 2, 2, 1]);
        assert_eq!(
            step.encodings,
            vec![Encoding::RunLength {
                src_type: DataType::Int32,
                src_size: 6
            }]
        );
    }

    #[test]
    fn run_length_counts_sum_to_length() {
        let input = vec![1, 1, 2, 3, 3, 3, 3, 1, 1, 9];
        let step = run_length(TypedArray::Int32(input.clone())).unwrap();
        let out = ints(&step);
        let total: i32 = out.chunks(2).map(|p| p[1]).sum();
        assert_eq!(total as usize, input.len());
        assert_eq!(out.len() / 2, 5);
    }

    #[test]
    fn run_length_empty() {
        let step = run_length(TypedArray::Int32(Vec::new())).unwrap();
        assert!(step.data.is_empty());
        assert_eq!(
            step.encodings,
            vec![Encoding::RunLength {
                src_type: DataType::Int32,
                src_size: 0
            }]
        );
    }

    #[test]
    fn delta_zeroes_first_element() {
        let step = delta(TypedArray::Int32(vec![10, 12, 9])).unwrap();
        assert_eq!(ints(&step), vec![0, 2, -3]);
        assert_eq!(
            step.encodings,
            vec![Encoding::Delta {
                origin: 10,
                src_type: DataType::Int32
            }]
        );
    }

    #[test]
    fn delta_keeps_narrow_type() {
        let step = delta(TypedArray::Int16(vec![-4, 100, 90])).unwrap();
        assert_eq!(step.data, TypedArray::Int16(vec![0, 104, -10]));
    }

    #[test]
    fn delta_rejects_unsigned() {
        assert_eq!(
            delta(TypedArray::Uint8(vec![1, 2])).unwrap_err(),
            EncodingError::DeltaRequiresSignedInt(Some(DataType::Uint8))
        );
    }

    #[test]
    fn delta_rounds_integral_floats_into_int32() {
        let step = delta(TypedArray::Float64(vec![3.0, 4.9999999, 2.0])).unwrap();
        assert_eq!(ints(&step), vec![0, 2, -3]);
        assert_eq!(
            step.encodings,
            vec![Encoding::Delta {
                origin: 3,
                src_type: DataType::Int32
            }]
        );
    }

    #[test]
    fn fixed_point_scales_and_rounds() {
        let step = fixed_point(TypedArray::Float64(vec![1.006, 2.0, -0.5]), 100.0).unwrap();
        assert_eq!(ints(&step), vec![101, 200, -50]);
        assert_eq!(
            step.encodings,
            vec![Encoding::FixedPoint {
                factor: 100.0,
                src_type: DataType::Float64
            }]
        );
    }

    #[test]
    fn round_half_up_matches_reference() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }

    #[test]
    fn interval_quantization_clamps_and_swaps() {
        let data = TypedArray::Float64(vec![-1.0, 0.0, 0.5, 1.0, 2.0]);
        let step = interval_quantization(data, 1.0, 0.0, 3, ArrayKind::Int32).unwrap();
        assert_eq!(ints(&step), vec![0, 0, 1, 2, 2]);
        match &step.encodings[0] {
            Encoding::IntervalQuantization { min, max, .. } => {
                assert_eq!((*min, *max), (0.0, 1.0));
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn interval_quantization_degenerate_inputs() {
        let empty = interval_quantization(TypedArray::Float32(Vec::new()), 0.0, 1.0, 10, ArrayKind::Int32).unwrap();
        assert!(empty.data.is_empty());

        let same = interval_quantization(TypedArray::Float64(vec![0.5, 1.0, 3.0]), 1.0, 1.0, 4, ArrayKind::Uint8)
            .unwrap();
        assert_eq!(same.data, TypedArray::Uint8(vec![0, 0, 3]));
    }

    #[test]
    fn determine_packing_widths() {
        assert_eq!(determine_packing(&[1, 2, 3]).bytes_per_element, 1);
        assert_eq!(determine_packing(&[1000, 2000, 3000]).bytes_per_element, 2);
        assert_eq!(determine_packing(&[1 << 20, 1 << 21]).bytes_per_element, 4);

        let p = determine_packing(&[-1, 3000]);
        assert!(p.is_signed);
        assert_eq!(p.bytes_per_element, 2);
    }

    #[test]
    fn integer_packing_sentinel_tokens() {
        let values = vec![300i64, -200, 5];
        let packing = Packing {
            is_signed: true,
            size: 0,
            bytes_per_element: 1,
        };
        let tokens = pack_tokens(&values, packing);
        assert_eq!(tokens, vec![127, 127, 46, -128, -72, 5]);

        // Summing tokens up to each non-sentinel value reconstructs the input.
        let mut rebuilt = Vec::new();
        let mut acc = 0;
        for t in tokens {
            acc += t;
            if t != 127 && t != -128 {
                rebuilt.push(acc);
                acc = 0;
            }
        }
        assert_eq!(rebuilt, values);
    }

    #[test]
    fn integer_packing_wide_values_degenerate_to_byte_array() {
        let step = integer_packing(TypedArray::Int32(vec![1 << 24, -(1 << 24)])).unwrap();
        assert_eq!(
            step.encodings,
            vec![Encoding::ByteArray {
                data_type: DataType::Int32
            }]
        );
        assert_eq!(step.data.len(), 8);
    }

    #[test]
    fn integer_packing_descriptor() {
        let step = integer_packing(TypedArray::Int32(vec![1, 2, 255])).unwrap();
        assert_eq!(
            step.encodings,
            vec![
                Encoding::IntegerPacking {
                    byte_count: 1,
                    is_unsigned: true,
                    src_size: 3
                },
                Encoding::ByteArray {
                    data_type: DataType::Uint8
                }
            ]
        );
        assert_eq!(step.data, TypedArray::Uint8(vec![1, 2, 255, 0]));
    }

    #[test]
    fn byte_array_little_endian() {
        let step = byte_array(TypedArray::Int16(vec![1, -2])).unwrap();
        assert_eq!(step.data, TypedArray::Uint8(vec![1, 0, 0xFE, 0xFF]));
        let step = byte_array(TypedArray::Int8(vec![-1])).unwrap();
        assert_eq!(step.data, TypedArray::Uint8(vec![0xFF]));
    }

    #[test]
    fn string_array_deduplicates() {
        let data = TypedArray::Str(vec![
            Some("ALA".into()),
            Some("GLY".into()),
            None,
            Some("ALA".into()),
        ]);
        let step = string_array(data).unwrap();
        match &step.encodings[0] {
            Encoding::StringArray { string_data, .. } => assert_eq!(string_data, "ALAGLY"),
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn encoder_requires_byte_output() {
        let err = ArrayEncoder::by(Provider::Delta)
            .encode(TypedArray::Int32(vec![1, 2, 3]))
            .unwrap_err();
        assert_eq!(err, EncodingError::NonByteOutput(Some(DataType::Int32)));
    }

    #[test]
    fn encoder_chains_steps() {
        let encoded = ArrayEncoder::by(Provider::Delta)
            .and(Provider::RunLength)
            .and(Provider::IntegerPacking)
            .encode(TypedArray::Int32(vec![1, 2, 3, 4, 5]))
            .unwrap();
        assert_eq!(
            encoded.kinds(),
            vec!["Delta", "RunLength", "IntegerPacking", "ByteArray"]
        );
        // [0,1,1,1,1] -> [0,1,1,4]
        assert_eq!(encoded.data, vec![0, 1, 1, 4]);
    }

    #[test]
    fn from_encoding_rebuilds_chain() {
        let encoder = ArrayEncoder::by(Provider::Delta)
            .and(Provider::RunLength)
            .and(Provider::IntegerPacking);
        let encoded = encoder.encode(TypedArray::Int32(vec![3, 4, 5, 9])).unwrap();
        let rebuilt = ArrayEncoder::from_encoding(&encoded.encoding);
        assert_eq!(rebuilt, encoder);
        let again = rebuilt.encode(TypedArray::Int32(vec![3, 4, 5, 9])).unwrap();
        assert_eq!(again, encoded);
    }
}
