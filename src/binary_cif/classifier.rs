//! Automatic selection of integer and float encoding chains.
//!
//! Integer columns are costed against four candidate chains (packing,
//! run-length, delta, delta + run-length) and the one with the smallest
//! projected byte length wins. Float columns are scaled to integers when a
//! small number of decimal digits represents them exactly.

use super::array::TypedArray;
use super::array_encoder::{round_half_up, ArrayEncoder, Provider};
use crate::util::number::array_digit_count;

const MAX_FLOAT_DIGITS: i32 = 4;
const FLOAT_DELTA: f64 = 1e-6;

/// Candidate chain shapes for integer columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntChain {
    Pack,
    Rle,
    Delta,
    DeltaRle,
}

impl IntChain {
    fn providers(self) -> &'static [Provider] {
        match self {
            IntChain::Pack => &[Provider::IntegerPacking],
            IntChain::Rle => &[Provider::RunLength, Provider::IntegerPacking],
            IntChain::Delta => &[Provider::Delta, Provider::IntegerPacking],
            IntChain::DeltaRle => &[
                Provider::Delta,
                Provider::RunLength,
                Provider::IntegerPacking,
            ],
        }
    }
}

/// Projected encoded size of one candidate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub kind: IntChain,
    /// Projected byte length.
    pub length: usize,
    /// Bytes per packed element (1, 2 or 4).
    pub elem: u8,
}

#[derive(Clone, Copy)]
struct Limits {
    limit8: i64,
    limit16: i64,
}

const SIGNED: Limits = Limits {
    limit8: 0x7F,
    limit16: 0x7FFF,
};
const UNSIGNED: Limits = Limits {
    limit8: 0xFF,
    limit16: 0xFFFF,
};

#[derive(Default)]
struct SizeInfo {
    pack8: usize,
    pack16: usize,
    count: usize,
}

fn pack_size(value: i64, upper_limit: i64) -> usize {
    let v = (value + 1) as f64;
    let size = if value >= 0 {
        (v / upper_limit as f64).ceil()
    } else {
        (v / (-upper_limit - 1) as f64).ceil()
    };
    size as usize
}

impl SizeInfo {
    fn inc(&mut self, limits: Limits, value: i64) {
        self.pack8 += pack_size(value, limits.limit8);
        self.pack16 += pack_size(value, limits.limit16);
        self.count += 1;
    }

    fn estimate(&self, kind: IntChain) -> SizeEstimate {
        let (length, elem) = if self.count * 4 < self.pack16 * 2 {
            (self.count * 4, 4)
        } else if self.pack16 * 2 < self.pack8 {
            (self.pack16 * 2, 2)
        } else {
            (self.pack8, 1)
        };
        SizeEstimate { kind, length, elem }
    }
}

fn packing_size(data: &[i64], limits: Limits) -> SizeEstimate {
    let mut size = SizeInfo::default();
    for &v in data {
        size.inc(limits, v);
    }
    size.estimate(IntChain::Pack)
}

fn delta_size(data: &[i64]) -> SizeEstimate {
    let mut size = SizeInfo::default();
    for w in data.windows(2) {
        size.inc(SIGNED, w[1] - w[0]);
    }
    size.estimate(IntChain::Delta)
}

fn rle_size(data: &[i64], limits: Limits) -> SizeEstimate {
    let mut size = SizeInfo::default();
    let mut run = 1;
    for i in 1..data.len() {
        if data[i - 1] != data[i] {
            size.inc(limits, data[i - 1]);
            size.inc(limits, run);
            run = 1;
        } else {
            run += 1;
        }
    }
    if let Some(&last) = data.last() {
        size.inc(limits, last);
    }
    size.inc(limits, run);
    size.estimate(IntChain::Rle)
}

// The first difference is taken against 0 rather than data[0]. Readers only
// see the chosen chain, so this only affects which candidate wins.
fn delta_rle_size(data: &[i64]) -> SizeEstimate {
    let mut size = SizeInfo::default();
    let mut run = 1;
    let mut prev = 0;
    let mut prev_value = 0;
    for &x in data.iter().skip(1) {
        let v = x - prev;
        if prev_value != v {
            size.inc(SIGNED, prev_value);
            size.inc(SIGNED, run);
            run = 1;
        } else {
            run += 1;
        }
        prev_value = v;
        prev = x;
    }
    size.inc(SIGNED, prev_value);
    size.inc(SIGNED, run);
    size.estimate(IntChain::DeltaRle)
}

/// Projected sizes of all four candidate chains, smallest first. Ties keep
/// the order pack, rle, delta, delta-rle.
pub fn int_sizes(data: &[i64]) -> Vec<SizeEstimate> {
    let limits = if data.iter().any(|&v| v < 0) {
        SIGNED
    } else {
        UNSIGNED
    };
    let mut sizes = vec![
        packing_size(data, limits),
        rle_size(data, limits),
        delta_size(data),
        delta_rle_size(data),
    ];
    sizes.sort_by_key(|s| s.length);
    sizes
}

fn chain(prefix: Option<Provider>, kind: IntChain) -> ArrayEncoder {
    let mut providers = prefix.into_iter().chain(kind.providers().iter().cloned());
    let Some(first) = providers.next() else {
        return ArrayEncoder::by(Provider::ByteArray);
    };
    providers.fold(ArrayEncoder::by(first), ArrayEncoder::and)
}

fn classify_ints(values: &[i64], prefix: Option<Provider>) -> ArrayEncoder {
    let kind = int_sizes(values)
        .first()
        .map_or(IntChain::Pack, |s| s.kind);
    chain(prefix, kind)
}

/// Choose the smallest chain for an integer column. Arrays shorter than two
/// elements are stored as raw bytes.
pub fn classify_int_array(data: &TypedArray) -> ArrayEncoder {
    if data.len() < 2 {
        return ArrayEncoder::by(Provider::ByteArray);
    }
    match data.to_i64_vec() {
        Some(values) => classify_ints(&values, None),
        None => ArrayEncoder::by(Provider::ByteArray),
    }
}

/// Choose a chain for a float column.
///
/// Values that need more than four decimal places, or more than ten
/// significant digits overall, are stored as raw bytes. Otherwise the column
/// is scaled by `10^m` into Int32 and the integer candidates are costed on
/// the scaled values. Integral columns skip the scaling and are classified
/// as integers.
pub fn classify_float_array(data: &TypedArray) -> ArrayEncoder {
    let Some(values) = data.to_f64_vec() else {
        return ArrayEncoder::by(Provider::ByteArray);
    };
    let digits = array_digit_count(&values, MAX_FLOAT_DIGITS, FLOAT_DELTA);
    if digits.mantissa < 0 || digits.mantissa + digits.integer > 10 {
        return ArrayEncoder::by(Provider::ByteArray);
    }
    if digits.mantissa == 0 {
        if values.len() < 2 {
            return ArrayEncoder::by(Provider::ByteArray);
        }
        let rounded: Vec<i64> = values.iter().map(|&v| round_half_up(v) as i64).collect();
        return classify_ints(&rounded, None);
    }

    let multiplier = 10f64.powi(digits.mantissa);
    let scaled: Vec<i64> = values
        .iter()
        .map(|&v| round_half_up(multiplier * v) as i32 as i64)
        .collect();
    classify_ints(&scaled, Some(Provider::FixedPoint(multiplier)))
}
