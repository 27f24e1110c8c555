//! BinaryCIF encoding descriptors.
//!
//! Every column in a BinaryCIF container carries the ordered list of
//! transforms that produced its byte payload. Decoding applies them in
//! reverse.
//!
//! Reference: https://github.com/molstar/BinaryCIF/blob/master/encoding.md

use serde::{Deserialize, Serialize};

/// Version string written into the container envelope.
pub const VERSION: &str = "0.3.0";

/// Element type of a typed numeric array, with its BinaryCIF wire code.
///
/// Type IDs: Int8=1, Int16=2, Int32=3, Uint8=4, Uint16=5, Uint32=6, Float32=32, Float64=33
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    Float32,
    Float64,
}

impl DataType {
    pub fn code(self) -> u8 {
        match self {
            DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 => 3,
            DataType::Uint8 => 4,
            DataType::Uint16 => 5,
            DataType::Uint32 => 6,
            DataType::Float32 => 32,
            DataType::Float64 => 33,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DataType::Int8),
            2 => Some(DataType::Int16),
            3 => Some(DataType::Int32),
            4 => Some(DataType::Uint8),
            5 => Some(DataType::Uint16),
            6 => Some(DataType::Uint32),
            32 => Some(DataType::Float32),
            33 => Some(DataType::Float64),
            _ => None,
        }
    }

    /// Width of one element in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            DataType::Int8 | DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, DataType::Int8 | DataType::Int16 | DataType::Int32)
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }
}

impl From<DataType> for u8 {
    fn from(t: DataType) -> u8 {
        t.code()
    }
}

impl TryFrom<u8> for DataType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DataType::from_code(code).ok_or_else(|| format!("unknown data type code {code}"))
    }
}

/// Per-row presence code stored in column masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Present = 0,
    /// `.` in text CIF.
    NotPresent = 1,
    /// `?` in text CIF.
    Unknown = 2,
}

impl ValueKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Unrecognised codes are treated as present.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ValueKind::NotPresent,
            2 => ValueKind::Unknown,
            _ => ValueKind::Present,
        }
    }
}

/// One step of an encoding chain, in the order it was applied.
///
/// The serde representation matches the descriptor maps of the container
/// (`{"kind": "Delta", "origin": 10, "srcType": 3}`), which is also the
/// format accepted by encoding hint files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Encoding {
    ByteArray {
        #[serde(rename = "type")]
        data_type: DataType,
    },
    FixedPoint {
        factor: f64,
        #[serde(rename = "srcType")]
        src_type: DataType,
    },
    IntervalQuantization {
        min: f64,
        max: f64,
        #[serde(rename = "numSteps")]
        num_steps: i32,
        #[serde(rename = "srcType")]
        src_type: DataType,
    },
    RunLength {
        #[serde(rename = "srcType")]
        src_type: DataType,
        #[serde(rename = "srcSize")]
        src_size: usize,
    },
    Delta {
        origin: i64,
        #[serde(rename = "srcType")]
        src_type: DataType,
    },
    IntegerPacking {
        #[serde(rename = "byteCount")]
        byte_count: u8,
        #[serde(rename = "isUnsigned")]
        is_unsigned: bool,
        #[serde(rename = "srcSize")]
        src_size: usize,
    },
    StringArray {
        #[serde(rename = "dataEncoding")]
        data_encoding: Vec<Encoding>,
        #[serde(rename = "stringData")]
        string_data: String,
        #[serde(rename = "offsetEncoding")]
        offset_encoding: Vec<Encoding>,
        #[serde(skip)]
        offsets: Vec<u8>,
    },
}

impl Encoding {
    /// The `kind` tag as written to the container.
    pub fn kind(&self) -> &'static str {
        match self {
            Encoding::ByteArray { .. } => "ByteArray",
            Encoding::FixedPoint { .. } => "FixedPoint",
            Encoding::IntervalQuantization { .. } => "IntervalQuantization",
            Encoding::RunLength { .. } => "RunLength",
            Encoding::Delta { .. } => "Delta",
            Encoding::IntegerPacking { .. } => "IntegerPacking",
            Encoding::StringArray { .. } => "StringArray",
        }
    }
}

/// A column payload: the applied encodings plus the final byte buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedData {
    pub encoding: Vec<Encoding>,
    pub data: Vec<u8>,
}

impl EncodedData {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.encoding.iter().map(Encoding::kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_codes_round_trip() {
        for t in [
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Uint8,
            DataType::Uint16,
            DataType::Uint32,
            DataType::Float32,
            DataType::Float64,
        ] {
            assert_eq!(DataType::from_code(t.code()), Some(t));
        }
        assert_eq!(DataType::from_code(7), None);
    }

    #[test]
    fn encoding_json_uses_wire_names() {
        let e = Encoding::Delta {
            origin: 10,
            src_type: DataType::Int32,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"kind":"Delta","origin":10,"srcType":3}"#);

        let parsed: Encoding =
            serde_json::from_str(r#"{"kind":"IntegerPacking","byteCount":1,"isUnsigned":true,"srcSize":4}"#)
                .unwrap();
        assert_eq!(
            parsed,
            Encoding::IntegerPacking {
                byte_count: 1,
                is_unsigned: true,
                src_size: 4
            }
        );
    }
}
