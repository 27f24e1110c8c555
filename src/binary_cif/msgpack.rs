//! Lightweight MessagePack value tree with reader and writer.

use std::io::{self, Read};

use super::encoding::{DataType, Encoding};
use super::error::DecodeError;

#[derive(Debug, Clone, PartialEq)]
pub enum MsgVal {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<MsgVal>),
    Map(Vec<(MsgVal, MsgVal)>),
}

impl MsgVal {
    /// A number written the way a dynamically typed encoder would: integral
    /// values as integers, everything else as float64.
    pub fn number(v: f64) -> Self {
        if v.fract() == 0.0 && v.abs() < 9.0e15 {
            MsgVal::Int(v as i64)
        } else {
            MsgVal::F64(v)
        }
    }

    /// Build a map with string keys, preserving order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, MsgVal)>) -> Self {
        MsgVal::Map(
            entries
                .into_iter()
                .map(|(k, v)| (MsgVal::Str(k.into()), v))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MsgVal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MsgVal::Int(v) => Some(*v),
            MsgVal::Uint(v) => Some(*v as i64),
            MsgVal::F64(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MsgVal::F64(v) => Some(*v),
            MsgVal::F32(v) => Some(*v as f64),
            MsgVal::Int(v) => Some(*v as f64),
            MsgVal::Uint(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MsgVal::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[MsgVal]> {
        match self {
            MsgVal::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bin(&self) -> Option<&[u8]> {
        match self {
            MsgVal::Bin(b) => Some(b),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&MsgVal> {
        match self {
            MsgVal::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

pub fn decode_msgpack(data: &[u8]) -> Result<MsgVal, DecodeError> {
    let mut cursor = io::Cursor::new(data);
    read_value(&mut cursor)
}

fn read_bytes<const N: usize>(rd: &mut io::Cursor<&[u8]>) -> Result<[u8; N], DecodeError> {
    let mut buf = [0u8; N];
    rd.read_exact(&mut buf)
        .map_err(|e| DecodeError::MsgPack(format!("read {N} bytes: {e}")))?;
    Ok(buf)
}

fn read_len<const N: usize>(rd: &mut io::Cursor<&[u8]>) -> Result<usize, DecodeError> {
    let b = read_bytes::<N>(rd)?;
    Ok(b.iter().fold(0usize, |acc, &x| (acc << 8) | x as usize))
}

fn read_value(rd: &mut io::Cursor<&[u8]>) -> Result<MsgVal, DecodeError> {
    use rmp::Marker;

    let marker = rmp::decode::read_marker(rd)
        .map_err(|e| DecodeError::MsgPack(format!("marker: {e:?}")))?;

    match marker {
        Marker::Null => Ok(MsgVal::Nil),
        Marker::True => Ok(MsgVal::Bool(true)),
        Marker::False => Ok(MsgVal::Bool(false)),

        Marker::FixPos(v) => Ok(MsgVal::Uint(v as u64)),
        Marker::FixNeg(v) => Ok(MsgVal::Int(v as i64)),

        Marker::U8 => Ok(MsgVal::Uint(read_bytes::<1>(rd)?[0] as u64)),
        Marker::U16 => Ok(MsgVal::Uint(u16::from_be_bytes(read_bytes(rd)?) as u64)),
        Marker::U32 => Ok(MsgVal::Uint(u32::from_be_bytes(read_bytes(rd)?) as u64)),
        Marker::U64 => Ok(MsgVal::Uint(u64::from_be_bytes(read_bytes(rd)?))),
        Marker::I8 => Ok(MsgVal::Int(read_bytes::<1>(rd)?[0] as i8 as i64)),
        Marker::I16 => Ok(MsgVal::Int(i16::from_be_bytes(read_bytes(rd)?) as i64)),
        Marker::I32 => Ok(MsgVal::Int(i32::from_be_bytes(read_bytes(rd)?) as i64)),
        Marker::I64 => Ok(MsgVal::Int(i64::from_be_bytes(read_bytes(rd)?))),
        Marker::F32 => Ok(MsgVal::F32(f32::from_be_bytes(read_bytes(rd)?))),
        Marker::F64 => Ok(MsgVal::F64(f64::from_be_bytes(read_bytes(rd)?))),

        Marker::FixStr(len) => read_string(rd, len as usize),
        Marker::Str8 => {
            let len = read_len::<1>(rd)?;
            read_string(rd, len)
        }
        Marker::Str16 => {
            let len = read_len::<2>(rd)?;
            read_string(rd, len)
        }
        Marker::Str32 => {
            let len = read_len::<4>(rd)?;
            read_string(rd, len)
        }

        Marker::Bin8 => {
            let len = read_len::<1>(rd)?;
            read_bin(rd, len)
        }
        Marker::Bin16 => {
            let len = read_len::<2>(rd)?;
            read_bin(rd, len)
        }
        Marker::Bin32 => {
            let len = read_len::<4>(rd)?;
            read_bin(rd, len)
        }

        Marker::FixArray(len) => read_array(rd, len as usize),
        Marker::Array16 => {
            let len = read_len::<2>(rd)?;
            read_array(rd, len)
        }
        Marker::Array32 => {
            let len = read_len::<4>(rd)?;
            read_array(rd, len)
        }

        Marker::FixMap(len) => read_map(rd, len as usize),
        Marker::Map16 => {
            let len = read_len::<2>(rd)?;
            read_map(rd, len)
        }
        Marker::Map32 => {
            let len = read_len::<4>(rd)?;
            read_map(rd, len)
        }

        other => Err(DecodeError::MsgPack(format!("unsupported marker: {other:?}"))),
    }
}

fn read_string(rd: &mut io::Cursor<&[u8]>, len: usize) -> Result<MsgVal, DecodeError> {
    let mut buf = vec![0u8; len];
    rd.read_exact(&mut buf)
        .map_err(|e| DecodeError::MsgPack(format!("string read: {e}")))?;
    let s = String::from_utf8(buf).map_err(|e| DecodeError::MsgPack(format!("string utf8: {e}")))?;
    Ok(MsgVal::Str(s))
}

fn read_bin(rd: &mut io::Cursor<&[u8]>, len: usize) -> Result<MsgVal, DecodeError> {
    let mut buf = vec![0u8; len];
    rd.read_exact(&mut buf)
        .map_err(|e| DecodeError::MsgPack(format!("bin read: {e}")))?;
    Ok(MsgVal::Bin(buf))
}

fn read_array(rd: &mut io::Cursor<&[u8]>, len: usize) -> Result<MsgVal, DecodeError> {
    let mut arr = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        arr.push(read_value(rd)?);
    }
    Ok(MsgVal::Array(arr))
}

fn read_map(rd: &mut io::Cursor<&[u8]>, len: usize) -> Result<MsgVal, DecodeError> {
    let mut pairs = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        let k = read_value(rd)?;
        let v = read_value(rd)?;
        pairs.push((k, v));
    }
    Ok(MsgVal::Map(pairs))
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

fn write_err(e: impl std::fmt::Debug) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("msgpack write: {e:?}"))
}

pub fn encode_msgpack(value: &MsgVal) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_value(&mut out, value)?;
    Ok(out)
}

pub fn write_value(wr: &mut Vec<u8>, value: &MsgVal) -> io::Result<()> {
    use rmp::encode;

    match value {
        MsgVal::Nil => encode::write_nil(wr).map_err(write_err)?,
        MsgVal::Bool(b) => encode::write_bool(wr, *b).map_err(write_err)?,
        MsgVal::Int(v) => {
            encode::write_sint(wr, *v).map_err(write_err)?;
        }
        MsgVal::Uint(v) => {
            encode::write_uint(wr, *v).map_err(write_err)?;
        }
        MsgVal::F32(v) => encode::write_f32(wr, *v).map_err(write_err)?,
        MsgVal::F64(v) => encode::write_f64(wr, *v).map_err(write_err)?,
        MsgVal::Str(s) => encode::write_str(wr, s).map_err(write_err)?,
        MsgVal::Bin(b) => encode::write_bin(wr, b).map_err(write_err)?,
        MsgVal::Array(items) => {
            encode::write_array_len(wr, items.len() as u32).map_err(write_err)?;
            for item in items {
                write_value(wr, item)?;
            }
        }
        MsgVal::Map(pairs) => {
            encode::write_map_len(wr, pairs.len() as u32).map_err(write_err)?;
            for (k, v) in pairs {
                write_value(wr, k)?;
                write_value(wr, v)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoding descriptors <-> msgpack maps
// ---------------------------------------------------------------------------

fn data_type_val(t: DataType) -> MsgVal {
    MsgVal::Uint(t.code() as u64)
}

impl From<&Encoding> for MsgVal {
    fn from(e: &Encoding) -> Self {
        let kind = ("kind", MsgVal::Str(e.kind().to_string()));
        match e {
            Encoding::ByteArray { data_type } => {
                MsgVal::map([kind, ("type", data_type_val(*data_type))])
            }
            Encoding::FixedPoint { factor, src_type } => MsgVal::map([
                kind,
                ("factor", MsgVal::number(*factor)),
                ("srcType", data_type_val(*src_type)),
            ]),
            Encoding::IntervalQuantization {
                min,
                max,
                num_steps,
                src_type,
            } => MsgVal::map([
                kind,
                ("min", MsgVal::number(*min)),
                ("max", MsgVal::number(*max)),
                ("numSteps", MsgVal::Int(*num_steps as i64)),
                ("srcType", data_type_val(*src_type)),
            ]),
            Encoding::RunLength { src_type, src_size } => MsgVal::map([
                kind,
                ("srcType", data_type_val(*src_type)),
                ("srcSize", MsgVal::Uint(*src_size as u64)),
            ]),
            Encoding::Delta { origin, src_type } => MsgVal::map([
                kind,
                ("origin", MsgVal::Int(*origin)),
                ("srcType", data_type_val(*src_type)),
            ]),
            Encoding::IntegerPacking {
                byte_count,
                is_unsigned,
                src_size,
            } => MsgVal::map([
                kind,
                ("byteCount", MsgVal::Uint(*byte_count as u64)),
                ("isUnsigned", MsgVal::Bool(*is_unsigned)),
                ("srcSize", MsgVal::Uint(*src_size as u64)),
            ]),
            Encoding::StringArray {
                data_encoding,
                string_data,
                offset_encoding,
                offsets,
            } => MsgVal::map([
                kind,
                ("dataEncoding", encodings_val(data_encoding)),
                ("stringData", MsgVal::Str(string_data.clone())),
                ("offsetEncoding", encodings_val(offset_encoding)),
                ("offsets", MsgVal::Bin(offsets.clone())),
            ]),
        }
    }
}

pub fn encodings_val(encodings: &[Encoding]) -> MsgVal {
    MsgVal::Array(encodings.iter().map(MsgVal::from).collect())
}

fn field<'a>(v: &'a MsgVal, kind: &str, key: &str) -> Result<&'a MsgVal, DecodeError> {
    v.get(key)
        .ok_or_else(|| DecodeError::InvalidFormat(format!("{kind} missing '{key}'")))
}

fn data_type_field(v: &MsgVal, kind: &str, key: &str) -> Result<DataType, DecodeError> {
    let code = field(v, kind, key)?
        .as_i64()
        .ok_or_else(|| DecodeError::InvalidFormat(format!("{kind} '{key}' is not an integer")))?;
    DataType::from_code(code as u8)
        .ok_or_else(|| DecodeError::InvalidFormat(format!("Unknown {kind} type: {code}")))
}

fn f64_field(v: &MsgVal, kind: &str, key: &str) -> Result<f64, DecodeError> {
    field(v, kind, key)?
        .as_f64()
        .ok_or_else(|| DecodeError::InvalidFormat(format!("{kind} '{key}' is not a number")))
}

fn i64_field(v: &MsgVal, kind: &str, key: &str) -> Result<i64, DecodeError> {
    field(v, kind, key)?
        .as_i64()
        .ok_or_else(|| DecodeError::InvalidFormat(format!("{kind} '{key}' is not an integer")))
}

pub fn encodings_from_val(v: &MsgVal) -> Result<Vec<Encoding>, DecodeError> {
    v.as_array()
        .ok_or_else(|| DecodeError::InvalidFormat("encoding is not an array".into()))?
        .iter()
        .map(Encoding::try_from)
        .collect()
}

impl TryFrom<&MsgVal> for Encoding {
    type Error = DecodeError;

    fn try_from(v: &MsgVal) -> Result<Self, Self::Error> {
        let kind = v
            .get("kind")
            .and_then(MsgVal::as_str)
            .ok_or_else(|| DecodeError::InvalidFormat("Encoding missing 'kind'".into()))?;

        Ok(match kind {
            "ByteArray" => Encoding::ByteArray {
                data_type: data_type_field(v, kind, "type")?,
            },
            "FixedPoint" => Encoding::FixedPoint {
                factor: f64_field(v, kind, "factor")?,
                src_type: data_type_field(v, kind, "srcType")?,
            },
            "IntervalQuantization" => Encoding::IntervalQuantization {
                min: f64_field(v, kind, "min")?,
                max: f64_field(v, kind, "max")?,
                num_steps: i64_field(v, kind, "numSteps")? as i32,
                src_type: data_type_field(v, kind, "srcType")?,
            },
            "RunLength" => Encoding::RunLength {
                src_type: data_type_field(v, kind, "srcType")?,
                src_size: i64_field(v, kind, "srcSize")? as usize,
            },
            "Delta" => Encoding::Delta {
                origin: v.get("origin").and_then(MsgVal::as_i64).unwrap_or(0),
                src_type: data_type_field(v, kind, "srcType")?,
            },
            "IntegerPacking" => Encoding::IntegerPacking {
                byte_count: i64_field(v, kind, "byteCount")? as u8,
                is_unsigned: v.get("isUnsigned").and_then(MsgVal::as_bool).unwrap_or(false),
                src_size: i64_field(v, kind, "srcSize")? as usize,
            },
            "StringArray" => Encoding::StringArray {
                data_encoding: encodings_from_val(field(v, kind, "dataEncoding")?)?,
                string_data: field(v, kind, "stringData")?
                    .as_str()
                    .ok_or_else(|| DecodeError::InvalidFormat("StringArray 'stringData' is not a string".into()))?
                    .to_string(),
                offset_encoding: encodings_from_val(field(v, kind, "offsetEncoding")?)?,
                offsets: field(v, kind, "offsets")?
                    .as_bin()
                    .ok_or_else(|| DecodeError::InvalidFormat("StringArray 'offsets' is not binary".into()))?
                    .to_vec(),
            },
            other => {
                return Err(DecodeError::InvalidFormat(format!(
                    "Unknown encoding kind: {other}"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_tree_round_trips() {
        let v = MsgVal::map([
            ("encoder", MsgVal::Str("test".into())),
            ("n", MsgVal::Int(-300)),
            ("big", MsgVal::Uint(70_000)),
            ("f", MsgVal::F64(1.5)),
            ("bin", MsgVal::Bin(vec![1, 2, 3])),
            ("list", MsgVal::Array(vec![MsgVal::Nil, MsgVal::Bool(true)])),
        ]);
        let bytes = encode_msgpack(&v).unwrap();
        let back = decode_msgpack(&bytes).unwrap();
        assert_eq!(back.get("encoder").and_then(MsgVal::as_str), Some("test"));
        assert_eq!(back.get("n").and_then(MsgVal::as_i64), Some(-300));
        assert_eq!(back.get("big").and_then(MsgVal::as_i64), Some(70_000));
        assert_eq!(back.get("f").and_then(MsgVal::as_f64), Some(1.5));
        assert_eq!(back.get("bin").and_then(MsgVal::as_bin), Some(&[1u8, 2, 3][..]));
        assert_eq!(back.get("list").and_then(MsgVal::as_array).map(|a| a.len()), Some(2));
    }

    #[test]
    fn integral_numbers_are_written_as_ints() {
        assert_eq!(MsgVal::number(100.0), MsgVal::Int(100));
        assert_eq!(MsgVal::number(0.5), MsgVal::F64(0.5));
    }

    #[test]
    fn encoding_descriptor_round_trips() {
        let encodings = vec![
            Encoding::FixedPoint {
                factor: 1000.0,
                src_type: DataType::Float32,
            },
            Encoding::IntervalQuantization {
                min: -1.5,
                max: 2.0,
                num_steps: 100,
                src_type: DataType::Float64,
            },
            Encoding::Delta {
                origin: -7,
                src_type: DataType::Int16,
            },
            Encoding::IntegerPacking {
                byte_count: 2,
                is_unsigned: false,
                src_size: 12,
            },
            Encoding::StringArray {
                data_encoding: vec![Encoding::ByteArray {
                    data_type: DataType::Int32,
                }],
                string_data: "ab".into(),
                offset_encoding: vec![Encoding::ByteArray {
                    data_type: DataType::Uint8,
                }],
                offsets: vec![0, 1, 2],
            },
        ];
        let bytes = encode_msgpack(&encodings_val(&encodings)).unwrap();
        let back = encodings_from_val(&decode_msgpack(&bytes).unwrap()).unwrap();
        assert_eq!(back, encodings);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let v = MsgVal::map([("kind", MsgVal::Str("Zip".into()))]);
        assert!(matches!(
            Encoding::try_from(&v),
            Err(DecodeError::InvalidFormat(_))
        ));
    }
}
