//! Homogeneous typed arrays flowing through encoding chains.

use super::encoding::DataType;

/// A fixed-length homogeneous column of numbers or strings.
///
/// `Str` entries are `None` when the value is absent; the string table
/// encoding maps those to index -1.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Str(Vec<Option<String>>),
}

/// Constructor tag for the array a field is materialised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    Float32,
    Float64,
    Str,
}

impl ArrayKind {
    /// Allocate a zero-filled array of this kind.
    pub fn zeroed(self, len: usize) -> TypedArray {
        match self {
            ArrayKind::Int8 => TypedArray::Int8(vec![0; len]),
            ArrayKind::Int16 => TypedArray::Int16(vec![0; len]),
            ArrayKind::Int32 => TypedArray::Int32(vec![0; len]),
            ArrayKind::Uint8 => TypedArray::Uint8(vec![0; len]),
            ArrayKind::Uint16 => TypedArray::Uint16(vec![0; len]),
            ArrayKind::Uint32 => TypedArray::Uint32(vec![0; len]),
            ArrayKind::Float32 => TypedArray::Float32(vec![0.0; len]),
            ArrayKind::Float64 => TypedArray::Float64(vec![0.0; len]),
            ArrayKind::Str => TypedArray::Str(vec![None; len]),
        }
    }

    pub fn from_data_type(t: DataType) -> Self {
        match t {
            DataType::Int8 => ArrayKind::Int8,
            DataType::Int16 => ArrayKind::Int16,
            DataType::Int32 => ArrayKind::Int32,
            DataType::Uint8 => ArrayKind::Uint8,
            DataType::Uint16 => ArrayKind::Uint16,
            DataType::Uint32 => ArrayKind::Uint32,
            DataType::Float32 => ArrayKind::Float32,
            DataType::Float64 => ArrayKind::Float64,
        }
    }
}

impl TypedArray {
    pub fn len(&self) -> usize {
        match self {
            TypedArray::Int8(v) => v.len(),
            TypedArray::Int16(v) => v.len(),
            TypedArray::Int32(v) => v.len(),
            TypedArray::Uint8(v) => v.len(),
            TypedArray::Uint16(v) => v.len(),
            TypedArray::Uint32(v) => v.len(),
            TypedArray::Float32(v) => v.len(),
            TypedArray::Float64(v) => v.len(),
            TypedArray::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric element type, `None` for string arrays.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            TypedArray::Int8(_) => Some(DataType::Int8),
            TypedArray::Int16(_) => Some(DataType::Int16),
            TypedArray::Int32(_) => Some(DataType::Int32),
            TypedArray::Uint8(_) => Some(DataType::Uint8),
            TypedArray::Uint16(_) => Some(DataType::Uint16),
            TypedArray::Uint32(_) => Some(DataType::Uint32),
            TypedArray::Float32(_) => Some(DataType::Float32),
            TypedArray::Float64(_) => Some(DataType::Float64),
            TypedArray::Str(_) => None,
        }
    }

    pub fn kind(&self) -> ArrayKind {
        match self.data_type() {
            Some(t) => ArrayKind::from_data_type(t),
            None => ArrayKind::Str,
        }
    }

    /// Short name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedArray::Int8(_) => "Int8Array",
            TypedArray::Int16(_) => "Int16Array",
            TypedArray::Int32(_) => "Int32Array",
            TypedArray::Uint8(_) => "Uint8Array",
            TypedArray::Uint16(_) => "Uint16Array",
            TypedArray::Uint32(_) => "Uint32Array",
            TypedArray::Float32(_) => "Float32Array",
            TypedArray::Float64(_) => "Float64Array",
            TypedArray::Str(_) => "string array",
        }
    }

    /// Numeric value at `i`; string arrays yield `None`.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            TypedArray::Int8(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Int16(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Int32(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Uint8(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Uint16(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Uint32(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Float32(v) => v.get(i).map(|&x| x as f64),
            TypedArray::Float64(v) => v.get(i).copied(),
            TypedArray::Str(_) => None,
        }
    }

    /// Numeric contents widened to `i64`. Floats are truncated.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        Some(match self {
            TypedArray::Int8(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Int16(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Int32(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Uint8(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Uint16(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Uint32(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Float32(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Float64(v) => v.iter().map(|&x| x as i64).collect(),
            TypedArray::Str(_) => return None,
        })
    }

    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        self.to_i64_vec()
            .map(|v| v.into_iter().map(|x| x as i32).collect())
    }

    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        Some(match self {
            TypedArray::Float64(v) => v.clone(),
            TypedArray::Str(_) => return None,
            other => (0..other.len()).filter_map(|i| other.get_f64(i)).collect(),
        })
    }

    /// Store a numeric value at `i`, casting to the element type.
    pub(crate) fn set_f64(&mut self, i: usize, value: f64) {
        match self {
            TypedArray::Int8(v) => v[i] = value as i8,
            TypedArray::Int16(v) => v[i] = value as i16,
            TypedArray::Int32(v) => v[i] = value as i32,
            TypedArray::Uint8(v) => v[i] = value as u8,
            TypedArray::Uint16(v) => v[i] = value as u16,
            TypedArray::Uint32(v) => v[i] = value as u32,
            TypedArray::Float32(v) => v[i] = value as f32,
            TypedArray::Float64(v) => v[i] = value,
            TypedArray::Str(v) => v[i] = Some(value.to_string()),
        }
    }

    /// Store an integer at `i` without a detour through `f64`.
    pub(crate) fn set_i64(&mut self, i: usize, value: i64) {
        match self {
            TypedArray::Int8(v) => v[i] = value as i8,
            TypedArray::Int16(v) => v[i] = value as i16,
            TypedArray::Int32(v) => v[i] = value as i32,
            TypedArray::Uint8(v) => v[i] = value as u8,
            TypedArray::Uint16(v) => v[i] = value as u16,
            TypedArray::Uint32(v) => v[i] = value as u32,
            TypedArray::Float32(v) => v[i] = value as f32,
            TypedArray::Float64(v) => v[i] = value as f64,
            TypedArray::Str(v) => v[i] = Some(value.to_string()),
        }
    }

    pub(crate) fn set_str(&mut self, i: usize, value: Option<String>) {
        if let TypedArray::Str(v) = self {
            v[i] = value;
        }
    }
}

impl From<Vec<i32>> for TypedArray {
    fn from(v: Vec<i32>) -> Self {
        TypedArray::Int32(v)
    }
}

impl From<Vec<f64>> for TypedArray {
    fn from(v: Vec<f64>) -> Self {
        TypedArray::Float64(v)
    }
}

impl From<Vec<u8>> for TypedArray {
    fn from(v: Vec<u8>) -> Self {
        TypedArray::Uint8(v)
    }
}

impl From<Vec<Option<String>>> for TypedArray {
    fn from(v: Vec<Option<String>>) -> Self {
        TypedArray::Str(v)
    }
}

impl From<Vec<&str>> for TypedArray {
    fn from(v: Vec<&str>) -> Self {
        TypedArray::Str(v.into_iter().map(|s| Some(s.to_string())).collect())
    }
}
