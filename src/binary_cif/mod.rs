//! BinaryCIF columnar codec: typed arrays, composable encoders, automatic
//! chain selection and the inverse decoder.

pub mod array;
pub mod array_encoder;
pub mod classifier;
pub mod decoder;
pub mod encoding;
pub mod error;
pub mod msgpack;

pub use array::{ArrayKind, TypedArray};
pub use array_encoder::{ArrayEncoder, Provider};
pub use classifier::{classify_float_array, classify_int_array};
pub use decoder::{decode, parse_binary, BinaryCategory, BinaryColumn, BinaryDataBlock, BinaryFile};
pub use encoding::{DataType, EncodedData, Encoding, ValueKind, VERSION};
pub use error::{DecodeError, EncodingError};
