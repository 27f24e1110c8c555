//! Error types for the BinaryCIF codec.

use thiserror::Error;

use super::encoding::DataType;

/// A misconfigured encoding chain. These indicate a programming mistake in
/// how an encoder was assembled, not a property of the data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("encoding chain must contain at least one provider")]
    EmptyChain,
    #[error("encoding step '{0}' produced no encodings")]
    EmptyEncoding(&'static str),
    #[error("the encoding must result in a byte array, got {0:?}; fix the encoding chain")]
    NonByteOutput(Option<DataType>),
    #[error("only signed integer types can be delta encoded, got {0:?}")]
    DeltaRequiresSignedInt(Option<DataType>),
    #[error("{provider} cannot be applied to {found}")]
    UnsupportedType {
        provider: &'static str,
        found: &'static str,
    },
}

/// Malformed container or column data encountered while decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Invalid BinaryCIF: {0}")]
    InvalidFormat(String),
    #[error("{kind} expects {expected} input")]
    UnexpectedInput {
        kind: &'static str,
        expected: &'static str,
    },
    #[error("msgpack: {0}")]
    MsgPack(String),
}
