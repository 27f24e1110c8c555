//! CIF category writers.
//!
//! Categories describe their columns as [`Field`]s over borrowed row data.
//! A [`BinaryEncoder`] turns them into a BinaryCIF container; a
//! [`TextEncoder`] writes the same categories as CIF text.
//!
//! ```ignore
//! let mut enc = BinaryEncoder::new(BinaryEncoderOptions::default());
//! enc.start_data_block("1abc");
//! enc.write_category(&atom_site, &model)?;
//! let bytes = enc.get_data()?;
//! ```

pub mod binary;
pub mod category;
pub mod field;
pub mod hints;
pub mod text;

use thiserror::Error;

use crate::binary_cif::EncodingError;

pub use binary::{BinaryEncoder, BinaryEncoderOptions};
pub use category::{
    Category, CategoryFilter, CategoryFormatter, CategoryInstance, CategorySource, DefaultFilter,
    DefaultFormatter, DirectiveFilter, FormatTable,
};
pub use field::{
    tensor_fields, Field, FieldBuilder, FieldFormat, FieldParams, FieldType, FieldValue,
};
pub use hints::{EncodingHint, EncodingProvider, HintsEncodingProvider};
pub use text::TextEncoder;

/// Misuse of a writer or of a field definition.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("the writer contents have already been encoded, no more writing")]
    AlreadyEncoded,
    #[error("no data block created")]
    NoDataBlock,
    #[error("tensor rank must be 1, 2 or 3, got {0}")]
    TensorRank(usize),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("failed to serialize container: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Write the category even if the filter excludes it.
    pub ignore_filter: bool,
}

/// Common interface of the binary and text writers.
pub trait Encoder {
    /// `None` restores the include-everything filter.
    fn set_filter(&mut self, filter: Option<Box<dyn CategoryFilter>>);
    fn set_formatter(&mut self, formatter: Option<Box<dyn CategoryFormatter>>);
    fn is_category_included(&self, name: &str) -> bool;
    fn start_data_block(&mut self, header: &str);

    fn write_category_with<C: Category>(
        &mut self,
        category: &C,
        ctx: &C::Context,
        options: WriteOptions,
    ) -> Result<(), WriterError>;

    fn write_category<C: Category>(
        &mut self,
        category: &C,
        ctx: &C::Context,
    ) -> Result<(), WriterError> {
        self.write_category_with(category, ctx, WriteOptions::default())
    }

    /// Finish writing and return the output. Repeated calls return the same
    /// bytes; further writes fail with [`WriterError::AlreadyEncoded`].
    fn get_data(&mut self) -> Result<&[u8], WriterError>;
}

/// Normalized data block header: spaces, tabs and line breaks removed,
/// uppercased.
pub(crate) fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\t'))
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("1abc"), "1ABC");
        assert_eq!(normalize_header(" my\tblock\nname "), "MYBLOCKNAME");
        assert_eq!(normalize_header(""), "");
    }
}
