//! BinaryCIF container writer.

use crate::binary_cif::msgpack::{encode_msgpack, encodings_val, MsgVal};
use crate::binary_cif::{
    classify_float_array, classify_int_array, ArrayEncoder, ArrayKind, BinaryCategory,
    BinaryColumn, BinaryDataBlock, EncodedData, Provider, TypedArray, ValueKind, VERSION,
};

use super::category::{
    Category, CategoryFilter, CategoryFormatter, CategoryInstance, DefaultFilter,
    DefaultFormatter,
};
use super::field::{Field, FieldFormat, FieldType, FieldValue};
use super::hints::EncodingProvider;
use super::{normalize_header, Encoder, WriteOptions, WriterError};

pub struct BinaryEncoderOptions {
    /// Written into the container's `encoder` entry.
    pub encoder_name: String,
    /// Pick encoders with the classifier when a field has none.
    pub auto_classify: bool,
    pub encoding_provider: Option<Box<dyn EncodingProvider>>,
}

impl Default for BinaryEncoderOptions {
    fn default() -> Self {
        Self {
            encoder_name: concat!("molpack ", env!("CARGO_PKG_VERSION")).to_string(),
            auto_classify: false,
            encoding_provider: None,
        }
    }
}

pub struct BinaryEncoder {
    encoder_name: String,
    auto_classify: bool,
    encoding_provider: Option<Box<dyn EncodingProvider>>,
    filter: Box<dyn CategoryFilter>,
    formatter: Box<dyn CategoryFormatter>,
    /// Dropped once the container is encoded.
    data_blocks: Option<Vec<BinaryDataBlock>>,
    encoded: Option<Vec<u8>>,
}

impl BinaryEncoder {
    pub fn new(options: BinaryEncoderOptions) -> Self {
        Self {
            encoder_name: options.encoder_name,
            auto_classify: options.auto_classify,
            encoding_provider: options.encoding_provider,
            filter: Box::new(DefaultFilter),
            formatter: Box::new(DefaultFormatter),
            data_blocks: Some(Vec::new()),
            encoded: None,
        }
    }

    /// Serialize the container. Later calls are no-ops.
    pub fn encode(&mut self) -> Result<(), WriterError> {
        if self.encoded.is_some() {
            return Ok(());
        }
        let blocks = self.data_blocks.take().unwrap_or_default();
        let root = MsgVal::map([
            ("encoder", MsgVal::Str(self.encoder_name.clone())),
            ("version", MsgVal::Str(VERSION.to_string())),
            (
                "dataBlocks",
                MsgVal::Array(blocks.iter().map(block_val).collect()),
            ),
        ]);
        let bytes = encode_msgpack(&root)?;
        log::debug!(
            "encoded {} data block(s) into {} bytes",
            blocks.len(),
            bytes.len()
        );
        self.encoded = Some(bytes);
        Ok(())
    }

    /// Size of the encoded container, once [`encode`](Self::encode) has run.
    pub fn get_size(&self) -> Option<usize> {
        self.encoded.as_ref().map(Vec::len)
    }
}

impl Encoder for BinaryEncoder {
    fn set_filter(&mut self, filter: Option<Box<dyn CategoryFilter>>) {
        self.filter = filter.unwrap_or_else(|| Box::new(DefaultFilter));
    }

    fn set_formatter(&mut self, formatter: Option<Box<dyn CategoryFormatter>>) {
        self.formatter = formatter.unwrap_or_else(|| Box::new(DefaultFormatter));
    }

    fn is_category_included(&self, name: &str) -> bool {
        self.filter.include_category(name)
    }

    fn start_data_block(&mut self, header: &str) {
        if let Some(blocks) = self.data_blocks.as_mut() {
            blocks.push(BinaryDataBlock {
                header: normalize_header(header),
                categories: Vec::new(),
            });
        }
    }

    fn write_category_with<C: Category>(
        &mut self,
        category: &C,
        ctx: &C::Context,
        options: WriteOptions,
    ) -> Result<(), WriterError> {
        let Some(blocks) = self.data_blocks.as_mut() else {
            return Err(WriterError::AlreadyEncoded);
        };
        let Some(block) = blocks.last_mut() else {
            return Err(WriterError::NoDataBlock);
        };

        let name = category.name();
        if !options.ignore_filter && !self.filter.include_category(name) {
            log::debug!("category '{name}' filtered out");
            return Ok(());
        }

        let instance = category.instance(ctx);
        let row_count = instance.row_count();
        if row_count == 0 {
            log::debug!("category '{name}' has no rows, skipped");
            return Ok(());
        }

        let mut columns = Vec::new();
        for field in instance.included_fields() {
            if !self.filter.include_field(name, &field.name) {
                continue;
            }
            let format = self.formatter.get_format(name, &field.name);
            columns.push(encode_field(
                name,
                field,
                &instance,
                row_count,
                format.as_ref(),
                self.encoding_provider.as_deref(),
                self.auto_classify,
            )?);
        }

        if columns.is_empty() {
            log::debug!("category '{name}' has no included columns, skipped");
            return Ok(());
        }

        block.categories.push(BinaryCategory {
            name: format!("_{name}"),
            row_count,
            columns,
        });
        Ok(())
    }

    fn get_data(&mut self) -> Result<&[u8], WriterError> {
        self.encode()?;
        Ok(self.encoded.as_deref().unwrap_or_default())
    }
}

fn array_kind<D>(field: &Field<D>, format: Option<&FieldFormat>) -> ArrayKind {
    format
        .and_then(|f| f.array_kind)
        .or_else(|| field.default_format.as_ref().and_then(|f| f.array_kind))
        .unwrap_or(match field.field_type {
            FieldType::Str => ArrayKind::Str,
            FieldType::Int => ArrayKind::Int32,
            FieldType::Float => ArrayKind::Float64,
        })
}

fn try_get_encoder<D>(
    category: &str,
    field: &Field<D>,
    format: Option<&FieldFormat>,
    provider: Option<&dyn EncodingProvider>,
) -> Option<ArrayEncoder> {
    format
        .and_then(|f| f.encoder.clone())
        .or_else(|| field.default_format.as_ref().and_then(|f| f.encoder.clone()))
        .or_else(|| provider.and_then(|p| p.get(category, &field.name)))
}

fn classify(field_type: FieldType, data: &TypedArray) -> ArrayEncoder {
    match field_type {
        FieldType::Str => ArrayEncoder::by(Provider::StringArray),
        FieldType::Int => classify_int_array(data),
        FieldType::Float => classify_float_array(data),
    }
}

fn default_encoder(field_type: FieldType) -> ArrayEncoder {
    match field_type {
        FieldType::Str => ArrayEncoder::by(Provider::StringArray),
        _ => ArrayEncoder::by(Provider::ByteArray),
    }
}

struct FieldData {
    array: TypedArray,
    mask: Vec<u8>,
    all_present: bool,
}

fn store(array: &mut TypedArray, i: usize, value: FieldValue) {
    match value {
        FieldValue::Str(s) if matches!(array, TypedArray::Str(_)) => array.set_str(i, Some(s)),
        FieldValue::Str(s) => array.set_f64(i, s.trim().parse().unwrap_or(0.0)),
        FieldValue::Int(v) => array.set_i64(i, v),
        FieldValue::Float(v) => array.set_f64(i, v),
    }
}

fn field_data<D>(
    field: &Field<D>,
    kind: ArrayKind,
    total: usize,
    instance: &CategoryInstance<'_, D>,
) -> FieldData {
    let is_str = field.field_type == FieldType::Str;
    let mut array = kind.zeroed(total);
    let mut mask = vec![ValueKind::Present.code(); total];
    let mut all_present = true;

    for (offset, (key, data)) in instance.rows().enumerate().take(total) {
        let kind = field
            .value_kind
            .as_ref()
            .map_or(ValueKind::Present, |f| f(key, data));
        if kind != ValueKind::Present {
            mask[offset] = kind.code();
            if is_str {
                array.set_str(offset, Some(String::new()));
            }
            all_present = false;
            continue;
        }

        let value = (field.value)(key, data, offset);
        if matches!(&value, FieldValue::Str(s) if s.is_empty()) {
            mask[offset] = ValueKind::NotPresent.code();
            all_present = false;
        }
        store(&mut array, offset, value);
    }

    FieldData {
        array,
        mask,
        all_present,
    }
}

fn encode_mask(mask: Vec<u8>) -> Result<EncodedData, WriterError> {
    let len = mask.len();
    let rle = ArrayEncoder::by(Provider::RunLength)
        .and(Provider::ByteArray)
        .encode(TypedArray::Uint8(mask.clone()))?;
    if rle.data.len() < len {
        return Ok(rle);
    }
    Ok(ArrayEncoder::by(Provider::ByteArray).encode(TypedArray::Uint8(mask))?)
}

fn encode_field<D>(
    category: &str,
    field: &Field<D>,
    instance: &CategoryInstance<'_, D>,
    total: usize,
    format: Option<&FieldFormat>,
    provider: Option<&dyn EncodingProvider>,
    auto_classify: bool,
) -> Result<BinaryColumn, WriterError> {
    let FieldData {
        array,
        mask,
        all_present,
    } = field_data(field, array_kind(field, format), total, instance);

    let encoder = match try_get_encoder(category, field, format, provider) {
        Some(encoder) => encoder,
        None if auto_classify => classify(field.field_type, &array),
        None => default_encoder(field.field_type),
    };
    log::trace!(
        "{category}.{}: {:?}",
        field.name,
        encoder.providers().iter().map(Provider::name).collect::<Vec<_>>()
    );

    let data = encoder.encode(array)?;
    let mask = if all_present {
        None
    } else {
        Some(encode_mask(mask)?)
    };

    Ok(BinaryColumn {
        name: field.name.clone(),
        data,
        mask,
    })
}

fn encoded_val(data: &EncodedData) -> MsgVal {
    MsgVal::map([
        ("encoding", encodings_val(&data.encoding)),
        ("data", MsgVal::Bin(data.data.clone())),
    ])
}

fn block_val(block: &BinaryDataBlock) -> MsgVal {
    let categories = block
        .categories
        .iter()
        .map(|cat| {
            let columns = cat
                .columns
                .iter()
                .map(|col| {
                    MsgVal::map([
                        ("name", MsgVal::Str(col.name.clone())),
                        ("data", encoded_val(&col.data)),
                        ("mask", col.mask.as_ref().map_or(MsgVal::Nil, encoded_val)),
                    ])
                })
                .collect();
            MsgVal::map([
                ("name", MsgVal::Str(cat.name.clone())),
                ("columns", MsgVal::Array(columns)),
                ("rowCount", MsgVal::Uint(cat.row_count as u64)),
            ])
        })
        .collect();
    MsgVal::map([
        ("header", MsgVal::Str(block.header.clone())),
        ("categories", MsgVal::Array(categories)),
    ])
}
