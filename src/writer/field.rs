//! Column definitions for category writers.
//!
//! A [`Field`] describes how to pull one column out of a category's data:
//! a value getter, an optional per-row [`ValueKind`], and a default format
//! choosing the array type and encoder.

use std::rc::Rc;

use crate::binary_cif::{ArrayEncoder, ArrayKind, Provider, ValueKind};

use super::WriterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Str(s) => s.parse().unwrap_or(0.0),
            FieldValue::Int(v) => *v as f64,
            FieldValue::Float(v) => *v,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

/// `(key, data, global_row) -> value`
pub type ValueFn<D> = Rc<dyn Fn(usize, &D, usize) -> FieldValue>;
/// `(key, data) -> kind`
pub type ValueKindFn<D> = Rc<dyn Fn(usize, &D) -> ValueKind>;
pub type IncludeFn<D> = Rc<dyn Fn(&D) -> bool>;

/// Per-column format override. Unset members fall through to the next
/// source (field default, encoding provider, classifier).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFormat {
    pub encoder: Option<ArrayEncoder>,
    pub array_kind: Option<ArrayKind>,
    /// Decimal places for text output.
    pub digit_count: Option<usize>,
}

pub struct Field<D> {
    pub name: String,
    pub field_type: FieldType,
    pub value: ValueFn<D>,
    pub value_kind: Option<ValueKindFn<D>>,
    pub default_format: Option<FieldFormat>,
    pub should_include: Option<IncludeFn<D>>,
}

impl<D> Clone for Field<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            field_type: self.field_type,
            value: Rc::clone(&self.value),
            value_kind: self.value_kind.clone(),
            default_format: self.default_format.clone(),
            should_include: self.should_include.clone(),
        }
    }
}

impl<D> std::fmt::Debug for Field<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

/// Optional settings shared by the [`Field`] constructors.
pub struct FieldParams<D> {
    pub value_kind: Option<ValueKindFn<D>>,
    pub encoder: Option<ArrayEncoder>,
    pub array_kind: Option<ArrayKind>,
    pub digit_count: Option<usize>,
    pub should_include: Option<IncludeFn<D>>,
}

impl<D> Default for FieldParams<D> {
    fn default() -> Self {
        Self {
            value_kind: None,
            encoder: None,
            array_kind: None,
            digit_count: None,
            should_include: None,
        }
    }
}

impl<D> Clone for FieldParams<D> {
    fn clone(&self) -> Self {
        Self {
            value_kind: self.value_kind.clone(),
            encoder: self.encoder.clone(),
            array_kind: self.array_kind,
            digit_count: self.digit_count,
            should_include: self.should_include.clone(),
        }
    }
}

impl<D: 'static> FieldParams<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_kind(mut self, f: impl Fn(usize, &D) -> ValueKind + 'static) -> Self {
        self.value_kind = Some(Rc::new(f));
        self
    }

    pub fn encoder(mut self, encoder: ArrayEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn array_kind(mut self, kind: ArrayKind) -> Self {
        self.array_kind = Some(kind);
        self
    }

    pub fn digit_count(mut self, digits: usize) -> Self {
        self.digit_count = Some(digits);
        self
    }

    pub fn should_include(mut self, f: impl Fn(&D) -> bool + 'static) -> Self {
        self.should_include = Some(Rc::new(f));
        self
    }
}

impl<D: 'static> Field<D> {
    fn with_params(
        name: impl Into<String>,
        field_type: FieldType,
        value: ValueFn<D>,
        params: FieldParams<D>,
        format: FieldFormat,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            value,
            value_kind: params.value_kind,
            default_format: Some(format),
            should_include: params.should_include,
        }
    }

    pub fn str(
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> String + 'static,
        params: FieldParams<D>,
    ) -> Self {
        let format = FieldFormat {
            encoder: params.encoder.clone(),
            ..Default::default()
        };
        let value: ValueFn<D> = Rc::new(move |k, d, i| FieldValue::Str(value(k, d, i)));
        Self::with_params(name, FieldType::Str, value, params, format)
    }

    pub fn int(
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> i64 + 'static,
        params: FieldParams<D>,
    ) -> Self {
        let format = FieldFormat {
            encoder: params.encoder.clone(),
            array_kind: params.array_kind,
            digit_count: None,
        };
        let value: ValueFn<D> = Rc::new(move |k, d, i| FieldValue::Int(value(k, d, i)));
        Self::with_params(name, FieldType::Int, value, params, format)
    }

    pub fn float(
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> f64 + 'static,
        params: FieldParams<D>,
    ) -> Self {
        let format = FieldFormat {
            encoder: params.encoder.clone(),
            array_kind: params.array_kind,
            digit_count: params.digit_count,
        };
        let value: ValueFn<D> = Rc::new(move |k, d, i| FieldValue::Float(value(k, d, i)));
        Self::with_params(name, FieldType::Float, value, params, format)
    }

    /// 1-based running row number across all sources of the category.
    pub fn index(name: impl Into<String>) -> Self {
        Self::int(
            name,
            |_, _, i| i as i64 + 1,
            FieldParams::new()
                .array_kind(ArrayKind::Int32)
                .encoder(
                    ArrayEncoder::by(Provider::Delta)
                        .and(Provider::RunLength)
                        .and(Provider::IntegerPacking),
                ),
        )
    }
}

type IntGetter<D> = Rc<dyn Fn(&D, usize) -> i64>;

/// Accumulates fields for a category definition.
pub struct FieldBuilder<D> {
    fields: Vec<Field<D>>,
}

impl<D> Default for FieldBuilder<D> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<D: 'static> FieldBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field::index(name));
        self
    }

    pub fn str(
        mut self,
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> String + 'static,
        params: FieldParams<D>,
    ) -> Self {
        self.fields.push(Field::str(name, value, params));
        self
    }

    pub fn int(
        mut self,
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> i64 + 'static,
        params: FieldParams<D>,
    ) -> Self {
        self.fields.push(Field::int(name, value, params));
        self
    }

    /// One int column per getter, named `name[1]`, `name[2]`, ...
    pub fn vec(
        mut self,
        name: &str,
        values: Vec<IntGetter<D>>,
        params: FieldParams<D>,
    ) -> Self {
        for (i, getter) in values.into_iter().enumerate() {
            self.fields.push(Field::int(
                format!("{name}[{}]", i + 1),
                move |k, d, _| getter(d, k),
                params.clone(),
            ));
        }
        self
    }

    pub fn float(
        mut self,
        name: impl Into<String>,
        value: impl Fn(usize, &D, usize) -> f64 + 'static,
        params: FieldParams<D>,
    ) -> Self {
        self.fields.push(Field::float(name, value, params));
        self
    }

    pub fn many(mut self, fields: impl IntoIterator<Item = Field<D>>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn add(mut self, field: Field<D>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(self) -> Vec<Field<D>> {
        self.fields
    }
}

/// Float columns for every component of a rank 1..=3 tensor.
///
/// Column names use 1-based subscripts (`name[i]`, `name[i][j]`,
/// `name[i][j][k]`); the getter receives 0-based coordinates.
pub fn tensor_fields<D: 'static>(
    name: &str,
    dims: &[usize],
    value: impl Fn(usize, &D, &[usize]) -> f64 + 'static,
    params: FieldParams<D>,
) -> Result<Vec<Field<D>>, WriterError> {
    if dims.is_empty() || dims.len() > 3 {
        return Err(WriterError::TensorRank(dims.len()));
    }

    let mut coords: Vec<Vec<usize>> = vec![Vec::new()];
    for &d in dims {
        coords = coords
            .into_iter()
            .flat_map(|prefix| {
                (0..d).map(move |i| {
                    let mut c = prefix.clone();
                    c.push(i);
                    c
                })
            })
            .collect();
    }

    let value = Rc::new(value);
    Ok(coords
        .into_iter()
        .map(|coord| {
            let suffix: String = coord.iter().map(|i| format!("[{}]", i + 1)).collect();
            let value = Rc::clone(&value);
            Field::float(
                format!("{name}{suffix}"),
                move |k, d, _| value(k, d, &coord),
                params.clone(),
            )
        })
        .collect())
}
