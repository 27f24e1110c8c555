//! External per-column encoder selection.

use std::collections::HashMap;

use serde::Deserialize;

use crate::binary_cif::{ArrayEncoder, Provider};

/// Supplies an encoder for a column by category and field name.
pub trait EncodingProvider {
    fn get(&self, category: &str, field: &str) -> Option<ArrayEncoder>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HintEncoding {
    #[serde(rename = "pack")]
    Pack,
    #[serde(rename = "rle")]
    Rle,
    #[serde(rename = "delta")]
    Delta,
    #[serde(rename = "delta-rle")]
    DeltaRle,
}

/// One entry of a hints file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingHint {
    pub category_name: String,
    pub column_name: String,
    pub encoding: HintEncoding,
    /// Decimal places kept by a fixed-point prefix.
    #[serde(default)]
    pub precision: Option<i32>,
}

impl EncodingHint {
    pub fn encoder(&self) -> ArrayEncoder {
        let prefix = self
            .precision
            .map(|p| Provider::FixedPoint(10f64.powi(p)));
        let chain: &[Provider] = match self.encoding {
            HintEncoding::Pack => &[Provider::IntegerPacking],
            HintEncoding::Rle => &[Provider::RunLength, Provider::IntegerPacking],
            HintEncoding::Delta => &[Provider::Delta, Provider::IntegerPacking],
            HintEncoding::DeltaRle => &[
                Provider::Delta,
                Provider::RunLength,
                Provider::IntegerPacking,
            ],
        };
        let mut providers = prefix.into_iter().chain(chain.iter().cloned());
        // every chain above is non-empty
        let first = providers.next().unwrap_or(Provider::ByteArray);
        providers.fold(ArrayEncoder::by(first), ArrayEncoder::and)
    }
}

/// Encoders read from a JSON array of [`EncodingHint`]s.
#[derive(Debug, Clone, Default)]
pub struct HintsEncodingProvider {
    encoders: HashMap<String, ArrayEncoder>,
}

impl HintsEncodingProvider {
    pub fn from_hints(hints: &[EncodingHint]) -> Self {
        let encoders = hints
            .iter()
            .map(|h| {
                (
                    format!("{}.{}", h.category_name, h.column_name),
                    h.encoder(),
                )
            })
            .collect();
        Self { encoders }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let hints: Vec<EncodingHint> = serde_json::from_str(json)?;
        log::debug!("loaded {} encoding hints", hints.len());
        Ok(Self::from_hints(&hints))
    }
}

impl EncodingProvider for HintsEncodingProvider {
    fn get(&self, category: &str, field: &str) -> Option<ArrayEncoder> {
        self.encoders.get(&format!("{category}.{field}")).cloned()
    }
}
