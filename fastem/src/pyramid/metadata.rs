//! Tag metadata carried from a source pyramid into every unpacked level.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::{Error, Result};

/// Writers store the page geometry under this key as an array. It would be
/// wrong for smaller levels, so array values are dropped on read without a
/// warning. Scalar values under the same key are ordinary metadata.
const SHAPE_KEY: &str = "shape";

/// Key used when the first page carries a description that is not a JSON object.
pub const DESCRIPTION_KEY: &str = "ImageDescription";

/// ASCII tags forwarded alongside the description.
const FORWARDED_ASCII_TAGS: &[(Tag, &str)] = &[
    (Tag::Software, "Software"),
    (Tag::DateTime, "DateTime"),
    (Tag::Make, "Make"),
    (Tag::Model, "Model"),
    (Tag::Artist, "Artist"),
    (Tag::HostComputer, "HostComputer"),
];

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// String-keyed metadata, read-only once extracted and written verbatim as a
/// JSON object into the `ImageDescription` tag of each output page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    /// Extracts metadata from the first page of the TIFF file at `path`.
    pub fn read_first_page(path: &Path) -> Result<Self> {
        let mut decoder = super::open_decoder(path)?;
        Self::from_decoder(&mut decoder).map_err(|e| Error::decode(path, e))
    }

    /// Reads the tags of the page the decoder currently points at.
    pub(crate) fn from_decoder<R>(decoder: &mut Decoder<R>) -> tiff::TiffResult<Self>
    where
        R: std::io::Read + std::io::Seek,
    {
        let mut metadata = match ascii_tag(decoder, Tag::ImageDescription)? {
            Some(description) => Self::from_description(&description),
            None => Self::new(),
        };

        for &(tag, name) in FORWARDED_ASCII_TAGS {
            if metadata.0.contains_key(name) {
                continue;
            }
            if let Some(text) = ascii_tag(decoder, tag)? {
                metadata.0.insert(name.to_string(), MetadataValue::Text(text));
            }
        }

        Ok(metadata)
    }

    /// Parses an `ImageDescription` string: JSON objects contribute their scalar
    /// entries, anything else is kept whole under [`DESCRIPTION_KEY`].
    pub fn from_description(description: &str) -> Self {
        let trimmed = description.trim_end_matches('\0').trim();
        if trimmed.is_empty() {
            return Self::new();
        }

        let object = match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Object(object)) => object,
            _ => return Self::new().with(DESCRIPTION_KEY, trimmed),
        };

        let mut metadata = Self::new();
        for (key, value) in &object {
            if key == SHAPE_KEY && value.is_array() {
                continue;
            }
            match MetadataValue::from_json(value) {
                Some(value) => {
                    metadata.0.insert(key.clone(), value);
                }
                None => tracing::warn!(key = %key, "Skipping non-scalar metadata entry"),
            }
        }
        metadata
    }

    /// The JSON text written into `ImageDescription`; `None` when empty.
    ///
    /// JSON has no NaN or infinity, so non-finite floats are rejected.
    pub(crate) fn to_description(&self) -> Result<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }
        if let Some((key, value)) = self
            .iter()
            .find(|(_, value)| matches!(value, MetadataValue::Float(f) if !f.is_finite()))
        {
            return Err(Error::NonFiniteMetadata {
                key: key.clone(),
                value: format!("{:?}", value),
            });
        }
        Ok(Some(serde_json::to_string(self)?))
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, MetadataValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn ascii_tag<R>(decoder: &mut Decoder<R>, tag: Tag) -> tiff::TiffResult<Option<String>>
where
    R: std::io::Read + std::io::Seek,
{
    match decoder.find_tag(tag)? {
        Some(value) => {
            let text = value.into_string()?;
            let text = text.trim_end_matches('\0');
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_description_keeps_scalars_and_drops_shape() {
        let metadata = Metadata::from_description(
            r#"{"shape": [64, 64], "pixel_size_nm": 4.0, "beam": "on", "frames": 8, "nested": {"a": 1}}"#,
        );

        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.get("pixel_size_nm"), Some(&MetadataValue::Float(4.0)));
        assert_eq!(metadata.get("beam"), Some(&MetadataValue::from("on")));
        assert_eq!(metadata.get("frames"), Some(&MetadataValue::Int(8)));
        assert!(metadata.get("shape").is_none());
        assert!(metadata.get("nested").is_none());
    }

    #[test]
    fn plain_description_is_kept_whole() {
        let metadata = Metadata::from_description("FAST-EM megafield 3\0");
        assert_eq!(
            metadata.get(DESCRIPTION_KEY),
            Some(&MetadataValue::from("FAST-EM megafield 3"))
        );
    }

    #[test]
    fn blank_description_is_empty() {
        assert!(Metadata::from_description("  \0").is_empty());
    }

    #[test]
    fn description_roundtrip() {
        let metadata = Metadata::new()
            .with("dwell_time_us", 0.4)
            .with("section", "S012")
            .with("overlap", 25_i64)
            .with("corrected", false);

        let description = metadata.to_description().unwrap().unwrap();
        assert_eq!(Metadata::from_description(&description), metadata);
    }

    #[test]
    fn scalar_shape_entry_is_kept() {
        let metadata = Metadata::from_description(r#"{"shape": "square", "beam": "on"}"#);
        assert_eq!(metadata.get("shape"), Some(&MetadataValue::from("square")));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn non_finite_float_is_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let metadata = Metadata::new().with("gain", value).with("beam", "on");
            assert!(matches!(
                metadata.to_description(),
                Err(Error::NonFiniteMetadata { ref key, .. }) if key == "gain"
            ));
        }
    }

    #[test]
    fn empty_metadata_writes_no_description() {
        assert!(Metadata::new().to_description().unwrap().is_none());
    }
}
