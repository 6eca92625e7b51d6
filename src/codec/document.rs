use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use cid::Cid;
use serde::{ser::SerializeMap, Serialize, Serializer};

/// A record whose mapping keys are all text.
///
/// Produced by [`normalize`](super::normalize) and consumed by the aggregator
/// and the JSON writer. Object keys are kept sorted.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Link(Cid),
    Array(Vec<Document>),
    Object(BTreeMap<String, Document>),
}

impl Document {
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Document> {
        match self {
            Document::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Document::Object(_))
    }
}

/// JSON-facing rendering: bytes become `{"$bytes": ..}`, links `{"$link": ..}`,
/// integers outside the 64-bit range become decimal strings and non-finite
/// floats become `null`.
impl Serialize for Document {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Integer(n) => {
                if let Ok(v) = i64::try_from(*n) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*n) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_str(&n.to_string())
                }
            }
            Document::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Document::Float(_) => serializer.serialize_unit(),
            Document::Text(s) => serializer.serialize_str(s),
            Document::Bytes(b) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$bytes", &STANDARD_NO_PAD.encode(b))?;
                map.end()
            }
            Document::Link(cid) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$link", &cid.to_string())?;
                map.end()
            }
            Document::Array(items) => items.serialize(serializer),
            Document::Object(fields) => fields.serialize(serializer),
        }
    }
}
