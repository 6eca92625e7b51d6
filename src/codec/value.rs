use cid::Cid;

use super::Document;

/// A decoded CBOR item.
///
/// This is the shape of a record straight off the wire: map keys may be of
/// any type, entries keep the order they were encoded in and duplicate keys
/// are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null` and `undefined`.
    Null,
    Bool(bool),
    /// Any CBOR integer; the wire range is `-2^64 ..= 2^64 - 1`.
    Integer(i128),
    Float(f64),
    Text(String),
    /// An opaque byte string.
    Bytes(Vec<u8>),
    /// A content link (tag 42).
    Link(Cid),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Link(_) => "link",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Cid> {
        match self {
            Value::Link(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a text key in a map. With duplicate keys the last one wins.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(b),
            Document::Integer(n) => Value::Integer(n),
            Document::Float(f) => Value::Float(f),
            Document::Text(s) => Value::Text(s),
            Document::Bytes(b) => Value::Bytes(b),
            Document::Link(c) => Value::Link(c),
            Document::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Document::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n as i128)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Cid> for Value {
    fn from(c: Cid) -> Self {
        Value::Link(c)
    }
}
