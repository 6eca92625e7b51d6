//! Encoding of [`Value`] trees as CBOR.
//!
//! Used to build archives for tests and benchmarks; the exporter itself only
//! reads.

use ciborium::value::{Integer, Value as CborValue};
use repodump_error::EncodeError;

use super::{
    tags::{CID_IDENTITY_PREFIX, TAG_CID, TAG_NEG_BIGNUM, TAG_POS_BIGNUM},
    Value,
};

/// Encodes a value as CBOR.
///
/// Heads and floats use the shortest lossless form and lengths are always
/// definite. Map entries keep the order they have in the value.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&raise(value), &mut buf)
        .map_err(|e| EncodeError::new(e.to_string()))?;
    Ok(buf)
}

fn raise(value: &Value) -> CborValue {
    match value {
        Value::Null => CborValue::Null,
        Value::Bool(b) => CborValue::Bool(*b),
        Value::Integer(n) => raise_integer(*n),
        Value::Float(f) => CborValue::Float(*f),
        Value::Text(s) => CborValue::Text(s.clone()),
        Value::Bytes(b) => CborValue::Bytes(b.clone()),
        Value::Link(cid) => {
            let mut payload = vec![CID_IDENTITY_PREFIX];
            payload.extend(cid.to_bytes());
            CborValue::Tag(TAG_CID, Box::new(CborValue::Bytes(payload)))
        }
        Value::Array(items) => CborValue::Array(items.iter().map(raise).collect()),
        Value::Map(entries) => CborValue::Map(
            entries
                .iter()
                .map(|(k, v)| (raise(k), raise(v)))
                .collect(),
        ),
    }
}

/// Integers past the 64-bit wire range become bignums.
fn raise_integer(n: i128) -> CborValue {
    if let Ok(small) = Integer::try_from(n) {
        return CborValue::Integer(small);
    }
    let (tag, magnitude) = if n >= 0 {
        (TAG_POS_BIGNUM, n as u128)
    } else {
        // -1 - n without overflow
        (TAG_NEG_BIGNUM, (-(n + 1)) as u128)
    };
    let bytes = magnitude.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    CborValue::Tag(tag, Box::new(CborValue::Bytes(bytes[first..].to_vec())))
}
