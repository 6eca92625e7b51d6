//! Decoding of CBOR records into [`Value`] trees.
//!
//! Parsing is done by `ciborium`, which keeps map entries in wire order
//! (duplicates included). The result is then lowered into [`Value`]: tags
//! are dropped except for content links (tag 42) and bignums that fit an
//! `i128`.

use ciborium::value::Value as CborValue;
use cid::Cid;
use repodump_error::{DecodeError, DecodeErrorKind};

use super::{
    tags::{CID_IDENTITY_PREFIX, TAG_CID, TAG_NEG_BIGNUM, TAG_POS_BIGNUM},
    Value,
};

/// Nesting limit used by [`decode`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting of arrays, maps and tags.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Decodes exactly one item spanning the whole input.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decodes exactly one item spanning the whole input, with explicit limits.
pub fn decode_with(
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<Value, DecodeError> {
    let mut cursor = bytes;
    let parsed: Result<CborValue, _> =
        ciborium::de::from_reader_with_recursion_limit(&mut cursor, options.max_depth);
    let consumed = (bytes.len() - cursor.len()) as u64;

    let item = parsed.map_err(|err| lower_error(err, consumed, options.max_depth))?;
    if !cursor.is_empty() {
        return Err(DecodeError::new(
            DecodeErrorKind::TrailingBytes {
                remaining: cursor.len(),
            },
            consumed,
        ));
    }
    lower(item).map_err(|kind| DecodeError::new(kind, consumed))
}

fn lower_error(
    err: ciborium::de::Error<std::io::Error>,
    consumed: u64,
    max_depth: usize,
) -> DecodeError {
    use ciborium::de::Error;

    match err {
        Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeError::new(DecodeErrorKind::UnexpectedEof, consumed)
        }
        Error::Io(e) => DecodeError::new(
            DecodeErrorKind::Semantic {
                reason: e.to_string(),
            },
            consumed,
        ),
        Error::Syntax(offset) => DecodeError::new(DecodeErrorKind::Syntax, offset as u64),
        Error::Semantic(offset, reason) => DecodeError::new(
            DecodeErrorKind::Semantic { reason },
            offset.map_or(consumed, |o| o as u64),
        ),
        Error::RecursionLimitExceeded => {
            DecodeError::new(DecodeErrorKind::DepthLimit { max: max_depth }, consumed)
        }
        #[allow(unreachable_patterns)]
        other => DecodeError::new(
            DecodeErrorKind::Semantic {
                reason: format!("{other:?}"),
            },
            consumed,
        ),
    }
}

/// Lowers a parsed item into the record value model.
fn lower(item: CborValue) -> Result<Value, DecodeErrorKind> {
    Ok(match item {
        CborValue::Null => Value::Null,
        CborValue::Bool(b) => Value::Bool(b),
        CborValue::Integer(n) => Value::Integer(i128::from(n)),
        CborValue::Float(f) => Value::Float(f),
        CborValue::Text(s) => Value::Text(s),
        CborValue::Bytes(b) => Value::Bytes(b),
        CborValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(lower)
                .collect::<Result<_, _>>()?,
        ),
        CborValue::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((lower(k)?, lower(v)?)))
                .collect::<Result<_, DecodeErrorKind>>()?,
        ),
        CborValue::Tag(tag, content) => lower_tagged(tag, *content)?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(DecodeErrorKind::Semantic {
                reason: format!("unsupported item {other:?}"),
            })
        }
    })
}

fn lower_tagged(
    tag: u64,
    content: CborValue,
) -> Result<Value, DecodeErrorKind> {
    match (tag, content) {
        (TAG_CID, CborValue::Bytes(bytes)) => match link_from(&bytes) {
            Some(cid) => Ok(Value::Link(cid)),
            None => Ok(Value::Bytes(bytes)),
        },
        (TAG_POS_BIGNUM, CborValue::Bytes(bytes)) => Ok(match bignum(&bytes) {
            Some(n) if n <= i128::MAX as u128 => Value::Integer(n as i128),
            _ => Value::Bytes(bytes),
        }),
        (TAG_NEG_BIGNUM, CborValue::Bytes(bytes)) => Ok(match bignum(&bytes) {
            Some(n) if n <= i128::MAX as u128 => Value::Integer(-1 - n as i128),
            _ => Value::Bytes(bytes),
        }),
        (_, content) => lower(content),
    }
}

/// A `0x00`-prefixed binary CID, or `None` when the payload is not one.
fn link_from(bytes: &[u8]) -> Option<Cid> {
    match bytes.split_first() {
        Some((&CID_IDENTITY_PREFIX, cid_bytes)) => Cid::try_from(cid_bytes).ok(),
        _ => None,
    }
}

/// Big-endian magnitude of a bignum, if it fits 128 bits.
fn bignum(bytes: &[u8]) -> Option<u128> {
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => return Some(0),
    };
    if significant.len() > 16 {
        return None;
    }
    Some(
        significant
            .iter()
            .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
    )
}

#[cfg(test)]
mod tests {
    use multihash_codetable::{Code, MultihashDigest};
    use repodump_error::{ErrorExt, StatusCode};

    use super::*;

    fn sample_cid() -> Cid {
        Cid::new_v1(0x71, Code::Sha2_256.digest(b"record"))
    }

    /// `{"x": 42(content)}` with a byte string payload.
    fn tagged_field(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xA1, 0x61, b'x', 0xD8, 0x2A, 0x58, payload.len() as u8];
        bytes.extend(payload);
        bytes
    }

    #[test]
    fn test_read_unsigned_widths() {
        assert_eq!(decode(&[0x00]).unwrap(), Value::Integer(0));
        assert_eq!(decode(&[0x17]).unwrap(), Value::Integer(23));
        assert_eq!(decode(&[0x18, 0xFF]).unwrap(), Value::Integer(255));
        assert_eq!(decode(&[0x19, 0x01, 0x00]).unwrap(), Value::Integer(256));
        assert_eq!(
            decode(&[0x1B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            Value::Integer(u64::MAX as i128)
        );
    }

    #[test]
    fn test_read_negative() {
        assert_eq!(decode(&[0x20]).unwrap(), Value::Integer(-1));
        assert_eq!(decode(&[0x38, 0x63]).unwrap(), Value::Integer(-100));
        assert_eq!(
            decode(&[0x3B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            Value::Integer(-1 - u64::MAX as i128)
        );
    }

    #[test]
    fn test_read_strings_and_simple_values() {
        assert_eq!(
            decode(&[0x65, b'h', b'e', b'l', b'l', b'o']).unwrap(),
            Value::Text("hello".into())
        );
        assert_eq!(decode(&[0x43, 1, 2, 3]).unwrap(), Value::Bytes(vec![1, 2, 3]));
        assert_eq!(decode(&[0xF4]).unwrap(), Value::Bool(false));
        assert_eq!(decode(&[0xF6]).unwrap(), Value::Null);
        // 1.5 as half and as double
        assert_eq!(decode(&[0xF9, 0x3E, 0x00]).unwrap(), Value::Float(1.5));
        assert_eq!(
            decode(&[0xFB, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = decode(&[0x82, 0x01, 0x62, 0xC3, 0x28]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::DecodingError);
    }

    #[test]
    fn test_duplicate_keys_are_kept_in_order() {
        let bytes = [0xA2, 0x01, 0x61, b'x', 0x01, 0x61, b'y'];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Map(vec![
                (Value::Integer(1), Value::from("x")),
                (Value::Integer(1), Value::from("y")),
            ])
        );
    }

    #[test]
    fn test_indefinite_lengths() {
        assert_eq!(
            decode(&[0x9F, 0x01, 0x02, 0xFF]).unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(
            decode(&[0xBF, 0x61, b'a', 0x01, 0xFF]).unwrap(),
            Value::Map(vec![(Value::from("a"), Value::Integer(1))])
        );
    }

    #[test]
    fn test_tags_are_dropped() {
        // 1(1363896240) epoch time
        let bytes = [0xC1, 0x1A, 0x51, 0x4B, 0x67, 0xB0];
        assert_eq!(decode(&bytes).unwrap(), Value::Integer(1363896240));
        // 32("http://x")
        let bytes = [0xD8, 0x20, 0x68, b'h', b't', b't', b'p', b':', b'/', b'/', b'x'];
        assert_eq!(decode(&bytes).unwrap(), Value::Text("http://x".into()));
    }

    #[test]
    fn test_small_bignums_become_integers() {
        // 2(h'0100') and 3(h'0100')
        assert_eq!(decode(&[0xC2, 0x42, 0x01, 0x00]).unwrap(), Value::Integer(256));
        assert_eq!(decode(&[0xC3, 0x42, 0x01, 0x00]).unwrap(), Value::Integer(-257));
    }

    #[test]
    fn test_tag_42_becomes_link() {
        let cid = sample_cid();
        let mut payload = vec![CID_IDENTITY_PREFIX];
        payload.extend(cid.to_bytes());

        assert_eq!(
            decode(&tagged_field(&payload)).unwrap(),
            Value::Map(vec![(Value::from("x"), Value::Link(cid))])
        );
    }

    #[test]
    fn test_tag_42_with_non_link_content_keeps_content() {
        // {"x": 42("hi")}
        let bytes = [0xA1, 0x61, b'x', 0xD8, 0x2A, 0x62, b'h', b'i'];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Map(vec![(Value::from("x"), Value::from("hi"))])
        );

        // {"x": 42(h'0102')}
        assert_eq!(
            decode(&tagged_field(&[0x01, 0x02])).unwrap(),
            Value::Map(vec![(Value::from("x"), Value::Bytes(vec![0x01, 0x02]))])
        );

        // CID bytes without the identity prefix
        let raw = sample_cid().to_bytes();
        assert_eq!(
            decode(&tagged_field(&raw)).unwrap(),
            Value::Map(vec![(Value::from("x"), Value::Bytes(raw))])
        );
    }

    #[test]
    fn test_truncated_input() {
        let err = decode(&[0x65, b'h', b'i']).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnexpectedEof);

        let err = decode(&[0xA1, 0x61, 0x61]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnexpectedEof);
        assert_eq!(err.status_code(), StatusCode::UnexpectedEof);

        let err = decode(&[]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnexpectedEof);
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_huge_declared_length_fails_cleanly() {
        // array claiming u64::MAX elements
        let bytes = [0x9B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_malformed_heads_are_rejected() {
        // reserved additional info, stray break
        for bytes in [&[0x1C][..], &[0x81, 0xFF][..]] {
            let err = decode(bytes).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::DecodingError, "{bytes:02x?}");
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let err = decode(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TrailingBytes { remaining: 1 });
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_depth_limit() {
        let nested = [0x81, 0x81, 0x81, 0x01];
        let options = DecodeOptions { max_depth: 2 };
        let err = decode_with(&nested, &options).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::DepthLimit { max: 2 });
        assert_eq!(err.status_code(), StatusCode::DepthLimit);

        let options = DecodeOptions { max_depth: 3 };
        assert!(decode_with(&nested, &options).is_ok());
    }
}
