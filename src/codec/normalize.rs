//! Rewriting of decoded values so that every mapping key is text.
//!
//! Keys are turned into text by [`key_text`]; values keep their type. When two
//! keys of one map end up with the same text, the entry decoded last wins.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use tracing::debug;

use super::{Document, Value};

/// Converts a decoded value into a document. Never fails.
pub fn normalize(value: Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(b),
        Value::Integer(n) => Document::Integer(n),
        Value::Float(f) => Document::Float(f),
        Value::Text(s) => Document::Text(s),
        Value::Bytes(b) => Document::Bytes(b),
        Value::Link(c) => Document::Link(c),
        Value::Array(items) => Document::Array(items.into_iter().map(normalize).collect()),
        Value::Map(entries) => {
            let mut fields = BTreeMap::new();
            for (key, value) in entries {
                let key = key_text(key);
                if fields.insert(key.clone(), normalize(value)).is_some() {
                    debug!(key = %key, "Duplicate map key after normalization, keeping the later entry");
                }
            }
            Document::Object(fields)
        }
    }
}

/// Canonical text form of a map key.
///
/// Text is kept as is and integers print in decimal. Floats use Rust's
/// `Display`, which never switches to exponent notation (`1e21` becomes
/// `1000000000000000000000`, `1e-7` becomes `0.0000001`). A null key is
/// `null`, bytes are unpadded base64 and links their CID string. Arrays and
/// maps print their members recursively inside `[..]` and `{..}`.
pub fn key_text(key: Value) -> String {
    match key {
        Value::Text(s) => s,
        other => {
            let mut out = String::new();
            write_key(&mut out, &other);
            out
        }
    }
}

fn write_key(
    out: &mut String,
    key: &Value,
) {
    match key {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::Text(s) => out.push_str(s),
        Value::Bytes(b) => out.push_str(&STANDARD_NO_PAD.encode(b)),
        Value::Link(c) => out.push_str(&c.to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_key(out, item);
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_key(out, k);
                out.push(':');
                write_key(out, v);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use cid::Cid;
    use multihash_codetable::{Code, MultihashDigest};

    use super::*;

    #[test]
    fn test_scalar_key_forms() {
        assert_eq!(key_text(Value::from("k")), "k");
        assert_eq!(key_text(Value::Integer(7)), "7");
        assert_eq!(key_text(Value::Integer(-3)), "-3");
        assert_eq!(key_text(Value::Float(1.5)), "1.5");
        assert_eq!(key_text(Value::Float(1.0)), "1");
        assert_eq!(key_text(Value::Float(f64::NAN)), "NaN");
        assert_eq!(key_text(Value::Float(f64::INFINITY)), "inf");
        assert_eq!(key_text(Value::Bool(true)), "true");
        assert_eq!(key_text(Value::Bool(false)), "false");
        assert_eq!(key_text(Value::Null), "null");
        assert_eq!(key_text(Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])), "3q2+7w");
    }

    #[test]
    fn test_float_keys_avoid_exponent_notation() {
        assert_eq!(key_text(Value::Float(1e21)), "1000000000000000000000");
        assert_eq!(key_text(Value::Float(1e-7)), "0.0000001");
        assert_eq!(key_text(Value::Float(-0.5)), "-0.5");

        let document = normalize(Value::Map(vec![(Value::Float(1e21), Value::Null)]));
        assert!(document.get("1000000000000000000000").is_some());
    }

    #[test]
    fn test_link_key_uses_cid_string() {
        let cid = Cid::new_v1(0x71, Code::Sha2_256.digest(b"k"));
        assert_eq!(key_text(Value::Link(cid)), cid.to_string());
    }

    #[test]
    fn test_compound_key_forms() {
        let key = Value::Array(vec![Value::Integer(1), Value::from("a"), Value::Null]);
        assert_eq!(key_text(key), "[1,a,null]");

        let key = Value::Map(vec![
            (Value::Integer(1), Value::Bool(true)),
            (Value::from("x"), Value::Array(vec![])),
        ]);
        assert_eq!(key_text(key), "{1:true,x:[]}");
    }

    #[test]
    fn test_integer_key_keeps_value() {
        let value = Value::Map(vec![(
            Value::Integer(7),
            Value::Map(vec![(Value::Integer(1), Value::Float(2.5))]),
        )]);
        let doc = normalize(value);

        let inner = doc.get("7").expect("key 7");
        assert_eq!(inner.get("1"), Some(&Document::Float(2.5)));
    }

    #[test]
    fn test_arrays_are_walked() {
        let value = Value::Array(vec![Value::Map(vec![(Value::Bool(false), Value::Null)])]);
        match normalize(value) {
            Document::Array(items) => assert_eq!(items[0].get("false"), Some(&Document::Null)),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_collision_keeps_later_entry() {
        let value = Value::Map(vec![
            (Value::Integer(1), Value::from("number")),
            (Value::from("1"), Value::from("text")),
        ]);
        assert_eq!(
            normalize(value).get("1"),
            Some(&Document::Text("text".into()))
        );

        let value = Value::Map(vec![
            (Value::from("1"), Value::from("text")),
            (Value::Integer(1), Value::from("number")),
        ]);
        assert_eq!(
            normalize(value).get("1"),
            Some(&Document::Text("number".into()))
        );
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize(Value::Integer(5)), Document::Integer(5));
        assert_eq!(normalize(Value::Bytes(vec![1])), Document::Bytes(vec![1]));
        assert_eq!(normalize(Value::Null), Document::Null);
    }
}
