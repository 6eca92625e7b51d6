//! Record encoding: the CBOR value model and its text-keyed form.
//!
//! ## Flow
//!
//! ```
//! use repodump::codec::{decode, encode, normalize, Value};
//!
//! let raw = encode(&Value::Map(vec![(Value::Integer(7), Value::from("seven"))]))?;
//! let doc = normalize(decode(&raw)?);
//! assert_eq!(doc.get("7").and_then(|d| d.as_str()), Some("seven"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`decode`] - bytes to [`Value`]
//! - [`encode`] - [`Value`] to bytes
//! - [`normalize`] - [`Value`] to [`Document`], keys coerced to text
//! - [`varint`] - LEB128 framing used by the archive format
//! - [`tags`] - tags with a meaning for records

pub mod decode;
pub mod document;
pub mod encode;
pub mod normalize;
pub mod tags;
pub mod value;
pub mod varint;

pub use decode::{decode, decode_with, DecodeOptions, DEFAULT_MAX_DEPTH};
pub use document::Document;
pub use encode::encode;
pub use normalize::{key_text, normalize};
pub use value::Value;
