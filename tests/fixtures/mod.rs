//! Builders for CAR archives used by the integration tests.
//!
//! Records are serialized with `serde_cbor`, the archive structure (commit,
//! MST node, header) with the crate's own encoder.

#![allow(dead_code)]

use std::collections::BTreeMap;

use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};
use repodump::{codec::varint::write_uvarint, encode, Value};
use serde_cbor::Value as CborValue;

pub const DAG_CBOR: u64 = 0x71;
pub const TEST_DID: &str = "did:plc:ewvi7nxzyoun6zhxrhs64oiz";

/// CID of `bytes` as a sha2-256 DAG-CBOR block.
pub fn cid_of(bytes: &[u8]) -> Cid {
    Cid::new_v1(DAG_CBOR, Code::Sha2_256.digest(bytes))
}

/// Serializes a record written as a `serde_cbor` value.
pub fn record(value: CborValue) -> Vec<u8> {
    serde_cbor::to_vec(&value).unwrap()
}

/// `{"$type": record_type, "text": text}`
pub fn typed_record(
    record_type: &str,
    text: &str,
) -> Vec<u8> {
    let mut map = BTreeMap::new();
    map.insert(
        CborValue::Text("$type".into()),
        CborValue::Text(record_type.into()),
    );
    map.insert(CborValue::Text("text".into()), CborValue::Text(text.into()));
    record(CborValue::Map(map))
}

/// `{"text": text}` without a type field.
pub fn untyped_record(text: &str) -> Vec<u8> {
    let mut map = BTreeMap::new();
    map.insert(CborValue::Text("text".into()), CborValue::Text(text.into()));
    record(CborValue::Map(map))
}

/// Accumulates blocks and writes them out as a CARv1 byte stream.
#[derive(Default)]
pub struct CarBuilder {
    blocks: Vec<(Cid, Vec<u8>)>,
}

impl CarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block under its own CID.
    pub fn put(
        &mut self,
        bytes: Vec<u8>,
    ) -> Cid {
        let cid = cid_of(&bytes);
        self.blocks.push((cid, bytes));
        cid
    }

    pub fn put_value(
        &mut self,
        value: &Value,
    ) -> Cid {
        self.put(encode(value).unwrap())
    }

    /// Adds a block under an arbitrary CID, digest or not.
    pub fn put_as(
        &mut self,
        cid: Cid,
        bytes: Vec<u8>,
    ) {
        self.blocks.push((cid, bytes));
    }

    pub fn finish(
        &self,
        roots: &[Cid],
    ) -> Vec<u8> {
        let header = Value::Map(vec![
            (
                Value::from("roots"),
                Value::Array(roots.iter().copied().map(Value::Link).collect()),
            ),
            (Value::from("version"), Value::from(1)),
        ]);
        let header = encode(&header).unwrap();

        let mut out = Vec::new();
        write_uvarint(&mut out, header.len() as u64);
        out.extend_from_slice(&header);
        for (cid, data) in &self.blocks {
            let cid_bytes = cid.to_bytes();
            write_uvarint(&mut out, (cid_bytes.len() + data.len()) as u64);
            out.extend_from_slice(&cid_bytes);
            out.extend_from_slice(data);
        }
        out
    }
}

/// A single-node MST over `entries`, which must already be sorted.
pub fn mst_node(entries: &[(&str, Cid)]) -> Value {
    let mut previous: &[u8] = &[];
    let mut encoded = Vec::with_capacity(entries.len());
    for (key, cid) in entries {
        let key = key.as_bytes();
        let shared = previous
            .iter()
            .zip(key)
            .take_while(|(a, b)| a == b)
            .count();
        encoded.push(Value::Map(vec![
            (Value::from("k"), Value::Bytes(key[shared..].to_vec())),
            (Value::from("p"), Value::from(shared as i64)),
            (Value::from("t"), Value::Null),
            (Value::from("v"), Value::Link(*cid)),
        ]));
        previous = key;
    }
    Value::Map(vec![
        (Value::from("e"), Value::Array(encoded)),
        (Value::from("l"), Value::Null),
    ])
}

pub fn commit(
    did: &str,
    data: Cid,
) -> Value {
    Value::Map(vec![
        (Value::from("data"), Value::Link(data)),
        (Value::from("did"), Value::from(did)),
        (Value::from("prev"), Value::Null),
        (Value::from("rev"), Value::from("3kabcdefghi2a")),
        (Value::from("sig"), Value::Bytes(vec![0x5a; 64])),
        (Value::from("version"), Value::from(3)),
    ])
}

/// Describes a repository to serialize.
pub struct RepoFixture {
    pub did: String,
    pub records: Vec<(String, Vec<u8>)>,
    /// Keys whose record block is left out of the archive.
    pub missing: Vec<String>,
}

impl RepoFixture {
    pub fn new(did: &str) -> Self {
        Self {
            did: did.to_string(),
            records: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn record(
        mut self,
        key: &str,
        bytes: Vec<u8>,
    ) -> Self {
        self.records.push((key.to_string(), bytes));
        self
    }

    pub fn without_block(
        mut self,
        key: &str,
    ) -> Self {
        self.missing.push(key.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut car = CarBuilder::new();
        let mut sorted: Vec<&(String, Vec<u8>)> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = Vec::with_capacity(sorted.len());
        for (key, bytes) in sorted {
            let cid = cid_of(bytes);
            if !self.missing.contains(key) {
                car.put_as(cid, bytes.clone());
            }
            entries.push((key.as_str(), cid));
        }

        let data = car.put_value(&mst_node(&entries));
        let root = car.put_value(&commit(&self.did, data));
        car.finish(&[root])
    }
}

/// `a/1` and `a/2` typed `x`, `b/1` without a type.
pub fn three_record_repo() -> RepoFixture {
    RepoFixture::new(TEST_DID)
        .record("a/1", typed_record("x", "first"))
        .record("a/2", typed_record("x", "second"))
        .record("b/1", untyped_record("third"))
}
