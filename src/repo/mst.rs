//! In-order traversal of a Merkle search tree.
//!
//! A node is `{l: link|null, e: [{p, k, v, t}]}`. Entry keys are prefix
//! compressed: `p` bytes are shared with the previous key of the same node
//! and `k` holds the rest. `l` is the subtree left of the first entry, `t` the
//! subtree right of its entry.

use std::collections::HashSet;

use cid::Cid;
use repodump_error::{ArchiveError, RepodumpResult, StackError};
use tracing::trace;

use super::{Blockstore, RecordEntry};
use crate::codec::{decode, Value};

/// Work left on the traversal stack.
enum Frame {
    Node(Cid),
    Entry(RecordEntry),
}

/// Decoded form of one node.
struct Node {
    left: Option<Cid>,
    entries: Vec<NodeEntry>,
}

struct NodeEntry {
    key: String,
    value: Cid,
    right: Option<Cid>,
}

/// Iterator over the records of a tree, in key order.
///
/// Nodes are loaded lazily. A node reached a second time is reported as a
/// cycle. After the first error the iterator is fused.
pub struct MstWalker<'a> {
    store: &'a dyn Blockstore,
    stack: Vec<Frame>,
    visited: HashSet<Cid>,
    failed: bool,
}

impl<'a> MstWalker<'a> {
    pub fn new(
        store: &'a dyn Blockstore,
        root: Cid,
    ) -> Self {
        Self {
            store,
            stack: vec![Frame::Node(root)],
            visited: HashSet::new(),
            failed: false,
        }
    }

    /// Pushes a node's content so that it pops in order.
    fn expand(
        &mut self,
        cid: Cid,
    ) -> RepodumpResult<()> {
        if !self.visited.insert(cid) {
            return Err(ArchiveError::InvalidNode {
                cid: cid.to_string(),
                reason: "node reached twice, the tree has a cycle".to_string(),
            }
            .into());
        }
        let bytes = self.store.get(&cid)?;
        let node = parse_node(&cid, &bytes)?;
        trace!(node = %cid, entries = node.entries.len(), "Expanding tree node");

        for entry in node.entries.into_iter().rev() {
            if let Some(right) = entry.right {
                self.stack.push(Frame::Node(right));
            }
            self.stack.push(Frame::Entry(RecordEntry {
                key: entry.key,
                cid: entry.value,
            }));
        }
        if let Some(left) = node.left {
            self.stack.push(Frame::Node(left));
        }
        Ok(())
    }
}

impl Iterator for MstWalker<'_> {
    type Item = RepodumpResult<RecordEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Entry(entry) => return Some(Ok(entry)),
                Frame::Node(cid) => {
                    if let Err(e) = self.expand(cid) {
                        self.failed = true;
                        self.stack.clear();
                        return Some(Err(e));
                    }
                }
            }
        }
        None
    }
}

fn parse_node(
    cid: &Cid,
    bytes: &[u8],
) -> Result<Node, StackError> {
    let invalid = |reason: String| ArchiveError::InvalidNode {
        cid: cid.to_string(),
        reason,
    };

    let value = decode(bytes).map_err(|e| invalid(e.to_string()))?;
    if !matches!(value, Value::Map(_)) {
        return Err(invalid(format!("expected a map, found {}", value.type_name())).into());
    }

    let left = optional_link(value.get("l")).map_err(|t| invalid(format!("'l' is {t}")))?;
    let raw_entries = value
        .get("e")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing array field 'e'".to_string()))?;

    let mut entries = Vec::with_capacity(raw_entries.len());
    let mut prev_key: Vec<u8> = Vec::new();
    for (i, raw) in raw_entries.iter().enumerate() {
        let prefix_len = raw
            .get("p")
            .and_then(Value::as_integer)
            .and_then(|p| usize::try_from(p).ok())
            .ok_or_else(|| invalid(format!("entry {i}: missing prefix length 'p'")))?;
        let suffix = raw
            .get("k")
            .and_then(Value::as_bytes)
            .ok_or_else(|| invalid(format!("entry {i}: missing key suffix 'k'")))?;
        let value_cid = *raw
            .get("v")
            .and_then(Value::as_link)
            .ok_or_else(|| invalid(format!("entry {i}: missing value link 'v'")))?;
        let right = optional_link(raw.get("t"))
            .map_err(|t| invalid(format!("entry {i}: 't' is {t}")))?;

        if prefix_len > prev_key.len() {
            return Err(invalid(format!(
                "entry {i}: prefix length {prefix_len} exceeds previous key length {}",
                prev_key.len()
            ))
            .into());
        }
        let mut key_bytes = prev_key[..prefix_len].to_vec();
        key_bytes.extend_from_slice(suffix);
        let key = String::from_utf8(key_bytes.clone())
            .map_err(|_| invalid(format!("entry {i}: key is not UTF-8")))?;
        prev_key = key_bytes;

        entries.push(NodeEntry {
            key,
            value: value_cid,
            right,
        });
    }

    Ok(Node { left, entries })
}

/// A link or null; anything else yields the type name found.
fn optional_link(value: Option<&Value>) -> Result<Option<Cid>, &'static str> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Link(cid)) => Ok(Some(*cid)),
        Some(other) => Err(other.type_name()),
    }
}
