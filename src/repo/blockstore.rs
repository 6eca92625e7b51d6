use std::collections::HashMap;

use bytes::Bytes;
use cid::Cid;
use repodump_error::BlockError;

use super::Blockstore;

/// Blocks held in memory, keyed by CID.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlockstore {
    blocks: HashMap<Cid, Bytes>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a block. A block already present under the same CID is replaced.
    pub fn insert(
        &mut self,
        cid: Cid,
        data: impl Into<Bytes>,
    ) {
        self.blocks.insert(cid, data.into());
    }

    pub fn contains(
        &self,
        cid: &Cid,
    ) -> bool {
        self.blocks.contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Blockstore for MemoryBlockstore {
    fn get(
        &self,
        cid: &Cid,
    ) -> Result<Bytes, BlockError> {
        self.blocks
            .get(cid)
            .cloned()
            .ok_or_else(|| BlockError::NotFound {
                cid: cid.to_string(),
                key: None,
            })
    }
}
