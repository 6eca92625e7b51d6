//! Access to the repository stored in an archive.
//!
//! The pipeline only sees the traits of this module. [`CarReader`] is the
//! default [`ArchiveReader`]: it loads a CARv1 file into a
//! [`MemoryBlockstore`], decodes the [`SignedCommit`] found at the first root
//! and walks the Merkle search tree with [`MstWalker`].

use std::io::Read;

use bytes::Bytes;
use cid::Cid;
use repodump_error::{BlockError, RepodumpResult};

pub mod blockstore;
pub mod car;
pub mod commit;
pub mod did;
pub mod mst;

pub use blockstore::MemoryBlockstore;
pub use car::{CarReader, CarRepository};
pub use commit::SignedCommit;
pub use did::Did;
pub use mst::MstWalker;

/// One record reachable from the commit: its key and the CID of its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub key: String,
    pub cid: Cid,
}

/// Content-addressed block lookup.
pub trait Blockstore {
    fn get(
        &self,
        cid: &Cid,
    ) -> Result<Bytes, BlockError>;
}

/// An opened repository.
pub trait Repository {
    /// The commit the archive was exported at.
    fn commit(&self) -> &SignedCommit;

    /// Every record of the commit, in tree order.
    fn entries(&self) -> Box<dyn Iterator<Item = RepodumpResult<RecordEntry>> + '_>;

    fn blockstore(&self) -> &dyn Blockstore;
}

/// Opens repositories from a byte stream.
pub trait ArchiveReader {
    type Repo: Repository;

    fn open<R: Read>(
        &self,
        reader: R,
    ) -> RepodumpResult<Self::Repo>;
}
