//! CARv1 archive reading.
//!
//! ```text
//! varint(header_len) | header {version: 1, roots: [cid, ..]}
//! varint(section_len) | cid | block bytes      (repeated until EOF)
//! ```

use std::io::{self, Cursor, Read};

use bytes::Bytes;
use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};
use repodump_error::{ArchiveError, RepodumpResult, ResultExt};
use tracing::{debug, trace};

use super::{
    mst::MstWalker, ArchiveReader, Blockstore, MemoryBlockstore, RecordEntry, Repository,
    SignedCommit,
};
use crate::codec::{decode, varint::read_uvarint, Value};

/// The only archive version understood.
pub const CAR_VERSION: i128 = 1;

/// Upper bound on the header size.
const MAX_HEADER_LEN: u64 = 1024 * 1024;

/// Reads CARv1 archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarReader {
    verify_blocks: bool,
}

/// Roots and blocks of a loaded archive.
#[derive(Debug, Clone)]
pub struct CarArchive {
    pub roots: Vec<Cid>,
    pub blocks: MemoryBlockstore,
}

/// A repository backed by a fully loaded archive.
#[derive(Debug, Clone)]
pub struct CarRepository {
    root: Cid,
    commit: SignedCommit,
    blocks: MemoryBlockstore,
}

/// Counts the bytes pulled through a reader.
struct CountingRead<R: Read> {
    inner: R,
    bytes_read: u64,
}

impl<R: Read> CountingRead<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for CountingRead<R> {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl CarReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes each block's digest while loading.
    pub fn verify_blocks(
        mut self,
        verify: bool,
    ) -> Self {
        self.verify_blocks = verify;
        self
    }

    /// Loads every block of the archive into memory.
    pub fn load<R: Read>(
        &self,
        reader: R,
    ) -> Result<CarArchive, ArchiveError> {
        let mut reader = CountingRead::new(reader);
        let roots = read_header(&mut reader)?;

        let mut blocks = MemoryBlockstore::new();
        while let Some((cid, data)) = read_section(&mut reader)? {
            if self.verify_blocks {
                verify_block(&cid, &data)?;
            }
            trace!(cid = %cid, len = data.len(), "Loaded block");
            blocks.insert(cid, data);
        }

        debug!(
            roots = roots.len(),
            blocks = blocks.len(),
            bytes = reader.bytes_read(),
            "Archive loaded"
        );
        Ok(CarArchive { roots, blocks })
    }
}

impl ArchiveReader for CarReader {
    type Repo = CarRepository;

    fn open<R: Read>(
        &self,
        reader: R,
    ) -> RepodumpResult<CarRepository> {
        let CarArchive { roots, blocks } = self.load(reader)?;
        // the header guarantees at least one root
        let root = roots[0];

        let commit_bytes = blocks
            .get(&root)
            .with_context(|| format!("Loading commit {root}"))?;
        let commit = SignedCommit::from_block(&root, &commit_bytes)?;
        debug!(root = %root, did = %commit.did, rev = ?commit.rev, "Commit decoded");

        Ok(CarRepository {
            root,
            commit,
            blocks,
        })
    }
}

impl CarRepository {
    /// CID of the commit block.
    pub fn root(&self) -> &Cid {
        &self.root
    }
}

impl Repository for CarRepository {
    fn commit(&self) -> &SignedCommit {
        &self.commit
    }

    fn entries(&self) -> Box<dyn Iterator<Item = RepodumpResult<RecordEntry>> + '_> {
        Box::new(MstWalker::new(&self.blocks, self.commit.data))
    }

    fn blockstore(&self) -> &dyn Blockstore {
        &self.blocks
    }
}

fn read_header<R: Read>(reader: &mut CountingRead<R>) -> Result<Vec<Cid>, ArchiveError> {
    let invalid = |reason: &str| ArchiveError::InvalidHeader {
        reason: reason.to_string(),
    };

    let len = read_uvarint(reader)
        .map_err(|e| invalid(&format!("bad length: {e}")))?
        .ok_or_else(|| invalid("empty input"))?;
    if len == 0 || len > MAX_HEADER_LEN {
        return Err(invalid(&format!("length {len} out of range")));
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => invalid("truncated"),
        _ => ArchiveError::read(&e),
    })?;

    let header = decode(&buf).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(header, Value::Map(_)) {
        return Err(invalid(&format!("expected a map, found {}", header.type_name())));
    }

    let version = header
        .get("version")
        .and_then(Value::as_integer)
        .ok_or_else(|| invalid("missing integer field 'version'"))?;
    if version != CAR_VERSION {
        return Err(ArchiveError::UnsupportedVersion { version });
    }

    let roots = header
        .get("roots")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing array field 'roots'"))?
        .iter()
        .map(|root| root.as_link().copied().ok_or_else(|| invalid("root is not a link")))
        .collect::<Result<Vec<_>, _>>()?;
    if roots.is_empty() {
        return Err(ArchiveError::NoRoots);
    }
    Ok(roots)
}

/// Reads the next section, `None` at a clean end of input.
fn read_section<R: Read>(
    reader: &mut CountingRead<R>,
) -> Result<Option<(Cid, Bytes)>, ArchiveError> {
    let offset = reader.bytes_read();
    let invalid = |reason: String| ArchiveError::InvalidSection { offset, reason };

    let len = match read_uvarint(reader) {
        Ok(Some(len)) => len,
        Ok(None) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(invalid("truncated section length".to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => return Err(invalid(e.to_string())),
        Err(e) => return Err(ArchiveError::read(&e)),
    };
    if len == 0 {
        return Err(invalid("empty section".to_string()));
    }

    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(len)
        .read_to_end(&mut buf)
        .map_err(|e| ArchiveError::read(&e))?;
    if (buf.len() as u64) < len {
        return Err(invalid(format!(
            "truncated section: expected {len} bytes, found {}",
            buf.len()
        )));
    }

    let mut cursor = Cursor::new(buf.as_slice());
    let cid = Cid::read_bytes(&mut cursor).map_err(|e| invalid(format!("bad CID: {e}")))?;
    let start = cursor.position() as usize;
    Ok(Some((cid, Bytes::from(buf).slice(start..))))
}

fn verify_block(
    cid: &Cid,
    data: &[u8],
) -> Result<(), ArchiveError> {
    let hash = cid.hash();
    match Code::try_from(hash.code()) {
        Ok(code) => {
            if code.digest(data).digest() != hash.digest() {
                return Err(ArchiveError::DigestMismatch {
                    cid: cid.to_string(),
                });
            }
        }
        Err(_) => debug!(cid = %cid, code = hash.code(), "Unsupported hash function, block not verified"),
    }
    Ok(())
}
