use cid::Cid;
use repodump_error::ArchiveError;

use crate::codec::{decode, Value};

/// The signed commit at the root of a repository.
///
/// The signature is carried but never checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCommit {
    /// Owner identity, as written in the commit.
    pub did: String,
    pub version: i64,
    /// Root node of the Merkle search tree.
    pub data: Cid,
    pub rev: Option<String>,
    pub prev: Option<Cid>,
    pub sig: Option<Vec<u8>>,
}

impl SignedCommit {
    /// Decodes a commit from its block.
    pub fn from_block(
        cid: &Cid,
        bytes: &[u8],
    ) -> Result<Self, ArchiveError> {
        let invalid = |reason: String| ArchiveError::InvalidCommit {
            cid: cid.to_string(),
            reason,
        };

        let value = decode(bytes).map_err(|e| invalid(e.to_string()))?;
        if !matches!(value, Value::Map(_)) {
            return Err(invalid(format!("expected a map, found {}", value.type_name())));
        }

        let did = value
            .get("did")
            .and_then(Value::as_text)
            .ok_or_else(|| invalid("missing text field 'did'".to_string()))?
            .to_string();

        let version = value
            .get("version")
            .and_then(Value::as_integer)
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| invalid("missing integer field 'version'".to_string()))?;

        let data = *value
            .get("data")
            .and_then(Value::as_link)
            .ok_or_else(|| invalid("missing link field 'data'".to_string()))?;

        let rev = match value.get("rev") {
            None | Some(Value::Null) => None,
            Some(Value::Text(rev)) => Some(rev.clone()),
            Some(other) => return Err(invalid(format!("'rev' is {}", other.type_name()))),
        };

        let prev = match value.get("prev") {
            None | Some(Value::Null) => None,
            Some(Value::Link(prev)) => Some(*prev),
            Some(other) => return Err(invalid(format!("'prev' is {}", other.type_name()))),
        };

        let sig = value.get("sig").and_then(Value::as_bytes).map(<[u8]>::to_vec);

        Ok(Self {
            did,
            version,
            data,
            rev,
            prev,
            sig,
        })
    }
}
