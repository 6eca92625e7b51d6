use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Errors of the archive container and of the structures stored in it
/// (signed commit, Merkle search tree nodes).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    /// The underlying reader failed.
    #[error("Failed to read archive: {reason}")]
    Read { reason: String },

    /// The container header is malformed.
    #[error("Invalid archive header: {reason}")]
    InvalidHeader { reason: String },

    /// Only CAR version 1 is understood.
    #[error("Unsupported archive version {version}")]
    UnsupportedVersion { version: i128 },

    /// The header lists no root.
    #[error("Archive header has no roots")]
    NoRoots,

    /// A block section is malformed or truncated.
    #[error("Invalid block section at offset {offset}: {reason}")]
    InvalidSection { offset: u64, reason: String },

    /// The bytes of a block do not hash to its content identifier.
    #[error("Block {cid} does not match its digest")]
    DigestMismatch { cid: String },

    /// The root block is not a commit object.
    #[error("Invalid commit {cid}: {reason}")]
    InvalidCommit { cid: String, reason: String },

    /// A tree node is malformed.
    #[error("Invalid tree node {cid}: {reason}")]
    InvalidNode { cid: String, reason: String },
}

/// Blockstore lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Block {cid} not found{}", key_suffix(.key))]
    NotFound { cid: String, key: Option<String> },
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_deref()
        .map(|k| format!(" (record '{k}')"))
        .unwrap_or_default()
}

impl ArchiveError {
    pub fn read(err: &std::io::Error) -> Self {
        Self::Read {
            reason: err.to_string(),
        }
    }
}

impl BlockError {
    /// Attaches the record key that referenced the missing block.
    pub fn with_key(
        self,
        record_key: impl Into<String>,
    ) -> Self {
        match self {
            Self::NotFound { cid, .. } => Self::NotFound {
                cid,
                key: Some(record_key.into()),
            },
        }
    }
}

impl ErrorExt for ArchiveError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Read { .. } => StatusCode::Io,
            Self::UnsupportedVersion { .. } => StatusCode::UnsupportedVersion,
            Self::DigestMismatch { .. } => StatusCode::DigestMismatch,
            Self::InvalidCommit { .. } => StatusCode::InvalidData,
            Self::InvalidHeader { .. }
            | Self::NoRoots
            | Self::InvalidSection { .. }
            | Self::InvalidNode { .. } => StatusCode::CorruptedData,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "archive".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::InvalidSection { offset, .. } => tags.push(("offset", offset.to_string())),
            Self::DigestMismatch { cid }
            | Self::InvalidCommit { cid, .. }
            | Self::InvalidNode { cid, .. } => tags.push(("cid", cid.clone())),
            _ => {}
        }

        tags
    }
}

impl ErrorExt for BlockError {
    fn status_code(&self) -> StatusCode {
        StatusCode::NotFound
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_tags(&self) -> Vec<(&'static str, String)> {
        let Self::NotFound { cid, key } = self;
        let mut tags = vec![
            ("error_type", "block".to_string()),
            ("status_code", self.status_code().to_string()),
            ("cid", cid.clone()),
        ];
        if let Some(key) = key {
            tags.push(("record_key", key.clone()));
        }
        tags
    }
}
