use std::{any::Any, fmt};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// What went wrong while decoding a binary record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("malformed item")]
    Syntax,

    #[error("unsupported item: {reason}")]
    Semantic { reason: String },

    #[error("nesting deeper than {max} levels")]
    DepthLimit { max: usize },

    #[error("{remaining} trailing byte(s) after the top-level item")]
    TrailingBytes { remaining: usize },
}

/// A record's binary payload could not be decoded.
///
/// Carries the byte offset at which decoding stopped and, once the pipeline
/// attaches it, the key of the record being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: u64,
    pub key: Option<String>,
}

impl DecodeError {
    pub fn new(
        kind: DecodeErrorKind,
        offset: u64,
    ) -> Self {
        Self {
            kind,
            offset,
            key: None,
        }
    }

    /// Names the record the payload belongs to.
    pub fn with_key(
        mut self,
        key: impl Into<String>,
    ) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.key {
            Some(key) => write!(
                f,
                "Failed to decode record '{key}' at offset {}: {}",
                self.offset, self.kind
            ),
            None => write!(f, "Failed to decode at offset {}: {}", self.offset, self.kind),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl ErrorExt for DecodeError {
    fn status_code(&self) -> StatusCode {
        match self.kind {
            DecodeErrorKind::UnexpectedEof { .. } => StatusCode::UnexpectedEof,
            DecodeErrorKind::DepthLimit { .. } => StatusCode::DepthLimit,
            _ => StatusCode::DecodingError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "decode".to_string()),
            ("status_code", self.status_code().to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(key) = &self.key {
            tags.push(("record_key", key.clone()));
        }
        tags
    }
}

/// A value could not be written as CBOR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to encode value: {reason}")]
pub struct EncodeError {
    pub reason: String,
}

impl EncodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ErrorExt for EncodeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::EncodingError
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
