use std::{any::Any, io, path::PathBuf};

use thiserror::Error;

use crate::{io_status, ErrorExt, StatusCode};

/// Filesystem failures of the persistence sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Failed to create directory {}: {reason}", .path.display())]
    CreateDir {
        path: PathBuf,
        kind: io::ErrorKind,
        reason: String,
    },

    #[error("Failed to write {}: {reason}", .path.display())]
    Write {
        path: PathBuf,
        kind: io::ErrorKind,
        reason: String,
    },

    /// The record key cannot be used as a relative path under the output root.
    #[error("Record key '{key}' is not a safe relative path")]
    UnsafeKey { key: String },

    #[error("Failed to serialize {}: {reason}", .path.display())]
    Serialize { path: PathBuf, reason: String },
}

impl SinkError {
    pub fn create_dir(
        path: impl Into<PathBuf>,
        err: &io::Error,
    ) -> Self {
        Self::CreateDir {
            path: path.into(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn write(
        path: impl Into<PathBuf>,
        err: &io::Error,
    ) -> Self {
        Self::Write {
            path: path.into(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

impl ErrorExt for SinkError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CreateDir { kind, .. } | Self::Write { kind, .. } => match io_status(*kind) {
                StatusCode::PermissionDenied => StatusCode::PermissionDenied,
                _ => StatusCode::Io,
            },
            Self::UnsafeKey { .. } => StatusCode::InvalidKey,
            Self::Serialize { .. } => StatusCode::SerializationFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn log_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "sink".to_string()),
            ("status_code", self.status_code().to_string()),
        ];
        match self {
            Self::CreateDir { path, .. } | Self::Write { path, .. } | Self::Serialize { path, .. } => {
                tags.push(("path", path.display().to_string()))
            }
            Self::UnsafeKey { key } => tags.push(("record_key", key.clone())),
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_keeps_path_and_kind() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = SinkError::write("/out/a/1.cbor", &io_err);
        assert_eq!(err.status_code(), StatusCode::PermissionDenied);
        assert!(err.to_string().contains("/out/a/1.cbor"));
        assert!(err
            .log_tags()
            .iter()
            .any(|(k, v)| *k == "path" && v == "/out/a/1.cbor"));
    }

    #[test]
    fn test_other_io_kinds_map_to_io() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = SinkError::create_dir("/out", &io_err);
        assert_eq!(err.status_code(), StatusCode::Io);
    }

    #[test]
    fn test_unsafe_key() {
        let err = SinkError::UnsafeKey {
            key: "../../etc/passwd".into(),
        };
        assert_eq!(err.status_code(), StatusCode::InvalidKey);
        assert_eq!(
            err.to_string(),
            "Record key '../../etc/passwd' is not a safe relative path"
        );
    }
}
