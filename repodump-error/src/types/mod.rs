pub mod archive;
pub mod decode;
pub mod identity;
pub mod sink;

// Public re-export of all error types from the nested modules to simplify
// access from external code.
pub use archive::*;
pub use decode::*;
pub use identity::*;
pub use sink::*;

use crate::{ErrorExt, StatusCode};

/// Generic error with a code and a message.
#[derive(Debug, Clone)]
pub struct GenericError {
    code: StatusCode,
    message: String,
}

impl GenericError {
    pub fn new(
        code: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GenericError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenericError {}

impl ErrorExt for GenericError {
    fn status_code(&self) -> StatusCode {
        self.code
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Maps an IO error kind onto a status code.
pub fn io_status(kind: std::io::ErrorKind) -> StatusCode {
    match kind {
        std::io::ErrorKind::NotFound => StatusCode::NotFound,
        std::io::ErrorKind::PermissionDenied => StatusCode::PermissionDenied,
        std::io::ErrorKind::AlreadyExists => StatusCode::AlreadyExists,
        std::io::ErrorKind::UnexpectedEof => StatusCode::UnexpectedEof,
        _ => StatusCode::Io,
    }
}

/// Conversion from std::io::Error
impl From<std::io::Error> for crate::StackError {
    fn from(err: std::io::Error) -> Self {
        crate::StackError::new(GenericError::new(io_status(err.kind()), err.to_string()))
    }
}

/// Conversion from std::str::Utf8Error
impl From<std::str::Utf8Error> for crate::StackError {
    fn from(err: std::str::Utf8Error) -> Self {
        crate::StackError::new(GenericError::new(
            StatusCode::InvalidUtf8,
            format!("UTF-8 decoding failed: {err}"),
        ))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
