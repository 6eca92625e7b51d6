use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// The repository owner's identity string is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Owner identity is empty")]
    Empty,

    #[error("Identity '{input}' does not start with 'did:'")]
    MissingPrefix { input: String },

    #[error("Identity '{input}' has an invalid method")]
    InvalidMethod { input: String },

    #[error("Identity '{input}' has an invalid identifier: {reason}")]
    InvalidIdentifier { input: String, reason: String },

    #[error("Identity is {len} bytes long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

impl ErrorExt for IdentityError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidIdentity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
