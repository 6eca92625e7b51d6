use std::{any::Any, error::Error};

use crate::StatusCode;

/// Extension trait for library errors (object-safe).
///
/// Provides helpers on top of [`Error`]:
/// - the status code used to pick a log level and an exit code,
/// - a short message for the terminal,
/// - a detailed message for logs,
/// - key/value tags for structured log fields.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Status code of the error.
    ///
    /// Defaults to [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Returns the error as [`Any`] so that it can be downcast.
    fn as_any(&self) -> &dyn Any;

    /// Short message for the user.
    fn user_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Detailed message for logs.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Structured fields attached to the log event of this error.
    fn log_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Name of the error type.
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}
