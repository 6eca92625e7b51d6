use std::{fmt, panic::Location, sync::Arc};

use crate::{ErrorExt, LogLevel, StatusCode};

/// Main error type with context and location tracking.
///
/// Context is appended while the error travels up the call stack, so the
/// final message reads outermost first: `stage → record → root cause`.
#[derive(Clone)]
pub struct StackError {
    inner: Arc<dyn ErrorExt>,
    contexts: Arc<Vec<ErrorContext>>,
}

/// One context frame with the location it was attached at.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub message: String,
    pub location: Option<&'static Location<'static>>,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl StackError {
    /// Creates a new error.
    #[track_caller]
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            inner: Arc::new(err),
            contexts: Arc::new(Vec::new()),
        }
    }

    /// Appends a context frame.
    #[track_caller]
    pub fn context(
        mut self,
        msg: impl Into<String>,
    ) -> Self {
        let mut new_contexts = (*self.contexts).clone();
        new_contexts.push(ErrorContext {
            message: msg.into(),
            location: Some(Location::caller()),
        });
        self.contexts = Arc::new(new_contexts);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    pub fn user_message(&self) -> String {
        self.inner.user_message()
    }

    /// Returns the root error.
    pub fn root(&self) -> &dyn ErrorExt {
        self.inner.as_ref()
    }

    /// Context frames in the order they were attached (innermost first).
    pub fn contexts(&self) -> &[ErrorContext] {
        &self.contexts
    }

    pub fn log_tags(&self) -> Vec<(&'static str, String)> {
        self.inner.log_tags()
    }

    /// Downcasts the root error to a concrete type.
    pub fn downcast_ref<T: ErrorExt + 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Whether the root error is of type `T`.
    pub fn is<T: ErrorExt + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    fn format_contexts(&self) -> Vec<String> {
        self.contexts
            .iter()
            .map(|ctx| {
                if let Some(loc) = ctx.location {
                    format!("{} ({}:{})", ctx.message, loc.file(), loc.line())
                } else {
                    ctx.message.clone()
                }
            })
            .collect()
    }

    pub fn log_level(&self) -> LogLevel {
        self.status_code().log_level()
    }

    pub fn is_critical(&self) -> bool {
        self.status_code().is_critical()
    }

    pub fn exit_code(&self) -> i32 {
        self.status_code().exit_code()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut debug = f.debug_struct("StackError");
        debug.field("inner", &self.inner.to_string());
        debug.field("status_code", &self.status_code());

        if !self.contexts.is_empty() {
            debug.field("contexts", &self.format_contexts());
        }

        debug.finish()
    }
}

impl fmt::Display for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if !self.contexts.is_empty() {
            let contexts: Vec<&str> = self
                .contexts
                .iter()
                .rev()
                .map(|c| c.message.as_str())
                .collect();
            write!(f, "{}: {}", contexts.join(" → "), self.inner)
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl<E: ErrorExt> From<E> for StackError {
    #[track_caller]
    fn from(e: E) -> Self {
        StackError::new(e)
    }
}

impl From<StackError> for std::io::Error {
    fn from(e: StackError) -> Self {
        std::io::Error::other(e.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
