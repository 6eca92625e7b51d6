/// Returns an error immediately (like `anyhow::bail!`).
///
/// Three forms:
/// - `bail!(err)` takes any error convertible into `StackError`;
/// - `bail!(code, "msg")` creates a `GenericError` with a code and message;
/// - `bail!(code, "fmt {}", arg)` formats the message.
///
/// ```ignore
/// use repodump_error::{bail, StatusCode};
///
/// fn check_extension(ext: &str) -> repodump_error::RepodumpResult<()> {
///     if ext.is_empty() {
///         bail!(StatusCode::InvalidArgs, "extension cannot be empty");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Checks a condition and calls `bail!` when it is false.
///
/// Accepts the same forms as `bail!` after the condition.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
    ($cond:expr, $code:expr, $msg:expr) => {
        if !($cond) {
            $crate::bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($code, $fmt, $($arg)*);
        }
    };
}

/// Extension trait for `Result` that attaches context to the error.
///
/// Turns the error into a [`StackError`](crate::StackError) and pushes a
/// context frame on it.
pub trait ResultExt<T> {
    /// Adds context to the error if `self` is `Err`.
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;

    /// Adds lazily built context (only evaluated on error).
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenericError, RepodumpResult, SinkError, StatusCode};

    #[test]
    fn test_bail_simple() {
        fn example() -> RepodumpResult<()> {
            bail!(GenericError::new(StatusCode::InvalidArgs, "test error"));
        }

        let err = example().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }

    #[test]
    fn test_bail_with_format() {
        fn example(depth: usize) -> RepodumpResult<()> {
            bail!(StatusCode::InvalidArgs, "max_depth must be positive, got {}", depth);
        }

        let err = example(0).unwrap_err();
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn test_ensure() {
        fn validate(ext: &str) -> RepodumpResult<()> {
            ensure!(!ext.is_empty(), StatusCode::InvalidArgs, "empty extension");
            ensure!(
                !ext.contains('/'),
                StatusCode::InvalidArgs,
                "extension '{}' contains a separator",
                ext
            );
            Ok(())
        }

        assert!(validate("cbor").is_ok());
        assert!(validate("").is_err());
        assert!(validate("a/b").is_err());
    }

    #[test]
    fn test_result_ext() {
        fn inner() -> Result<(), SinkError> {
            Err(SinkError::UnsafeKey {
                key: "../escape".to_string(),
            })
        }

        fn outer() -> RepodumpResult<()> {
            inner().context("raw write")?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.contexts().len(), 1);
        assert_eq!(err.contexts()[0].message, "raw write");
        assert_eq!(err.status_code(), StatusCode::InvalidKey);
    }

    #[test]
    fn test_with_context_lazy() {
        fn example(success: bool) -> RepodumpResult<()> {
            let result: Result<(), GenericError> = if success {
                Ok(())
            } else {
                Err(GenericError::new(StatusCode::Internal, "error"))
            };

            result.with_context(|| format!("attempt success={success}"))?;
            Ok(())
        }

        assert!(example(true).is_ok());
        let err = example(false).unwrap_err();
        assert_eq!(err.contexts()[0].message, "attempt success=false");
    }
}
