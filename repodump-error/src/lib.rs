//! Centralized error handling for repodump.
//!
//! Every domain error implements [`ErrorExt`] and is carried through the
//! pipeline as a [`StackError`], which accumulates human-readable context
//! (stage, record key, file path) as it travels up the call stack.

pub mod ext;
pub mod macros;
pub mod stack;
pub mod status_code;
pub mod types;

// Publicly re-export all error types and functions from the submodules to
// simplify access from external code.
pub use ext::*;
pub use macros::*;
pub use stack::*;
pub use status_code::*;
pub use types::*;

pub type RepodumpResult<T> = Result<T, StackError>;
