use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Status codes used to categorize errors.
///
/// # Ranges:
/// - 0xxx: Success
/// - 1xxx: General errors
/// - 2xxx: Data errors
/// - 3xxx: Identity
/// - 5xxx: Storage
/// - 6xxx: IO
/// - 8xxx: Encoding / decoding
///
/// `num_enum::TryFromPrimitive` provides `TryFrom<u32>`; with the `extras`
/// feature the code serializes as its numeric value.
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Success ===
    Success = 0,

    // === 1xxx: General errors ===
    Unknown = 1000,
    Unsupported = 1001,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Data errors ===
    NotFound = 2000,
    AlreadyExists = 2001,
    InvalidKey = 2003,
    InvalidValue = 2004,
    InvalidData = 2009,

    // === 3xxx: Identity ===
    InvalidIdentity = 3000,

    // === 5xxx: Storage ===
    StorageUnavailable = 5000,
    DiskFull = 5001,
    CorruptedData = 5002,
    SerializationFailed = 5003,
    DeserializationFailed = 5004,
    DigestMismatch = 5005,

    // === 6xxx: IO ===
    Io = 6000,
    PermissionDenied = 6001,
    UnexpectedEof = 6007,

    // === 8xxx: Encoding ===
    UnsupportedVersion = 8002,
    InvalidUtf8 = 8004,
    DepthLimit = 8008,
    ParseError = 8009,
    EncodingError = 8010,
    DecodingError = 8011,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Numeric representation of the status code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Tries to obtain a `StatusCode` variant from a `u32`.
    ///
    /// Returns `None` if the value does not match any variant.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Returns `true` if `code` means success.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Problem in the input: the archive, a record or the owner identity.
    pub fn is_input_error(&self) -> bool {
        let c = self.code();
        if (2000..=3999).contains(&c) || (8000..=8999).contains(&c) {
            return true;
        }
        matches!(
            self,
            Self::InvalidArgs | Self::CorruptedData | Self::DigestMismatch
        )
    }

    /// Failure of the local environment (filesystem, disk).
    pub fn is_environment_error(&self) -> bool {
        matches!(
            self,
            Self::Io
                | Self::PermissionDenied
                | Self::DiskFull
                | Self::StorageUnavailable
                | Self::SerializationFailed
        )
    }

    /// Whether the error must be logged as critical.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Internal | Self::CorruptedData | Self::DiskFull | Self::StorageUnavailable
        )
    }

    /// Recommended log level for this code.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::AlreadyExists => LogLevel::Debug,
            Self::InvalidArgs | Self::InvalidValue | Self::InvalidKey => LogLevel::Info,
            Self::DecodingError
            | Self::DepthLimit
            | Self::InvalidUtf8
            | Self::UnexpectedEof => LogLevel::Warn,
            Self::Internal
            | Self::NotFound
            | Self::CorruptedData
            | Self::DigestMismatch
            | Self::DiskFull
            | Self::StorageUnavailable
            | Self::Io
            | Self::PermissionDenied => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    /// Process exit code the binary reports for this status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InvalidArgs => 2,
            Self::InvalidIdentity => 3,
            Self::CorruptedData
            | Self::DigestMismatch
            | Self::UnsupportedVersion
            | Self::InvalidData => 4,
            Self::DecodingError
            | Self::DepthLimit
            | Self::InvalidUtf8
            | Self::UnexpectedEof
            | Self::ParseError => 5,
            Self::NotFound => 6,
            Self::Io | Self::PermissionDenied | Self::DiskFull | Self::SerializationFailed => 7,
            _ => 1,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
