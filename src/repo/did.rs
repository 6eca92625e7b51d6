use std::fmt;

use repodump_error::IdentityError;

/// Longest accepted identity, in bytes.
pub const MAX_DID_LEN: usize = 2048;

/// A syntactically valid decentralized identifier (`did:<method>:<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Did(String);

impl Did {
    /// Validates `input`. The canonical form is the input itself.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        if input.is_empty() {
            return Err(IdentityError::Empty);
        }
        if input.len() > MAX_DID_LEN {
            return Err(IdentityError::TooLong {
                len: input.len(),
                max: MAX_DID_LEN,
            });
        }

        let rest = input
            .strip_prefix("did:")
            .ok_or_else(|| IdentityError::MissingPrefix {
                input: input.to_string(),
            })?;

        let (method, identifier) = rest.split_once(':').ok_or_else(|| {
            IdentityError::InvalidIdentifier {
                input: input.to_string(),
                reason: "missing identifier".to_string(),
            }
        })?;

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(IdentityError::InvalidMethod {
                input: input.to_string(),
            });
        }

        let invalid = |reason: &str| IdentityError::InvalidIdentifier {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        if identifier.is_empty() {
            return Err(invalid("empty"));
        }
        if let Some(c) = identifier
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-')))
        {
            return Err(invalid(&format!("unexpected character '{c}'")));
        }
        if identifier.ends_with(':') || identifier.ends_with('%') {
            return Err(invalid("ends with ':' or '%'"));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method segment, e.g. `plc`.
    pub fn method(&self) -> &str {
        self.0
            .split(':')
            .nth(1)
            .unwrap_or_default()
    }
}

impl fmt::Display for Did {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
