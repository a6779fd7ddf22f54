//! Human-readable account alias.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeError;

/// A validated account alias: 4 to 30 characters from the lowercase latin
/// alphabet, digits, and `. _ @ -`.
///
/// Construction goes through [`Alias::new`], which enforces the charset, so
/// any `Alias` value in the process is well-formed. Persisted alias keys are
/// re-validated on read; a failure there is a corruption error in the store
/// layer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alias(String);

impl Alias {
    pub const MIN_LENGTH: usize = 4;
    pub const MAX_LENGTH: usize = 30;

    /// Validate and wrap a raw alias string.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        if s.len() < Self::MIN_LENGTH
            || s.len() > Self::MAX_LENGTH
            || !s.bytes().all(Self::is_alias_byte)
        {
            return Err(TypeError::InvalidAlias(s));
        }
        Ok(Self(s))
    }

    /// Reconstruct an alias from persisted key bytes.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, TypeError> {
        let s = std::str::from_utf8(bytes).map_err(|_| TypeError::AliasNotUtf8)?;
        Self::new(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_alias_byte(b: u8) -> bool {
        b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'@' | b'-')
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({})", self.0)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
